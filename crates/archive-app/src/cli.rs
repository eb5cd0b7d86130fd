//! CLI argument definitions for the archive client.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use archive_core::ArchiveConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Archive: conversational search and document management for the contract archive.
#[derive(Parser, Debug)]
#[command(name = "archive", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Backend API base URL, e.g. http://localhost:8000/api.
    #[arg(short = 'u', long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Interactive conversational search.
    Chat,
    /// Ask a single question and print the answer.
    Ask {
        question: String,
        /// Continue an existing session.
        #[arg(short = 's', long = "session")]
        session: Option<String>,
    },
    /// Stored conversations.
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Uploaded contract documents.
    #[command(subcommand)]
    Contracts(ContractsCommand),
    /// Document-level search.
    #[command(subcommand)]
    Search(SearchCommand),
    /// Check that the backend is reachable.
    Health,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SessionsCommand {
    /// List stored sessions, newest first.
    List {
        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: u32,
    },
    /// Print every turn of a session.
    Show { session: String },
    /// Delete a session.
    Delete { session: String },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ContractsCommand {
    /// List contracts.
    List {
        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: u32,
        #[arg(long = "page-size", default_value_t = 20)]
        page_size: u32,
    },
    /// Show contract metadata and processing state.
    Show { id: i64 },
    /// Upload a contract file. OCR starts on the server.
    Upload {
        path: PathBuf,
        /// Contract category, e.g. 采购合同.
        #[arg(short = 't', long = "type")]
        contract_type: Option<String>,
        /// Wait for OCR to finish.
        #[arg(short = 'w', long = "watch")]
        watch: bool,
    },
    /// Show OCR status, including the backend error of a failed run.
    Ocr {
        id: i64,
        /// (Re)start OCR processing first.
        #[arg(long = "start")]
        start: bool,
    },
    /// Poll OCR status until it completes or fails.
    Watch { id: i64 },
    /// Print or save the extracted HTML content.
    Html {
        id: i64,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Download the original file.
    Download {
        id: i64,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Delete a contract.
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SearchCommand {
    /// Natural-language search.
    Natural {
        query: String,
        #[arg(short = 'n', long = "limit", default_value_t = 10)]
        limit: u32,
        #[arg(short = 't', long = "type")]
        contract_type: Option<String>,
    },
    /// Keyword search.
    Keyword {
        keyword: String,
        #[arg(short = 'n', long = "limit", default_value_t = 20)]
        limit: u32,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ARCHIVE_CONFIG env var > platform default (~/.archive/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ARCHIVE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Load the configuration at `path`.
    ///
    /// A file named with --config must load; the env or default location
    /// falls back to defaults when absent or invalid.
    pub fn load_config(&self, path: &Path) -> archive_core::Result<ArchiveConfig> {
        if self.config.is_some() {
            ArchiveConfig::load(path)
        } else {
            Ok(ArchiveConfig::load_or_default(path))
        }
    }

    /// Resolve the backend base URL.
    ///
    /// Priority: --base-url flag > ARCHIVE_BASE_URL env var > config file value.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        if let Some(ref url) = self.base_url {
            return url.clone();
        }
        if let Ok(url) = std::env::var("ARCHIVE_BASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }
        config_url.to_string()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value > info.
    /// `RUST_LOG` still wins over both when the subscriber is built.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if !config_level.trim().is_empty() {
            return config_level.to_string();
        }
        "info".to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".archive").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".archive").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_chat() {
        let args = parse(&["archive", "chat"]);
        assert_eq!(args.command, Command::Chat);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["archive", "ask", "合同期限是多久？", "-u", "http://h/api", "-l", "debug"]);
        assert_eq!(
            args.command,
            Command::Ask {
                question: "合同期限是多久？".to_string(),
                session: None
            }
        );
        assert_eq!(args.base_url.as_deref(), Some("http://h/api"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_parse_contract_upload() {
        let args = parse(&["archive", "contracts", "upload", "a.pdf", "-t", "采购合同", "--watch"]);
        assert_eq!(
            args.command,
            Command::Contracts(ContractsCommand::Upload {
                path: PathBuf::from("a.pdf"),
                contract_type: Some("采购合同".to_string()),
                watch: true,
            })
        );
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&["archive", "sessions", "list"]);
        assert_eq!(args.command, Command::Sessions(SessionsCommand::List { page: 1 }));

        let args = parse(&["archive", "search", "keyword", "设备"]);
        assert_eq!(
            args.command,
            Command::Search(SearchCommand::Keyword {
                keyword: "设备".to_string(),
                limit: 20
            })
        );
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(CliArgs::try_parse_from(["archive"]).is_err());
        assert!(CliArgs::try_parse_from(["archive", "contracts", "show", "abc"]).is_err());
    }

    #[test]
    fn test_flag_wins_over_config() {
        let args = parse(&["archive", "-c", "/tmp/a.toml", "-u", "http://flag/api", "-l", "warn", "health"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/a.toml"));
        assert_eq!(args.resolve_base_url("http://config/api"), "http://flag/api");
        assert_eq!(args.resolve_log_level("debug"), "warn");
    }

    #[test]
    fn test_explicit_config_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[chat\nhistory_page_size = ").unwrap();
        let path = broken.to_str().unwrap();

        let args = parse(&["archive", "-c", path, "health"]);
        let err = args.load_config(&args.resolve_config_path()).unwrap_err();
        assert!(matches!(err, archive_core::ArchiveError::Config(_)));
        assert!(!err.user_message().contains("history_page_size"));

        let args = parse(&["archive", "-c", "/nonexistent/archive.toml", "health"]);
        assert!(args.load_config(&args.resolve_config_path()).is_err());
    }

    #[test]
    fn test_default_config_location_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("config.toml");
        std::fs::write(&broken, "not = [valid").unwrap();

        let args = parse(&["archive", "health"]);
        let config = args.load_config(&broken).unwrap();
        assert_eq!(config.chat.history_page_size, 20);
        let config = args.load_config(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.polling.ocr_interval_secs, 3);
    }

    #[test]
    fn test_log_level_falls_back() {
        let args = parse(&["archive", "health"]);
        assert_eq!(args.resolve_log_level("debug"), "debug");
        assert_eq!(args.resolve_log_level(""), "info");
    }
}
