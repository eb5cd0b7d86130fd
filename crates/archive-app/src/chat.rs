//! Interactive chat loop over stdin.

use std::sync::Arc;

use archive_chat::{AskOutcome, ChatError, ChatOrchestrator};
use archive_client::QaApi;
use archive_core::config::ChatConfig;
use archive_core::{ChatView, FeedbackValue, SessionId, SessionSummary};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::render;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Ask(String),
    New,
    History(u32),
    Open(String),
    Delete(String),
    Vote(usize, FeedbackValue),
    Doc(usize),
    Hit(usize),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub fn parse_line(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    let number = || arg.and_then(|a| a.parse::<usize>().ok()).filter(|n| *n > 0);

    match (name, arg) {
        ("new", _) => ChatCommand::New,
        ("history", None) => ChatCommand::History(1),
        ("history", Some(p)) => match p.parse::<u32>() {
            Ok(page) if page > 0 => ChatCommand::History(page),
            _ => ChatCommand::Invalid("usage: /history [page]".to_string()),
        },
        ("open", Some(id)) => ChatCommand::Open(id.to_string()),
        ("delete", Some(id)) => ChatCommand::Delete(id.to_string()),
        ("good", _) => number()
            .map(|n| ChatCommand::Vote(n, FeedbackValue::Helpful))
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /good <n>".to_string())),
        ("bad", _) => number()
            .map(|n| ChatCommand::Vote(n, FeedbackValue::NotHelpful))
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /bad <n>".to_string())),
        ("doc", _) => number()
            .map(ChatCommand::Doc)
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /doc <n>".to_string())),
        ("hit", _) => number()
            .map(ChatCommand::Hit)
            .unwrap_or_else(|| ChatCommand::Invalid("usage: /hit <n>".to_string())),
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        ("open", None) | ("delete", None) => {
            ChatCommand::Invalid(format!("usage: /{} <n|session id>", name))
        }
        _ => ChatCommand::Invalid(format!("unknown command /{}, try /help", name)),
    }
}

/// A listing number from the last `/history` output, or a raw session id.
fn resolve_session(arg: &str, listed: &[SessionSummary]) -> SessionId {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| listed.get(i))
        .map(|s| s.session_id.clone())
        .unwrap_or_else(|| SessionId::from(arg))
}

struct ChatLoop {
    orchestrator: ChatOrchestrator,
    /// Sessions of the most recent history fetch.
    listed: Vec<SessionSummary>,
}

impl ChatLoop {
    async fn refresh_history(&mut self, page: u32) -> Result<(), ChatError> {
        let result = self.orchestrator.list_history(page).await?;
        debug!(sessions = result.sessions.len(), total = result.total, "History refreshed");
        self.listed = result.sessions;
        Ok(())
    }

    /// Refresh after a send or delete. Failures only cost the listing.
    async fn refresh_quietly(&mut self) {
        if let Err(e) = self.refresh_history(1).await {
            warn!(error = %e, "History refresh failed");
        }
    }

    /// Handle one command; returns false when the loop should end.
    async fn handle(&mut self, command: ChatCommand) -> Result<bool, ChatError> {
        match command {
            ChatCommand::Empty => {}
            ChatCommand::Quit => return Ok(false),
            ChatCommand::Help => println!("{}", render::help()),
            ChatCommand::Invalid(usage) => println!("{}", usage),
            ChatCommand::Ask(question) => {
                self.orchestrator.set_input(question.clone());
                let outcome = self.orchestrator.ask(&question).await?;
                let store = self.orchestrator.store();
                match outcome {
                    AskOutcome::Answered(id) | AskOutcome::Fallback(id) => {
                        if let Some(m) = store.message(&id) {
                            print!("{}", render::message(m, None));
                        }
                    }
                    AskOutcome::Discarded => {}
                }
                self.refresh_quietly().await;
            }
            ChatCommand::New => {
                self.orchestrator.new_conversation();
                println!("{}", render::welcome());
            }
            ChatCommand::History(page) => {
                let result = self.orchestrator.list_history(page).await?;
                print!("{}", render::sessions(&result));
                self.listed = result.sessions;
            }
            ChatCommand::Open(arg) => {
                let session_id = resolve_session(&arg, &self.listed);
                self.orchestrator.open_session(&session_id).await?;
                let store = self.orchestrator.store();
                for m in store.messages() {
                    print!("{}", render::message(m, store.feedback(&m.id)));
                }
            }
            ChatCommand::Delete(arg) => {
                let session_id = resolve_session(&arg, &self.listed);
                self.orchestrator.delete_session(&session_id).await?;
                println!("Deleted session {}.", session_id);
                if self.orchestrator.store().view() == ChatView::Welcome {
                    println!("{}", render::welcome());
                }
                self.refresh_quietly().await;
            }
            ChatCommand::Vote(n, value) => {
                let id = self
                    .orchestrator
                    .store()
                    .messages()
                    .iter()
                    .filter(|m| m.is_assistant())
                    .nth(n - 1)
                    .map(|m| m.id.clone());
                match id {
                    Some(id) => {
                        self.orchestrator.submit_feedback(&id, value).await?;
                        println!("Thanks for the feedback.");
                    }
                    None => println!("There is no answer {}.", n),
                }
            }
            ChatCommand::Doc(n) => {
                let group = self
                    .orchestrator
                    .store()
                    .last_answer()
                    .and_then(|m| m.document_groups.as_ref())
                    .and_then(|groups| groups.get(n - 1))
                    .cloned();
                match group {
                    Some(group) => {
                        self.orchestrator.select_document(Some(group));
                        self.print_selected();
                    }
                    None => println!("The last answer has no document {}.", n),
                }
            }
            ChatCommand::Hit(n) => {
                if self.orchestrator.highlight_hit(n - 1) {
                    self.print_selected();
                } else {
                    println!("No hit {} in the shown document.", n);
                }
            }
        }
        Ok(true)
    }

    fn print_selected(&self) {
        let store = self.orchestrator.store();
        if let Some(doc) = store.selected_document() {
            print!("{}", render::document(doc, store.current_highlight()));
        }
    }
}

/// Run the interactive loop until `/quit` or end of input.
pub async fn run(api: Arc<dyn QaApi>, config: ChatConfig) -> Result<(), AppError> {
    let mut chat = ChatLoop {
        orchestrator: ChatOrchestrator::new(api, config),
        listed: Vec::new(),
    };
    println!("{}", render::welcome());

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match chat.handle(parse_line(&line)).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                debug!(error = %e, "Chat command failed");
                println!("{}", e.user_message());
            }
        }
    }
    Ok(())
}
