//! One-shot commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use archive_chat::{AskOutcome, ChatOrchestrator, HistoryManager};
use archive_client::{
    ContractApi, HttpClient, NaturalSearchRequest, OcrStatusPoller, QaApi, SearchApi,
    SearchFilters,
};
use archive_core::{ArchiveConfig, ContractId, MessageId, SessionId};
use tracing::info;

use crate::cli::{ContractsCommand, SearchCommand, SessionsCommand};
use crate::error::AppError;
use crate::render;

pub async fn ask(
    client: &HttpClient,
    config: &ArchiveConfig,
    question: &str,
    session: Option<String>,
) -> Result<(), AppError> {
    let api: Arc<dyn QaApi> = Arc::new(client.clone());
    let mut orchestrator = ChatOrchestrator::new(api, config.chat.clone());
    if let Some(session) = session {
        orchestrator.open_session(&SessionId::new(session)).await?;
    }

    match orchestrator.ask(question).await? {
        AskOutcome::Answered(id) | AskOutcome::Fallback(id) => {
            let store = orchestrator.store();
            if let Some(message) = store.message(&id) {
                print!("{}", render::message(message, None));
            }
            if let Some(session_id) = store.session_id() {
                println!("session: {}", session_id);
            }
        }
        AskOutcome::Discarded => {}
    }
    Ok(())
}

pub async fn sessions(
    client: &HttpClient,
    config: &ArchiveConfig,
    command: SessionsCommand,
) -> Result<(), AppError> {
    let history = HistoryManager::new(Arc::new(client.clone()));
    match command {
        SessionsCommand::List { page } => {
            let page = history.list(page, config.chat.history_page_size).await?;
            print!("{}", render::sessions(&page));
        }
        SessionsCommand::Show { session } => {
            let loaded = history.load_session(&SessionId::new(session)).await?;
            if let Some(ref title) = loaded.title {
                println!("# {}", title);
            }
            let feedback = |id: &MessageId| {
                loaded
                    .feedback
                    .iter()
                    .find(|(rated, _)| rated == id)
                    .map(|(_, value)| *value)
            };
            for message in &loaded.messages {
                print!("{}", render::message(message, feedback(&message.id)));
            }
        }
        SessionsCommand::Delete { session } => {
            history.delete_session(&SessionId::new(session.clone())).await?;
            println!("Deleted session {}.", session);
        }
    }
    Ok(())
}

pub async fn contracts(
    client: &HttpClient,
    config: &ArchiveConfig,
    command: ContractsCommand,
) -> Result<(), AppError> {
    match command {
        ContractsCommand::List { page, page_size } => {
            let page = client.list_contracts(page.max(1), page_size).await?;
            print!("{}", render::contracts(&page));
        }
        ContractsCommand::Show { id } => {
            let contract = client.get_contract(id).await?;
            print!("{}", render::contract(&contract));
        }
        ContractsCommand::Upload {
            path,
            contract_type,
            watch,
        } => {
            let receipt = client
                .upload_contract(&path, contract_type.as_deref())
                .await?;
            println!(
                "Uploaded {} as contract #{} ({}), ocr: {}",
                receipt.file_name, receipt.contract_id, receipt.contract_number, receipt.ocr_status
            );
            if watch {
                watch_ocr(client, config, receipt.contract_id).await?;
            }
        }
        ContractsCommand::Ocr { id, start } => {
            if start {
                let receipt = client.process_ocr(id).await?;
                println!("OCR started, status: {}", receipt.ocr_status);
            }
            let report = client.ocr_status(id).await?;
            print!("{}", render::ocr_status(&report));
        }
        ContractsCommand::Watch { id } => watch_ocr(client, config, id).await?,
        ContractsCommand::Html { id, output } => {
            let content = client.html_content(id).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, content.html_content.as_bytes()).await?;
                    println!("Saved HTML to {}.", path.display());
                }
                None => println!("{}", content.html_content),
            }
        }
        ContractsCommand::Download { id, output } => {
            let path = match output {
                Some(path) => path,
                None => default_download_path(client, id).await?,
            };
            let bytes = client.download_contract(id).await?;
            tokio::fs::write(&path, &bytes).await?;
            info!(contract_id = id, bytes = bytes.len(), path = %path.display(), "Contract downloaded");
            println!("Saved {} bytes to {}.", bytes.len(), path.display());
        }
        ContractsCommand::Delete { id } => {
            client.delete_contract(id).await?;
            println!("Deleted contract #{}.", id);
        }
    }
    Ok(())
}

async fn watch_ocr(
    client: &HttpClient,
    config: &ArchiveConfig,
    id: ContractId,
) -> Result<(), AppError> {
    let poller = OcrStatusPoller::from_config(&config.polling);
    let mut last = None;
    let report = poller
        .wait_for(client, id, |report| {
            if last != Some(report.ocr_status) {
                println!("ocr: {}", report.ocr_status);
                last = Some(report.ocr_status);
            }
        })
        .await?;
    print!("{}", render::ocr_status(&report));
    Ok(())
}

/// Stored file name of the contract, or `contract-<id>` when unknown.
async fn default_download_path(client: &HttpClient, id: ContractId) -> Result<PathBuf, AppError> {
    let contract = client.get_contract(id).await?;
    Ok(download_name(&contract.file_name, id))
}

fn download_name(file_name: &str, id: ContractId) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("contract-{}", id)))
}

pub async fn search(client: &HttpClient, command: SearchCommand) -> Result<(), AppError> {
    let page = match command {
        SearchCommand::Natural {
            query,
            limit,
            contract_type,
        } => {
            let request = NaturalSearchRequest {
                query,
                limit,
                filters: SearchFilters {
                    contract_type,
                    date_range: None,
                },
            };
            client.natural_search(&request).await?
        }
        SearchCommand::Keyword { keyword, limit } => client.keyword_search(&keyword, limit).await?,
    };
    print!("{}", render::search(&page));
    Ok(())
}

pub async fn health(client: &HttpClient) -> Result<(), AppError> {
    let report = client.health().await?;
    println!(
        "{} ({}) status: {}, database: {}",
        client.base_url(),
        report.version.as_deref().unwrap_or("unknown version"),
        report.status,
        report.database.as_deref().unwrap_or("-")
    );
    Ok(())
}
