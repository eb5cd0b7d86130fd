//! Backend operations grouped by concern.
//!
//! [`HttpClient`](crate::HttpClient) implements all three traits; the chat
//! engine only depends on [`QaApi`], which keeps it testable with in-memory
//! doubles.

use std::path::Path;

use archive_core::{ContractId, FeedbackValue};
use async_trait::async_trait;

use crate::error::ClientError;
use crate::wire::{
    AskRequest, ContractPage, ContractRecord, HealthReport, HtmlContent, NaturalSearchRequest,
    OcrProcessReceipt, OcrStatusReport, QaRecord, SearchPage, SessionHistory, SessionPage,
    UploadReceipt,
};

/// Question answering and session history.
#[async_trait]
pub trait QaApi: Send + Sync {
    /// Ask a question, optionally continuing an existing session.
    async fn ask(&self, request: &AskRequest) -> Result<QaRecord, ClientError>;

    /// One page of past sessions, newest first. Pages start at 1.
    async fn list_sessions(&self, page: u32, page_size: u32) -> Result<SessionPage, ClientError>;

    /// Every stored turn of a session in creation order.
    async fn session_history(&self, session_id: &str) -> Result<SessionHistory, ClientError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError>;

    /// Record a verdict on one stored turn.
    async fn submit_feedback(
        &self,
        session_id: &str,
        message_id: i64,
        feedback: FeedbackValue,
    ) -> Result<(), ClientError>;
}

/// Contract documents and their processing state.
#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn health(&self) -> Result<HealthReport, ClientError>;

    async fn list_contracts(&self, page: u32, page_size: u32)
        -> Result<ContractPage, ClientError>;

    async fn get_contract(&self, id: ContractId) -> Result<ContractRecord, ClientError>;

    /// Upload a file; the backend starts OCR on its own.
    async fn upload_contract(
        &self,
        path: &Path,
        contract_type: Option<&str>,
    ) -> Result<UploadReceipt, ClientError>;

    async fn ocr_status(&self, id: ContractId) -> Result<OcrStatusReport, ClientError>;

    /// Manually (re)start OCR for a contract.
    async fn process_ocr(&self, id: ContractId) -> Result<OcrProcessReceipt, ClientError>;

    async fn delete_contract(&self, id: ContractId) -> Result<(), ClientError>;

    /// Rendered HTML of the extracted text. Only available once OCR completed.
    async fn html_content(&self, id: ContractId) -> Result<HtmlContent, ClientError>;

    /// Original uploaded file bytes.
    async fn download_contract(&self, id: ContractId) -> Result<Vec<u8>, ClientError>;
}

/// Document-level keyword and natural-language search.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn natural_search(
        &self,
        request: &NaturalSearchRequest,
    ) -> Result<SearchPage, ClientError>;

    async fn keyword_search(&self, keyword: &str, limit: u32) -> Result<SearchPage, ClientError>;
}
