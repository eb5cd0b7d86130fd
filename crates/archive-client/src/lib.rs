//! REST client for the contract archive backend.
//!
//! Covers question answering and session history, contract upload and OCR
//! status, document search, and the response envelope all of these share.

pub mod api;
pub mod envelope;
pub mod error;
pub mod http;
pub mod poller;
pub mod wire;

pub use api::{ContractApi, QaApi, SearchApi};
pub use envelope::ApiEnvelope;
pub use error::ClientError;
pub use http::HttpClient;
pub use poller::OcrStatusPoller;
pub use wire::{
    AskRequest, ContractPage, ContractRecord, EsHit, EsResults, HealthReport, HtmlContent,
    NaturalSearchRequest, OcrProcessReceipt, OcrStatusReport, QaRecord, SearchDocument,
    SearchFilters, SearchPage, SessionHistory, SessionPage, SessionRow, UploadReceipt,
};
