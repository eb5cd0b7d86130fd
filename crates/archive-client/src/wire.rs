//! Request and response bodies of the archive backend.
//!
//! Every response struct is `#[serde(default)]`: the backend omits fields
//! freely and the client treats absent data as empty rather than failing.
//! The embedded search payload is decoded leniently on top of that, see
//! [`EsResults`].

use archive_core::{
    ContractId, FeedbackValue, ProcessingStatus, SearchHit, SessionId, SessionSummary,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

// =============================================================================
// Q&A
// =============================================================================

/// Body of `POST /qa/ask`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// One stored question/answer turn. Returned by `/qa/ask` and as the
/// elements of a session history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QaRecord {
    pub id: Option<i64>,
    pub session_id: Option<String>,
    pub session_title: Option<String>,
    pub message_order: Option<i64>,
    pub question: Option<String>,
    pub answer: Option<String>,
    #[serde(deserialize_with = "lenient_es_results")]
    pub elasticsearch_results: EsResults,
    pub search_method: Option<String>,
    pub response_time: Option<f64>,
    pub user_feedback: Option<String>,
    pub created_at: Option<String>,
}

/// Page of `GET /qa/sessions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionPage {
    pub sessions: Vec<SessionRow>,
    pub total: u64,
}

/// One row of the session list. The backend has shipped two spellings of
/// the preview and time fields; both are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionRow {
    pub session_id: String,
    pub session_title: Option<String>,
    #[serde(alias = "first_question")]
    pub first_message: Option<String>,
    #[serde(alias = "last_message_time")]
    pub created_at: Option<String>,
    pub message_count: u32,
}

impl From<SessionRow> for SessionSummary {
    fn from(row: SessionRow) -> Self {
        SessionSummary {
            session_id: SessionId::new(row.session_id),
            title: row.session_title.filter(|t| !t.trim().is_empty()),
            first_message: row.first_message.unwrap_or_default(),
            created_at: row.created_at,
            message_count: row.message_count,
        }
    }
}

/// Body of `GET /qa/sessions/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionHistory {
    pub session_id: String,
    pub session_title: Option<String>,
    pub messages: Vec<QaRecord>,
    pub total_messages: u64,
}

/// Body of `POST /qa/sessions/{id}/messages/{message_id}/feedback`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRequest {
    pub feedback: FeedbackValue,
}

// =============================================================================
// Embedded search payload
// =============================================================================

/// Raw search-engine response embedded in Q&A records.
///
/// Shape: `{ hits: { hits: [ { _source, _score, highlight } ] } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsResults {
    pub hits: EsHitList,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsHitList {
    pub hits: Vec<EsHit>,
    pub max_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsHit {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "_source")]
    pub source: EsSource,
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    pub highlight: Option<EsHighlight>,
}

/// Indexed chunk document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsSource {
    #[serde(alias = "chunkId")]
    pub chunk_id: Option<i64>,
    #[serde(alias = "chunkIndex")]
    pub chunk_index: Option<i64>,
    #[serde(alias = "contentText")]
    pub content_text: Option<String>,
    #[serde(alias = "chunkType")]
    pub chunk_type: Option<String>,
    #[serde(alias = "chunkSize")]
    pub chunk_size: Option<i64>,
    #[serde(alias = "contractId")]
    pub contract_id: Option<ContractId>,
    #[serde(alias = "contractNumber")]
    pub contract_number: Option<String>,
    #[serde(alias = "contractName")]
    pub contract_name: Option<String>,
    #[serde(alias = "fileName")]
    pub file_name: Option<String>,
    #[serde(alias = "fileFormat")]
    pub file_format: Option<String>,
    #[serde(alias = "uploadTime")]
    pub upload_time: Option<String>,
    #[serde(alias = "contractType")]
    pub contract_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsHighlight {
    #[serde(alias = "contentText")]
    pub content_text: Option<Fragments>,
}

/// Highlight text, either a single string or the search engine's list of
/// fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragments {
    One(String),
    Many(Vec<String>),
}

impl Fragments {
    /// Fragments joined into one display string.
    pub fn joined(&self) -> String {
        match self {
            Fragments::One(s) => s.clone(),
            Fragments::Many(parts) => parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ... "),
        }
    }
}

impl EsHit {
    /// Flatten into the client-side hit shape.
    pub fn to_hit(&self) -> SearchHit {
        let src = &self.source;
        let highlighted_text = self
            .highlight
            .as_ref()
            .and_then(|h| h.content_text.as_ref())
            .map(Fragments::joined)
            .unwrap_or_default();
        SearchHit {
            chunk_id: src.chunk_id,
            chunk_index: src.chunk_index.unwrap_or_default(),
            content_text: src.content_text.clone().unwrap_or_default(),
            highlighted_text,
            chunk_type: src.chunk_type.clone().unwrap_or_default(),
            chunk_size: src.chunk_size.unwrap_or_default(),
            relevance_score: self.score.unwrap_or(0.0),
            contract_id: src.contract_id,
            contract_number: src.contract_number.clone().unwrap_or_default(),
            contract_name: src.contract_name.clone().unwrap_or_default(),
            file_name: src.file_name.clone().unwrap_or_default(),
            file_format: src.file_format.clone().unwrap_or_default(),
            upload_time: src.upload_time.clone().unwrap_or_default(),
            contract_type: src.contract_type.clone(),
        }
    }
}

impl EsResults {
    /// All hits in backend order.
    pub fn to_hits(&self) -> Vec<SearchHit> {
        self.hits.hits.iter().map(EsHit::to_hit).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.hits.is_empty()
    }
}

/// Decode the search payload, degrading to an empty result set when the
/// payload is null or structurally wrong.
fn lenient_es_results<'de, D>(deserializer: D) -> Result<EsResults, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => EsResults::default(),
        Some(raw) => serde_json::from_value(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Malformed search results payload, treating as empty");
            EsResults::default()
        }),
    })
}

/// Status fields arrive as `null` for documents the backend never touched.
fn nullable_status<'de, D>(deserializer: D) -> Result<ProcessingStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ProcessingStatus>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Contracts
// =============================================================================

/// Contract metadata row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractRecord {
    pub id: ContractId,
    pub contract_number: String,
    pub contract_name: String,
    pub contract_type: Option<String>,
    pub file_name: String,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
    pub file_format: Option<String>,
    pub upload_time: Option<String>,
    #[serde(deserialize_with = "nullable_status")]
    pub ocr_status: ProcessingStatus,
    #[serde(deserialize_with = "nullable_status")]
    pub content_status: ProcessingStatus,
    #[serde(deserialize_with = "nullable_status")]
    pub vector_status: ProcessingStatus,
    #[serde(deserialize_with = "nullable_status")]
    pub elasticsearch_sync_status: ProcessingStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Page of `GET /v1/contracts/`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub contracts: Vec<ContractRecord>,
}

/// Body of `GET /v1/contracts/{id}/ocr-status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrStatusReport {
    pub contract_id: ContractId,
    #[serde(deserialize_with = "nullable_status")]
    pub ocr_status: ProcessingStatus,
    #[serde(deserialize_with = "nullable_status")]
    pub content_status: ProcessingStatus,
    #[serde(deserialize_with = "nullable_status")]
    pub vector_status: ProcessingStatus,
    pub html_content_path: Option<String>,
    pub text_content_path: Option<String>,
    /// Backend error text of a failed OCR run.
    pub ocr_error: Option<String>,
}

/// Body of `POST /v1/contracts/{id}/process-ocr`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OcrProcessReceipt {
    pub contract_id: ContractId,
    #[serde(deserialize_with = "nullable_status")]
    pub ocr_status: ProcessingStatus,
}

/// Body of `POST /v1/contracts/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadReceipt {
    pub contract_id: ContractId,
    pub contract_number: String,
    pub file_name: String,
    pub file_size: u64,
    pub upload_time: Option<String>,
    #[serde(deserialize_with = "nullable_status")]
    pub ocr_status: ProcessingStatus,
}

/// Body of `GET /v1/contracts/{id}/html-content`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HtmlContent {
    pub html_content: String,
    pub content_type: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: Option<String>,
    pub version: Option<String>,
    pub database: Option<String>,
}

// =============================================================================
// Document search
// =============================================================================

/// Optional filters of a natural-language search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(String, String)>,
}

/// Body of `POST /search/natural`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NaturalSearchRequest {
    pub query: String,
    pub limit: u32,
    #[serde(flatten)]
    pub filters: SearchFilters,
}

/// Document identifiers arrive as numbers or strings depending on the index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(i64),
    Text(String),
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        Some(IdRepr::Number(n)) => n.to_string(),
        Some(IdRepr::Text(s)) => s,
        None => String::new(),
    })
}

/// One document returned by keyword or natural-language search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchDocument {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(alias = "contract_name")]
    pub title: String,
    pub file_name: Option<String>,
    #[serde(alias = "content")]
    pub content_summary: Option<String>,
    #[serde(alias = "score")]
    pub similarity: Option<f64>,
    pub highlights: Vec<String>,
    #[serde(alias = "upload_time")]
    pub upload_date: Option<String>,
}

/// Body of both search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    pub documents: Vec<SearchDocument>,
    pub total: u64,
    pub query: String,
    pub search_time: f64,
}
