use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Backend primary key of a contract.
pub type ContractId = i64;

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned identifier grouping a sequence of question/answer turns.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Locally generated chat message identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Which screen of the conversational search is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatView {
    /// Empty start screen, no conversation yet.
    #[default]
    Welcome,
    /// A conversation is on screen.
    Chat,
}

/// User verdict on an assistant answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackValue {
    Helpful,
    NotHelpful,
}

impl FeedbackValue {
    /// Parse the backend spelling (`helpful` / `not_helpful`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "helpful" => Some(FeedbackValue::Helpful),
            "not_helpful" => Some(FeedbackValue::NotHelpful),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackValue::Helpful => "helpful",
            FeedbackValue::NotHelpful => "not_helpful",
        }
    }
}

/// Backend-reported stage of a document processing step (OCR, content,
/// vectorisation, search index sync).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status string this client does not know.
    #[serde(other)]
    Unknown,
}

impl ProcessingStatus {
    /// Whether processing has stopped, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Search results
// =============================================================================

/// One matched content chunk returned by the search backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Chunk primary key, when the backend reports it.
    pub chunk_id: Option<i64>,
    /// Position of the chunk inside its document.
    pub chunk_index: i64,
    /// Raw chunk text.
    pub content_text: String,
    /// Highlighted text, may contain inline `<em>` markup. Empty if absent.
    pub highlighted_text: String,
    pub chunk_type: String,
    pub chunk_size: i64,
    /// Backend relevance score. Unbounded, higher is more relevant.
    pub relevance_score: f64,
    pub contract_id: Option<ContractId>,
    pub contract_number: String,
    pub contract_name: String,
    pub file_name: String,
    pub file_format: String,
    pub upload_time: String,
    pub contract_type: Option<String>,
}

impl SearchHit {
    /// Text to display: highlighted text when present, raw content otherwise.
    pub fn display_text(&self) -> &str {
        if self.highlighted_text.trim().is_empty() {
            &self.content_text
        } else {
            &self.highlighted_text
        }
    }
}

/// Search hits sharing a source file, with their summed relevance.
///
/// Derived view: built once from a hit list and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentGroup {
    pub file_name: String,
    pub contract_id: Option<ContractId>,
    pub contract_name: String,
    pub contract_number: String,
    pub file_format: String,
    pub upload_time: String,
    pub contract_type: Option<String>,
    /// Member hits in the order they were received.
    pub hits: Vec<SearchHit>,
    /// Sum of member relevance scores.
    pub total_relevance: f64,
}

impl DocumentGroup {
    /// Start an empty group seeded with the metadata of `hit`.
    pub fn seeded_from(hit: &SearchHit) -> Self {
        Self {
            file_name: hit.file_name.clone(),
            contract_id: hit.contract_id,
            contract_name: hit.contract_name.clone(),
            contract_number: hit.contract_number.clone(),
            file_format: hit.file_format.clone(),
            upload_time: hit.upload_time.clone(),
            contract_type: hit.contract_type.clone(),
            hits: Vec::new(),
            total_relevance: 0.0,
        }
    }
}

// =============================================================================
// Chat messages
// =============================================================================

/// One entry of the conversation log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Backend record id of the question/answer turn, needed for feedback.
    pub remote_id: Option<i64>,
    pub search_hits: Option<Vec<SearchHit>>,
    pub document_groups: Option<Vec<DocumentGroup>>,
}

impl ChatMessage {
    /// A user question stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: ChatRole::User,
            text: text.into(),
            timestamp: Utc::now(),
            remote_id: None,
            search_hits: None,
            document_groups: None,
        }
    }

    /// An assistant answer without search results.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            ..Self::user(text)
        }
    }

    /// Attach search hits and their document groups.
    pub fn with_results(mut self, hits: Vec<SearchHit>, groups: Vec<DocumentGroup>) -> Self {
        self.search_hits = Some(hits);
        self.document_groups = Some(groups);
        self
    }

    pub fn with_remote_id(mut self, remote_id: Option<i64>) -> Self {
        self.remote_id = remote_id;
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }
}

/// Summary row of a past session, as listed by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub title: Option<String>,
    pub first_message: String,
    pub created_at: Option<String>,
    pub message_count: u32,
}
