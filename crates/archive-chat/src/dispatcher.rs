//! Query dispatcher: one question in, one answer out.
//!
//! Sends the question with the current session identifier and hands back
//! the answer, the (possibly new) session identifier and the embedded
//! search payload. Single attempt, no retry; it never touches the store.

use std::sync::Arc;
use std::time::Instant;

use archive_client::wire::EsResults;
use archive_client::{AskRequest, ClientError, QaApi, QaRecord};
use archive_core::{SearchHit, SessionId};
use tracing::{debug, info};

/// A question accepted for sending, with the state it was asked in.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAsk {
    pub question: String,
    /// Session the question belongs to; `None` for a new conversation.
    pub session_id: Option<SessionId>,
    /// Store generation at the time the question was accepted.
    pub generation: u64,
}

/// Decoded answer of the Q&A endpoint.
#[derive(Debug, Clone, Default)]
pub struct DispatchReply {
    pub answer: String,
    pub session_id: Option<SessionId>,
    /// Backend record id, the key for later feedback.
    pub remote_message_id: Option<i64>,
    pub results: EsResults,
}

impl DispatchReply {
    pub fn hits(&self) -> Vec<SearchHit> {
        self.results.to_hits()
    }
}

impl From<QaRecord> for DispatchReply {
    fn from(record: QaRecord) -> Self {
        Self {
            answer: record.answer.unwrap_or_default(),
            session_id: record
                .session_id
                .filter(|s| !s.trim().is_empty())
                .map(SessionId::new),
            remote_message_id: record.id,
            results: record.elasticsearch_results,
        }
    }
}

/// Sends questions to the Q&A endpoint.
#[derive(Clone)]
pub struct QueryDispatcher {
    api: Arc<dyn QaApi>,
}

impl QueryDispatcher {
    pub fn new(api: Arc<dyn QaApi>) -> Self {
        Self { api }
    }

    pub async fn dispatch(&self, pending: &PendingAsk) -> Result<DispatchReply, ClientError> {
        let request = AskRequest {
            question: pending.question.clone(),
            session_id: pending.session_id.as_ref().map(|s| s.as_str().to_string()),
        };
        debug!(
            session_id = ?request.session_id,
            chars = request.question.chars().count(),
            "Dispatching question"
        );

        let started = Instant::now();
        let reply = DispatchReply::from(self.api.ask(&request).await?);
        info!(
            session_id = ?reply.session_id,
            hits = reply.results.hits.hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Question answered"
        );
        Ok(reply)
    }
}
