//! In-memory `QaApi` double shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use archive_client::wire::EsResults;
use archive_client::{
    AskRequest, ClientError, QaApi, QaRecord, SessionHistory, SessionPage, SessionRow,
};
use archive_core::FeedbackValue;
use async_trait::async_trait;
use serde_json::json;

/// Scripted backend. Answers queue up in `replies`; unscripted asks fail
/// with a transport error.
#[derive(Default)]
pub struct MockQa {
    pub replies: Mutex<VecDeque<Result<QaRecord, ClientError>>>,
    pub asks: Mutex<Vec<AskRequest>>,
    pub histories: Mutex<HashMap<String, SessionHistory>>,
    pub pages: Mutex<Vec<(u32, u32)>>,
    pub deleted: Mutex<Vec<String>>,
    pub feedback: Mutex<Vec<(String, i64, FeedbackValue)>>,
    pub fail_feedback: Mutex<bool>,
}

impl MockQa {
    pub fn reply(&self, reply: Result<QaRecord, ClientError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn add_history(&self, history: SessionHistory) {
        self.histories
            .lock()
            .unwrap()
            .insert(history.session_id.clone(), history);
    }

    pub fn asks(&self) -> Vec<AskRequest> {
        self.asks.lock().unwrap().clone()
    }
}

#[async_trait]
impl QaApi for MockQa {
    async fn ask(&self, request: &AskRequest) -> Result<QaRecord, ClientError> {
        self.asks.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("connection refused".to_string())))
    }

    async fn list_sessions(&self, page: u32, page_size: u32) -> Result<SessionPage, ClientError> {
        self.pages.lock().unwrap().push((page, page_size));
        let rows = self
            .histories
            .lock()
            .unwrap()
            .values()
            .map(|h| {
                serde_json::from_value::<SessionRow>(json!({
                    "session_id": h.session_id,
                    "session_title": h.session_title,
                    "message_count": h.messages.len(),
                }))
                .unwrap()
            })
            .collect::<Vec<_>>();
        Ok(SessionPage {
            total: rows.len() as u64,
            sessions: rows,
        })
    }

    async fn session_history(&self, session_id: &str) -> Result<SessionHistory, ClientError> {
        self.histories
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: "会话不存在".to_string(),
            })
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        if self.histories.lock().unwrap().remove(session_id).is_none() {
            return Err(ClientError::Status {
                status: 404,
                message: "会话不存在".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(session_id.to_string());
        Ok(())
    }

    async fn submit_feedback(
        &self,
        session_id: &str,
        message_id: i64,
        feedback: FeedbackValue,
    ) -> Result<(), ClientError> {
        if *self.fail_feedback.lock().unwrap() {
            return Err(ClientError::Transport("reset".to_string()));
        }
        self.feedback
            .lock()
            .unwrap()
            .push((session_id.to_string(), message_id, feedback));
        Ok(())
    }
}

/// A backend Q&A record with one hit per `(file, score)` pair.
pub fn record(id: i64, session: &str, answer: &str, hits: &[(&str, f64)]) -> QaRecord {
    let hits: Vec<_> = hits
        .iter()
        .map(|(file, score)| {
            json!({"_source": {"file_name": file, "contract_name": "X"}, "_score": score})
        })
        .collect();
    let results: EsResults = serde_json::from_value(json!({"hits": {"hits": hits}})).unwrap();
    QaRecord {
        id: Some(id),
        session_id: Some(session.to_string()),
        answer: Some(answer.to_string()),
        elasticsearch_results: results,
        ..Default::default()
    }
}
