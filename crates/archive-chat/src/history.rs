//! History manager: past sessions as stored by the backend.
//!
//! Nothing is cached; every call reads the backend. Loaded sessions are
//! rebuilt into chat messages with their document groups recomputed from
//! the stored search payload.

use std::sync::Arc;

use archive_client::{ClientError, QaApi, QaRecord, SessionHistory};
use archive_core::{ChatMessage, FeedbackValue, MessageId, SessionId, SessionSummary};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::grouping::group_hits;

/// One page of session summaries.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub sessions: Vec<SessionSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// A past session rebuilt for display.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub session_id: SessionId,
    pub title: Option<String>,
    /// Messages in creation order.
    pub messages: Vec<ChatMessage>,
    /// Votes the backend already holds, keyed by the rebuilt message ids.
    pub feedback: Vec<(MessageId, FeedbackValue)>,
}

/// Lists, loads and deletes past sessions.
#[derive(Clone)]
pub struct HistoryManager {
    api: Arc<dyn QaApi>,
}

impl HistoryManager {
    pub fn new(api: Arc<dyn QaApi>) -> Self {
        Self { api }
    }

    /// One page of sessions, newest first. Page numbers start at 1.
    pub async fn list(&self, page: u32, page_size: u32) -> Result<HistoryPage, ClientError> {
        let page = page.max(1);
        let result = self.api.list_sessions(page, page_size).await?;
        debug!(page, page_size, total = result.total, "Session page fetched");
        Ok(HistoryPage {
            sessions: result.sessions.into_iter().map(SessionSummary::from).collect(),
            total: result.total,
            page,
            page_size,
        })
    }

    pub async fn load_session(&self, session_id: &SessionId) -> Result<LoadedSession, ClientError> {
        let history = self.api.session_history(session_id.as_str()).await?;
        let loaded = rebuild_session(session_id, history);
        info!(
            session_id = %loaded.session_id,
            messages = loaded.messages.len(),
            "Session loaded"
        );
        Ok(loaded)
    }

    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), ClientError> {
        self.api.delete_session(session_id.as_str()).await
    }
}

/// Turn stored Q&A records into chat messages.
///
/// Each record yields a user message for a non-blank question and an
/// assistant message for a non-blank answer, in record order.
pub fn rebuild_session(requested: &SessionId, history: SessionHistory) -> LoadedSession {
    let session_id = if history.session_id.trim().is_empty() {
        requested.clone()
    } else {
        SessionId::new(history.session_id)
    };

    let mut messages = Vec::with_capacity(history.messages.len() * 2);
    let mut feedback = Vec::new();

    for (position, record) in history.messages.into_iter().enumerate() {
        let key = record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("p{}", position));
        let timestamp = parse_timestamp(record.created_at.as_deref());

        if let Some(question) = non_blank(record.question.as_deref()) {
            let mut message = ChatMessage::user(question);
            message.id = MessageId::new(format!("{}-q", key));
            message.timestamp = timestamp;
            messages.push(message.with_remote_id(record.id));
        }

        if let Some(answer) = rebuild_answer(&record, &key, timestamp) {
            if let Some(value) = record.user_feedback.as_deref().and_then(FeedbackValue::parse) {
                feedback.push((answer.id.clone(), value));
            }
            messages.push(answer);
        }
    }

    LoadedSession {
        session_id,
        title: history.session_title.filter(|t| !t.trim().is_empty()),
        messages,
        feedback,
    }
}

fn rebuild_answer(record: &QaRecord, key: &str, timestamp: DateTime<Utc>) -> Option<ChatMessage> {
    let answer = non_blank(record.answer.as_deref())?;
    let hits = record.elasticsearch_results.to_hits();
    let groups = group_hits(&hits);

    let mut message = ChatMessage::assistant(answer);
    message.id = MessageId::new(format!("{}-a", key));
    message.timestamp = timestamp;
    Some(
        message
            .with_remote_id(record.id)
            .with_results(hits, groups),
    )
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Backend timestamps are RFC 3339 or naive UTC (`2024-05-01T10:00:00`).
fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Utc::now();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive.and_utc();
        }
    }
    debug!(raw, "Unparsable timestamp, using current time");
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{record, MockQa};
    use archive_core::ChatRole;
    use chrono::TimeZone;

    fn turn(id: Option<i64>, question: Option<&str>, answer: Option<&str>) -> QaRecord {
        QaRecord {
            id,
            question: question.map(str::to_string),
            answer: answer.map(str::to_string),
            created_at: Some("2024-05-01T10:00:00".to_string()),
            ..Default::default()
        }
    }

    fn history(session: &str, messages: Vec<QaRecord>) -> SessionHistory {
        SessionHistory {
            session_id: session.to_string(),
            session_title: Some("合同期限".to_string()),
            total_messages: messages.len() as u64,
            messages,
        }
    }

    #[test]
    fn test_rebuild_preserves_creation_order() {
        let loaded = rebuild_session(
            &SessionId::from("s1"),
            history(
                "s1",
                vec![
                    turn(Some(1), Some("第一问"), Some("第一答")),
                    turn(Some(2), Some("第二问"), Some("第二答")),
                ],
            ),
        );

        let texts: Vec<_> = loaded.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["第一问", "第一答", "第二问", "第二答"]);
        let roles: Vec<_> = loaded.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::User, ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(loaded.messages[1].id.as_str(), "1-a");
        assert_eq!(loaded.messages[1].remote_id, Some(1));
        assert_eq!(loaded.title.as_deref(), Some("合同期限"));
    }

    #[test]
    fn test_rebuild_skips_blank_question_or_answer() {
        let loaded = rebuild_session(
            &SessionId::from("s1"),
            history(
                "s1",
                vec![
                    turn(Some(1), Some("只有问题"), None),
                    turn(Some(2), Some("  "), Some("只有回答")),
                    turn(Some(3), None, Some("")),
                ],
            ),
        );
        let texts: Vec<_> = loaded.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["只有问题", "只有回答"]);
    }

    #[test]
    fn test_rebuild_recomputes_groups() {
        let mut stored = record(5, "s1", "见文档", &[("b.pdf", 1.0), ("a.pdf", 2.0), ("b.pdf", 1.5)]);
        stored.question = Some("违约金".to_string());

        let loaded = rebuild_session(&SessionId::from("s1"), history("s1", vec![stored]));
        let answer = &loaded.messages[1];
        let groups = answer.document_groups.as_ref().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].file_name, "b.pdf");
        assert_eq!(groups[0].total_relevance, 2.5);
        assert_eq!(answer.search_hits.as_ref().unwrap().len(), 3);
        assert!(loaded.messages[0].document_groups.is_none());
    }

    #[test]
    fn test_rebuild_ids_fall_back_to_position() {
        let loaded = rebuild_session(
            &SessionId::from("s1"),
            history("s1", vec![turn(None, Some("q"), Some("a"))]),
        );
        assert_eq!(loaded.messages[0].id.as_str(), "p0-q");
        assert_eq!(loaded.messages[1].id.as_str(), "p0-a");
        assert_eq!(loaded.messages[1].remote_id, None);
    }

    #[test]
    fn test_rebuild_collects_stored_feedback() {
        let mut rated = turn(Some(7), Some("q"), Some("a"));
        rated.user_feedback = Some("not_helpful".to_string());
        let mut junk = turn(Some(8), Some("q2"), Some("a2"));
        junk.user_feedback = Some("meh".to_string());

        let loaded = rebuild_session(&SessionId::from("s1"), history("s1", vec![rated, junk]));
        assert_eq!(
            loaded.feedback,
            vec![(MessageId::new("7-a"), FeedbackValue::NotHelpful)]
        );
    }

    #[test]
    fn test_rebuild_uses_requested_id_when_missing() {
        let loaded = rebuild_session(&SessionId::from("asked"), history("", vec![]));
        assert_eq!(loaded.session_id.as_str(), "asked");
        assert!(loaded.messages.is_empty());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(Some("2024-05-01T10:00:00")), expected);
        assert_eq!(parse_timestamp(Some("2024-05-01 10:00:00")), expected);
        assert_eq!(parse_timestamp(Some("2024-05-01T12:00:00+02:00")), expected);
        assert_eq!(
            parse_timestamp(Some("2024-05-01T10:00:00.250")).timestamp(),
            expected.timestamp()
        );

        let before = Utc::now();
        assert!(parse_timestamp(Some("yesterday")) >= before);
        assert!(parse_timestamp(None) >= before);
    }

    #[tokio::test]
    async fn test_list_clamps_page_and_maps_rows() {
        let api = Arc::new(MockQa::default());
        api.add_history(history("s1", vec![turn(Some(1), Some("q"), Some("a"))]));
        let manager = HistoryManager::new(api.clone());

        let page = manager.list(0, 20).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.sessions[0].session_id.as_str(), "s1");
        assert_eq!(*api.pages.lock().unwrap(), vec![(1, 20)]);
    }

    #[tokio::test]
    async fn test_load_and_delete() {
        let api = Arc::new(MockQa::default());
        api.add_history(history("s1", vec![turn(Some(1), Some("q"), Some("a"))]));
        let manager = HistoryManager::new(api.clone());

        let loaded = manager.load_session(&SessionId::from("s1")).await.unwrap();
        assert_eq!(loaded.messages.len(), 2);

        manager.delete_session(&SessionId::from("s1")).await.unwrap();
        let err = manager
            .load_session(&SessionId::from("s1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
