//! Chat orchestrator: the only writer of the session store.
//!
//! Asking is split in two so front-ends can show the busy state before the
//! network call: [`ChatOrchestrator::begin_ask`] validates the question and
//! updates the store synchronously, [`ChatOrchestrator::complete_ask`]
//! folds the backend result in. [`ChatOrchestrator::ask`] runs both.

use std::sync::Arc;

use archive_client::{ClientError, QaApi};
use archive_core::config::ChatConfig;
use archive_core::{ChatMessage, ChatView, DocumentGroup, FeedbackValue, MessageId, SessionId};
use tracing::{debug, info, warn};

use crate::dispatcher::{DispatchReply, PendingAsk, QueryDispatcher};
use crate::error::ChatError;
use crate::grouping::group_hits;
use crate::history::{HistoryManager, HistoryPage};
use crate::store::ChatStore;

/// What happened to an asked question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// The backend answered; the id is the new assistant message.
    Answered(MessageId),
    /// The request failed; the id is the fallback assistant message.
    Fallback(MessageId),
    /// The conversation changed while the request was in flight and the
    /// response was dropped.
    Discarded,
}

/// Coordinates the store, the dispatcher and the history manager.
pub struct ChatOrchestrator {
    store: ChatStore,
    dispatcher: QueryDispatcher,
    history: HistoryManager,
    api: Arc<dyn QaApi>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(api: Arc<dyn QaApi>, config: ChatConfig) -> Self {
        Self {
            store: ChatStore::new(),
            dispatcher: QueryDispatcher::new(api.clone()),
            history: HistoryManager::new(api.clone()),
            api,
            config,
        }
    }

    /// Read-only view of the conversation state.
    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.store.set_input(input);
    }

    // =========================================================================
    // Asking
    // =========================================================================

    /// Accept a question and prepare the store for the request.
    ///
    /// On success the busy flag is set, the input buffer cleared, the user
    /// message appended and the view switched to chat, all before any I/O.
    pub fn begin_ask(&mut self, question: &str) -> Result<PendingAsk, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if question.chars().count() > self.config.max_question_chars {
            return Err(ChatError::MessageTooLong(self.config.max_question_chars));
        }
        if self.store.is_busy() {
            return Err(ChatError::Busy);
        }

        self.store.set_busy(true);
        self.store.set_input("");
        self.store.append_message(ChatMessage::user(question));
        self.store.set_view(ChatView::Chat);

        Ok(PendingAsk {
            question: question.to_string(),
            session_id: self.store.session_id().cloned(),
            generation: self.store.generation(),
        })
    }

    /// Fold the result of a dispatched question into the store.
    pub fn complete_ask(
        &mut self,
        pending: &PendingAsk,
        result: Result<DispatchReply, ClientError>,
    ) -> AskOutcome {
        let stale = pending.generation != self.store.generation();
        if stale && self.config.discard_stale_responses {
            info!(
                asked_in = pending.generation,
                current = self.store.generation(),
                "Dropping response for a replaced conversation"
            );
            return AskOutcome::Discarded;
        }
        if stale {
            debug!(
                asked_in = pending.generation,
                current = self.store.generation(),
                "Applying response to a newer conversation"
            );
        }

        self.store.set_busy(false);
        match result {
            Ok(reply) => {
                let hits = reply.hits();
                let groups = group_hits(&hits);
                debug!(hits = hits.len(), groups = groups.len(), "Answer grouped");

                let message = ChatMessage::assistant(reply.answer)
                    .with_remote_id(reply.remote_message_id)
                    .with_results(hits, groups);
                let id = message.id.clone();
                self.store.append_message(message);

                if self.store.session_id().is_none() {
                    if let Some(session_id) = reply.session_id {
                        info!(session_id = %session_id, "Session started");
                        self.store.set_session_id(Some(session_id));
                    }
                }
                AskOutcome::Answered(id)
            }
            Err(e) => {
                warn!(error = %e, "Question failed, showing fallback answer");
                let message = ChatMessage::assistant(self.config.fallback_message.clone());
                let id = message.id.clone();
                self.store.append_message(message);
                AskOutcome::Fallback(id)
            }
        }
    }

    /// Ask a question and wait for the answer.
    ///
    /// Backend failures do not surface as errors: they become the fallback
    /// answer. Only a rejected question is an error.
    pub async fn ask(&mut self, question: &str) -> Result<AskOutcome, ChatError> {
        let pending = self.begin_ask(question)?;
        let result = self.dispatcher.dispatch(&pending).await;
        Ok(self.complete_ask(&pending, result))
    }

    // =========================================================================
    // Feedback
    // =========================================================================

    /// Vote on an assistant answer. Each answer can be rated once.
    ///
    /// The vote is stored locally first; sending it to the backend is best
    /// effort and a failure keeps the local vote.
    pub async fn submit_feedback(
        &mut self,
        message_id: &MessageId,
        value: FeedbackValue,
    ) -> Result<(), ChatError> {
        if self.store.feedback(message_id).is_some() {
            return Err(ChatError::FeedbackAlreadySet(message_id.clone()));
        }
        self.store.set_feedback(message_id, Some(value))?;

        let remote_id = self.store.message(message_id).and_then(|m| m.remote_id);
        let session_id = self.store.session_id().cloned();
        match (session_id, remote_id) {
            (Some(session_id), Some(remote_id)) => {
                if let Err(e) = self
                    .api
                    .submit_feedback(session_id.as_str(), remote_id, value)
                    .await
                {
                    warn!(
                        session_id = %session_id,
                        message_id = remote_id,
                        error = %e,
                        "Feedback not delivered, kept locally"
                    );
                }
            }
            _ => debug!(message_id = %message_id, "No backend record for feedback"),
        }
        Ok(())
    }

    // =========================================================================
    // Conversations and history
    // =========================================================================

    /// Start over from the welcome view.
    pub fn new_conversation(&mut self) {
        self.store.clear_conversation();
    }

    /// One page of past sessions, sized by `chat.history_page_size`.
    pub async fn list_history(&self, page: u32) -> Result<HistoryPage, ChatError> {
        Ok(self
            .history
            .list(page, self.config.history_page_size)
            .await?)
    }

    /// Replace the conversation with a stored session.
    pub async fn open_session(&mut self, session_id: &SessionId) -> Result<(), ChatError> {
        if self.store.is_busy() {
            return Err(ChatError::Busy);
        }
        self.store.set_busy(true);
        let loaded = match self.history.load_session(session_id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.store.set_busy(false);
                return Err(e.into());
            }
        };

        self.store.replace_messages(loaded.messages);
        self.store.set_session_id(Some(loaded.session_id));
        self.store.set_selected_document(None);
        self.store.set_view(ChatView::Chat);
        self.store.set_viewing_history(true);
        for (id, value) in loaded.feedback {
            if let Err(e) = self.store.set_feedback(&id, Some(value)) {
                debug!(message_id = %id, error = %e, "Stored feedback skipped");
            }
        }
        self.store.set_busy(false);
        Ok(())
    }

    /// Delete a stored session; clears the conversation if it was open.
    pub async fn delete_session(&mut self, session_id: &SessionId) -> Result<(), ChatError> {
        self.history.delete_session(session_id).await?;
        if self.store.session_id() == Some(session_id) {
            self.store.clear_conversation();
        }
        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    // =========================================================================
    // Document preview
    // =========================================================================

    pub fn select_document(&mut self, group: Option<DocumentGroup>) {
        self.store.set_selected_document(group);
    }

    /// Move the highlight to hit `index` of the selected document.
    ///
    /// Returns false when nothing is selected or the index is out of range.
    pub fn highlight_hit(&mut self, index: usize) -> bool {
        let in_range = self
            .store
            .selected_document()
            .is_some_and(|doc| index < doc.hits.len());
        if in_range {
            self.store.set_current_highlight(index);
        }
        in_range
    }
}
