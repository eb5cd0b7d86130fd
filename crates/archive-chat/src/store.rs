//! Session state store.
//!
//! Single owner of the conversation state: view, message log, input buffer,
//! session identifier, selected document and feedback votes. Fields are
//! private and change only through the transition methods below.
//!
//! Every wholesale change of the message log (`clear_conversation`,
//! `replace_messages`) bumps a generation counter. Requests capture the
//! generation when they start, so a response can tell whether the
//! conversation it belongs to is still on screen.

use std::collections::HashMap;

use archive_core::{ChatMessage, ChatView, DocumentGroup, FeedbackValue, MessageId, SessionId};
use tracing::debug;

use crate::error::ChatError;

/// Conversation state of one chat front-end.
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    view: ChatView,
    messages: Vec<ChatMessage>,
    input: String,
    session_id: Option<SessionId>,
    selected_document: Option<DocumentGroup>,
    current_highlight: usize,
    busy: bool,
    viewing_history: bool,
    feedback: HashMap<MessageId, FeedbackValue>,
    generation: u64,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn view(&self) -> ChatView {
        self.view
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Most recent assistant message, if any.
    pub fn last_answer(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.is_assistant())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn selected_document(&self) -> Option<&DocumentGroup> {
        self.selected_document.as_ref()
    }

    pub fn current_highlight(&self) -> usize {
        self.current_highlight
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_viewing_history(&self) -> bool {
        self.viewing_history
    }

    pub fn feedback(&self, id: &MessageId) -> Option<FeedbackValue> {
        self.feedback.get(id).copied()
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn set_view(&mut self, view: ChatView) {
        self.view = view;
    }

    /// Append to the log. The only way messages grow during a conversation.
    pub fn append_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replace the whole log, e.g. with a loaded history.
    ///
    /// Feedback for messages that are no longer present is dropped.
    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
        let messages = &self.messages;
        self.feedback
            .retain(|id, _| messages.iter().any(|m| &m.id == id));
        self.generation += 1;
    }

    /// Return to the initial state. Only the generation survives, bumped.
    pub fn clear_conversation(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
        debug!(generation, "Conversation cleared");
    }

    /// Set or forget the session identifier.
    ///
    /// Forgetting it also forgets all feedback, which is only valid for
    /// messages of a known session.
    pub fn set_session_id(&mut self, session_id: Option<SessionId>) {
        if session_id.is_none() {
            self.feedback.clear();
        }
        self.session_id = session_id;
    }

    /// Select a document group for preview. Resets the highlighted hit.
    pub fn set_selected_document(&mut self, document: Option<DocumentGroup>) {
        self.selected_document = document;
        self.current_highlight = 0;
    }

    pub fn set_current_highlight(&mut self, index: usize) {
        self.current_highlight = index;
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn set_viewing_history(&mut self, viewing: bool) {
        self.viewing_history = viewing;
    }

    /// Record (or with `None`, remove) a vote on an assistant message.
    ///
    /// Overwrites any earlier vote. Rejects ids that are not in the log,
    /// user messages, and conversations without a session identifier.
    pub fn set_feedback(
        &mut self,
        id: &MessageId,
        value: Option<FeedbackValue>,
    ) -> Result<(), ChatError> {
        let message = self
            .message(id)
            .ok_or_else(|| ChatError::UnknownMessage(id.clone()))?;
        if !message.is_assistant() {
            return Err(ChatError::FeedbackNotAllowed("not an assistant message"));
        }
        if self.session_id.is_none() {
            return Err(ChatError::FeedbackNotAllowed("conversation has no session"));
        }

        match value {
            Some(value) => {
                self.feedback.insert(id.clone(), value);
            }
            None => {
                self.feedback.remove(id);
            }
        }
        Ok(())
    }
}
