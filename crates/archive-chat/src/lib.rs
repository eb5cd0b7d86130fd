//! Conversational search over the contract archive.
//!
//! Groups search hits by source document, keeps the conversation state,
//! sends questions and manages stored sessions.

pub mod dispatcher;
pub mod error;
pub mod grouping;
pub mod history;
pub mod orchestrator;
pub mod store;

#[cfg(test)]
mod test_support;

pub use dispatcher::{DispatchReply, PendingAsk, QueryDispatcher};
pub use error::ChatError;
pub use grouping::group_hits;
pub use history::{HistoryManager, HistoryPage, LoadedSession};
pub use orchestrator::{AskOutcome, ChatOrchestrator};
pub use store::ChatStore;
