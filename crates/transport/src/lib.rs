#![deny(unsafe_code)]

//! Request/response transport for the chat widget.
//!
//! The widget never talks to the network directly; it goes through
//! [`ChatTransport`], which keeps the two remote operations (send a message,
//! delete a stored conversation) behind one seam.
pub mod error;
pub mod http;
pub mod payload;

use futures::future::LocalBoxFuture;

pub use error::{TransportError, TransportResult};
pub use http::{DELETE_HISTORY_ROUTE, HttpChatTransport, SEND_MESSAGE_ROUTE, TransportConfig};
pub use payload::{DeleteOutcome, HistoryId, Reply, SendMessageRequest};

/// Remote responder used by the chat controller.
///
/// Futures are `!Send` on purpose: the widget runs on a single event thread and
/// hosts drive them with `spawn_local`.
pub trait ChatTransport {
    /// Sends `message` verbatim and resolves with the responder's reply.
    fn send_text_message(&self, message: String) -> LocalBoxFuture<'static, TransportResult<Reply>>;

    /// Requests deletion of one stored conversation.
    fn delete_history_record(
        &self,
        history_id: HistoryId,
    ) -> LocalBoxFuture<'static, TransportResult<DeleteOutcome>>;
}
