use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use chatpane_transport::{ChatTransport, HistoryId};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::message::{ChatTranscript, Message, MessageId, Origin, RenderMode};
use crate::dialogs::{Dialogs, Locale};
use crate::document::{
    Document, ERROR_MESSAGE_CLASS, ElementId, HOME_LOCATION, MessageNode, history_location,
};
use crate::widget::Continuation;

const REQUIRED_ELEMENTS: [ElementId; 3] = [
    ElementId::SendButton,
    ElementId::UserInput,
    ElementId::ChatWindow,
];

/// What happens to a submit while an earlier reply is still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Every submit issues its own request; replies render in arrival order.
    #[default]
    Concurrent,
    /// Submits are ignored until the outstanding reply settles.
    Serialized,
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub render_mode: RenderMode,
    pub submit_policy: SubmitPolicy,
    /// Send the trimmed text instead of the raw input.
    pub trim_outbound: bool,
    /// Append a notice line when a reply cannot be fetched.
    pub show_send_errors: bool,
    pub locale: Locale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    AwaitingReply,
    Deleting,
}

#[derive(Debug, Default)]
struct ChatState {
    transcript: ChatTranscript,
    next_message_id: u64,
    pending_replies: usize,
    deleting: HashSet<HistoryId>,
}

impl ChatState {
    fn next_id(&mut self) -> MessageId {
        self.next_message_id += 1;
        MessageId::new(self.next_message_id)
    }
}

/// Handles shared between the controller and its in-flight continuations.
#[derive(Clone)]
struct ChatView {
    document: Rc<dyn Document>,
    dialogs: Rc<dyn Dialogs>,
    options: Rc<ChatOptions>,
    state: Rc<RefCell<ChatState>>,
}

impl ChatView {
    fn append(&self, origin: Origin, text: String) {
        let message = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id();
            let message = Message::new(id, origin, text);
            state.transcript.push(message.clone());
            message
        };

        self.document
            .append_message(message.to_node(self.options.render_mode));
        self.document.scroll_to_bottom(ElementId::ChatWindow);
    }

    fn append_failure_notice(&self) {
        let notice = htmlescape::encode_minimal(self.options.locale.send_failed());
        self.document
            .append_message(MessageNode::new(ERROR_MESSAGE_CLASS, notice));
        self.document.scroll_to_bottom(ElementId::ChatWindow);
    }

}

enum InFlightWork {
    Reply,
    Delete(HistoryId),
}

/// Bookkeeping for one round-trip, released when the continuation finishes
/// or is dropped unpolled.
struct InFlight {
    state: Rc<RefCell<ChatState>>,
    work: InFlightWork,
}

impl InFlight {
    fn begin(state: &Rc<RefCell<ChatState>>, work: InFlightWork) -> Self {
        {
            let mut state = state.borrow_mut();
            match &work {
                InFlightWork::Reply => state.pending_replies += 1,
                InFlightWork::Delete(history_id) => {
                    state.deleting.insert(history_id.clone());
                }
            }
        }
        Self {
            state: state.clone(),
            work,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            tracing::warn!("chat state busy while releasing a finished round-trip");
            return;
        };
        match &self.work {
            InFlightWork::Reply => {
                state.pending_replies = state.pending_replies.saturating_sub(1);
            }
            InFlightWork::Delete(history_id) => {
                state.deleting.remove(history_id);
            }
        }
    }
}

/// Owns the transcript and the two server round-trips.
pub struct ChatController {
    view: ChatView,
    transport: Rc<dyn ChatTransport>,
}

impl ChatController {
    /// Binds to the page; `None` when the send control, input or transcript is absent.
    pub fn attach(
        document: Rc<dyn Document>,
        transport: Rc<dyn ChatTransport>,
        dialogs: Rc<dyn Dialogs>,
        options: ChatOptions,
    ) -> Option<Self> {
        if let Some(missing) = REQUIRED_ELEMENTS
            .into_iter()
            .find(|element| !document.contains(*element))
        {
            tracing::debug!(
                element = missing.dom_id(),
                "chat controller not attached because an element is missing"
            );
            return None;
        }

        Some(Self {
            view: ChatView {
                document,
                dialogs,
                options: Rc::new(options),
                state: Rc::new(RefCell::new(ChatState::default())),
            },
            transport,
        })
    }

    pub fn options(&self) -> &ChatOptions {
        &self.view.options
    }

    pub fn transcript(&self) -> ChatTranscript {
        self.view.state.borrow().transcript.clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.view.state.borrow().pending_replies
    }

    pub fn phase(&self) -> ChatPhase {
        let state = self.view.state.borrow();
        if !state.deleting.is_empty() {
            ChatPhase::Deleting
        } else if state.pending_replies > 0 {
            ChatPhase::AwaitingReply
        } else {
            ChatPhase::Idle
        }
    }

    /// Renders the user's message and returns the round-trip for the reply.
    ///
    /// Returns `None` when nothing was sent: blank input, or a submit refused by
    /// [`SubmitPolicy::Serialized`].
    pub fn submit(&self, raw: &str) -> Option<Continuation> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if self.view.options.submit_policy == SubmitPolicy::Serialized {
            let pending = self.pending_replies();
            if pending > 0 {
                tracing::debug!(pending, "ignoring submit while a reply is pending");
                return None;
            }
        }

        self.view.append(Origin::User, trimmed.to_string());
        self.view.document.set_input_value("");
        let in_flight = InFlight::begin(&self.view.state, InFlightWork::Reply);

        let outbound = if self.view.options.trim_outbound {
            trimmed.to_string()
        } else {
            raw.to_string()
        };
        tracing::debug!(chars = outbound.chars().count(), "sending chat message");

        let request = self.transport.send_text_message(outbound);
        let view = self.view.clone();
        Some(
            async move {
                let _in_flight = in_flight;
                match request.await {
                    Ok(reply) => view.append(Origin::Assistant, reply.response),
                    Err(error) => {
                        tracing::warn!(stage = error.stage(), "failed to fetch reply: {error}");
                        if view.options.show_send_errors {
                            view.append_failure_notice();
                        }
                    }
                }
            }
            .boxed_local(),
        )
    }

    /// Asks for confirmation, then requests deletion of one stored conversation.
    pub fn delete_chat(&self, history_id: HistoryId) -> Option<Continuation> {
        if self.view.state.borrow().deleting.contains(&history_id) {
            tracing::debug!(%history_id, "delete already in progress");
            return None;
        }

        let prompt = self.view.options.locale.delete_confirmation();
        if !self.view.dialogs.confirm(prompt) {
            tracing::debug!(%history_id, "delete declined");
            return None;
        }

        let in_flight = InFlight::begin(
            &self.view.state,
            InFlightWork::Delete(history_id.clone()),
        );

        let request = self.transport.delete_history_record(history_id.clone());
        let view = self.view.clone();
        Some(
            async move {
                let in_flight = in_flight;
                match request.await {
                    Ok(outcome) if outcome.success => {
                        if !view.document.remove_history_entry(&history_id) {
                            tracing::warn!(%history_id, "deleted conversation had no list entry");
                        }
                        tracing::info!(%history_id, "conversation deleted");
                        drop(in_flight);
                        view.document.navigate(HOME_LOCATION);
                        return;
                    }
                    Ok(_) => tracing::warn!(%history_id, "server refused to delete conversation"),
                    Err(error) => tracing::warn!(
                        %history_id,
                        stage = error.stage(),
                        "failed to delete conversation: {error}"
                    ),
                }
                drop(in_flight);
                view.dialogs.alert(view.options.locale.delete_failed());
            }
            .boxed_local(),
        )
    }

    /// Navigates to the stored conversation's view.
    pub fn open_history(&self, history_id: &HistoryId) {
        self.view.document.navigate(&history_location(history_id));
    }
}
