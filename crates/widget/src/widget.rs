use std::fmt;
use std::rc::Rc;

use chatpane_transport::{ChatTransport, HistoryId};
use futures::future::LocalBoxFuture;

use crate::chat::ChatController;
use crate::dialogs::Dialogs;
use crate::document::{Document, ElementId};
use crate::preferences::PreferenceStore;
use crate::settings::WidgetSettings;
use crate::sidebar::SidebarController;

/// Pending half of one server round-trip; the host drives it to completion.
pub type Continuation = LocalBoxFuture<'static, ()>;

pub const ENTER_KEY: &str = "Enter";

/// User interaction delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Click(ElementId),
    KeyPress {
        target: ElementId,
        key: String,
        /// True while an input method editor is composing text.
        is_composing: bool,
    },
    Resize {
        viewport_width: u32,
    },
    /// Click on the delete control nested inside a history entry.
    DeleteClick(HistoryId),
    HistoryClick(HistoryId),
}

impl UiEvent {
    pub fn key_press(target: ElementId, key: impl Into<String>) -> Self {
        Self::KeyPress {
            target,
            key: key.into(),
            is_composing: false,
        }
    }
}

/// What the host must do after a dispatch.
#[derive(Default)]
pub struct EventOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    pub continuation: Option<Continuation>,
}

impl fmt::Debug for EventOutcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EventOutcome")
            .field("default_prevented", &self.default_prevented)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("has_continuation", &self.continuation.is_some())
            .finish()
    }
}

impl EventOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn prevented() -> Self {
        Self {
            default_prevented: true,
            ..Self::default()
        }
    }

    fn continuing(continuation: Option<Continuation>) -> Self {
        Self {
            continuation,
            ..Self::default()
        }
    }

    /// Spawns the continuation on the current `LocalSet`, if there is one.
    pub fn spawn_local(self) -> Option<tokio::task::JoinHandle<()>> {
        self.continuation.map(tokio::task::spawn_local)
    }
}

/// Host capabilities the widget binds to.
#[derive(Clone)]
pub struct WidgetPorts {
    pub document: Rc<dyn Document>,
    pub transport: Rc<dyn ChatTransport>,
    pub dialogs: Rc<dyn Dialogs>,
    pub preferences: Rc<dyn PreferenceStore>,
}

/// Both controllers bound to one page.
///
/// Each half attaches independently; a page missing the sidebar still chats.
pub struct ChatWidget {
    document: Rc<dyn Document>,
    sidebar: Option<SidebarController>,
    chat: Option<ChatController>,
}

impl ChatWidget {
    pub fn attach(ports: WidgetPorts, settings: &WidgetSettings) -> Self {
        let WidgetPorts {
            document,
            transport,
            dialogs,
            preferences,
        } = ports;

        let sidebar =
            SidebarController::attach(document.clone(), preferences, settings.sidebar_options());
        let chat = ChatController::attach(
            document.clone(),
            transport,
            dialogs,
            settings.chat_options(),
        );

        tracing::info!(
            sidebar = sidebar.is_some(),
            chat = chat.is_some(),
            "chat widget attached"
        );

        Self {
            document,
            sidebar,
            chat,
        }
    }

    pub fn sidebar(&self) -> Option<&SidebarController> {
        self.sidebar.as_ref()
    }

    pub fn chat(&self) -> Option<&ChatController> {
        self.chat.as_ref()
    }

    pub fn dispatch(&self, event: UiEvent) -> EventOutcome {
        match event {
            UiEvent::Click(ElementId::SidebarToggle) => match &self.sidebar {
                Some(sidebar) => {
                    sidebar.toggle();
                    EventOutcome::prevented()
                }
                None => EventOutcome::ignored(),
            },
            UiEvent::Click(ElementId::SendButton) => self.send_clicked(),
            UiEvent::Click(_) => EventOutcome::ignored(),
            UiEvent::KeyPress {
                target: ElementId::UserInput,
                key,
                is_composing,
            } if key == ENTER_KEY => {
                if is_composing {
                    tracing::trace!("enter ignored during composition");
                    return EventOutcome::ignored();
                }
                self.send_clicked()
            }
            UiEvent::KeyPress { .. } => EventOutcome::ignored(),
            UiEvent::Resize { viewport_width } => {
                if let Some(sidebar) = &self.sidebar {
                    sidebar.on_resize(viewport_width);
                }
                EventOutcome::ignored()
            }
            UiEvent::DeleteClick(history_id) => {
                let continuation = self
                    .chat
                    .as_ref()
                    .and_then(|chat| chat.delete_chat(history_id));
                EventOutcome {
                    default_prevented: true,
                    propagation_stopped: true,
                    continuation,
                }
            }
            UiEvent::HistoryClick(history_id) => {
                if let Some(chat) = &self.chat {
                    chat.open_history(&history_id);
                }
                EventOutcome::ignored()
            }
        }
    }

    fn send_clicked(&self) -> EventOutcome {
        let Some(chat) = &self.chat else {
            return EventOutcome::ignored();
        };
        let raw = self.document.input_value();
        EventOutcome::continuing(chat.submit(&raw))
    }
}
