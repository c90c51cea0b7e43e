#![deny(unsafe_code)]

//! Chat page widget: a collapsible conversation sidebar and a message pane
//! that round-trips through a [`chatpane_transport::ChatTransport`].
//!
//! Hosts implement [`document::Document`], [`dialogs::Dialogs`] and
//! [`preferences::PreferenceStore`], attach a [`ChatWidget`], then feed it
//! [`UiEvent`]s and drive the continuations it hands back.
/// Transcript model and the controller that round-trips messages.
pub mod chat;
/// Confirmation and notice prompts.
pub mod dialogs;
/// Page contract plus the in-memory document.
pub mod document;
/// Atomic JSON file writes shared by the on-disk stores.
pub mod persist;
/// Small key/value preferences such as the sidebar state.
pub mod preferences;
/// Layered widget settings.
pub mod settings;
/// Collapsible sidebar controller.
pub mod sidebar;
mod widget;

pub use widget::{ChatWidget, Continuation, ENTER_KEY, EventOutcome, UiEvent, WidgetPorts};
