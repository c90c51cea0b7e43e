//! Host document contract the controllers bind to.
//!
//! A browser page, a terminal, or a test double can stand behind [`Document`].
//! Every method takes `&self`; implementations use interior mutability because
//! the controllers and their pending continuations share one document.
mod memory;

pub use memory::MemoryDocument;

use chatpane_transport::HistoryId;

pub const MESSAGE_CLASS: &str = "message";
pub const USER_MESSAGE_CLASS: &str = "user-message";
pub const AI_MESSAGE_CLASS: &str = "ai-message";
pub const ERROR_MESSAGE_CLASS: &str = "error-message";
/// Applied to the sidebar element while it is collapsed.
pub const SIDEBAR_COLLAPSED_CLASS: &str = "collapsed";
/// Applied to the main content element while the sidebar is collapsed.
pub const CONTENT_EXPANDED_CLASS: &str = "sidebar-collapsed";

/// Default view the page returns to after a conversation is deleted.
pub const HOME_LOCATION: &str = "/";

pub fn history_location(history_id: &HistoryId) -> String {
    format!("/history/{history_id}")
}

/// Elements with stable identifiers in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementId {
    SidebarToggle,
    Sidebar,
    MainContent,
    SendButton,
    UserInput,
    ChatWindow,
}

impl ElementId {
    pub const ALL: [ElementId; 6] = [
        Self::SidebarToggle,
        Self::Sidebar,
        Self::MainContent,
        Self::SendButton,
        Self::UserInput,
        Self::ChatWindow,
    ];

    pub const fn dom_id(self) -> &'static str {
        match self {
            Self::SidebarToggle => "sidebarToggle",
            Self::Sidebar => "sidebar",
            Self::MainContent => "main-content",
            Self::SendButton => "send-btn",
            Self::UserInput => "user-input",
            Self::ChatWindow => "chat-window",
        }
    }

    pub fn from_dom_id(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|element| element.dom_id() == raw)
    }
}

/// One node appended to the transcript container.
///
/// `markup` is inserted as-is; escaping (if any) already happened upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub classes: Vec<&'static str>,
    pub markup: String,
}

impl MessageNode {
    pub fn new(variant_class: &'static str, markup: impl Into<String>) -> Self {
        Self {
            classes: vec![MESSAGE_CLASS, variant_class],
            markup: markup.into(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|candidate| *candidate == class)
    }
}

pub trait Document {
    fn contains(&self, element: ElementId) -> bool;
    /// Adds or removes `class`; a no-op when the element is absent.
    fn set_class(&self, element: ElementId, class: &'static str, enabled: bool);
    fn viewport_width(&self) -> u32;
    fn input_value(&self) -> String;
    fn set_input_value(&self, value: &str);
    fn append_message(&self, node: MessageNode);
    fn scroll_to_bottom(&self, element: ElementId);
    /// Removes the list entry for `history_id`; returns false when none exists.
    fn remove_history_entry(&self, history_id: &HistoryId) -> bool;
    fn navigate(&self, location: &str);
}
