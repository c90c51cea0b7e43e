use std::cell::Cell;
use std::rc::Rc;

use crate::document::{CONTENT_EXPANDED_CLASS, Document, ElementId, SIDEBAR_COLLAPSED_CLASS};
use crate::preferences::PreferenceStore;

/// Viewports at or below this width collapse the sidebar.
pub const DEFAULT_BREAKPOINT: u32 = 768;
/// Preference key holding the last manually chosen state.
pub const SIDEBAR_PREFERENCE_KEY: &str = "sb|sidebar-toggle";

const REQUIRED_ELEMENTS: [ElementId; 2] = [ElementId::Sidebar, ElementId::MainContent];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarState {
    pub expanded: bool,
}

impl SidebarState {
    pub const EXPANDED: Self = Self { expanded: true };
    pub const COLLAPSED: Self = Self { expanded: false };

    pub const fn for_viewport(viewport_width: u32, breakpoint: u32) -> Self {
        Self {
            expanded: viewport_width > breakpoint,
        }
    }

    pub const fn toggled(self) -> Self {
        Self {
            expanded: !self.expanded,
        }
    }

    fn preference_value(self) -> &'static str {
        if self.expanded { "true" } else { "false" }
    }

    fn from_preference(raw: &str) -> Option<Self> {
        match raw.trim() {
            "true" => Some(Self::EXPANDED),
            "false" => Some(Self::COLLAPSED),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarOptions {
    pub breakpoint: u32,
    /// Record manual toggles in the preference store.
    pub persist: bool,
    /// Apply the recorded state on attach, after the viewport policy.
    pub restore: bool,
}

impl Default for SidebarOptions {
    fn default() -> Self {
        Self {
            breakpoint: DEFAULT_BREAKPOINT,
            persist: true,
            restore: false,
        }
    }
}

/// Keeps the sidebar and main content classes in step with one boolean.
pub struct SidebarController {
    document: Rc<dyn Document>,
    preferences: Rc<dyn PreferenceStore>,
    options: SidebarOptions,
    state: Cell<SidebarState>,
}

impl SidebarController {
    /// Binds to the page; `None` when the sidebar or content element is absent.
    pub fn attach(
        document: Rc<dyn Document>,
        preferences: Rc<dyn PreferenceStore>,
        options: SidebarOptions,
    ) -> Option<Self> {
        if let Some(missing) = REQUIRED_ELEMENTS
            .into_iter()
            .find(|element| !document.contains(*element))
        {
            tracing::debug!(
                element = missing.dom_id(),
                "sidebar controller not attached because an element is missing"
            );
            return None;
        }

        // Markup ships expanded; sync the classes before the first recompute.
        let controller = Self {
            document,
            preferences,
            options,
            state: Cell::new(SidebarState::EXPANDED),
        };
        controller.apply(SidebarState::EXPANDED);
        controller.on_resize(controller.document.viewport_width());

        if options.restore {
            controller.restore_preference();
        }

        Some(controller)
    }

    pub fn state(&self) -> SidebarState {
        self.state.get()
    }

    pub fn is_expanded(&self) -> bool {
        self.state.get().expanded
    }

    pub fn options(&self) -> SidebarOptions {
        self.options
    }

    /// Manual toggle; the new state holds until the next resize.
    pub fn toggle(&self) {
        let next = self.flip();
        if self.options.persist {
            self.persist(next);
        }
    }

    pub fn on_resize(&self, viewport_width: u32) {
        let desired = SidebarState::for_viewport(viewport_width, self.options.breakpoint);
        if desired != self.state.get() {
            tracing::debug!(
                viewport_width,
                expanded = desired.expanded,
                "viewport crossed sidebar breakpoint"
            );
            self.flip();
        }
    }

    fn flip(&self) -> SidebarState {
        let next = self.state.get().toggled();
        self.state.set(next);
        self.apply(next);
        next
    }

    fn apply(&self, state: SidebarState) {
        let collapsed = !state.expanded;
        self.document
            .set_class(ElementId::Sidebar, SIDEBAR_COLLAPSED_CLASS, collapsed);
        self.document
            .set_class(ElementId::MainContent, CONTENT_EXPANDED_CLASS, collapsed);
    }

    fn persist(&self, state: SidebarState) {
        if let Err(error) = self
            .preferences
            .store(SIDEBAR_PREFERENCE_KEY, state.preference_value())
        {
            tracing::warn!("failed to persist sidebar state: {error}");
        }
    }

    fn restore_preference(&self) {
        let Some(raw) = self.preferences.load(SIDEBAR_PREFERENCE_KEY) else {
            return;
        };

        match SidebarState::from_preference(&raw) {
            Some(restored) if restored != self.state.get() => {
                self.flip();
            }
            Some(_) => {}
            None => {
                tracing::debug!(value = %raw, "ignoring unrecognized sidebar preference");
            }
        }
    }
}
