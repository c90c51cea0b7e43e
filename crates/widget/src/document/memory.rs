use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};

use chatpane_transport::HistoryId;

use super::{Document, ElementId, MessageNode};

/// Headless document that records every mutation.
///
/// Used by tests and by hosts that render the transcript somewhere else.
#[derive(Debug)]
pub struct MemoryDocument {
    elements: HashSet<ElementId>,
    classes: RefCell<HashMap<ElementId, BTreeSet<&'static str>>>,
    viewport_width: Cell<u32>,
    input: RefCell<String>,
    transcript: RefCell<Vec<MessageNode>>,
    scroll_requests: Cell<usize>,
    history_entries: RefCell<Vec<HistoryId>>,
    locations: RefCell<Vec<String>>,
}

impl MemoryDocument {
    /// Creates a document containing every known element.
    pub fn new(viewport_width: u32) -> Self {
        Self {
            elements: ElementId::ALL.into_iter().collect(),
            classes: RefCell::new(HashMap::new()),
            viewport_width: Cell::new(viewport_width),
            input: RefCell::new(String::new()),
            transcript: RefCell::new(Vec::new()),
            scroll_requests: Cell::new(0),
            history_entries: RefCell::new(Vec::new()),
            locations: RefCell::new(Vec::new()),
        }
    }

    pub fn without(mut self, element: ElementId) -> Self {
        self.elements.remove(&element);
        self
    }

    pub fn with_history<I, T>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<HistoryId>,
    {
        self.history_entries
            .borrow_mut()
            .extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn set_viewport_width(&self, viewport_width: u32) {
        self.viewport_width.set(viewport_width);
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.classes
            .borrow()
            .get(&element)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn transcript(&self) -> Vec<MessageNode> {
        self.transcript.borrow().clone()
    }

    pub fn scroll_requests(&self) -> usize {
        self.scroll_requests.get()
    }

    pub fn history_entries(&self) -> Vec<HistoryId> {
        self.history_entries.borrow().clone()
    }

    pub fn locations(&self) -> Vec<String> {
        self.locations.borrow().clone()
    }
}

impl Document for MemoryDocument {
    fn contains(&self, element: ElementId) -> bool {
        self.elements.contains(&element)
    }

    fn set_class(&self, element: ElementId, class: &'static str, enabled: bool) {
        if !self.contains(element) {
            return;
        }

        let mut classes = self.classes.borrow_mut();
        let entry = classes.entry(element).or_default();
        if enabled {
            entry.insert(class);
        } else {
            entry.remove(class);
        }
    }

    fn viewport_width(&self) -> u32 {
        self.viewport_width.get()
    }

    fn input_value(&self) -> String {
        self.input.borrow().clone()
    }

    fn set_input_value(&self, value: &str) {
        *self.input.borrow_mut() = value.to_string();
    }

    fn append_message(&self, node: MessageNode) {
        self.transcript.borrow_mut().push(node);
    }

    fn scroll_to_bottom(&self, _element: ElementId) {
        self.scroll_requests.set(self.scroll_requests.get() + 1);
    }

    fn remove_history_entry(&self, history_id: &HistoryId) -> bool {
        let mut entries = self.history_entries.borrow_mut();
        let Some(index) = entries.iter().position(|entry| entry == history_id) else {
            return false;
        };
        entries.remove(index);
        true
    }

    fn navigate(&self, location: &str) {
        self.locations.borrow_mut().push(location.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_on_missing_elements_are_ignored() {
        let document = MemoryDocument::new(1024).without(ElementId::Sidebar);
        document.set_class(ElementId::Sidebar, "collapsed", true);
        assert!(!document.has_class(ElementId::Sidebar, "collapsed"));
    }

    #[test]
    fn removing_unknown_history_entry_reports_false() {
        let document = MemoryDocument::new(1024).with_history(["1", "2"]);
        assert!(document.remove_history_entry(&HistoryId::from("2")));
        assert!(!document.remove_history_entry(&HistoryId::from("2")));
        assert_eq!(document.history_entries(), vec![HistoryId::from("1")]);
    }
}
