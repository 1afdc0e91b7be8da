//! Transcript Store - append-only, arrival-ordered chat events.

use crate::{ChatEvent, has_finalization_marker};

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    events: Vec<ChatEvent>,
}

/// Lazy view over the events that are shown to the operator.
///
/// Cloning the iterator restarts nothing in the store; it simply walks the
/// same slice again.
#[derive(Debug, Clone)]
pub struct VisibleEvents<'a> {
    inner: std::slice::Iter<'a, ChatEvent>,
}

impl<'a> Iterator for VisibleEvents<'a> {
    type Item = &'a ChatEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find(|event| !has_finalization_marker(&event.content))
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: ChatEvent) {
        self.events.push(event);
    }

    /// Events without a `finalize_plan` / `final_code` segment, in order.
    pub fn visible(&self) -> VisibleEvents<'_> {
        VisibleEvents {
            inner: self.events.iter(),
        }
    }

    /// Visible events among those appended at index `start` or later.
    pub fn visible_since(&self, start: usize) -> VisibleEvents<'_> {
        let start = start.min(self.events.len());
        VisibleEvents {
            inner: self.events[start..].iter(),
        }
    }

    /// Every appended event, including hidden ones.
    pub fn events(&self) -> &[ChatEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&ChatEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockNode, Role, render};

    #[test]
    fn test_hello_then_response_scenario() {
        let mut t = Transcript::new();
        t.append(ChatEvent::user("Hello"));
        t.append(ChatEvent::assistant("<response>Hi there</response>"));

        let visible: Vec<&ChatEvent> = t.visible().collect();
        assert_eq!(visible.len(), 2);
        let block = render(visible[1]);
        assert_eq!(
            block.nodes[0],
            BlockNode::Labeled {
                label: "[RESPONSE]".to_string(),
                text: "Hi there".to_string(),
            }
        );
    }

    #[test]
    fn test_finalization_events_hidden_but_counted() {
        let mut t = Transcript::new();
        t.append(ChatEvent::assistant("<final_code>print(1)</final_code>"));
        t.append(ChatEvent::new(
            Role::Planner,
            "<finalize_plan>done</finalize_plan>",
        ));
        assert_eq!(t.len(), 2);
        assert_eq!(t.visible().count(), 0);
    }

    #[test]
    fn test_visible_preserves_order_for_interleaving() {
        let mut t = Transcript::new();
        let mut expected = Vec::new();
        for i in 0..20 {
            let content = if i % 3 == 0 {
                format!("<final_code>{i}</final_code>")
            } else {
                let c = format!("msg {i}");
                expected.push(c.clone());
                c
            };
            t.append(ChatEvent::assistant(content));
        }
        let got: Vec<&str> = t.visible().map(|e| e.content.as_str()).collect();
        assert_eq!(got, expected);
        assert_eq!(t.len(), 20);
    }

    #[test]
    fn test_visible_is_restartable() {
        let mut t = Transcript::new();
        t.append(ChatEvent::user("a"));
        t.append(ChatEvent::user("b"));
        let view = t.visible();
        let first: Vec<_> = view.clone().collect();
        let second: Vec<_> = view.collect();
        assert_eq!(first, second);
        assert_eq!(t.visible().count(), 2);
    }

    #[test]
    fn test_visible_since_skips_already_seen() {
        let mut t = Transcript::new();
        t.append(ChatEvent::user("a"));
        t.append(ChatEvent::assistant("<final_code>x</final_code>"));
        t.append(ChatEvent::assistant("b"));
        let tail: Vec<&str> = t.visible_since(1).map(|e| e.content.as_str()).collect();
        assert_eq!(tail, vec!["b"]);
        assert_eq!(t.visible_since(10).count(), 0);
    }
}
