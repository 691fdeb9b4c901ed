//! Access to the navigation fragment.
//!
//! The fragment is global mutable state owned by the navigation layer. The
//! [`FragmentIo`] trait abstracts it so the store can run against the browser's
//! location hash on wasm and against [`MemoryFragment`] everywhere else.

#[cfg(target_arch = "wasm32")]
mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserFragment;

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Identifies a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    fn new() -> Self {
        ListenerId(Uuid::new_v4())
    }
}

/// What a listener did with a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The notification was consumed
    Handled,
    /// The listener could not act now; deliver the fragment to it again later
    Retry,
}

/// Callback invoked with the fragment's value when a change notification is handled.
pub type ChangeCallback = Box<dyn FnMut(&str) -> Delivery>;

/// Read/write access to the navigation fragment plus change notifications.
pub trait FragmentIo {
    /// Current fragment, without the leading `#`.
    fn read(&self) -> String;

    /// Replaces the fragment. Writing a different value eventually raises a
    /// change notification, exactly like an external navigation would.
    fn write(&mut self, fragment: &str);

    /// Registers `callback` for change notifications. A callback that returns
    /// [`Delivery::Retry`] is called again later with the then-current fragment.
    fn on_change(&mut self, callback: ChangeCallback) -> ListenerId;

    /// Unregisters a listener. Returns false if it was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;
}

#[derive(Default)]
struct MemoryState {
    current: String,
    pending: usize,
    listeners: Vec<(ListenerId, ChangeCallback)>,
    /// Listeners that asked for another delivery
    retry: Vec<ListenerId>,
    /// Ids of the listeners taken out for the dispatch in progress
    dispatching: Vec<ListenerId>,
    removed_while_dispatching: Vec<ListenerId>,
}

/// In-memory fragment with queued notifications.
///
/// Notifications are not delivered when the fragment changes but when
/// [`MemoryFragment::dispatch_pending`] runs, the way a browser fires
/// `hashchange` on a later turn of its event loop. Each listener sees the
/// fragment's value at dispatch time, so several writes made before a dispatch
/// are observed as their final value.
///
/// Clones share the same fragment.
#[derive(Clone, Default)]
pub struct MemoryFragment {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryFragment {
    /// Creates a fragment holding `initial`, with no pending notifications.
    pub fn new(initial: &str) -> Self {
        let fragment = Self::default();
        fragment.state.borrow_mut().current = strip_hash(initial).to_string();
        fragment
    }

    /// Simulates an external navigation (address bar edit, back button, link).
    pub fn navigate(&self, fragment: &str) {
        self.set(fragment);
    }

    /// Number of notifications waiting to be dispatched.
    pub fn pending(&self) -> usize {
        self.state.borrow().pending
    }

    /// Delivers queued notifications, including any raised by the listeners
    /// themselves, until the queue is empty.
    ///
    /// Listeners that returned [`Delivery::Retry`] on an earlier call are
    /// first handed the current fragment again. Retries requested during this
    /// call wait for the next one.
    ///
    /// # Returns
    ///
    /// The number of notifications delivered, counting a retry round as one.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        let mut deferred = Vec::new();

        let retry = std::mem::take(&mut self.state.borrow_mut().retry);
        if !retry.is_empty() {
            self.deliver(Some(&retry), &mut deferred);
            delivered += 1;
        }

        loop {
            {
                let mut state = self.state.borrow_mut();
                if state.pending == 0 {
                    break;
                }
                state.pending -= 1;
            }
            self.deliver(None, &mut deferred);
            delivered += 1;
        }

        self.state.borrow_mut().retry = deferred;
        delivered
    }

    /// Hands the current fragment to every listener, or only to those in `only`.
    fn deliver(&self, only: Option<&[ListenerId]>, deferred: &mut Vec<ListenerId>) {
        let (fragment, mut listeners) = {
            let mut state = self.state.borrow_mut();
            let listeners = std::mem::take(&mut state.listeners);
            state.dispatching = listeners.iter().map(|(id, _)| *id).collect();
            (state.current.clone(), listeners)
        };

        for (id, callback) in listeners.iter_mut() {
            if only.is_some_and(|ids| !ids.contains(id)) {
                continue;
            }
            if callback(&fragment) == Delivery::Retry && !deferred.contains(id) {
                deferred.push(*id);
            }
        }

        let mut state = self.state.borrow_mut();
        state.dispatching.clear();
        let removed = std::mem::take(&mut state.removed_while_dispatching);
        listeners.retain(|(id, _)| !removed.contains(id));
        deferred.retain(|id| !removed.contains(id));
        listeners.append(&mut state.listeners);
        state.listeners = listeners;
    }

    fn set(&self, fragment: &str) {
        let mut state = self.state.borrow_mut();
        let fragment = strip_hash(fragment);
        if state.current != fragment {
            state.current = fragment.to_string();
            state.pending += 1;
        }
    }
}

impl FragmentIo for MemoryFragment {
    fn read(&self) -> String {
        self.state.borrow().current.clone()
    }

    fn write(&mut self, fragment: &str) {
        self.set(fragment);
    }

    fn on_change(&mut self, callback: ChangeCallback) -> ListenerId {
        let id = ListenerId::new();
        self.state.borrow_mut().listeners.push((id, callback));
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(listener, _)| *listener != id);
        state.retry.retain(|listener| *listener != id);
        if state.listeners.len() != before {
            return true;
        }
        if state.dispatching.contains(&id) && !state.removed_while_dispatching.contains(&id) {
            state.removed_while_dispatching.push(id);
            return true;
        }
        false
    }
}

fn strip_hash(fragment: &str) -> &str {
    fragment.strip_prefix('#').unwrap_or(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recording(fragment: &mut MemoryFragment) -> (ListenerId, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = fragment.on_change(Box::new(move |f| {
            sink.borrow_mut().push(f.to_string());
            Delivery::Handled
        }));
        (id, seen)
    }

    #[test]
    fn writes_are_visible_immediately_but_notified_later() {
        let mut fragment = MemoryFragment::new("#R10|GrowingTree|1");
        let (_, seen) = recording(&mut fragment);
        assert_eq!(fragment.read(), "R10|GrowingTree|1");

        fragment.write("T5|Kruskal|2");
        assert_eq!(fragment.read(), "T5|Kruskal|2");
        assert!(seen.borrow().is_empty());

        assert_eq!(fragment.dispatch_pending(), 1);
        assert_eq!(*seen.borrow(), vec!["T5|Kruskal|2".to_string()]);
    }

    #[test]
    fn writing_the_same_value_does_not_notify() {
        let mut fragment = MemoryFragment::new("abc");
        fragment.write("abc");
        fragment.write("#abc");
        assert_eq!(fragment.pending(), 0);
    }

    #[test]
    fn coalesced_writes_report_the_final_value() {
        let mut fragment = MemoryFragment::new("");
        let (_, seen) = recording(&mut fragment);
        fragment.write("a");
        fragment.navigate("b");
        fragment.dispatch_pending();
        assert_eq!(*seen.borrow(), vec!["b".to_string(), "b".to_string()]);
    }

    #[test]
    fn removed_listeners_are_not_called() {
        let mut fragment = MemoryFragment::new("");
        let (id, seen) = recording(&mut fragment);
        assert!(fragment.remove_listener(id));
        assert!(!fragment.remove_listener(id));
        fragment.navigate("x");
        fragment.dispatch_pending();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn listener_writes_are_dispatched_in_the_same_call() {
        let mut fragment = MemoryFragment::new("");
        let mut writer = fragment.clone();
        fragment.on_change(Box::new(move |f| {
            if f == "first" {
                writer.write("second");
            }
            Delivery::Handled
        }));
        let (_, seen) = recording(&mut fragment);
        fragment.navigate("first");
        assert_eq!(fragment.dispatch_pending(), 2);
        assert_eq!(*seen.borrow(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn retried_listeners_get_the_fragment_on_the_next_dispatch() {
        let mut fragment = MemoryFragment::new("");
        let busy = Rc::new(Cell::new(true));
        let flag = Rc::clone(&busy);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        fragment.on_change(Box::new(move |f| {
            if flag.get() {
                return Delivery::Retry;
            }
            sink.borrow_mut().push(f.to_string());
            Delivery::Handled
        }));
        let (_, other) = recording(&mut fragment);

        fragment.navigate("a");
        assert_eq!(fragment.dispatch_pending(), 1);
        assert!(seen.borrow().is_empty());
        // Still busy: asked again, deferred again
        assert_eq!(fragment.dispatch_pending(), 1);

        busy.set(false);
        assert_eq!(fragment.dispatch_pending(), 1);
        assert_eq!(*seen.borrow(), vec!["a".to_string()]);
        // Only the deferring listener was called again
        assert_eq!(*other.borrow(), vec!["a".to_string()]);
        assert_eq!(fragment.dispatch_pending(), 0);
    }

    #[test]
    fn removal_during_dispatch_only_succeeds_for_registered_ids() {
        let mut fragment = MemoryFragment::new("");
        let mut handle = fragment.clone();
        let own_id = Rc::new(Cell::new(None));
        let own = Rc::clone(&own_id);
        let results = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&results);
        let id = fragment.on_change(Box::new(move |_| {
            sink.borrow_mut()
                .push(handle.remove_listener(ListenerId(Uuid::new_v4())));
            if let Some(id) = own.get() {
                sink.borrow_mut().push(handle.remove_listener(id));
                sink.borrow_mut().push(handle.remove_listener(id));
            }
            Delivery::Handled
        }));
        own_id.set(Some(id));

        fragment.navigate("x");
        fragment.dispatch_pending();
        assert_eq!(*results.borrow(), vec![false, true, false]);

        fragment.navigate("y");
        fragment.dispatch_pending();
        assert_eq!(results.borrow().len(), 3);
    }
}
