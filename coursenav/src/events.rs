//! Synchronous publish/subscribe for state change notifications
//!
//! Listeners are called in subscription order. A listener that returns an
//! error or panics is logged and skipped; the remaining listeners are still
//! notified.

use std::panic::{self, AssertUnwindSafe};

/// Error type listeners may return
pub type ListenerError = Box<dyn std::error::Error>;

/// Result returned by a fallible listener
pub type ListenerResult = Result<(), ListenerError>;

type Listener<E> = Box<dyn FnMut(&E) -> ListenerResult>;

/// Handle returned by `subscribe`, used to unsubscribe later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of listeners for events of type `E`
pub struct Subscribers<E> {
    /// Name used in log messages ("navigation", "progress")
    topic: &'static str,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<E>)>,
}

impl<E> Subscribers<E> {
    pub fn new(topic: &'static str) -> Self {
        Self {
            topic,
            next_id: 1,
            listeners: Vec::new(),
        }
    }

    /// Register an infallible listener
    pub fn subscribe(&mut self, mut listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        self.subscribe_fallible(move |event| {
            listener(event);
            Ok(())
        })
    }

    /// Register a listener whose errors are logged instead of propagated
    pub fn subscribe_fallible(
        &mut self,
        listener: impl FnMut(&E) -> ListenerResult + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false when `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Deliver `event` to every listener
    ///
    /// # Returns
    /// Number of listeners that failed (returned an error or panicked)
    pub fn notify(&mut self, event: &E) -> usize {
        let mut failures = 0;

        for (id, listener) in &mut self.listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    log::warn!("{} listener {:?} failed: {}", self.topic, id, e);
                }
                Err(payload) => {
                    failures += 1;
                    log::warn!(
                        "{} listener {:?} panicked: {}",
                        self.topic,
                        id,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        failures
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("topic", &self.topic)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_in_subscription_order() {
        // Arrange: Two listeners recording into a shared log
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::new("test");
        let first = Rc::clone(&seen);
        subscribers.subscribe(move |n: &u32| first.borrow_mut().push(("first", *n)));
        let second = Rc::clone(&seen);
        subscribers.subscribe(move |n: &u32| second.borrow_mut().push(("second", *n)));

        // Act: Publish one event
        let failures = subscribers.notify(&7);

        // Assert: Both saw it, in order
        assert_eq!(failures, 0);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_failing_listeners_do_not_stop_delivery() {
        // Arrange: An erroring listener, a panicking one, then a healthy one
        let delivered = Rc::new(RefCell::new(0));
        let mut subscribers = Subscribers::new("test");
        subscribers.subscribe_fallible(|_: &u32| Err("storage full".into()));
        subscribers.subscribe(|_: &u32| panic!("listener bug"));
        let counter = Rc::clone(&delivered);
        subscribers.subscribe(move |_: &u32| *counter.borrow_mut() += 1);

        // Act: Publish twice
        let failures = subscribers.notify(&1) + subscribers.notify(&2);

        // Assert: Healthy listener ran both times
        assert_eq!(failures, 4);
        assert_eq!(*delivered.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let calls = Rc::new(RefCell::new(0));
        let mut subscribers = Subscribers::new("test");
        let counter = Rc::clone(&calls);
        let id = subscribers.subscribe(move |_: &()| *counter.borrow_mut() += 1);

        subscribers.notify(&());
        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        subscribers.notify(&());

        assert_eq!(*calls.borrow(), 1);
        assert!(subscribers.is_empty());
    }
}
