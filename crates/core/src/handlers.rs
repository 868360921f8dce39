//! Observer registry for host events.
//!
//! Handlers live in an [`IndexMap`] so they fire in registration order and
//! unregister in O(1). Registration hands back a [`Subscription`] that
//! removes the handler when dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for event handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Handler function: `&E` → `()`.
pub type HandlerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handler storage keyed by [`HandlerId`].
pub type HandlerMap<E> = Arc<Mutex<IndexMap<HandlerId, HandlerFn<E>>>>;

/// Creates an empty handler map.
pub fn handler_map<E>() -> HandlerMap<E> {
	Arc::new(Mutex::new(IndexMap::new()))
}

/// Registers `handler` and returns the subscription that owns it.
pub fn subscribe<E, F>(handlers: &HandlerMap<E>, handler: F) -> Subscription
where
	E: 'static,
	F: Fn(&E) + Send + Sync + 'static,
{
	let id = next_handler_id();
	handlers.lock().insert(id, Arc::new(handler));
	Subscription::from_handler_map(id, handlers)
}

/// Calls every registered handler with `event`.
///
/// Handlers are snapshotted first, so a handler may subscribe or drop a
/// subscription without deadlocking.
pub fn emit<E>(handlers: &HandlerMap<E>, event: &E) -> usize {
	let snapshot: Vec<HandlerFn<E>> = handlers.lock().values().cloned().collect();
	for handler in &snapshot {
		handler(event);
	}
	snapshot.len()
}

/// RAII handle that unregisters an event handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the owning
/// host is gone is a no-op.
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Creates a subscription with a custom dropper function.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self { id, dropper: Some(dropper) }
	}

	/// Creates a subscription from a handler map using a weak reference.
	pub fn from_handler_map<E: 'static>(id: HandlerId, handlers: &HandlerMap<E>) -> Self {
		let weak: Weak<Mutex<IndexMap<HandlerId, HandlerFn<E>>>> = Arc::downgrade(handlers);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::AtomicUsize;

	use super::*;

	#[test]
	fn test_handler_id_increments() {
		let id1 = next_handler_id();
		let id2 = next_handler_id();
		assert!(id2 > id1);
	}

	#[test]
	fn test_emit_in_registration_order() {
		let map: HandlerMap<u32> = handler_map();
		let seen = Arc::new(Mutex::new(Vec::new()));

		let first = Arc::clone(&seen);
		let _a = subscribe(&map, move |v: &u32| first.lock().push(("a", *v)));
		let second = Arc::clone(&seen);
		let _b = subscribe(&map, move |v: &u32| second.lock().push(("b", *v)));

		assert_eq!(emit(&map, &7), 2);
		assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
	}

	#[test]
	fn test_subscription_drop_removes_handler() {
		let map: HandlerMap<()> = handler_map();
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);

		{
			let _sub = subscribe(&map, move |_| {
				counter.fetch_add(1, Ordering::SeqCst);
			});
			emit(&map, &());
		}

		assert_eq!(emit(&map, &()), 0);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_subscription_unsubscribe() {
		let map: HandlerMap<()> = handler_map();
		let sub = subscribe(&map, |_| {});
		assert_eq!(map.lock().len(), 1);

		sub.unsubscribe();
		assert!(map.lock().is_empty());
	}

	#[test]
	fn test_subscription_weak_reference() {
		let map: HandlerMap<()> = handler_map();
		let sub = subscribe(&map, |_| {});

		drop(map);
		// Map is gone; dropping must not panic.
		drop(sub);
	}
}
