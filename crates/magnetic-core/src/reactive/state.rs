//! State - Reactive Value Container
//!
//! `State<T>` holds one current value and notifies its subscribers
//! synchronously whenever the value is replaced.
//!
//! ## Key Features
//!
//! - **Replay-of-one**: every new subscriber immediately receives the current
//!   value, before any future value.
//! - **Synchronous multicast**: `update` returns only after every subscriber
//!   ran, in subscription order.
//! - **Error isolation**: a failing subscriber never blocks its siblings.
//! - **Cheap handles**: clones share the value and the subscriber list.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::observer::Observer;
use super::subscriber::SubscriberList;
use super::subscription::Subscription;

struct StateInner<T> {
	value: RefCell<T>,
	subscribers: Rc<SubscriberList<T>>,
}

/// A reactive value container with replay-of-one semantics.
///
/// # Example
///
/// ```
/// use magnetic_core::reactive::{Observer, State};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let is_mobile = State::new(false);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// is_mobile.update(true);
///
/// // A late subscriber starts from the current value.
/// let sink = seen.clone();
/// is_mobile.subscribe(Observer::new(move |v: &bool| sink.borrow_mut().push(*v)));
/// is_mobile.update(false);
///
/// assert_eq!(*seen.borrow(), vec![true, false]);
/// ```
pub struct State<T> {
	inner: Rc<StateInner<T>>,
}

impl<T: Clone + 'static> State<T> {
	/// Creates a container holding `initial`.
	pub fn new(initial: T) -> Self {
		Self {
			inner: Rc::new(StateInner {
				value: RefCell::new(initial),
				subscribers: SubscriberList::new(),
			}),
		}
	}

	/// Returns a clone of the current value.
	pub fn get(&self) -> T {
		self.inner.value.borrow().clone()
	}

	/// Runs `f` with a reference to the current value.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.inner.value.borrow())
	}

	/// Stores `value` and notifies every subscriber in subscription order.
	///
	/// Ignored once the container completed.
	pub fn update(&self, value: T) {
		if self.inner.subscribers.is_completed() {
			tracing::debug!(target: "magnetic", "update on completed state ignored");
			return;
		}
		*self.inner.value.borrow_mut() = value.clone();
		// Handlers receive a snapshot so they may call `update` re-entrantly.
		self.inner.subscribers.notify(&value);
	}

	/// Registers `observer` and immediately delivers the current value.
	pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
		match self.inner.subscribers.add(observer) {
			Some((subscriber, subscription)) => {
				let current = self.get();
				subscriber.deliver(&current);
				subscription
			}
			None => Subscription::closed(),
		}
	}

	/// Registers `observer` for future values only, skipping the replay.
	pub fn subscribe_changes(&self, observer: Observer<T>) -> Subscription {
		match self.inner.subscribers.add(observer) {
			Some((_, subscription)) => subscription,
			None => Subscription::closed(),
		}
	}

	/// Completes the container: subscribers are closed and their completion
	/// handlers run. The last value stays readable through [`State::get`].
	pub fn complete(&self) {
		self.inner.subscribers.complete();
	}

	/// Returns true once [`State::complete`] was called.
	pub fn is_completed(&self) -> bool {
		self.inner.subscribers.is_completed()
	}

	/// Number of active subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.len()
	}
}

impl<T> Clone for State<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("State")
			.field("value", &*self.inner.value.borrow())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactive::HandlerError;
	use rstest::rstest;
	use std::cell::Cell;

	fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, Observer<T>) {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		(seen, Observer::new(move |value: &T| sink.borrow_mut().push(value.clone())))
	}

	#[rstest]
	fn test_subscribe_replays_current_value() {
		let state = State::new(7);
		let (seen, observer) = recorder();

		state.subscribe(observer);

		assert_eq!(*seen.borrow(), vec![7]);
	}

	#[rstest]
	fn test_update_notifies_in_subscription_order() {
		let state = State::new(0);
		let order = Rc::new(RefCell::new(Vec::new()));

		for tag in ["first", "second", "third"] {
			let order = order.clone();
			state.subscribe_changes(Observer::new(move |_: &i32| order.borrow_mut().push(tag)));
		}
		state.update(1);

		assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
	}

	#[rstest]
	fn test_failing_subscriber_does_not_block_siblings() {
		let state = State::new(0);
		let errors = Rc::new(Cell::new(0));
		let counter = errors.clone();
		state.subscribe_changes(
			Observer::fallible(|_: &i32| Err(HandlerError::msg("fail")))
				.on_error(move |_| counter.set(counter.get() + 1)),
		);
		let (seen, observer) = recorder();
		state.subscribe_changes(observer);

		state.update(5);

		assert_eq!(errors.get(), 1);
		assert_eq!(*seen.borrow(), vec![5]);
	}

	#[rstest]
	fn test_unsubscribe_stops_delivery() {
		let state = State::new("a".to_string());
		let (seen, observer) = recorder();
		let subscription = state.subscribe(observer);

		subscription.unsubscribe();
		state.update("b".to_string());

		assert_eq!(*seen.borrow(), vec!["a".to_string()]);
		assert_eq!(state.subscriber_count(), 0);
	}

	#[rstest]
	fn test_reentrant_update_is_depth_first() {
		let state = State::new(0);
		let inner = state.clone();
		state.subscribe_changes(Observer::new(move |value: &i32| {
			if *value == 1 {
				inner.update(2);
			}
		}));
		let (seen, observer) = recorder();
		state.subscribe_changes(observer);

		state.update(1);

		// The nested update completes its fan-out before the outer one resumes.
		assert_eq!(*seen.borrow(), vec![2, 1]);
		assert_eq!(state.get(), 2);
	}

	#[rstest]
	fn test_complete_closes_subscribers() {
		let state = State::new(1);
		let completed = Rc::new(Cell::new(false));
		let flag = completed.clone();
		let subscription = state.subscribe(Observer::empty().on_complete(move || flag.set(true)));

		state.complete();
		state.update(2);

		assert!(completed.get());
		assert!(subscription.is_closed());
		assert!(state.is_completed());
		assert_eq!(state.get(), 1);
	}

	#[rstest]
	fn test_subscribe_after_complete_returns_closed() {
		let state = State::new(1);
		state.complete();
		let (seen, observer) = recorder();

		let subscription = state.subscribe(observer);

		assert!(subscription.is_closed());
		assert!(seen.borrow().is_empty());
	}
}
