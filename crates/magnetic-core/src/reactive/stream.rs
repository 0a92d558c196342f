//! Stream - multicast channel without replay

use std::fmt;
use std::rc::Rc;

use super::observer::Observer;
use super::subscriber::SubscriberList;
use super::subscription::Subscription;

/// A multicast channel: values pushed are delivered synchronously to the
/// subscribers registered at that moment. Nothing is replayed to late
/// subscribers.
///
/// # Example
///
/// ```
/// use magnetic_core::reactive::{Observer, Stream};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let clicks: Stream<u32> = Stream::new();
/// clicks.push(1); // nobody listens yet
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = seen.clone();
/// clicks.subscribe_map(
///     |n: &u32| format!("click #{n}"),
///     Observer::new(move |label: &String| sink.borrow_mut().push(label.clone())),
/// );
/// clicks.push(2);
///
/// assert_eq!(*seen.borrow(), vec!["click #2".to_string()]);
/// ```
pub struct Stream<T> {
	subscribers: Rc<SubscriberList<T>>,
}

impl<T: 'static> Stream<T> {
	/// Creates an empty stream.
	pub fn new() -> Self {
		Self {
			subscribers: SubscriberList::new(),
		}
	}

	/// Delivers `value` to every current subscriber.
	pub fn push(&self, value: T) {
		self.subscribers.notify(&value);
	}

	/// Registers an observer for future values.
	pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
		match self.subscribers.add(observer) {
			Some((_, subscription)) => subscription,
			None => Subscription::closed(),
		}
	}

	/// Registers an observer that receives every value passed through
	/// `transform`. The transform runs once per value for this subscriber.
	pub fn subscribe_map<U, F>(&self, transform: F, observer: Observer<U>) -> Subscription
	where
		U: 'static,
		F: Fn(&T) -> U + 'static,
	{
		let error_route = observer.clone();
		let complete_route = observer.clone();
		let mapped = Observer::new(move |value: &T| observer.next(&transform(value)))
			.on_error(move |err| error_route.error(err))
			.on_complete(move || complete_route.complete());
		self.subscribe(mapped)
	}

	/// Completes the stream and closes every subscriber.
	pub fn complete(&self) {
		self.subscribers.complete();
	}

	/// Returns true once [`Stream::complete`] was called.
	pub fn is_completed(&self) -> bool {
		self.subscribers.is_completed()
	}

	/// Number of active subscribers.
	pub fn subscriber_count(&self) -> usize {
		self.subscribers.len()
	}
}

impl<T: 'static> Default for Stream<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for Stream<T> {
	fn clone(&self) -> Self {
		Self {
			subscribers: Rc::clone(&self.subscribers),
		}
	}
}

impl<T> fmt::Debug for Stream<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Stream").finish_non_exhaustive()
	}
}
