//! Ordered subscriber records shared by [`State`](super::State) and
//! [`Stream`](super::Stream).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::observer::Observer;
use super::subscription::Subscription;

/// One registered observer.
pub(crate) struct Subscriber<T> {
	id: u64,
	observer: Observer<T>,
	active: Cell<bool>,
	subscription: RefCell<Option<Subscription>>,
}

impl<T> Subscriber<T> {
	/// Delivers a value if the subscriber is still active.
	pub(crate) fn deliver(&self, value: &T) {
		if self.active.get() {
			self.observer.next(value);
		}
	}
}

/// Ordered list of subscriber records.
///
/// Notification iterates over a snapshot, so subscribers added or removed by
/// a handler do not disturb the loop in progress. A subscriber removed during
/// the loop is skipped through its `active` flag.
pub(crate) struct SubscriberList<T> {
	entries: RefCell<Vec<Rc<Subscriber<T>>>>,
	next_id: Cell<u64>,
	completed: Cell<bool>,
}

impl<T: 'static> SubscriberList<T> {
	pub(crate) fn new() -> Rc<Self> {
		Rc::new(Self {
			entries: RefCell::new(Vec::new()),
			next_id: Cell::new(0),
			completed: Cell::new(false),
		})
	}

	/// Appends an observer. Returns `None` when the list already completed,
	/// in which case the observer's completion handler has been invoked.
	pub(crate) fn add(
		self: &Rc<Self>,
		observer: Observer<T>,
	) -> Option<(Rc<Subscriber<T>>, Subscription)> {
		if self.completed.get() {
			observer.complete();
			return None;
		}

		let id = self.next_id.get();
		self.next_id.set(id + 1);

		let subscriber = Rc::new(Subscriber {
			id,
			observer,
			active: Cell::new(true),
			subscription: RefCell::new(None),
		});

		let list: Weak<Self> = Rc::downgrade(self);
		let subscription = Subscription::new(move || {
			if let Some(list) = list.upgrade() {
				list.remove(id);
			}
		});
		*subscriber.subscription.borrow_mut() = Some(subscription.clone());

		self.entries.borrow_mut().push(subscriber.clone());
		Some((subscriber, subscription))
	}

	fn remove(&self, id: u64) {
		let mut entries = self.entries.borrow_mut();
		if let Some(entry) = entries.iter().find(|entry| entry.id == id) {
			entry.active.set(false);
		}
		entries.retain(|entry| entry.id != id);
	}

	/// Notifies every active subscriber in subscription order.
	pub(crate) fn notify(&self, value: &T) {
		if self.completed.get() {
			return;
		}
		let snapshot = self.entries.borrow().clone();
		for subscriber in snapshot {
			subscriber.deliver(value);
		}
	}

	/// Completes the list: every subscriber is closed and its completion
	/// handler invoked. Later notifications are ignored.
	pub(crate) fn complete(&self) {
		if self.completed.replace(true) {
			return;
		}
		let entries = std::mem::take(&mut *self.entries.borrow_mut());
		for subscriber in entries {
			subscriber.active.set(false);
			let subscription = subscriber.subscription.borrow_mut().take();
			if let Some(subscription) = subscription {
				subscription.mark_closed();
			}
			subscriber.observer.complete();
		}
	}

	pub(crate) fn is_completed(&self) -> bool {
		self.completed.get()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.borrow().len()
	}
}
