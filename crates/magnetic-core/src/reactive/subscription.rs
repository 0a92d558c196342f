//! Subscription disposer.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Teardown = Box<dyn FnOnce()>;

struct SubscriptionInner {
	closed: Cell<bool>,
	teardown: RefCell<Option<Teardown>>,
}

/// Handle returned by every `subscribe` call.
///
/// Dropping a `Subscription` does **not** unsubscribe; the subscriber stays
/// active for the lifetime of its source unless [`Subscription::unsubscribe`]
/// is called. Clones share the same underlying registration.
#[derive(Clone)]
pub struct Subscription {
	inner: Rc<SubscriptionInner>,
}

impl Subscription {
	/// Creates a subscription that runs `teardown` once when unsubscribed.
	pub fn new<F>(teardown: F) -> Self
	where
		F: FnOnce() + 'static,
	{
		Self {
			inner: Rc::new(SubscriptionInner {
				closed: Cell::new(false),
				teardown: RefCell::new(Some(Box::new(teardown))),
			}),
		}
	}

	/// Creates a subscription that is already closed.
	pub fn closed() -> Self {
		Self {
			inner: Rc::new(SubscriptionInner {
				closed: Cell::new(true),
				teardown: RefCell::new(None),
			}),
		}
	}

	/// Detaches the subscriber. Calling it again is a no-op.
	pub fn unsubscribe(&self) {
		if self.inner.closed.replace(true) {
			return;
		}
		let teardown = self.inner.teardown.borrow_mut().take();
		if let Some(teardown) = teardown {
			teardown();
		}
	}

	/// Returns true once unsubscribed or once the source completed.
	pub fn is_closed(&self) -> bool {
		self.inner.closed.get()
	}

	/// Marks the subscription closed without running its teardown.
	pub(crate) fn mark_closed(&self) {
		self.inner.closed.set(true);
		self.inner.teardown.borrow_mut().take();
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("closed", &self.is_closed())
			.finish()
	}
}
