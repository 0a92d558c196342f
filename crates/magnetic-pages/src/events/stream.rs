//! Multicast event stream keyed by subscription id.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use magnetic_core::reactive::Observer;

use crate::dom::{Event, EventSource, ListenerHandle};
use crate::error::PagesError;
use crate::{debug_log, error_log};

type Transform<T> = Rc<dyn Fn(&Event) -> Option<T>>;
type Filter = Rc<dyn Fn(&Event) -> bool>;

/// A native event source turned into a subscribable sequence of `T`.
///
/// Each subscription gets its own native listener, so the mapping runs once
/// per raw event per subscriber. Subscriptions are keyed by caller-chosen ids:
/// subscribing an id twice or unsubscribing an unknown id is an error.
///
/// # Example
///
/// ```ignore
/// use magnetic_core::reactive::Observer;
/// use magnetic_pages::events::EventStream;
///
/// let load = EventStream::new(ctx.window(), "load", |_| true);
/// load.subscribe("splash", Observer::new(|_: &bool| hide_splash()))?;
/// load.unsubscribe("splash")?;
/// ```
pub struct EventStream<T> {
	source: Rc<dyn EventSource>,
	event_type: String,
	transform: Transform<T>,
	filter: Option<Filter>,
	subscriptions: RefCell<Vec<(String, ListenerHandle)>>,
}

impl<T: 'static> EventStream<T> {
	/// Maps every `event_type` event of `source` through `transform`.
	pub fn new<S, F>(source: S, event_type: &str, transform: F) -> Self
	where
		S: EventSource + 'static,
		F: Fn(&Event) -> T + 'static,
	{
		Self::filter_map(source, event_type, move |event| Some(transform(event)))
	}

	/// Maps events through `transform` with a fixed side payload.
	pub fn with_payload<S, P, F>(source: S, event_type: &str, payload: P, transform: F) -> Self
	where
		S: EventSource + 'static,
		P: 'static,
		F: Fn(&Event, &P) -> T + 'static,
	{
		Self::new(source, event_type, move |event| transform(event, &payload))
	}

	/// Maps events through `transform`, dropping events it returns `None` for.
	pub fn filter_map<S, F>(source: S, event_type: &str, transform: F) -> Self
	where
		S: EventSource + 'static,
		F: Fn(&Event) -> Option<T> + 'static,
	{
		Self {
			source: Rc::new(source),
			event_type: event_type.to_string(),
			transform: Rc::new(transform),
			filter: None,
			subscriptions: RefCell::new(Vec::new()),
		}
	}

	/// Gates raw events before they are mapped. Events the predicate rejects
	/// reach no subscriber.
	pub fn with_filter<F>(mut self, predicate: F) -> Self
	where
		F: Fn(&Event) -> bool + 'static,
	{
		self.filter = Some(Rc::new(predicate));
		self
	}

	/// Attaches `observer` under `id`.
	pub fn subscribe(&self, id: impl Into<String>, observer: Observer<T>) -> Result<(), PagesError> {
		let id = id.into();
		if self.is_subscribed(&id) {
			error_log!("Subscription id '{}' already used on '{}' stream", id, self.event_type);
			return Err(PagesError::DuplicateSubscription(id));
		}

		let transform = Rc::clone(&self.transform);
		let filter = self.filter.clone();
		let handle = self.source.listen(
			&self.event_type,
			Rc::new(move |event: &Event| {
				if let Some(filter) = &filter {
					if !filter(event) {
						return;
					}
				}
				if let Some(value) = transform(event) {
					observer.next(&value);
				}
			}),
		)?;
		debug_log!("Subscribed '{}' to '{}' stream", id, self.event_type);
		self.subscriptions.borrow_mut().push((id, handle));
		Ok(())
	}

	/// Detaches the subscription `id`.
	pub fn unsubscribe(&self, id: &str) -> Result<(), PagesError> {
		let removed = {
			let mut subscriptions = self.subscriptions.borrow_mut();
			subscriptions
				.iter()
				.position(|(existing, _)| existing == id)
				.map(|index| subscriptions.remove(index))
		};
		match removed {
			// Dropping the handle detaches the native listener.
			Some(_) => Ok(()),
			None => {
				error_log!("Cannot unsubscribe '{}' from '{}' stream: unknown id", id, self.event_type);
				Err(PagesError::UnknownSubscription(id.to_string()))
			}
		}
	}

	/// Detaches every subscription.
	pub fn unsubscribe_all(&self) {
		let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
		drop(subscriptions);
	}

	/// Returns true if `id` is subscribed.
	pub fn is_subscribed(&self, id: &str) -> bool {
		self.subscriptions.borrow().iter().any(|(existing, _)| existing == id)
	}

	/// Subscribed ids in subscription order.
	pub fn ids(&self) -> Vec<String> {
		self.subscriptions
			.borrow()
			.iter()
			.map(|(id, _)| id.clone())
			.collect()
	}

	/// Name of the native event.
	pub fn event_type(&self) -> &str {
		&self.event_type
	}
}

impl<T> fmt::Debug for EventStream<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventStream")
			.field("event_type", &self.event_type)
			.field("subscriptions", &self.subscriptions.borrow().len())
			.finish_non_exhaustive()
	}
}
