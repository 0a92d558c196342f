//! Derived media-query stream.

use std::fmt;

use magnetic_core::reactive::Observer;

use super::stream::EventStream;
use crate::dom::{Event, MediaQueryList, Window};
use crate::error::PagesError;

/// Builds a width media condition.
///
/// | max | min | condition |
/// |-----|-----|-----------|
/// | `Some(a)` | `Some(b)` | `(max-width: apx) and (min-width: bpx)` |
/// | `Some(a)` | `None` | `(max-width: apx)` |
/// | `None` | `Some(b)` | `(min-width: bpx)` |
/// | `None` | `None` | `""` (always matches) |
pub fn width_condition(max: Option<u32>, min: Option<u32>) -> String {
	match (max, min) {
		(Some(max), Some(min)) => format!("(max-width: {}px) and (min-width: {}px)", max, min),
		(Some(max), None) => format!("(max-width: {}px)", max),
		(None, Some(min)) => format!("(min-width: {}px)", min),
		(None, None) => String::new(),
	}
}

/// The match state of a CSS media condition as a stream of booleans.
///
/// Subscribing delivers the current match state synchronously, then every
/// change.
///
/// # Example
///
/// ```ignore
/// use magnetic_core::reactive::{Observer, State};
/// use magnetic_pages::events::MediaQuery;
///
/// let is_mobile = State::new(false);
/// let mobile = MediaQuery::width(&ctx.window(), Some(768), None)?;
/// let target = is_mobile.clone();
/// mobile.subscribe("menu", Observer::new(move |matches: &bool| target.update(*matches)))?;
/// ```
pub struct MediaQuery {
	list: MediaQueryList,
	stream: EventStream<bool>,
}

impl MediaQuery {
	/// Watches `query`.
	pub fn new(window: &Window, query: &str) -> Result<Self, PagesError> {
		let list = window.match_media(query)?;
		let reader = list.clone();
		let stream = EventStream::new(list.clone(), "change", move |_: &Event| reader.matches());
		Ok(Self { list, stream })
	}

	/// Watches the width condition built by [`width_condition`].
	pub fn width(window: &Window, max: Option<u32>, min: Option<u32>) -> Result<Self, PagesError> {
		Self::new(window, &width_condition(max, min))
	}

	/// The media condition.
	pub fn query(&self) -> String {
		self.list.media()
	}

	/// Current match state.
	pub fn matches(&self) -> bool {
		self.list.matches()
	}

	/// Attaches `observer` under `id`, then delivers the current state to it.
	/// Nothing is delivered when attaching fails.
	pub fn subscribe(&self, id: impl Into<String>, observer: Observer<bool>) -> Result<(), PagesError> {
		self.stream.subscribe(id, observer.clone())?;
		observer.next(&self.list.matches());
		Ok(())
	}

	/// Detaches the subscription `id`.
	pub fn unsubscribe(&self, id: &str) -> Result<(), PagesError> {
		self.stream.unsubscribe(id)
	}
}

impl fmt::Debug for MediaQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MediaQuery")
			.field("list", &self.list)
			.field("stream", &self.stream)
			.finish()
	}
}
