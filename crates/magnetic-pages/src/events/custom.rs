//! Custom event bridge
//!
//! A named event dispatched on the window with a JSON `detail` lets one
//! component notify others it knows nothing about.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::stream::EventStream;
use crate::context::AppContext;
use crate::debug_log;
use crate::dom::Event;
use crate::error::PagesError;

/// Serializes `detail` and dispatches the custom event `name` on the window.
pub fn dispatch_custom<S>(ctx: &AppContext, name: &str, detail: &S) -> Result<(), PagesError>
where
	S: Serialize + ?Sized,
{
	let detail = serde_json::to_value(detail)?;
	debug_log!("Dispatching custom event '{}' with {}", name, detail);
	ctx.window().dispatch_custom_event(name, detail)?;
	Ok(())
}

/// Decodes the detail of a custom event.
pub fn custom_detail<T: DeserializeOwned>(event: &Event) -> Option<T> {
	event
		.detail()
		.and_then(|detail| serde_json::from_value(detail).ok())
}

/// Stream of the decoded details of the window custom event `name`. Events
/// whose detail does not decode as `T` are skipped.
pub fn custom_stream<T>(ctx: &AppContext, name: &str) -> EventStream<T>
where
	T: DeserializeOwned + 'static,
{
	EventStream::filter_map(ctx.window(), name, custom_detail::<T>)
}
