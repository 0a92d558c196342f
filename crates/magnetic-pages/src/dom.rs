//! DOM abstraction layer
//!
//! The binding engine only talks to the document through the types in this
//! module. Two interchangeable backends provide them:
//!
//! - **native** (`not(target_arch = "wasm32")`): an arena-backed in-memory
//!   document with a window, custom events and width-driven media queries.
//!   It backs every test and non-browser host.
//! - **wasm32**: thin wrappers around `web_sys` with `wasm_bindgen::Closure`
//!   listeners.
//!
//! Both expose the same API: [`Document`], [`Element`], [`Window`],
//! [`MediaQueryList`], [`Event`] and the RAII [`ListenerHandle`] returned by
//! [`EventSource::listen`].
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_pages::dom::{Document, EventSource};
//! use std::rc::Rc;
//!
//! let document = Document::new();
//! let button = document.create_element("button")?;
//! button.set_attribute("class", "mag-langSelector")?;
//! document.body().append_child(&button)?;
//!
//! let _handle = button.listen("click", Rc::new(|event| {
//!     println!("clicked: {}", event.event_type());
//! }))?;
//! ```

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
mod memory;
#[cfg(not(target_arch = "wasm32"))]
pub use memory::{Document, Element, Event, ListenerHandle, MediaQueryList, Window};

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::{Document, Element, Event, ListenerHandle, MediaQueryList, Window};

/// DOM operation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
	/// The element must have a parent for this operation.
	#[error("Element has no parent")]
	NoParent,
	/// An element cannot be inserted into itself or one of its descendants.
	#[error("Cannot insert an element into itself or one of its descendants")]
	HierarchyRequest,
	/// The media condition is not understood by this backend.
	#[error("Unsupported media query: '{0}'")]
	UnsupportedMediaQuery(String),
	/// Unknown adjacent insertion position.
	#[error("Invalid insertion position: '{0}'")]
	InvalidPosition(String),
	/// The host environment rejected the operation.
	#[error("Host error: {0}")]
	Host(String),
}

/// Callback invoked for each event delivered to a listener.
pub type EventCallback = Rc<dyn Fn(&Event)>;

/// Anything events can be listened to on: the window, an element or a media
/// query list.
///
/// The listener stays attached as long as the returned [`ListenerHandle`] is
/// alive.
pub trait EventSource {
	/// Attaches `callback` for events named `event_type`.
	fn listen(&self, event_type: &str, callback: EventCallback) -> Result<ListenerHandle, DomError>;
}

/// Adjacent insertion position, as in `insertAdjacentElement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
	/// Before the element itself.
	BeforeBegin,
	/// Inside the element, before its first child.
	AfterBegin,
	/// Inside the element, after its last child.
	BeforeEnd,
	/// After the element itself.
	AfterEnd,
}

impl Position {
	/// Returns the DOM spelling of the position.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::BeforeBegin => "beforebegin",
			Self::AfterBegin => "afterbegin",
			Self::BeforeEnd => "beforeend",
			Self::AfterEnd => "afterend",
		}
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Position {
	type Err = DomError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"beforebegin" => Ok(Self::BeforeBegin),
			"afterbegin" => Ok(Self::AfterBegin),
			"beforeend" => Ok(Self::BeforeEnd),
			"afterend" => Ok(Self::AfterEnd),
			_ => Err(DomError::InvalidPosition(s.to_string())),
		}
	}
}
