//! Application context
//!
//! [`AppContext`] is built once at start-up and passed by reference to every
//! constructor. It owns the document handle, the engine [`Settings`] and the
//! [`BindingTable`] that maps identities to the elements currently bound to
//! them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use magnetic_core::conf::Settings;

use crate::dom::{Document, Element, Window};
use crate::error::PagesError;
use crate::identity::Identity;

/// Identity → current element indirection.
///
/// Managed nodes never hold on to a raw element across an action: they claim
/// their identity here once and resolve the current element through the
/// table on every access. An identity can be claimed by one live node at a
/// time.
#[derive(Default)]
pub struct BindingTable {
	entries: RefCell<HashMap<Identity, Element>>,
}

impl BindingTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Claims `identity` for `element`.
	pub fn claim(&self, identity: &Identity, element: Element) -> Result<(), PagesError> {
		let mut entries = self.entries.borrow_mut();
		if entries.contains_key(identity) {
			return Err(PagesError::IdentityCollision(identity.value().to_string()));
		}
		entries.insert(identity.clone(), element);
		Ok(())
	}

	/// Points a claimed identity at a new element.
	pub fn rebind(&self, identity: &Identity, element: Element) {
		self.entries.borrow_mut().insert(identity.clone(), element);
	}

	/// Releases a claim. Releasing an unclaimed identity is a no-op.
	pub fn release(&self, identity: &Identity) {
		self.entries.borrow_mut().remove(identity);
	}

	/// Element currently bound to `identity`.
	pub fn get(&self, identity: &Identity) -> Option<Element> {
		self.entries.borrow().get(identity).cloned()
	}

	/// Returns true if `identity` is claimed.
	pub fn contains(&self, identity: &Identity) -> bool {
		self.entries.borrow().contains_key(identity)
	}

	/// Number of claimed identities.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Returns true if nothing is claimed.
	pub fn is_empty(&self) -> bool {
		self.entries.borrow().is_empty()
	}
}

impl fmt::Debug for BindingTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BindingTable")
			.field("len", &self.len())
			.finish()
	}
}

struct ContextInner {
	document: Document,
	settings: Settings,
	bindings: BindingTable,
}

/// Shared application context. Clones are cheap and share everything.
///
/// # Example
///
/// ```ignore
/// use magnetic_pages::{AppContext, dom::Document};
///
/// let ctx = AppContext::with_defaults(Document::new());
/// assert_eq!(ctx.settings().identity_attribute(), "data-mag-id");
/// ```
#[derive(Clone)]
pub struct AppContext {
	inner: Rc<ContextInner>,
}

impl AppContext {
	/// Creates a context over `document`.
	pub fn new(document: Document, settings: Settings) -> Self {
		Self {
			inner: Rc::new(ContextInner {
				document,
				settings,
				bindings: BindingTable::new(),
			}),
		}
	}

	/// Creates a context with default settings.
	pub fn with_defaults(document: Document) -> Self {
		Self::new(document, Settings::default())
	}

	/// Creates a context over the current browser document.
	#[cfg(target_arch = "wasm32")]
	pub fn from_window(settings: Settings) -> Result<Self, PagesError> {
		Ok(Self::new(Document::current()?, settings))
	}

	/// The document.
	pub fn document(&self) -> &Document {
		&self.inner.document
	}

	/// The window of the document.
	pub fn window(&self) -> Window {
		self.inner.document.window()
	}

	/// Engine settings.
	pub fn settings(&self) -> &Settings {
		&self.inner.settings
	}

	/// Identity → element table.
	pub fn bindings(&self) -> &BindingTable {
		&self.inner.bindings
	}
}

impl fmt::Debug for AppContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppContext")
			.field("settings", &self.inner.settings)
			.field("bindings", &self.inner.bindings)
			.finish_non_exhaustive()
	}
}
