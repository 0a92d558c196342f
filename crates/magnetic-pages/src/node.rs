//! Managed Node
//!
//! A [`ManagedNode`] binds one stable [`Identity`] to whichever element
//! currently stands for it, and mutates that element through named actions.
//!
//! ## Key Features
//!
//! - **Action registry**: an ordered map of action name → transform
//!   `(element, payload) -> element`, pre-filled with the default actions
//!   (see [`actions`]).
//! - **Dispatch channel**: [`ManagedNode::fire_action`] pushes
//!   `{name, payload}` on the node's channel; the matching action runs against
//!   the element bound *now*, resolved through the context binding table.
//! - **Replacement**: when an action returns a different element, it is put
//!   in place of the old one in the document before any observer of the node
//!   sees the new binding.
//! - **Visible failures**: a failing action leaves the old element bound and
//!   marks it with `data-<prefix>-error`.
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_pages::{AppContext, ManagedNode, Payload};
//!
//! let node = ManagedNode::by_id(&ctx, "potato")?;
//! node.fire_action("innerHTML", "<b>hello</b>");
//! node.fire_action("opacity", 0.5);
//! node.fire_action("doesNotExist", ()); // logged and ignored
//! ```

pub mod actions;
mod payload;

pub use payload::Payload;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use magnetic_core::reactive::{Observer, State, Stream, Subscription};

use crate::context::AppContext;
use crate::dom::Element;
use crate::error::{ActionError, PagesError};
use crate::identity::Identity;
use crate::{debug_log, error_log, warn_log};

/// Action transform: receives the bound element and the payload, returns the
/// element to bind next.
pub type ActionFn = Rc<dyn Fn(&Element, &Payload) -> Result<Element, ActionError>>;

/// Optional per-action handlers.
#[derive(Clone, Default)]
pub struct ActionHooks {
	on_error: Option<Rc<dyn Fn(&ActionError)>>,
	on_complete: Option<Rc<dyn Fn()>>,
}

impl ActionHooks {
	/// Creates empty hooks.
	pub fn new() -> Self {
		Self::default()
	}

	/// Called with the error each time the action fails.
	pub fn on_error<F>(mut self, handler: F) -> Self
	where
		F: Fn(&ActionError) + 'static,
	{
		self.on_error = Some(Rc::new(handler));
		self
	}

	/// Called once when the node is released.
	pub fn on_complete<F>(mut self, handler: F) -> Self
	where
		F: Fn() + 'static,
	{
		self.on_complete = Some(Rc::new(handler));
		self
	}
}

impl fmt::Debug for ActionHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionHooks")
			.field("on_error", &self.on_error.is_some())
			.field("on_complete", &self.on_complete.is_some())
			.finish()
	}
}

#[derive(Clone)]
struct ActionEvent {
	name: Rc<str>,
	payload: Payload,
}

struct RegisteredAction {
	name: String,
	subscription: Subscription,
}

struct NodeInner {
	ctx: AppContext,
	identity: Identity,
	bound: State<Element>,
	channel: Stream<ActionEvent>,
	actions: RefCell<Vec<RegisteredAction>>,
	released: Cell<bool>,
}

impl NodeInner {
	/// The table entry while it is attached; otherwise whatever carries the
	/// identity in the document, falling back to the detached entry (the
	/// `remove` placeholder).
	fn current(&self) -> Option<Element> {
		let cached = self.ctx.bindings().get(&self.identity);
		if let Some(element) = &cached {
			if element.is_connected() {
				return cached;
			}
		}
		self.identity.resolve(self.ctx.document()).or(cached)
	}

	fn run(&self, name: &str, action: &ActionFn, payload: &Payload, on_error: Option<&Rc<dyn Fn(&ActionError)>>) {
		let Some(current) = self.current() else {
			error_log!("Action '{}' skipped: no element bound to {}", name, self.identity);
			return;
		};
		let result = action(&current, payload).and_then(|next| {
			// A nested action may have rebound the node while the transform ran.
			let latest = self.current().unwrap_or_else(|| current.clone());
			if latest != current && next == current {
				debug_log!("Action '{}' on {} kept the nested rebinding", name, self.identity);
				return Ok(());
			}
			self.install(&latest, next)
		});
		if let Err(err) = result {
			self.mark_error(&current, &err);
			error_log!("Action '{}' failed on {}: {}", name, self.identity, err);
			if let Some(handler) = on_error {
				handler(&err);
			}
		}
	}

	/// Puts `next` in the document in place of `previous` and publishes it.
	fn install(&self, previous: &Element, next: Element) -> Result<(), ActionError> {
		if next != *previous {
			if !self.identity.is_carried_by(&next) {
				self.identity.stamp(&next)?;
			}
			previous.replace_with(&next)?;
		}
		let error_attribute = self.ctx.settings().error_attribute();
		if next.has_attribute(&error_attribute) {
			next.remove_attribute(&error_attribute)?;
		}
		self.ctx.bindings().rebind(&self.identity, next.clone());
		self.bound.update(next);
		Ok(())
	}

	fn mark_error(&self, element: &Element, err: &ActionError) {
		let error_attribute = self.ctx.settings().error_attribute();
		if let Err(mark_err) = element.set_attribute(&error_attribute, &err.to_string()) {
			error_log!("Could not mark {} as failed: {}", self.identity, mark_err);
		}
	}
}

impl Drop for NodeInner {
	fn drop(&mut self) {
		if !self.released.get() {
			self.ctx.bindings().release(&self.identity);
		}
	}
}

/// One identity bound to one live element, with an action registry.
///
/// Clones share the same node.
#[derive(Clone)]
pub struct ManagedNode {
	inner: Rc<NodeInner>,
}

impl ManagedNode {
	/// Binds the element currently carrying `identity`.
	pub fn new(ctx: &AppContext, identity: Identity) -> Result<Self, PagesError> {
		let element = identity
			.resolve(ctx.document())
			.ok_or_else(|| PagesError::ElementNotFound(identity.to_string()))?;
		Self::bind(ctx, identity, element)
	}

	/// Binds the element whose `id` is `id`.
	pub fn by_id(ctx: &AppContext, id: &str) -> Result<Self, PagesError> {
		Self::new(ctx, Identity::id(id))
	}

	pub(crate) fn bind(ctx: &AppContext, identity: Identity, element: Element) -> Result<Self, PagesError> {
		ctx.bindings().claim(&identity, element.clone())?;
		let node = Self {
			inner: Rc::new(NodeInner {
				ctx: ctx.clone(),
				identity,
				bound: State::new(element),
				channel: Stream::new(),
				actions: RefCell::new(Vec::new()),
				released: Cell::new(false),
			}),
		};
		for (name, action) in actions::defaults(&ctx.settings().placeholder_tag) {
			node.register(name.to_string(), action, ActionHooks::default());
		}
		Ok(node)
	}

	/// The node identity.
	pub fn identity(&self) -> &Identity {
		&self.inner.identity
	}

	/// Resolves the element bound to the identity right now.
	///
	/// The binding table entry is trusted while it is attached to the
	/// document. Once it is detached, the identity is looked up again, so an
	/// element swapped in by outside code is picked up.
	pub fn element(&self) -> Result<Element, PagesError> {
		if self.is_released() {
			return Err(PagesError::Released(self.inner.identity.to_string()));
		}
		self.inner
			.current()
			.ok_or_else(|| PagesError::ElementNotFound(self.inner.identity.to_string()))
	}

	/// Fires the action `name`. Unknown names are logged and ignored.
	pub fn fire_action(&self, name: &str, payload: impl Into<Payload>) {
		if self.is_released() {
			warn_log!("Action '{}' fired on released node {}; ignored", name, self.inner.identity);
			return;
		}
		if !self.has_action(name) {
			warn_log!("Unknown action '{}' on {}; ignored", name, self.inner.identity);
			return;
		}
		debug_log!("Firing '{}' on {}", name, self.inner.identity);
		self.inner.channel.push(ActionEvent {
			name: Rc::from(name),
			payload: payload.into(),
		});
	}

	/// Registers (or replaces) the action `name`.
	pub fn add_action<F>(&self, name: impl Into<String>, action: F)
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(name.into(), Rc::new(action), ActionHooks::default());
	}

	/// Registers (or replaces) the action `name` with error/completion hooks.
	pub fn add_action_with<F>(&self, name: impl Into<String>, action: F, hooks: ActionHooks)
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(name.into(), Rc::new(action), hooks);
	}

	pub(crate) fn register(&self, name: String, action: ActionFn, hooks: ActionHooks) {
		if self.is_released() {
			warn_log!("Cannot add action '{}' to released node {}", name, self.inner.identity);
			return;
		}

		let weak: Weak<NodeInner> = Rc::downgrade(&self.inner);
		let target: Rc<str> = Rc::from(name.as_str());
		let on_error = hooks.on_error.clone();
		let mut observer = Observer::new(move |event: &ActionEvent| {
			if event.name != target {
				return;
			}
			if let Some(inner) = weak.upgrade() {
				inner.run(&target, &action, &event.payload, on_error.as_ref());
			}
		});
		if let Some(on_complete) = hooks.on_complete {
			observer = observer.on_complete(move || on_complete());
		}
		let subscription = self.inner.channel.subscribe(observer);

		let previous = {
			let mut registry = self.inner.actions.borrow_mut();
			match registry.iter().position(|entry| entry.name == name) {
				Some(index) => Some(std::mem::replace(&mut registry[index].subscription, subscription)),
				None => {
					registry.push(RegisteredAction { name, subscription });
					None
				}
			}
		};
		if let Some(previous) = previous {
			previous.unsubscribe();
		}
	}

	/// Removes the action `name`.
	pub fn remove_action(&self, name: &str) -> Result<(), PagesError> {
		let mut registry = self.inner.actions.borrow_mut();
		let index = registry
			.iter()
			.position(|entry| entry.name == name)
			.ok_or_else(|| PagesError::UnknownAction(name.to_string()))?;
		let removed = registry.remove(index);
		drop(registry);
		removed.subscription.unsubscribe();
		Ok(())
	}

	/// Returns true if `name` is registered.
	pub fn has_action(&self, name: &str) -> bool {
		self.inner.actions.borrow().iter().any(|entry| entry.name == name)
	}

	/// Registered action names, in registration order.
	pub fn actions_list(&self) -> Vec<String> {
		self.inner
			.actions
			.borrow()
			.iter()
			.map(|entry| entry.name.clone())
			.collect()
	}

	/// Observes the bound element: the current one immediately, then every
	/// replacement.
	pub fn side_effect(&self, observer: Observer<Element>) -> Subscription {
		self.inner.bound.subscribe(observer)
	}

	/// Observes the bound element after each action, without the initial
	/// replay.
	pub fn subscribe_changes(&self, observer: Observer<Element>) -> Subscription {
		self.inner.bound.subscribe_changes(observer)
	}

	/// Returns true once [`ManagedNode::release`] was called.
	pub fn is_released(&self) -> bool {
		self.inner.released.get()
	}

	/// Detaches every action, completes the node streams and frees the
	/// identity. Later calls on any clone of the node are no-ops or return
	/// [`PagesError::Released`].
	pub fn release(&self) {
		if self.inner.released.replace(true) {
			return;
		}
		debug_log!("Releasing {}", self.inner.identity);
		self.inner.channel.complete();
		self.inner.bound.complete();
		self.inner.actions.borrow_mut().clear();
		self.inner.ctx.bindings().release(&self.inner.identity);
	}
}

impl fmt::Debug for ManagedNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManagedNode")
			.field("identity", &self.inner.identity)
			.field("actions", &self.actions_list())
			.field("released", &self.is_released())
			.finish()
	}
}
