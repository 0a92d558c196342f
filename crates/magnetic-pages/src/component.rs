//! Components
//!
//! A [`Component`] owns the [`ComponentTemplate`] of the elements carrying its
//! namespaced marker class (`<prefix>-<name>`, e.g. `mag-card`) and routes
//! lifecycle and DOM events to actions on those instances.
//!
//! ## Key Features
//!
//! - **Lifecycle hooks**: [`Component::on_load`] and [`Component::on_update`]
//!   register the `onLoad` and `onUpdate` actions and wire them to the window
//!   `load` event and to the replacement streams of the member nodes.
//! - **Global routing**: [`Component::on_event_global`] listens once on the
//!   window and broadcasts `on<event>` to every instance.
//! - **Local routing**: [`Component::on_event_local`] listens on each instance
//!   element and fires `on<event>` on that instance only. The listener stays
//!   on the element that existed at discovery; use
//!   [`Component::on_event_local_tracked`] to follow replacements.
//! - **Regenerate / dispose**: custom actions and routes are remembered, so
//!   [`Component::regenerate`] can rebuild them on a fresh node set.
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_pages::{Component, Payload};
//!
//! let cards = Component::new(&ctx, "card")?;
//! cards.on_event_local("click", |element, _payload| {
//!     element.set_attribute("aria-pressed", "true")?;
//!     Ok(element.clone())
//! })?;
//! cards.on_load(|element, _| {
//!     element.set_style_property("opacity", "1")?;
//!     Ok(element.clone())
//! })?;
//! ```

mod template;

pub use template::{ComponentTemplate, Marker};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use magnetic_core::reactive::{Observer, Subscription};

use crate::context::AppContext;
use crate::dom::{Element, Event, EventSource, ListenerHandle};
use crate::error::{ActionError, PagesError};
use crate::node::{ActionFn, ActionHooks, ManagedNode, Payload};
use crate::{debug_log, error_log, info_log, warn_log};

/// Action fired on every instance when the window `load` event arrives.
pub const LOAD_ACTION: &str = "onLoad";

/// Action fired on every instance when a member's bound element changes.
pub const UPDATE_ACTION: &str = "onUpdate";

const LOAD_EVENT: &str = "load";

/// Name of the action routed for the DOM event `event`: `on<event>`.
pub fn event_action_name(event: &str) -> String {
	format!("on{}", event)
}

struct CustomAction {
	name: String,
	action: ActionFn,
	hooks: ActionHooks,
}

/// Listener on one instance element.
struct LocalListener {
	element: RefCell<Element>,
	handle: RefCell<Option<ListenerHandle>>,
}

struct LocalRoute {
	event: String,
	tracked: bool,
	listeners: Vec<Rc<LocalListener>>,
	watchers: Vec<Subscription>,
}

impl LocalRoute {
	fn detach(self) {
		for watcher in self.watchers {
			watcher.unsubscribe();
		}
	}
}

struct ComponentInner {
	ctx: AppContext,
	name: String,
	template: ComponentTemplate,
	custom: RefCell<Vec<CustomAction>>,
	/// Window listeners keyed by action name.
	global: RefCell<Vec<(String, ListenerHandle)>>,
	local: RefCell<Vec<LocalRoute>>,
	update_watchers: RefCell<Vec<Subscription>>,
	watches_updates: Cell<bool>,
	updating: Cell<bool>,
	disposed: Cell<bool>,
}

impl ComponentInner {
	fn remember(&self, name: &str, action: ActionFn, hooks: ActionHooks) {
		let mut custom = self.custom.borrow_mut();
		match custom.iter_mut().find(|entry| entry.name == name) {
			Some(entry) => {
				entry.action = action;
				entry.hooks = hooks;
			}
			None => custom.push(CustomAction {
				name: name.to_string(),
				action,
				hooks,
			}),
		}
	}

	/// Keeps the window listener of the action `action`, dropping the one it
	/// replaces.
	fn set_global(&self, action: &str, handle: ListenerHandle) {
		let previous = {
			let mut global = self.global.borrow_mut();
			match global.iter().position(|(existing, _)| existing == action) {
				Some(index) => Some(std::mem::replace(&mut global[index].1, handle)),
				None => {
					global.push((action.to_string(), handle));
					None
				}
			}
		};
		drop(previous);
	}

	fn broadcast_update(&self) {
		if self.updating.replace(true) {
			return;
		}
		debug_log!("Component '{}' broadcasting {}", self.name, UPDATE_ACTION);
		self.template.fire_action(UPDATE_ACTION, ());
		self.updating.set(false);
	}
}

/// A namespaced set of managed elements with lifecycle hooks and event
/// routing.
///
/// Clones share the same component. Dropping the last clone detaches every
/// listener, like [`Component::dispose`] without releasing the nodes.
#[derive(Clone)]
pub struct Component {
	inner: Rc<ComponentInner>,
}

impl Component {
	/// Discovers the elements with class `<prefix>-<name>`.
	pub fn new(ctx: &AppContext, name: &str) -> Result<Self, PagesError> {
		let marker = Marker::class(ctx.settings().component_marker(name));
		let template = ComponentTemplate::new(ctx, marker)?;
		info_log!("Component '{}' created with {} instance(s)", name, template.len());
		Ok(Self {
			inner: Rc::new(ComponentInner {
				ctx: ctx.clone(),
				name: name.to_string(),
				template,
				custom: RefCell::new(Vec::new()),
				global: RefCell::new(Vec::new()),
				local: RefCell::new(Vec::new()),
				update_watchers: RefCell::new(Vec::new()),
				watches_updates: Cell::new(false),
				updating: Cell::new(false),
				disposed: Cell::new(false),
			}),
		})
	}

	/// Component name.
	pub fn name(&self) -> &str {
		&self.inner.name
	}

	/// The underlying template.
	pub fn template(&self) -> &ComponentTemplate {
		&self.inner.template
	}

	/// Instance identities in document order.
	pub fn ids(&self) -> Vec<String> {
		self.inner.template.ids()
	}

	/// The node of instance `id`.
	pub fn node(&self, id: &str) -> Option<ManagedNode> {
		self.inner.template.node(id)
	}

	/// Registers `action` as `onLoad` and fires it on every instance at the
	/// first window `load` event.
	pub fn on_load<F>(&self, action: F) -> Result<(), PagesError>
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(LOAD_ACTION, Rc::new(action), ActionHooks::default());
		let weak = Rc::downgrade(&self.inner);
		let fired = Cell::new(false);
		let handle = self.inner.ctx.window().listen(
			LOAD_EVENT,
			Rc::new(move |_: &Event| {
				if fired.replace(true) {
					return;
				}
				if let Some(inner) = weak.upgrade() {
					debug_log!("Component '{}' received load", inner.name);
					inner.template.fire_action(LOAD_ACTION, ());
				}
			}),
		)?;
		self.inner.set_global(LOAD_ACTION, handle);
		Ok(())
	}

	/// Registers `action` as `onUpdate` and fires it on every instance
	/// whenever an action completes on any instance.
	///
	/// Actions fired while `onUpdate` is broadcasting do not trigger another
	/// broadcast.
	pub fn on_update<F>(&self, action: F)
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(UPDATE_ACTION, Rc::new(action), ActionHooks::default());
		self.inner.watches_updates.set(true);
		self.watch_updates();
	}

	/// Registers `action` as `on<event>` and broadcasts it, with the event as
	/// payload, on every window `event`.
	pub fn on_event_global<F>(&self, event: &str, action: F) -> Result<(), PagesError>
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		let name = event_action_name(event);
		self.register(&name, Rc::new(action), ActionHooks::default());
		let weak = Rc::downgrade(&self.inner);
		let target = name.clone();
		let handle = self.inner.ctx.window().listen(
			event,
			Rc::new(move |raw: &Event| {
				if let Some(inner) = weak.upgrade() {
					debug_log!("Component '{}' received global '{}'", inner.name, raw.event_type());
					inner.template.fire_action(&target, raw.clone());
				}
			}),
		)?;
		info_log!("Component '{}' listening for global '{}'", self.inner.name, event);
		self.inner.set_global(&name, handle);
		Ok(())
	}

	/// Registers `action` as `on<event>` and fires it on an instance when
	/// `event` reaches that instance's element.
	///
	/// The listener stays on the element bound at the time of the call. When
	/// an action replaces that element a warning is logged and the instance
	/// stops receiving `event`.
	pub fn on_event_local<F>(&self, event: &str, action: F) -> Result<(), PagesError>
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(&event_action_name(event), Rc::new(action), ActionHooks::default());
		self.route_local(event, false)
	}

	/// Like [`Component::on_event_local`], but moves the listener onto every
	/// replacement element.
	pub fn on_event_local_tracked<F>(&self, event: &str, action: F) -> Result<(), PagesError>
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(&event_action_name(event), Rc::new(action), ActionHooks::default());
		self.route_local(event, true)
	}

	/// Registers (or replaces) the action `name` on every instance.
	pub fn add_action<F>(&self, name: impl Into<String>, action: F)
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(&name.into(), Rc::new(action), ActionHooks::default());
	}

	/// Registers (or replaces) the action `name` on every instance, with hooks.
	pub fn add_action_with<F>(&self, name: impl Into<String>, action: F, hooks: ActionHooks)
	where
		F: Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static,
	{
		self.register(&name.into(), Rc::new(action), hooks);
	}

	/// Removes the action `name` from every instance.
	pub fn remove_action(&self, name: &str) -> Result<(), PagesError> {
		self.inner.custom.borrow_mut().retain(|entry| entry.name != name);
		self.inner.template.remove_action(name)
	}

	/// Fires the action `name` on every instance.
	pub fn fire_action(&self, name: &str, payload: impl Into<Payload>) {
		self.inner.template.fire_action(name, payload);
	}

	/// Fires the action `name` on instance `id` only.
	pub fn fire_action_on(&self, id: &str, name: &str, payload: impl Into<Payload>) -> Result<(), PagesError> {
		self.inner.template.fire_action_on(id, name, payload)
	}

	/// Action names of the first instance.
	pub fn actions_list(&self) -> Vec<String> {
		self.inner.template.actions_list()
	}

	/// Observes every instance's bound element.
	pub fn side_effect(&self, observer: Observer<Element>) -> Vec<Subscription> {
		self.inner.template.side_effect(observer)
	}

	/// Re-runs discovery, then restores the custom actions, the `onUpdate`
	/// wiring and the local routes on the new instances.
	pub fn regenerate(&self) -> Result<(), PagesError> {
		if self.is_disposed() {
			return Err(PagesError::Released(self.inner.name.clone()));
		}
		self.unwatch_updates();
		let routes: Vec<(String, bool)> = {
			let mut local = self.inner.local.borrow_mut();
			std::mem::take(&mut *local)
				.into_iter()
				.map(|route| {
					let key = (route.event.clone(), route.tracked);
					route.detach();
					key
				})
				.collect()
		};

		self.inner.template.regenerate()?;

		for entry in self.inner.custom.borrow().iter() {
			self.inner
				.template
				.register(&entry.name, Rc::clone(&entry.action), entry.hooks.clone());
		}
		if self.inner.watches_updates.get() {
			self.watch_updates();
		}
		for (event, tracked) in routes {
			self.route_local(&event, tracked)?;
		}
		info_log!("Component '{}' regenerated with {} instance(s)", self.inner.name, self.inner.template.len());
		Ok(())
	}

	/// Detaches every listener and releases every instance.
	pub fn dispose(&self) {
		if self.inner.disposed.replace(true) {
			return;
		}
		self.inner.global.borrow_mut().clear();
		let routes = std::mem::take(&mut *self.inner.local.borrow_mut());
		for route in routes {
			route.detach();
		}
		self.unwatch_updates();
		self.inner.custom.borrow_mut().clear();
		self.inner.template.release();
		debug_log!("Component '{}' disposed", self.inner.name);
	}

	/// Returns true once [`Component::dispose`] was called.
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}

	fn register(&self, name: &str, action: ActionFn, hooks: ActionHooks) {
		if self.is_disposed() {
			warn_log!("Cannot add action '{}' to disposed component '{}'", name, self.inner.name);
			return;
		}
		self.inner.remember(name, Rc::clone(&action), hooks.clone());
		self.inner.template.register(name, action, hooks);
	}

	fn watch_updates(&self) {
		self.unwatch_updates();
		let watchers = self
			.inner
			.template
			.nodes()
			.iter()
			.map(|node| {
				let weak = Rc::downgrade(&self.inner);
				node.subscribe_changes(Observer::new(move |_: &Element| {
					if let Some(inner) = weak.upgrade() {
						inner.broadcast_update();
					}
				}))
			})
			.collect();
		*self.inner.update_watchers.borrow_mut() = watchers;
	}

	fn unwatch_updates(&self) {
		let watchers = std::mem::take(&mut *self.inner.update_watchers.borrow_mut());
		for watcher in watchers {
			watcher.unsubscribe();
		}
	}

	fn route_local(&self, event: &str, tracked: bool) -> Result<(), PagesError> {
		let name = Rc::<str>::from(event_action_name(event));
		let mut listeners = Vec::new();
		let mut watchers = Vec::new();
		for node in self.inner.template.nodes() {
			let id = node.identity().value().to_string();
			let element = node.element()?;
			let listener = Rc::new(LocalListener {
				element: RefCell::new(element.clone()),
				handle: RefCell::new(None),
			});
			let handle = listen_local(Rc::downgrade(&self.inner), &element, event, &id, &name)?;
			*listener.handle.borrow_mut() = Some(handle);
			watchers.push(node.subscribe_changes(local_watcher(
				Rc::downgrade(&self.inner),
				Rc::downgrade(&listener),
				event,
				id,
				Rc::clone(&name),
				tracked,
			)));
			listeners.push(listener);
		}

		info_log!(
			"Component '{}' listening for local '{}' on {} instance(s)",
			self.inner.name,
			event,
			listeners.len()
		);
		let route = LocalRoute {
			event: event.to_string(),
			tracked,
			listeners,
			watchers,
		};
		let previous = {
			let mut local = self.inner.local.borrow_mut();
			match local.iter().position(|existing| existing.event == event) {
				Some(index) => Some(std::mem::replace(&mut local[index], route)),
				None => {
					local.push(route);
					None
				}
			}
		};
		if let Some(previous) = previous {
			previous.detach();
		}
		Ok(())
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let local: Vec<(String, usize)> = self
			.inner
			.local
			.borrow()
			.iter()
			.map(|route| (route.event.clone(), route.listeners.len()))
			.collect();
		f.debug_struct("Component")
			.field("name", &self.inner.name)
			.field("template", &self.inner.template)
			.field("local", &local)
			.field("disposed", &self.is_disposed())
			.finish()
	}
}

fn listen_local(
	component: Weak<ComponentInner>,
	element: &Element,
	event: &str,
	id: &str,
	name: &Rc<str>,
) -> Result<ListenerHandle, PagesError> {
	let id = id.to_string();
	let name = Rc::clone(name);
	let handle = element.listen(
		event,
		Rc::new(move |raw: &Event| {
			let Some(inner) = component.upgrade() else {
				return;
			};
			debug_log!("Component '{}' instance {} received local '{}'", inner.name, id, raw.event_type());
			if let Err(err) = inner.template.fire_action_on(&id, &name, raw.clone()) {
				warn_log!("Local '{}' on stale instance {}: {}", raw.event_type(), id, err);
			}
		}),
	)?;
	Ok(handle)
}

fn local_watcher(
	component: Weak<ComponentInner>,
	listener: Weak<LocalListener>,
	event: &str,
	id: String,
	name: Rc<str>,
	tracked: bool,
) -> Observer<Element> {
	let event = event.to_string();
	Observer::new(move |next: &Element| {
		let Some(listener) = listener.upgrade() else {
			return;
		};
		if *listener.element.borrow() == *next {
			return;
		}
		if !tracked {
			let Some(inner) = component.upgrade() else {
				return;
			};
			if listener.handle.borrow().is_some() {
				warn_log!(
					"Component '{}' instance {} was replaced; its local '{}' listener stays on the old element",
					inner.name,
					id,
					event
				);
			}
			// Warn once per replacement chain.
			*listener.element.borrow_mut() = next.clone();
			return;
		}
		match listen_local(component.clone(), next, &event, &id, &name) {
			Ok(handle) => {
				let previous = listener.handle.replace(Some(handle));
				*listener.element.borrow_mut() = next.clone();
				drop(previous);
			}
			Err(err) => error_log!("Could not move local '{}' listener of {}: {}", event, id, err),
		}
	})
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::dom::Document;
	use rstest::{fixture, rstest};

	fn page(instances: usize) -> (AppContext, Vec<Element>) {
		let document = Document::new();
		let body = document.body();
		let elements = (0..instances)
			.map(|_| {
				let element = document.create_element("button").unwrap();
				element.set_attribute("class", "mag-card").unwrap();
				body.append_child(&element).unwrap();
				element
			})
			.collect();
		(AppContext::with_defaults(document), elements)
	}

	#[fixture]
	fn three() -> (AppContext, Vec<Element>) {
		page(3)
	}

	fn counting(count: &Rc<Cell<u32>>) -> impl Fn(&Element, &Payload) -> Result<Element, ActionError> + 'static {
		let count = Rc::clone(count);
		move |element: &Element, _: &Payload| {
			count.set(count.get() + 1);
			Ok(element.clone())
		}
	}

	#[rstest]
	fn test_event_action_name() {
		assert_eq!(event_action_name("click"), "onclick");
		assert_eq!(event_action_name("i18n_update"), "oni18n_update");
	}

	#[rstest]
	fn test_marker_is_namespaced(three: (AppContext, Vec<Element>)) {
		let (ctx, _) = three;

		let component = Component::new(&ctx, "card").unwrap();

		assert_eq!(component.template().marker(), &Marker::class("mag-card"));
		assert_eq!(component.ids().len(), 3);
	}

	#[rstest]
	fn test_on_load_fires_once(three: (AppContext, Vec<Element>)) {
		let (ctx, _) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_load(counting(&count)).unwrap();

		ctx.window().dispatch_event(&Event::new("load").unwrap()).unwrap();
		ctx.window().dispatch_event(&Event::new("load").unwrap()).unwrap();

		assert_eq!(count.get(), 3);
		assert!(component.actions_list().contains(&LOAD_ACTION.to_string()));
	}

	#[rstest]
	fn test_local_listener_pinned_after_replace(three: (AppContext, Vec<Element>)) {
		let (ctx, elements) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_event_local("click", counting(&count)).unwrap();
		let first = component.ids()[0].clone();
		let replacement = ctx.document().create_element("button").unwrap();

		component.fire_action_on(&first, "replace", replacement.clone()).unwrap();
		elements[0].dispatch_event(&Event::new("click").unwrap()).unwrap();
		replacement.dispatch_event(&Event::new("click").unwrap()).unwrap();

		// The detached original still routes; the replacement does not.
		assert_eq!(count.get(), 1);
	}

	#[rstest]
	fn test_tracked_local_listener_follows_replace(three: (AppContext, Vec<Element>)) {
		let (ctx, elements) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_event_local_tracked("click", counting(&count)).unwrap();
		let first = component.ids()[0].clone();
		let replacement = ctx.document().create_element("button").unwrap();

		component.fire_action_on(&first, "replace", replacement.clone()).unwrap();
		elements[0].dispatch_event(&Event::new("click").unwrap()).unwrap();
		replacement.dispatch_event(&Event::new("click").unwrap()).unwrap();

		assert_eq!(count.get(), 1);
		assert!(replacement.is_connected());
	}

	#[rstest]
	fn test_on_update_does_not_recurse(three: (AppContext, Vec<Element>)) {
		let (ctx, _) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_update(counting(&count));

		let first = component.ids()[0].clone();
		component.fire_action_on(&first, "innerHTML", "changed").unwrap();

		assert_eq!(count.get(), 3);
	}

	#[rstest]
	fn test_dispose_detaches_everything(three: (AppContext, Vec<Element>)) {
		let (ctx, elements) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_event_local("click", counting(&count)).unwrap();
		component.on_event_global("scroll", counting(&count)).unwrap();

		component.dispose();
		elements[1].dispatch_event(&Event::new("click").unwrap()).unwrap();
		ctx.window().dispatch_event(&Event::new("scroll").unwrap()).unwrap();

		assert_eq!(count.get(), 0);
		assert!(component.is_disposed());
		assert!(ctx.bindings().is_empty());
		assert!(component.regenerate().is_err());
	}

	#[rstest]
	fn test_regenerate_restores_routes(three: (AppContext, Vec<Element>)) {
		let (ctx, _) = three;
		let component = Component::new(&ctx, "card").unwrap();
		let count = Rc::new(Cell::new(0));
		component.on_event_local("click", counting(&count)).unwrap();
		component.add_action("mark", |element: &Element, _: &Payload| Ok(element.clone()));
		let extra = ctx.document().create_element("button").unwrap();
		extra.set_attribute("class", "mag-card").unwrap();
		ctx.document().body().append_child(&extra).unwrap();

		component.regenerate().unwrap();
		extra.dispatch_event(&Event::new("click").unwrap()).unwrap();

		assert_eq!(component.ids().len(), 4);
		assert_eq!(count.get(), 1);
		assert!(component.actions_list().contains(&"mark".to_string()));
	}
}
