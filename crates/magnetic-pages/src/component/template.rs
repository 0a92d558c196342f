//! Component template: marker discovery and identity assignment.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use magnetic_core::reactive::{Observer, Subscription};

use crate::context::AppContext;
use crate::dom::{Document, Element};
use crate::error::{ActionError, PagesError};
use crate::identity::{Identity, generate_identity_value};
use crate::node::{ActionFn, ActionHooks, ManagedNode, Payload};
use crate::{debug_log, warn_log};

/// Predicate selecting the elements of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
	/// Elements carrying the class.
	Class(String),
	/// Elements carrying the attribute, optionally with an exact value.
	Attribute {
		/// Attribute name.
		name: String,
		/// Required value; `None` matches any value.
		value: Option<String>,
	},
}

impl Marker {
	/// Class marker.
	pub fn class(class: impl Into<String>) -> Self {
		Self::Class(class.into())
	}

	/// Attribute marker matching any value.
	pub fn attribute(name: impl Into<String>) -> Self {
		Self::Attribute {
			name: name.into(),
			value: None,
		}
	}

	/// Attribute marker matching one value.
	pub fn attribute_value(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Attribute {
			name: name.into(),
			value: Some(value.into()),
		}
	}

	/// Matching connected elements, in document order.
	pub fn find(&self, document: &Document) -> Vec<Element> {
		match self {
			Self::Class(class) => document.elements_by_class(class),
			Self::Attribute { name, value } => document.elements_with_attribute(name, value.as_deref()),
		}
	}

	/// Returns true if `element` matches.
	pub fn matches(&self, element: &Element) -> bool {
		match self {
			Self::Class(class) => element.has_class(class),
			Self::Attribute { name, value: None } => element.has_attribute(name),
			Self::Attribute {
				name,
				value: Some(value),
			} => element.get_attribute(name).as_deref() == Some(value.as_str()),
		}
	}
}

impl fmt::Display for Marker {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Class(class) => write!(f, ".{}", class),
			Self::Attribute { name, value: None } => write!(f, "[{}]", name),
			Self::Attribute {
				name,
				value: Some(value),
			} => write!(f, "[{}=\"{}\"]", name, value),
		}
	}
}

struct TemplateInner {
	ctx: AppContext,
	marker: Marker,
	nodes: RefCell<Vec<(String, ManagedNode)>>,
}

/// Every element matching a [`Marker`], each bound to its own
/// [`ManagedNode`].
///
/// Elements without a `data-<prefix>-id` get a generated one at discovery.
/// The node set is fixed until [`ComponentTemplate::regenerate`], and action
/// calls fan out over it in document order.
///
/// Clones share the same node set.
#[derive(Clone)]
pub struct ComponentTemplate {
	inner: Rc<TemplateInner>,
}

impl ComponentTemplate {
	/// Discovers the elements matching `marker`.
	pub fn new(ctx: &AppContext, marker: Marker) -> Result<Self, PagesError> {
		let nodes = discover(ctx, &marker)?;
		debug_log!("Template {} discovered {} element(s)", marker, nodes.len());
		Ok(Self {
			inner: Rc::new(TemplateInner {
				ctx: ctx.clone(),
				marker,
				nodes: RefCell::new(nodes),
			}),
		})
	}

	/// The template marker.
	pub fn marker(&self) -> &Marker {
		&self.inner.marker
	}

	/// Instance identities in document order.
	pub fn ids(&self) -> Vec<String> {
		self.inner
			.nodes
			.borrow()
			.iter()
			.map(|(id, _)| id.clone())
			.collect()
	}

	/// Number of instances.
	pub fn len(&self) -> usize {
		self.inner.nodes.borrow().len()
	}

	/// Returns true if no element matched.
	pub fn is_empty(&self) -> bool {
		self.inner.nodes.borrow().is_empty()
	}

	/// The node of instance `id`.
	pub fn node(&self, id: &str) -> Option<ManagedNode> {
		self.inner
			.nodes
			.borrow()
			.iter()
			.find(|(existing, _)| existing == id)
			.map(|(_, node)| node.clone())
	}

	/// All nodes in document order.
	pub fn nodes(&self) -> Vec<ManagedNode> {
		self.inner
			.nodes
			.borrow()
			.iter()
			.map(|(_, node)| node.clone())
			.collect()
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

	pub(crate) fn register(&self, name: &str, action: ActionFn, hooks: ActionHooks) {
		for node in self.nodes() {
			node.register(name.to_string(), Rc::clone(&action), hooks.clone());
		}
	}

	/// Removes the action `name` from every instance.
	///
	/// Fails with [`PagesError::UnknownAction`] if an instance does not have
	/// it; the instances that do still lose it.
	pub fn remove_action(&self, name: &str) -> Result<(), PagesError> {
		let mut result = Ok(());
		for node in self.nodes() {
			if let Err(err) = node.remove_action(name) {
				result = Err(err);
			}
		}
		result
	}

	/// Fires the action `name` on every instance, in document order.
	pub fn fire_action(&self, name: &str, payload: impl Into<Payload>) {
		let payload = payload.into();
		for node in self.nodes() {
			node.fire_action(name, payload.clone());
		}
	}

	/// Fires the action `name` on instance `id` only.
	pub fn fire_action_on(&self, id: &str, name: &str, payload: impl Into<Payload>) -> Result<(), PagesError> {
		let node = self
			.node(id)
			.ok_or_else(|| PagesError::ElementNotFound(id.to_string()))?;
		node.fire_action(name, payload);
		Ok(())
	}

	/// Action names of the first instance.
	pub fn actions_list(&self) -> Vec<String> {
		self.inner
			.nodes
			.borrow()
			.first()
			.map(|(_, node)| node.actions_list())
			.unwrap_or_default()
	}

	/// Observes every instance's bound element. Returns one subscription per
	/// instance.
	pub fn side_effect(&self, observer: Observer<Element>) -> Vec<Subscription> {
		self.nodes()
			.iter()
			.map(|node| node.side_effect(observer.clone()))
			.collect()
	}

	/// Re-runs discovery. The previous nodes are released first, so handles
	/// to them go stale.
	pub fn regenerate(&self) -> Result<(), PagesError> {
		self.release();
		let nodes = discover(&self.inner.ctx, &self.inner.marker)?;
		debug_log!("Template {} rediscovered {} element(s)", self.inner.marker, nodes.len());
		*self.inner.nodes.borrow_mut() = nodes;
		Ok(())
	}

	/// Releases every node and empties the template.
	pub fn release(&self) {
		let nodes = std::mem::take(&mut *self.inner.nodes.borrow_mut());
		for (_, node) in nodes {
			node.release();
		}
	}
}

impl fmt::Debug for ComponentTemplate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ComponentTemplate")
			.field("marker", &self.inner.marker)
			.field("ids", &self.ids())
			.finish()
	}
}

fn discover(ctx: &AppContext, marker: &Marker) -> Result<Vec<(String, ManagedNode)>, PagesError> {
	let attribute = ctx.settings().identity_attribute();
	let elements = marker.find(ctx.document());
	if elements.is_empty() {
		warn_log!("No element matches {}", marker);
	}

	let mut nodes = Vec::with_capacity(elements.len());
	for element in elements {
		let value = match element.get_attribute(&attribute) {
			Some(value) => value,
			None => {
				let value = generate_identity_value();
				if ctx.document().query_attribute(&attribute, &value).is_some() {
					return Err(PagesError::IdentityCollision(value));
				}
				element.set_attribute(&attribute, &value)?;
				value
			}
		};
		let node = ManagedNode::bind(ctx, Identity::marker(attribute.clone(), value.clone()), element)?;
		nodes.push((value, node));
	}
	Ok(nodes)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::dom::Document;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;
	use std::collections::HashSet;

	struct Page {
		ctx: AppContext,
		cards: Vec<Element>,
	}

	#[fixture]
	fn page() -> Page {
		let document = Document::new();
		let body = document.body();
		let cards = (0..3)
			.map(|_| {
				let card = document.create_element("div").unwrap();
				card.set_attribute("class", "mag-card").unwrap();
				body.append_child(&card).unwrap();
				card
			})
			.collect();
		Page {
			ctx: AppContext::with_defaults(document),
			cards,
		}
	}

	// ==========================================================================
	// Discovery
	// ==========================================================================

	#[rstest]
	fn test_discovery_assigns_unique_identities(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();

		let ids = template.ids();
		assert_eq!(ids.len(), 3);
		assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
		for (card, id) in page.cards.iter().zip(&ids) {
			assert_eq!(card.get_attribute("data-mag-id").as_deref(), Some(id.as_str()));
		}
	}

	#[rstest]
	fn test_existing_identity_is_kept(page: Page) {
		page.cards[1].set_attribute("data-mag-id", "fixed").unwrap();

		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();

		assert_eq!(template.ids()[1], "fixed");
		assert!(template.node("fixed").is_some());
	}

	#[rstest]
	fn test_overlapping_templates_collide(page: Page) {
		let _cards = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();

		let again = ComponentTemplate::new(&page.ctx, Marker::attribute("data-mag-id"));

		assert!(matches!(again, Err(PagesError::IdentityCollision(_))));
	}

	#[rstest]
	fn test_attribute_marker_with_value(page: Page) {
		page.cards[2].set_attribute("data-role", "menu").unwrap();

		let template = ComponentTemplate::new(&page.ctx, Marker::attribute_value("data-role", "menu")).unwrap();

		assert_eq!(template.len(), 1);
		assert!(template.marker().matches(&page.cards[2]));
		assert!(!template.marker().matches(&page.cards[0]));
	}

	// ==========================================================================
	// Broadcast
	// ==========================================================================

	#[rstest]
	fn test_fire_action_fans_out_in_document_order(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();
		let order = Rc::new(RefCell::new(Vec::new()));
		let sink = order.clone();
		template.add_action("mark", move |element: &Element, _: &Payload| {
			sink.borrow_mut().push(element.get_attribute("data-mag-id").unwrap_or_default());
			Ok(element.clone())
		});

		template.fire_action("mark", ());

		assert_eq!(*order.borrow(), template.ids());
	}

	#[rstest]
	fn test_fire_action_on_one_instance(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();
		let second = template.ids()[1].clone();

		template.fire_action_on(&second, "innerHTML", "two").unwrap();

		assert_eq!(page.cards[0].inner_html(), "");
		assert_eq!(page.cards[1].inner_html(), "two");
		assert!(template.fire_action_on("missing", "innerHTML", "x").is_err());
	}

	#[rstest]
	fn test_remove_action_everywhere(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();
		template.add_action("mark", |element: &Element, _: &Payload| Ok(element.clone()));

		template.remove_action("mark").unwrap();

		assert!(!template.actions_list().contains(&"mark".to_string()));
		assert!(matches!(template.remove_action("mark"), Err(PagesError::UnknownAction(_))));
	}

	#[rstest]
	fn test_side_effect_returns_one_subscription_per_instance(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();
		let seen = Rc::new(RefCell::new(0));
		let sink = seen.clone();

		let subscriptions = template.side_effect(Observer::new(move |_: &Element| *sink.borrow_mut() += 1));

		assert_eq!(subscriptions.len(), 3);
		assert_eq!(*seen.borrow(), 3);
	}

	// ==========================================================================
	// Regenerate / release
	// ==========================================================================

	#[rstest]
	fn test_regenerate_picks_up_new_elements(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();
		let old = template.nodes();
		let extra = page.ctx.document().create_element("div").unwrap();
		extra.set_attribute("class", "mag-card").unwrap();
		page.ctx.document().body().append_child(&extra).unwrap();

		template.regenerate().unwrap();

		assert_eq!(template.len(), 4);
		assert!(old.iter().all(ManagedNode::is_released));
		assert_eq!(template.ids()[..3], old.iter().map(|n| n.identity().value().to_string()).collect::<Vec<_>>()[..]);
	}

	#[rstest]
	fn test_release_frees_identities(page: Page) {
		let template = ComponentTemplate::new(&page.ctx, Marker::class("mag-card")).unwrap();

		template.release();

		assert!(template.is_empty());
		assert!(page.ctx.bindings().is_empty());
	}
}
