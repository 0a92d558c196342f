//! Editable nodes
//!
//! An [`EditableNode`] keeps a [`State`] and writes it into properties of one
//! element every time it changes. Each property has its own rendering of the
//! value.
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_pages::{EditableNode, Property};
//!
//! let counter = EditableNode::new(&ctx, "counter", 0_u32)?;
//! counter.set_property(Property::TextContent, |n: &u32| n.to_string());
//! counter.set_property(Property::Attribute("data-count".into()), |n: &u32| n.to_string());
//! counter.update(3);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use magnetic_core::reactive::{HandlerError, Observer, State, Subscription};

use crate::context::AppContext;
use crate::dom::{DomError, Element};
use crate::error::PagesError;
use crate::node::ManagedNode;
use crate::{debug_log, error_log};

/// Element property an [`EditableNode`] writes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Property {
	/// Inner markup.
	InnerHtml,
	/// Text content.
	TextContent,
	/// A named attribute.
	Attribute(String),
	/// A named inline style property.
	Style(String),
}

impl Property {
	fn write(&self, element: &Element, value: &str) -> Result<(), DomError> {
		match self {
			Self::InnerHtml => element.set_inner_html(value),
			Self::TextContent => element.set_text_content(value),
			Self::Attribute(name) => element.set_attribute(name, value)?,
			Self::Style(name) => element.set_style_property(name, value)?,
		}
		Ok(())
	}

	fn clear(&self, element: &Element) -> Result<(), DomError> {
		match self {
			Self::InnerHtml => element.set_inner_html(""),
			Self::TextContent => element.set_text_content(""),
			Self::Attribute(name) => element.remove_attribute(name)?,
			Self::Style(name) => element.set_style_property(name, "")?,
		}
		Ok(())
	}
}

impl fmt::Display for Property {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InnerHtml => f.write_str("innerHTML"),
			Self::TextContent => f.write_str("textContent"),
			Self::Attribute(name) => write!(f, "attribute '{}'", name),
			Self::Style(name) => write!(f, "style '{}'", name),
		}
	}
}

struct PropertyBinding {
	property: Property,
	subscription: Subscription,
}

/// A value bound to properties of the element with a given `id`.
pub struct EditableNode<T> {
	node: ManagedNode,
	state: State<T>,
	bindings: RefCell<Vec<PropertyBinding>>,
}

impl<T: Clone + 'static> EditableNode<T> {
	/// Binds the element whose `id` is `id`, starting from `initial`.
	pub fn new(ctx: &AppContext, id: &str, initial: T) -> Result<Self, PagesError> {
		Ok(Self {
			node: ManagedNode::by_id(ctx, id)?,
			state: State::new(initial),
			bindings: RefCell::new(Vec::new()),
		})
	}

	/// Writes `render(value)` into `property` now and after every update.
	/// Replaces an earlier rendering of the same property.
	pub fn set_property<F>(&self, property: Property, render: F)
	where
		F: Fn(&T) -> String + 'static,
	{
		let node = self.node.clone();
		let target = property.clone();
		let observer = Observer::fallible(move |value: &T| {
			let element = node.element().map_err(HandlerError::new)?;
			target.write(&element, &render(value)).map_err(HandlerError::new)
		});
		let label = property.to_string();
		let identity = self.node.identity().to_string();
		let observer = observer.on_error(move |err| {
			error_log!("Could not write {} of {}: {}", label, identity, err);
		});
		let subscription = self.state.subscribe(observer);

		let previous = {
			let mut bindings = self.bindings.borrow_mut();
			match bindings.iter().position(|binding| binding.property == property) {
				Some(index) => Some(std::mem::replace(&mut bindings[index].subscription, subscription)),
				None => {
					bindings.push(PropertyBinding { property, subscription });
					None
				}
			}
		};
		if let Some(previous) = previous {
			previous.unsubscribe();
		}
	}

	/// Stops writing `property` and clears it on the element.
	pub fn unset_property(&self, property: &Property) -> Result<(), PagesError> {
		let removed = {
			let mut bindings = self.bindings.borrow_mut();
			let index = bindings
				.iter()
				.position(|binding| binding.property == *property)
				.ok_or_else(|| PagesError::UnknownSubscription(property.to_string()))?;
			bindings.remove(index)
		};
		removed.subscription.unsubscribe();
		property.clear(&self.node.element()?)?;
		debug_log!("Unset {} of {}", property, self.node.identity());
		Ok(())
	}

	/// Properties currently written.
	pub fn properties(&self) -> Vec<Property> {
		self.bindings
			.borrow()
			.iter()
			.map(|binding| binding.property.clone())
			.collect()
	}

	/// Stores `value` and rewrites every property.
	pub fn update(&self, value: T) {
		self.state.update(value);
	}

	/// Current value.
	pub fn get(&self) -> T {
		self.state.get()
	}

	/// The backing state.
	pub fn state(&self) -> &State<T> {
		&self.state
	}

	/// The node of the bound element.
	pub fn node(&self) -> &ManagedNode {
		&self.node
	}

	/// Observes the value: the current one immediately, then every update.
	pub fn side_effect(&self, observer: Observer<T>) -> Subscription {
		self.state.subscribe(observer)
	}
}

impl<T: fmt::Debug> fmt::Debug for EditableNode<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let properties: Vec<String> = self
			.bindings
			.borrow()
			.iter()
			.map(|binding| binding.property.to_string())
			.collect();
		f.debug_struct("EditableNode")
			.field("node", &self.node)
			.field("state", &self.state)
			.field("properties", &properties)
			.finish()
	}
}
