//! Default node actions
//!
//! Every managed node starts with these actions registered, in this order.
//! Each one is a transform `(bound element, payload) -> next element`:
//!
//! | Name | Payload | Result |
//! |------|---------|--------|
//! | `innerHTML` | text | same element, content replaced |
//! | `opacity` | number or text | same element, `opacity` style set |
//! | `transform` | text | same element, `transform` style set |
//! | `appendChild` | element | same element, payload appended last |
//! | `appendSibling` | element + position | same element, payload inserted |
//! | `replace` | element | the payload element |
//! | `remove` | none | a fresh empty placeholder |

use std::rc::Rc;

use super::payload::Payload;
use super::ActionFn;
use crate::dom::{Element, Position};
use crate::error::ActionError;

/// Sets the element markup.
pub const INNER_HTML: &str = "innerHTML";
/// Sets the `opacity` style.
pub const OPACITY: &str = "opacity";
/// Sets the `transform` style.
pub const TRANSFORM: &str = "transform";
/// Appends a child element.
pub const APPEND_CHILD: &str = "appendChild";
/// Inserts an element next to or inside the bound element.
pub const APPEND_SIBLING: &str = "appendSibling";
/// Swaps the bound element for another one.
pub const REPLACE: &str = "replace";
/// Detaches the bound element, leaving a placeholder binding.
pub const REMOVE: &str = "remove";

/// Default actions in registration order. `placeholder_tag` is the element
/// created by `remove`.
pub(crate) fn defaults(placeholder_tag: &str) -> Vec<(&'static str, ActionFn)> {
	let tag = placeholder_tag.to_string();
	vec![
		(INNER_HTML, Rc::new(inner_html) as ActionFn),
		(OPACITY, Rc::new(opacity) as ActionFn),
		(TRANSFORM, Rc::new(transform) as ActionFn),
		(APPEND_CHILD, Rc::new(append_child) as ActionFn),
		(APPEND_SIBLING, Rc::new(append_sibling) as ActionFn),
		(REPLACE, Rc::new(replace) as ActionFn),
		(
			REMOVE,
			Rc::new(move |element: &Element, _: &Payload| remove(element, &tag)) as ActionFn,
		),
	]
}

/// Sets the markup of `element`.
pub fn inner_html(element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	let markup = payload
		.as_text()
		.ok_or_else(|| ActionError::invalid_payload(INNER_HTML, "a text"))?;
	element.set_inner_html(markup);
	Ok(element.clone())
}

/// Sets the `opacity` style of `element`.
pub fn opacity(element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	let value = payload
		.css_value()
		.ok_or_else(|| ActionError::invalid_payload(OPACITY, "a number or text"))?;
	element.set_style_property("opacity", &value)?;
	Ok(element.clone())
}

/// Sets the `transform` style of `element`.
pub fn transform(element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	let value = payload
		.css_value()
		.ok_or_else(|| ActionError::invalid_payload(TRANSFORM, "a text"))?;
	element.set_style_property("transform", &value)?;
	Ok(element.clone())
}

/// Appends the payload element as last child of `element`.
pub fn append_child(element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	let Payload::Element(child) = payload else {
		return Err(ActionError::invalid_payload(APPEND_CHILD, "an element"));
	};
	element.append_child(child)?;
	Ok(element.clone())
}

/// Inserts the payload element at the payload position. A bare element is
/// inserted at `beforeend`.
pub fn append_sibling(element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	let (other, position) = match payload {
		Payload::Adjacent { element, position } => (element, *position),
		Payload::Element(element) => (element, Position::BeforeEnd),
		_ => {
			return Err(ActionError::invalid_payload(
				APPEND_SIBLING,
				"an element with a position",
			));
		}
	};
	element.insert_adjacent(position, other)?;
	Ok(element.clone())
}

/// Returns the payload element; the node installs it in place of `element`.
pub fn replace(_element: &Element, payload: &Payload) -> Result<Element, ActionError> {
	match payload {
		Payload::Element(replacement) => Ok(replacement.clone()),
		_ => Err(ActionError::invalid_payload(REPLACE, "an element")),
	}
}

/// Detaches `element` and returns a fresh empty placeholder.
pub fn remove(element: &Element, placeholder_tag: &str) -> Result<Element, ActionError> {
	let placeholder = element.owner_document()?.create_element(placeholder_tag)?;
	element.remove();
	Ok(placeholder)
}
