//! Action payloads.

use serde_json::Value;

use crate::dom::{Element, Event, Position};

/// Value passed to an action transform alongside the bound element.
#[derive(Debug, Clone, Default)]
pub enum Payload {
	/// No payload.
	#[default]
	None,
	/// Text, e.g. markup for `innerHTML` or a CSS value.
	Text(String),
	/// A number, e.g. an opacity.
	Number(f64),
	/// An element, e.g. for `appendChild` or `replace`.
	Element(Element),
	/// An element and where to insert it, for `appendSibling`.
	Adjacent {
		/// Element to insert.
		element: Element,
		/// Insertion position relative to the bound element.
		position: Position,
	},
	/// The raw event that triggered the action.
	Event(Event),
	/// Arbitrary structured data.
	Json(Value),
}

impl Payload {
	/// Returns true for [`Payload::None`].
	pub fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}

	/// Text content, if the payload is text.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Json(Value::String(text)) => Some(text),
			_ => None,
		}
	}

	/// Numeric content, if the payload is a number.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(number) => Some(*number),
			Self::Json(value) => value.as_f64(),
			_ => None,
		}
	}

	/// Element content, if the payload carries an element.
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) | Self::Adjacent { element, .. } => Some(element),
			_ => None,
		}
	}

	/// The triggering event, if any.
	pub fn as_event(&self) -> Option<&Event> {
		match self {
			Self::Event(event) => Some(event),
			_ => None,
		}
	}

	/// Custom event detail or JSON content.
	pub fn detail(&self) -> Option<Value> {
		match self {
			Self::Event(event) => event.detail(),
			Self::Json(value) => Some(value.clone()),
			_ => None,
		}
	}

	/// Text or number rendered as a CSS value.
	pub fn css_value(&self) -> Option<String> {
		self.as_text()
			.map(str::to_string)
			.or_else(|| self.as_number().map(|number| number.to_string()))
	}

	/// Short name of the payload kind, for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Text(_) => "text",
			Self::Number(_) => "number",
			Self::Element(_) => "element",
			Self::Adjacent { .. } => "adjacent element",
			Self::Event(_) => "event",
			Self::Json(_) => "json",
		}
	}
}

impl From<()> for Payload {
	fn from(_: ()) -> Self {
		Self::None
	}
}

impl From<&str> for Payload {
	fn from(text: &str) -> Self {
		Self::Text(text.to_string())
	}
}

impl From<String> for Payload {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<f64> for Payload {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<i32> for Payload {
	fn from(number: i32) -> Self {
		Self::Number(f64::from(number))
	}
}

impl From<Element> for Payload {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<(Element, Position)> for Payload {
	fn from((element, position): (Element, Position)) -> Self {
		Self::Adjacent { element, position }
	}
}

impl From<Event> for Payload {
	fn from(event: Event) -> Self {
		Self::Event(event)
	}
}

impl From<Value> for Payload {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}
