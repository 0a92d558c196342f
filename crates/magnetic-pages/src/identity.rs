//! Element identities
//!
//! An [`Identity`] names one logical element independently of the DOM node
//! currently standing for it. It is either the element `id`, or a value of
//! the marker attribute (`data-<prefix>-id`) assigned during component
//! discovery.

use std::fmt;

use crate::dom::{Document, DomError, Element};

/// Stable name of a managed element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
	/// Resolved through the element `id` attribute.
	Id(String),
	/// Resolved through a marker attribute.
	Marker {
		/// Attribute name, e.g. `data-mag-id`.
		attribute: String,
		/// Attribute value.
		value: String,
	},
}

impl Identity {
	/// Identity resolved by element `id`.
	pub fn id(id: impl Into<String>) -> Self {
		Self::Id(id.into())
	}

	/// Identity resolved by a marker attribute.
	pub fn marker(attribute: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Marker {
			attribute: attribute.into(),
			value: value.into(),
		}
	}

	/// The identifying value (the `id`, or the marker attribute value).
	pub fn value(&self) -> &str {
		match self {
			Self::Id(id) => id,
			Self::Marker { value, .. } => value,
		}
	}

	/// Looks the identity up in the document.
	pub fn resolve(&self, document: &Document) -> Option<Element> {
		match self {
			Self::Id(id) => document.get_element_by_id(id),
			Self::Marker { attribute, value } => document.query_attribute(attribute, value),
		}
	}

	/// Returns true if `element` carries this identity.
	pub fn is_carried_by(&self, element: &Element) -> bool {
		match self {
			Self::Id(id) => element.get_attribute("id").as_deref() == Some(id),
			Self::Marker { attribute, value } => element.get_attribute(attribute).as_deref() == Some(value),
		}
	}

	/// Writes the identity onto `element`, so later lookups find it.
	pub fn stamp(&self, element: &Element) -> Result<(), DomError> {
		match self {
			Self::Id(id) => element.set_attribute("id", id),
			Self::Marker { attribute, value } => element.set_attribute(attribute, value),
		}
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Id(id) => write!(f, "#{}", id),
			Self::Marker { attribute, value } => write!(f, "[{}=\"{}\"]", attribute, value),
		}
	}
}

/// Generates a fresh marker value.
///
/// Values are random (UUID v4, simple form), so identities generated by
/// independent components do not collide in practice.
pub fn generate_identity_value() -> String {
	uuid::Uuid::new_v4().simple().to_string()
}
