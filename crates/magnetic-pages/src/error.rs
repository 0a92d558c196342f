//! Error types for the binding engine.

use thiserror::Error;

use crate::dom::DomError;

/// Failure of an action transform.
///
/// A failing action leaves its node bound to the last good element; the
/// element is marked with the `data-<prefix>-error` attribute until the next
/// successful action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
	/// The payload does not have the shape the action needs.
	#[error("Action '{action}' expects {expected} payload")]
	InvalidPayload {
		/// Action name.
		action: String,
		/// Description of the expected payload.
		expected: &'static str,
	},
	/// A DOM operation failed.
	#[error(transparent)]
	Dom(#[from] DomError),
	/// The transform reported a failure of its own.
	#[error("{0}")]
	Failed(String),
}

impl ActionError {
	/// Creates an [`ActionError::InvalidPayload`].
	pub fn invalid_payload(action: impl Into<String>, expected: &'static str) -> Self {
		Self::InvalidPayload {
			action: action.into(),
			expected,
		}
	}

	/// Creates an [`ActionError::Failed`].
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// Errors raised by nodes, templates, components and event streams.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PagesError {
	/// `unsubscribe` was called with an id that is not subscribed.
	#[error("No subscription with id '{0}'")]
	UnknownSubscription(String),
	/// `subscribe` was called with an id that is already subscribed.
	#[error("Subscription id '{0}' is already in use")]
	DuplicateSubscription(String),
	/// `remove_action` was called for an action that is not registered.
	#[error("No action named '{0}'")]
	UnknownAction(String),
	/// The identity is already bound by another live node.
	#[error("Identity '{0}' is already bound")]
	IdentityCollision(String),
	/// No element carries the identity.
	#[error("No element found for identity '{0}'")]
	ElementNotFound(String),
	/// The node was released and can no longer be used.
	#[error("Node '{0}' was released")]
	Released(String),
	/// A DOM operation failed.
	#[error(transparent)]
	Dom(#[from] DomError),
	/// A custom event detail could not be serialized.
	#[error("Failed to serialize event detail: {0}")]
	Serialize(#[from] serde_json::Error),
}
