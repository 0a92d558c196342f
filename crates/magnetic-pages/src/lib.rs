//! Magnetic Pages - reactive state-to-DOM bindings
//!
//! Binds application state to elements of an existing page. Elements are
//! declared by marker in the markup; the engine gives each one a stable
//! identity and an action dispatcher, and application code mutates them by
//! firing named actions.
//!
//! ## Features
//!
//! - **Managed nodes**: one identity, one live element, an ordered action
//!   registry pre-filled with `innerHTML`, `opacity`, `transform`,
//!   `appendChild`, `appendSibling`, `replace` and `remove`
//! - **Components**: marker discovery, identity assignment, lifecycle hooks
//!   and global/local event routing
//! - **Event streams**: window, element and media-query events as subscribable
//!   sequences keyed by subscription id
//! - **Two DOM backends**: `web-sys` in the browser, an in-memory document
//!   everywhere else
//!
//! ## Architecture
//!
//! - [`dom`]: DOM abstraction layer
//! - [`context`]: application context and identity binding table
//! - [`identity`]: element identities
//! - [`node`]: managed nodes and default actions
//! - [`component`]: component templates and components
//! - [`events`]: event streams, media queries, custom events
//! - [`property`]: editable nodes
//! - [`logging`]: logging macros
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_core::reactive::{Observer, State};
//! use magnetic_pages::{AppContext, Component, MediaQuery};
//!
//! let ctx = AppContext::from_window(Default::default())?;
//!
//! let is_mobile = State::new(false);
//! let mobile = MediaQuery::width(&ctx.window(), Some(768), None)?;
//! let target = is_mobile.clone();
//! mobile.subscribe("app", Observer::new(move |m: &bool| target.update(*m)))?;
//!
//! let cards = Component::new(&ctx, "card")?;
//! cards.on_event_local("click", |element, _| {
//!     element.set_attribute("aria-pressed", "true")?;
//!     Ok(element.clone())
//! })?;
//! ```

#![warn(missing_docs)]

pub mod component;
pub mod context;
pub mod dom;
pub mod error;
pub mod events;
pub mod identity;
pub mod logging;
pub mod node;
pub mod property;

pub use component::{Component, ComponentTemplate, LOAD_ACTION, Marker, UPDATE_ACTION, event_action_name};
pub use context::{AppContext, BindingTable};
pub use error::{ActionError, PagesError};
pub use events::{EventStream, MediaQuery, dispatch_custom};
pub use identity::Identity;
pub use node::{ActionFn, ActionHooks, ManagedNode, Payload};
pub use property::{EditableNode, Property};

// Used by the logging macros.
#[doc(hidden)]
pub use tracing as __tracing;
#[cfg(target_arch = "wasm32")]
#[doc(hidden)]
pub use web_sys as __web_sys;
