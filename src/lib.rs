//! # Magnetic
//!
//! A reactive state-to-DOM binding engine.
//!
//! Pages declare elements by marker (a class such as `mag-card`, or an id);
//! Magnetic gives every discovered element a stable identity and an action
//! dispatcher, and application code mutates the page by firing named actions
//! or by pushing values through reactive containers.
//!
//! ## Feature Flags
//!
//! - `minimal` - Reactive primitives and settings only
//! - `pages` - DOM binding engine: nodes, components, event streams, media queries
//! - `i18n` - Text replacer and language selector (implies `pages`)
//! - `full` (default) - Everything, plus [`setup`](fn@setup)
//!
//! ## Modules
//!
//! - [`core`]: `State`, `Stream`, `Observer`, `Subscription`, `Settings`
//! - `pages`: `ManagedNode`, `Component`, `EventStream`, `MediaQuery`, ...
//! - `i18n`: `Catalog`, `TextReplacer`, `LangSelector`
//!
//! ## Example
//!
//! ```rust,ignore
//! use magnetic::prelude::*;
//! use std::rc::Rc;
//!
//! let ctx = AppContext::from_window(Settings::default())?;
//! let mut catalog = Catalog::new();
//! catalog.insert_json("en", include_str!("../i18n/en.json"))?;
//! catalog.insert_json("es", include_str!("../i18n/es.json"))?;
//!
//! let app = magnetic::setup(&ctx, Rc::new(catalog))?;
//! app.is_mobile.subscribe(Observer::new(|mobile: &bool| {
//!     tracing::info!("mobile layout: {}", mobile);
//! }));
//! ```

pub mod core;
#[cfg(feature = "i18n")]
pub mod i18n;
#[cfg(feature = "pages")]
pub mod pages;
#[cfg(feature = "i18n")]
mod setup;

pub use magnetic_core::conf::{ConfError, Settings};
pub use magnetic_core::reactive::{HandlerError, Observer, State, Stream, Subscription};

#[cfg(feature = "pages")]
pub use magnetic_pages::{
	ActionError, ActionHooks, AppContext, Component, ComponentTemplate, EditableNode, EventStream, Identity,
	ManagedNode, Marker, MediaQuery, PagesError, Payload, Property,
};

#[cfg(feature = "i18n")]
pub use magnetic_i18n::{Catalog, I18nError, LangSelector, TextReplacer};

#[cfg(feature = "i18n")]
pub use setup::{AppState, SetupError, setup};

/// Commonly used types.
pub mod prelude {
	pub use crate::{Observer, Settings, State, Stream, Subscription};

	#[cfg(feature = "pages")]
	pub use crate::{
		ActionError, AppContext, Component, EditableNode, EventStream, ManagedNode, MediaQuery, Payload, Property,
	};

	#[cfg(feature = "i18n")]
	pub use crate::{AppState, Catalog, LangSelector, TextReplacer};
}
