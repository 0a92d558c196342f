//! Magnetic I18n - text replacement and language selection
//!
//! Two components built on `magnetic-pages` that work together through the
//! locale custom event (`i18n_update` by default):
//!
//! - [`LangSelector`]: clicking a `mag-langSelector` element dispatches the
//!   locale event with the element's `data-mag-i18n-lang`
//! - [`TextReplacer`]: every `mag-i18n` element gets the catalog text of its
//!   key in the dispatched locale
//!
//! Translations live in a [`Catalog`] of flat key → string maps per locale.
//!
//! ## Example
//!
//! ```ignore
//! use magnetic_i18n::{Catalog, LangSelector, TextReplacer};
//! use std::rc::Rc;
//!
//! let mut catalog = Catalog::new();
//! catalog.insert_json("en", include_str!("../i18n/en.json"))?;
//! catalog.insert_json("es", include_str!("../i18n/es.json"))?;
//!
//! let replacer = TextReplacer::new(&ctx, Rc::new(catalog))?;
//! let selector = LangSelector::new(&ctx)?;
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod replacer;
pub mod selector;

pub use catalog::Catalog;
pub use error::I18nError;
pub use replacer::{TextReplacer, translation_key};
pub use selector::LangSelector;
