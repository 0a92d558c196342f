//! # Magnetic Core
//!
//! Core building blocks shared by every Magnetic crate:
//!
//! - [`reactive`]: synchronous observer-based primitives ([`State`], [`Stream`],
//!   [`Observer`], [`Subscription`])
//! - [`conf`]: engine [`Settings`] (marker prefix, i18n conventions, breakpoints)
//!
//! Everything here is single-threaded. Values are shared through `Rc` and
//! interior mutability; propagation is depth-first and fully completes before
//! the triggering call returns.

#![warn(missing_docs)]

pub mod conf;
pub mod reactive;

pub use conf::{ConfError, I18nSettings, MediaSettings, Settings};
pub use reactive::{HandlerError, Observer, State, Stream, Subscription};
