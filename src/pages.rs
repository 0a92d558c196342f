//! DOM binding engine
//!
//! This module provides access to magnetic-pages: managed nodes, components,
//! event streams, media queries and the DOM layer they run on.
//!
//! ## Example
//!
//! ```rust,ignore
//! use magnetic::pages::{AppContext, ManagedNode};
//!
//! let potato = ManagedNode::by_id(&ctx, "potato")?;
//! potato.fire_action("innerHTML", "<em>mashed</em>");
//! ```

pub use magnetic_pages::*;
