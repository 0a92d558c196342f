//! Reactive primitives and settings
//!
//! This module provides access to magnetic-core: the synchronous observer
//! primitives every other layer is built on, and the engine settings.
//!
//! ## Example
//!
//! ```rust
//! use magnetic::core::reactive::{Observer, State};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let count = State::new(0);
//! count.subscribe(Observer::new(move |n: &i32| sink.borrow_mut().push(*n)));
//! count.update(1);
//!
//! assert_eq!(*seen.borrow(), vec![0, 1]);
//! ```

pub use magnetic_core::*;
