//! Reactive primitives
//!
//! This module provides the observer-based building blocks the binding engine
//! is made of:
//!
//! - [`State`]: a single current value with replay-of-one multicast
//! - [`Stream`]: a plain multicast channel without replay
//! - [`Observer`]: a `(next, error, complete)` handler triple
//! - [`Subscription`]: an explicit disposer returned by every `subscribe`
//!
//! ## Delivery contract
//!
//! - Notification is synchronous: `update`/`push` return only after every
//!   subscriber (and everything those subscribers trigger) has run.
//! - Subscribers are notified in subscription order.
//! - A handler that returns `Err` never stops delivery to the remaining
//!   subscribers. The error goes to that observer's own error handler, or is
//!   swallowed and logged when it has none.
//! - Propagation may re-enter: a handler can call `update` on the container
//!   that is currently notifying it.
//!
//! ## Example
//!
//! ```
//! use magnetic_core::reactive::{Observer, State};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let count = State::new(1);
//!
//! let sink = seen.clone();
//! let _subscription = count.subscribe(Observer::new(move |value: &i32| {
//!     sink.borrow_mut().push(*value);
//! }));
//!
//! count.update(2);
//! assert_eq!(*seen.borrow(), vec![1, 2]);
//! ```

mod observer;
mod state;
mod stream;
mod subscriber;
mod subscription;

pub use observer::{HandlerError, Observer};
pub use state::State;
pub use stream::Stream;
pub use subscription::Subscription;
