//! Event streams
//!
//! - [`EventStream`]: a window, element or media list event mapped to a
//!   subscribable sequence, keyed by subscription id
//! - [`MediaQuery`]: the match state of a media condition, replayed on
//!   subscribe
//! - [`dispatch_custom`] / [`custom_stream`]: the custom event bridge

mod custom;
mod media;
mod stream;

pub use custom::{custom_detail, custom_stream, dispatch_custom};
pub use media::{MediaQuery, width_condition};
pub use stream::EventStream;

pub use crate::dom::{EventSource, ListenerHandle};
