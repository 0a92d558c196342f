//! Text replacement and language selection
//!
//! This module provides access to magnetic-i18n.

pub use magnetic_i18n::*;
