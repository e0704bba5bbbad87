//! logrotor core - Shared types, configuration, and error handling

pub mod config;
pub mod constants;
pub mod error;
pub mod layout;

pub use config::*;
pub use constants::*;
pub use error::{Error, Result};
pub use layout::Layout;
