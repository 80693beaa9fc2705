pub mod core;
pub mod error;
pub mod handler;

pub use crate::core::{Core, CoreState, DEFAULT_BODY_LIMIT};
pub use error::ProxyError;
