//! Core types, configuration, and utilities for the polkit agent.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_BUS_NAME, DEFAULT_LOCALE, DEFAULT_LOG_LEVEL, DEFAULT_PROMPT_TIMEOUT_SECS,
    DEFAULT_SESSION_QUERY_TIMEOUT_SECS, DEFAULT_VERIFY_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use observability::LogFormat;
pub use paths::Paths;
