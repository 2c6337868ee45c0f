//! CPR family lookup service.
//!
//! Exposes a single HTTP endpoint that returns the children under 18 of a
//! person, looked up in the CPR registry over mutually authenticated TLS.

pub mod api;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::ServiceError;
