//! File based authentication and authorization for an MQTT broker.
//!
//! Credentials (users, roles, topic permissions) live in a TOML file in the
//! extension home folder and are hot reloaded while the broker runs.

pub mod auth;
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use auth::{AuthDecision, ConnectRequest, CredentialsValidator, FileAuthenticator};
pub use config::{load_extension_config, CredentialsStore, ExtensionConfig};
pub use lifecycle::Shutdown;
