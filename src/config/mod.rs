//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! credentials file (TOML)
//!     → resolver.rs (current or legacy location)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (structural checks)
//!     → CredentialsConfig (validated, immutable)
//!     → shared via Arc from store.rs
//!
//! On every reload tick (watcher.rs):
//!     store.rs checks the modification time
//!     → loader.rs loads new document
//!     → validation.rs validates
//!     → archiver.rs writes the outgoing document to credentials-archive/
//!     → atomic swap of Arc<CredentialsConfig>
//!     → subscribers observe (old, new)
//! ```
//!
//! # Design Decisions
//! - A document is immutable once accepted; changes require a full reload
//! - Invalid documents never replace an accepted one
//! - Validation separates syntactic (serde) from structural checks

pub mod archiver;
pub mod extension;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use extension::load_extension_config;
pub use schema::{
    Activity, CredentialsConfig, ExtensionConfig, PasswordType, Permission, Qos, Retain, Role,
    SharedSubscription, User,
};
pub use store::{CredentialsStore, ReloadOutcome};
