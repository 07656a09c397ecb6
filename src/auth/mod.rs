//! Authentication and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! CONNECT (user name, password, client id)
//!     → authenticator.rs (listener filter, wildcard checks)
//!     → credentials.rs get_roles
//!         → PLAIN: direct comparison
//!         → HASHED: hasher.rs → cache.rs → hashing.rs (PBKDF2-HMAC-SHA512)
//!     → credentials.rs get_permissions
//!         → substitution.rs (${{clientid}}, ${{username}})
//!     → AuthDecision
//! ```
//!
//! # Design Decisions
//! - Fail closed: no accepted credentials means no role for anyone
//! - Verification errors collapse to "no match", nothing here panics
//! - Derived hashes are cached briefly so reconnect storms stay cheap

pub mod authenticator;
pub mod cache;
pub mod credentials;
pub mod hasher;
pub mod hashing;
pub mod substitution;

pub use authenticator::{AuthDecision, ConnectRequest, FileAuthenticator, ReasonCode};
pub use credentials::{CredentialsValidator, PermissionType, TopicPermission};
pub use hasher::CredentialsHasher;
pub use hashing::{encode_password, HashingError};
pub use substitution::substitute;
