//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Extension config → Credentials store → Validator → Authenticator → Reload task
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → reload task and watcher stop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
