//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every listener stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then route table, then listeners
//! - One broadcast fans out to all three listeners

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
