//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Admin API (add / insert / delete)
//!     → route.rs (validate, compile pattern)
//!     → table.rs (assign id + index, publish new snapshot)
//!
//! Incoming Request (method, path)
//!     → table.rs (load snapshot)
//!     → matcher.rs (segment match, extract params)
//!     → Return: first matching Route by index, or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes are editable at runtime; readers work on immutable snapshots
//! - No regex in hot path (literal/capture segments only)
//! - Deterministic: lowest index wins among matching routes
//! - Duplicate and overlapping patterns are allowed

pub mod matcher;
pub mod route;
pub mod table;

pub use matcher::{Params, Pattern, PatternError, Segment};
pub use route::{NewRoute, Route, RouteError, RouteId};
pub use table::{RouteTable, RouteTableError, Snapshot};
