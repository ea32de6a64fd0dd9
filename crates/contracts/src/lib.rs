//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - Events are opaque JSON documents validated upstream of dispatch
//! - Acceptance into the memory queue means "accepted for delivery", not "delivered"

mod blueprint;
mod dispatch_options;
mod drain;
mod error;
mod event;
mod queue_options;
mod stats;
mod transport;
mod validator;

pub use blueprint::*;
pub use dispatch_options::*;
pub use drain::*;
pub use error::*;
pub use event::*;
pub use queue_options::*;
pub use stats::*;
pub use transport::*;
pub use validator::*;
