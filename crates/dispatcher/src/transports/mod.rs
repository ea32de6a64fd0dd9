//! Transport implementations
//!
//! Contains LogTransport, FileTransport, and NetworkTransport.

mod file;
mod log;
mod network;

pub use self::file::FileTransport;
pub use self::log::LogTransport;
pub use self::network::{NetworkTransport, WireFormat};
