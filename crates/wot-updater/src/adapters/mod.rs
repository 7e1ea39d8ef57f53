//! Adapters implementing the outbound ports.
//!
//! - [`memory`]: in-memory identity cache
//! - [`mock`]: recording connector for tests

pub mod memory;
pub mod mock;

pub use memory::InMemoryIdentityCache;
pub use mock::{ConnectorCall, RecordingConnector};
