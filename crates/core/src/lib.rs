//! `navgate-core`: shared foundation for the navigation core.
//!
//! This crate holds the inputs every other crate treats as immutable or
//! external: process configuration, the key/value persistence contract and
//! the wall clock.

pub mod clock;
pub mod config;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, NavConfig, RouteLoadMode};
pub use storage::{KeyValueStore, MemoryStore, StorageError, keys};
