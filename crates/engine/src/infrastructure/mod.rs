//! Infrastructure adapters behind the port traits.

pub mod clock;
pub mod memory;
pub mod ports;
pub mod sqlite;
