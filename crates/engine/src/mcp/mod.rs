//! Session-stateful tool transport (MCP-style streamable HTTP).

pub mod protocol;
pub mod routes;
pub mod session;
pub mod tools;

pub use routes::{routes, SESSION_HEADER};
pub use session::{McpSession, SessionManager};
