//! Orrery engine: persistence, command orchestration, and the push
//! transports (WebSocket and MCP-style tool sessions) around the pure
//! domain reducer.

pub mod api;
pub mod app;
pub mod broadcast;
pub mod infrastructure;
pub mod mcp;
pub mod use_cases;

pub use app::App;
