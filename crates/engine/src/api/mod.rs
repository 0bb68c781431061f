//! HTTP and WebSocket surface.

pub mod http;
pub mod websocket;
