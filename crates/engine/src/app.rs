//! Application state and composition.

use std::sync::Arc;

use crate::broadcast::BroadcastHub;
use crate::infrastructure::ports::{ClockPort, UniverseRepo};
use crate::mcp::SessionManager;
use crate::use_cases::CommandProcessor;

/// Main application state, passed to HTTP/WebSocket/MCP handlers via
/// axum state.
pub struct App {
    pub repo: Arc<dyn UniverseRepo>,
    pub clock: Arc<dyn ClockPort>,
    pub hub: Arc<BroadcastHub>,
    pub processor: Arc<CommandProcessor>,
    pub sessions: Arc<SessionManager>,
}

impl App {
    /// Wire up the application around one repository adapter.
    pub fn new(repo: Arc<dyn UniverseRepo>, clock: Arc<dyn ClockPort>) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let processor = Arc::new(CommandProcessor::new(repo.clone(), hub.clone()));
        let sessions = Arc::new(SessionManager::new(
            repo.clone(),
            hub.clone(),
            processor.clone(),
        ));
        Self {
            repo,
            clock,
            hub,
            processor,
            sessions,
        }
    }
}
