use std::sync::Arc;

use crate::orchestrator::{PollSettings, RunOrchestrator};
use crate::platform::PlatformApi;

/// Immutable per-process state. Run flows share nothing mutable through it.
pub struct AppState {
    pub platform: Arc<dyn PlatformApi>,
    pub orchestrator: RunOrchestrator,
}

impl AppState {
    pub fn new(platform: Arc<dyn PlatformApi>, poll_settings: PollSettings) -> Self {
        let orchestrator = RunOrchestrator::new(Arc::clone(&platform), poll_settings);
        Self {
            platform,
            orchestrator,
        }
    }
}
