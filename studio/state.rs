use std::sync::Arc;

use fdnet::{RunConfig, SessionHandle};

/// Everything a handler needs: the training session and the configuration
/// it was started with.
pub struct StudioState {
    pub session: SessionHandle,
    pub config: RunConfig,
}

/// Shared state type — an `Arc<StudioState>` passed to every handler.
///
/// No lock is needed here: the session serializes every call itself.
pub type SharedState = Arc<StudioState>;
