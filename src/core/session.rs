//! Download session state and cooperative cancellation.
//!
//! One session exists per download run. The session object is owned by the
//! orchestrating worker; the UI side only ever holds a [`CancelHandle`], so
//! there is no global mutable "current process" state anywhere.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::models::{DownloadRequest, DownloadState};

/// Cloneable cancellation handle given to the presentation layer.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Request cancellation. Idempotent; the worker notices at its next
    /// suspension point (the line read) and winds the run down.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// State shared between one worker task and the manager.
#[derive(Debug, Clone)]
pub struct DownloadSession {
    run_id: String,
    request: DownloadRequest,
    token: CancellationToken,
    state: Arc<RwLock<DownloadState>>,
}

impl DownloadSession {
    pub fn new(request: DownloadRequest) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            request,
            token: CancellationToken::new(),
            state: Arc::new(RwLock::new(DownloadState::Idle)),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub async fn state(&self) -> DownloadState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, state: DownloadState) {
        *self.state.write().await = state;
    }
}
