use tokio::{sync::watch, task::JoinHandle};

use crate::{
    endpoint::Endpoint,
    messages::OutboundMessage,
    prelude::*,
    session::{
        MessageListener, Phase, SessionOptions,
        manager::{SessionManager, SessionManagerHandle},
        transport::Connector,
    },
};

/// Handle to a running session manager.
///
/// All calls are fire-and-forget: they return once the manager has queued
/// the request and only fail when the manager is no longer running. Use
/// [`SessionClient::shutdown`] to stop it; after that returns the listener is
/// never called again. Dropping the client without shutting down aborts the
/// manager task.
#[derive(Debug)]
pub struct SessionClient {
    handle: SessionManagerHandle,
    phase: watch::Receiver<Phase>,
    task: Option<JoinHandle<()>>,
}

impl SessionClient {
    #[instrument(skip_all)]
    pub fn spawn<C: Connector>(connector: C, options: SessionOptions, listener: impl MessageListener) -> Self {
        let (handle, phase, task) = SessionManager::spawn(connector, options, Box::new(listener));
        Self {
            handle,
            phase,
            task: Some(task),
        }
    }

    /// Sets or clears the target endpoint. Passing the endpoint that is
    /// already configured leaves the current session alone, whatever its phase.
    pub async fn configure(&self, endpoint: Option<Endpoint>) -> Result<()> {
        self.handle.configure(endpoint).await
    }

    /// Transmitted only if the session is open at the time the manager
    /// handles it; dropped with a warning otherwise.
    pub async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.handle.send_message(message).await
    }

    /// Opens a new session to the configured endpoint if the last one closed.
    pub async fn reconnect(&self) -> Result<()> {
        self.handle.reconnect().await
    }

    pub async fn set_listener(&self, listener: impl MessageListener) -> Result<()> {
        self.handle.set_listener(Box::new(listener)).await
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_alive()
    }

    pub async fn shutdown(mut self) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        if self.handle.shutdown().await.is_err() {
            debug!("Session manager already stopped");
        }
        task.await?;
        Ok(())
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
