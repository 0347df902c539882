use std::{future::pending, sync::Arc};

use handle_macro::Handle;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::{
    comm::{self, Frame},
    endpoint::Endpoint,
    messages::{InboundMessage, OutboundMessage},
    prelude::*,
    session::{
        MessageListener, Phase, SessionOptions,
        transport::{Connection, Connector},
    },
};

#[derive(Handle)]
pub(crate) enum SessionManagerEvent {
    // client -> manager events
    Configure { endpoint: Option<Endpoint> },
    SendMessage { message: OutboundMessage },
    Reconnect,
    SetListener { listener: Box<dyn MessageListener> },
    Shutdown,

    // connect task -> manager events
    Connected { session_id: Uuid, result: Result<Connection> },
}
use SessionManagerEvent::*;

enum SessionState {
    Connecting(JoinHandle<()>),
    Open(Connection),
}

struct Session {
    id: Uuid,
    state: SessionState,
}

impl Drop for Session {
    fn drop(&mut self) {
        if let SessionState::Connecting(task) = &self.state {
            task.abort();
        }
    }
}

pub(crate) struct SessionManager<C> {
    connector: Arc<C>,
    options: SessionOptions,
    handle: SessionManagerHandle,
    rx: mpsc::Receiver<SessionManagerEvent>,
    listener: Option<Box<dyn MessageListener>>,
    endpoint: Option<Endpoint>,
    session: Option<Session>, // at most one live session
    retry_at: Option<Instant>,
    phase: watch::Sender<Phase>,
}

impl<C: Connector> SessionManager<C> {
    #[instrument(skip_all)]
    pub(crate) fn spawn(
        connector: C,
        options: SessionOptions,
        listener: Box<dyn MessageListener>,
    ) -> (SessionManagerHandle, watch::Receiver<Phase>, JoinHandle<()>) {
        let (manager, phase_rx) = Self::new(connector, options, listener);
        let handle = manager.handle.clone();
        let task = manager.run();
        (handle, phase_rx, task)
    }

    fn new(connector: C, options: SessionOptions, listener: Box<dyn MessageListener>) -> (Self, watch::Receiver<Phase>) {
        let (handle, rx) = SessionManagerHandle::channel(32);
        let (phase, phase_rx) = watch::channel(Phase::Unconfigured);
        let manager = Self {
            connector: Arc::new(connector),
            options,
            handle,
            rx,
            listener: Some(listener),
            endpoint: None,
            session: None,
            retry_at: None,
            phase,
        };
        (manager, phase_rx)
    }

    #[instrument(skip(self), name = "SessionManager")]
    fn run(mut self) -> JoinHandle<()> {
        let span = tracing::Span::current();
        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        event = self.rx.recv() => {
                            let Some(event) = event else {
                                break;
                            };
                            match event {
                                Configure { endpoint } => {
                                    debug!("SessionManager: Configure");
                                    self.handle_configure(endpoint);
                                }
                                SendMessage { message } => {
                                    trace!("SessionManager: SendMessage");
                                    self.handle_send(message);
                                }
                                Reconnect => {
                                    debug!("SessionManager: Reconnect");
                                    self.handle_reconnect();
                                }
                                SetListener { listener } => {
                                    debug!("SessionManager: SetListener");
                                    self.listener = Some(listener);
                                }
                                Shutdown => {
                                    debug!("SessionManager: Shutdown");
                                    break;
                                }
                                Connected { session_id, result } => {
                                    debug!("SessionManager: Connected");
                                    self.handle_connected(session_id, result);
                                }
                            }
                        }
                        frame = next_frame(&mut self.session) => {
                            self.handle_frame(frame);
                        }
                        () = retry_timer(self.retry_at) => {
                            debug!("SessionManager: retry timer elapsed");
                            self.retry_at = None;
                            self.open_session();
                        }
                    }
                }
                self.teardown();
                debug!("SessionManager stopped");
            }
            .instrument(span),
        )
    }

    fn handle_configure(&mut self, endpoint: Option<Endpoint>) {
        if self.endpoint == endpoint {
            debug!(endpoint = ?self.endpoint, "Endpoint unchanged, keeping current session");
            return;
        }
        self.close_session();
        self.retry_at = None;
        self.endpoint = endpoint;
        match &self.endpoint {
            Some(endpoint) => {
                info!(%endpoint, "Endpoint configured");
                self.open_session();
            }
            None => {
                info!("Endpoint cleared");
                self.publish_phase();
            }
        }
    }

    fn handle_reconnect(&mut self) {
        if self.endpoint.is_none() || self.session.is_some() {
            debug!(phase = %self.current_phase(), "Nothing to reconnect");
            return;
        }
        self.retry_at = None;
        self.open_session();
    }

    /// Never waits on the transport: a stalled writer must not stop the
    /// manager from reading frames or handling shutdown.
    fn handle_send(&mut self, message: OutboundMessage) {
        let Some(Session {
            state: SessionState::Open(connection),
            ..
        }) = &self.session
        else {
            warn!(%message, "Connection not open, dropping message");
            return;
        };
        let frame = match comm::encode_frame(&message) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Error encoding {message}: {e}");
                return;
            }
        };
        if let Err(e) = connection.try_send(frame) {
            warn!(%message, "Dropping message: {e}");
        }
    }

    fn handle_connected(&mut self, session_id: Uuid, result: Result<Connection>) {
        let Some(session) = self.session.as_mut().filter(|session| session.id == session_id) else {
            debug!(%session_id, "Ignoring connect result for a replaced session");
            return;
        };
        match result {
            Ok(connection) => {
                info!(%session_id, "Session open");
                session.state = SessionState::Open(connection);
                self.publish_phase();
            }
            Err(e) => {
                warn!(%session_id, "Error connecting: {e}");
                self.session_closed();
            }
        }
    }

    fn handle_frame(&mut self, frame: Option<Frame>) {
        let text = match frame {
            Some(Frame::Text(text)) => text,
            Some(Frame::Binary(bytes)) => {
                warn!(len = bytes.len(), "Dropping binary frame");
                return;
            }
            Some(Frame::Close) | None => {
                info!("Session closed by peer or transport");
                self.session_closed();
                return;
            }
        };
        match comm::decode::<InboundMessage>(&text) {
            Ok(message) => {
                trace!(?message, "Received message");
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_message(message);
                }
            }
            Err(e) => {
                warn!(frame = %text, "Dropping malformed frame: {e}");
            }
        }
    }

    fn open_session(&mut self) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let session_id = Uuid::new_v4();
        let span = info_span!("connect", %session_id, %endpoint);
        let connector = self.connector.clone();
        let handle = self.handle.clone();
        let connect_timeout = self.options.connect_timeout;

        let task = tokio::spawn(
            async move {
                let result = match connect_timeout {
                    Some(after) => tokio::time::timeout(after, connector.connect(&endpoint))
                        .await
                        .unwrap_or_else(|_| {
                            Err(Error::ConnectTimeout {
                                endpoint: endpoint.to_string(),
                                after,
                            })
                        }),
                    None => connector.connect(&endpoint).await,
                };
                // manager may already be gone
                let _ = handle.connected(session_id, result).await;
            }
            .instrument(span),
        );

        self.session = Some(Session {
            id: session_id,
            state: SessionState::Connecting(task),
        });
        self.publish_phase();
    }

    fn session_closed(&mut self) {
        self.session = None;
        if let Some(delay) = self.options.retry_delay {
            debug!(?delay, "Scheduling reconnect");
            self.retry_at = Some(Instant::now() + delay);
        }
        self.publish_phase();
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session_id = %session.id, "Closing session");
        }
    }

    fn teardown(&mut self) {
        self.close_session();
        self.retry_at = None;
        self.listener = None;
        self.phase.send_replace(Phase::Closed);
    }

    fn current_phase(&self) -> Phase {
        match (&self.endpoint, &self.session) {
            (None, _) => Phase::Unconfigured,
            (Some(_), None) => Phase::Closed,
            (Some(_), Some(Session { state: SessionState::Connecting(_), .. })) => Phase::Connecting,
            (Some(_), Some(Session { state: SessionState::Open(_), .. })) => Phase::Open,
        }
    }

    fn publish_phase(&self) {
        let phase = self.current_phase();
        self.phase.send_if_modified(|current| {
            if *current == phase {
                return false;
            }
            debug!(from = %current, to = %phase, "Phase change");
            *current = phase;
            true
        });
    }
}

/// Next frame from the open session; pends forever while no session is open.
async fn next_frame(session: &mut Option<Session>) -> Option<Frame> {
    match session {
        Some(Session {
            state: SessionState::Open(connection),
            ..
        }) => connection.recv().await,
        _ => pending().await,
    }
}

async fn retry_timer(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}
