//! In-process connector for exercising the session manager without sockets.

use std::{
    io,
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use crate::{
    comm::Frame,
    endpoint::Endpoint,
    prelude::*,
    session::transport::{Connection, Connector},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Accept,
    Refuse,
    /// never completes; only a timeout or teardown ends the attempt
    Hang,
}

/// The remote side of one accepted connection.
#[derive(Debug)]
pub struct MemoryPeer {
    pub endpoint: Endpoint,
    pub to_client: mpsc::Sender<Frame>,
    pub from_client: mpsc::Receiver<Frame>,
}

#[derive(Debug)]
struct Inner {
    behavior: Behavior,
    attempts: usize,
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

#[derive(Debug, Clone)]
pub struct MemoryConnector {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let inner = Inner {
            behavior: Behavior::Accept,
            attempts: 0,
            peers,
        };
        (
            Self {
                inner: Arc::new(Mutex::new(inner)),
            },
            peers_rx,
        )
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        self.lock().behavior = behavior;
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // a panicking test thread must not hide the counters from the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the attempt and, when accepting, hands the peer side out.
    fn attempt(&self, endpoint: &Endpoint) -> Result<Option<Connection>> {
        let mut inner = self.lock();
        inner.attempts += 1;
        match inner.behavior {
            Behavior::Refuse => Err(Error::Transport(tungstenite::Error::Io(io::Error::from(
                io::ErrorKind::ConnectionRefused,
            )))),
            Behavior::Hang => Ok(None),
            Behavior::Accept => {
                let (to_client, inbound) = mpsc::channel(32);
                let (outbound, from_client) = mpsc::channel(32);
                let _ = inner.peers.send(MemoryPeer {
                    endpoint: endpoint.clone(),
                    to_client,
                    from_client,
                });
                Ok(Some(Connection::new(outbound, inbound)))
            }
        }
    }
}

impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
        match self.attempt(endpoint)? {
            Some(connection) => Ok(connection),
            None => std::future::pending().await,
        }
    }
}
