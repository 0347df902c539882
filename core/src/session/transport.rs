use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_tungstenite::tungstenite::Message;
use tracing::Instrument;

use crate::{comm::Frame, endpoint::Endpoint, prelude::*};

const FRAME_BUFFER: usize = 32;

/// Opens connections to an endpoint. The session manager owns one
/// `Connector` and asks it for a fresh [`Connection`] per session.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, endpoint: &Endpoint) -> impl Future<Output = Result<Connection>> + Send;
}

/// An open, full-duplex frame link. Dropping it closes the link: the
/// outbound side is flushed and closed, background tasks are aborted.
#[derive(Debug)]
pub struct Connection {
    outbound: mpsc::Sender<Frame>,
    inbound: mpsc::Receiver<Frame>,
    tasks: Vec<JoinHandle<()>>,
}

impl Connection {
    pub fn new(outbound: mpsc::Sender<Frame>, inbound: mpsc::Receiver<Frame>) -> Self {
        Self {
            outbound,
            inbound,
            tasks: Vec::new(),
        }
    }

    /// ties `task` to the lifetime of this connection
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    pub async fn send(&self, frame: Frame) -> Result<()> {
        self.outbound.send(frame).await.map_err(|_| Error::TransportClosed)
    }

    /// Queues `frame` without waiting. Fails with [`Error::OutboundFull`] when
    /// the writer has fallen behind by a whole buffer.
    pub fn try_send(&self, frame: Frame) -> Result<()> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => Error::OutboundFull,
            TrySendError::Closed(_) => Error::TransportClosed,
        })
    }

    /// `None` once the peer or the transport has closed the link.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection> {
        let (stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str()).await?;
        debug!("WebSocket handshake complete");
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Frame>(FRAME_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel::<Frame>(FRAME_BUFFER);
        let span = tracing::Span::current();

        // ends on its own once the Connection drops its sender
        tokio::spawn(
            async move {
                while let Some(frame) = outbound_rx.recv().await {
                    let message = match frame {
                        Frame::Text(text) => Message::Text(text.into()),
                        Frame::Binary(bytes) => Message::Binary(bytes),
                        Frame::Close => break,
                    };
                    if let Err(e) = sink.send(message).await {
                        warn!("Error writing frame: {e}");
                        return;
                    }
                }
                if let Err(e) = sink.close().await {
                    debug!("Error closing websocket: {e}");
                }
            }
            .instrument(span.clone()),
        );

        let reader = tokio::spawn(
            async move {
                while let Some(res) = source.next().await {
                    let frame = match res {
                        Ok(Message::Text(text)) => Frame::Text(text.as_str().to_owned()),
                        Ok(Message::Binary(bytes)) => Frame::Binary(bytes),
                        Ok(Message::Close(reason)) => {
                            debug!(?reason, "Peer sent close frame");
                            break;
                        }
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("WebSocket error: {e}");
                            break;
                        }
                    };
                    if inbound_tx.send(frame).await.is_err() {
                        break;
                    }
                }
            }
            .instrument(span),
        );

        Ok(Connection::new(outbound_tx, inbound_rx).with_task(reader))
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_websocket_round_trip() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // echo server that closes after one frame
        let server: JoinHandle<Result<()>> = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await?;
            if let Some(Ok(message)) = ws.next().await {
                ws.send(message).await?;
            }
            ws.close(None).await?;
            Ok(())
        });

        let endpoint = Endpoint::from_host_port("127.0.0.1", addr.port())?;
        let mut connection = WsConnector.connect(&endpoint).await?;
        connection.send(Frame::Text(r#"{"type":"log","message":"hi"}"#.to_string())).await?;

        assert_eq!(
            connection.recv().await,
            Some(Frame::Text(r#"{"type":"log","message":"hi"}"#.to_string()))
        );
        assert_eq!(connection.recv().await, None);
        server.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_try_send_reports_full_and_closed() {
        let (outbound, mut from_client) = mpsc::channel(1);
        let (_to_client, inbound) = mpsc::channel(1);
        let connection = Connection::new(outbound, inbound);

        connection.try_send(Frame::Text("a".to_string())).unwrap();
        assert!(matches!(
            connection.try_send(Frame::Text("b".to_string())),
            Err(Error::OutboundFull)
        ));
        assert_eq!(from_client.recv().await, Some(Frame::Text("a".to_string())));

        drop(from_client);
        assert!(matches!(
            connection.try_send(Frame::Text("c".to_string())),
            Err(Error::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = Endpoint::from_host_port("127.0.0.1", port).unwrap();
        let result = WsConnector.connect(&endpoint).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
