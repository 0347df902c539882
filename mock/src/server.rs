use std::{net::SocketAddr, time::Duration};

use color_eyre::Result;
use futures_util::{Sink, SinkExt, StreamExt};
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    time::{Instant, interval_at},
};
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};
use uavlink_core::{
    comm,
    messages::{InboundMessage, OutboundMessage},
};

use crate::vehicle::Vehicle;

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct MockConfig {
    pub image_interval: Duration,
    pub message_interval: Duration,
}

/// WebSocket server that plays one pretend vehicle per connected client.
pub struct MockServer {
    listener: TcpListener,
    config: MockConfig,
}

impl MockServer {
    pub async fn bind(addr: impl ToSocketAddrs, config: MockConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    #[instrument(skip(self), name = "MockServer")]
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!(%peer, "Accepting connection");
            let config = self.config;
            tokio::spawn(
                async move {
                    if let Err(e) = handle_connection(stream, config).await {
                        error!("{e}");
                    }
                }
                .instrument(info_span!("connection", %peer)),
            );
        }
    }
}

async fn handle_connection(stream: TcpStream, config: MockConfig) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();
    let mut vehicle = Vehicle::default();
    let mut rng = StdRng::from_os_rng();

    send(&mut sink, &vehicle.load()).await?;

    let start = Instant::now();
    let mut images = interval_at(start + config.image_interval, config.image_interval);
    let mut messages = interval_at(start + config.message_interval, config.message_interval);
    let mut clock = interval_at(start + CLOCK_PERIOD, CLOCK_PERIOD);

    loop {
        let replies = tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match comm::decode::<OutboundMessage>(text.as_str()) {
                    Ok(OutboundMessage::Command { command }) => {
                        info!(%command, "Command received");
                        vehicle.handle_command(command)
                    }
                    Err(e) => {
                        warn!("Ignoring malformed frame: {e}");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client disconnected");
                    return Ok(());
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            },
            _ = messages.tick() => vehicle.message(&mut rng),
            _ = images.tick() => vec![vehicle.image()],
            _ = clock.tick() => {
                vehicle.tick();
                continue;
            }
        };

        for reply in &replies {
            send(&mut sink, reply).await?;
        }
    }
}

async fn send<S>(sink: &mut S, message: &InboundMessage) -> Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = comm::encode(message)?;
    debug!(%text, "Sending");
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}
