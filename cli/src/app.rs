use std::{io::Write, ops::ControlFlow, time::Duration};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::watch,
    task::JoinHandle,
};
use uavlink_core::{
    error::Error as CoreError,
    messages::{InboundMessage, OutboundMessage},
    session::{Connector, Phase, SessionClient},
    state::{ViewState, ViewStore, spawn_clock},
};

use crate::{
    args::Args,
    commands::{HELP, OperatorCommand},
    prelude::*,
    render::Renderer,
};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Wires one session to the view store and the operator's terminal.
pub struct App<W> {
    client: SessionClient,
    store: ViewStore,
    clock: JoinHandle<()>,
    renderer: Renderer,
    out: W,
}

impl<W: Write> App<W> {
    #[instrument(skip_all)]
    pub async fn start<C: Connector>(args: &Args, connector: C, out: W) -> Result<Self> {
        let endpoint = args.endpoint()?;
        let store = ViewStore::new(ViewState::new(args.log_capacity()));
        let clock = spawn_clock(store.clone(), CLOCK_PERIOD)?;
        let client = SessionClient::spawn(connector, args.session_options(), {
            let store = store.clone();
            move |message: InboundMessage| store.dispatch(&message)
        });

        info!(%endpoint, "Starting session");
        client.configure(Some(endpoint)).await?;
        Ok(Self {
            client,
            store,
            clock,
            renderer: Renderer::default(),
            out,
        })
    }

    /// Reads operator commands from `input` until `quit` or end of input,
    /// re-rendering whenever the view or the session phase changes.
    pub async fn run(mut self, input: impl AsyncBufRead + Unpin) -> Result<()> {
        let mut lines = input.lines();
        let mut snapshots = self.store.subscribe();
        let mut phase = self.client.watch_phase();
        self.render(&mut snapshots, &mut phase)?;

        let result = loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            debug!("Input closed");
                            break Ok(());
                        }
                        Err(e) => break Err(e.into()),
                    };
                    match self.handle_line(&line).await {
                        Ok(ControlFlow::Break(())) => break Ok(()),
                        Ok(ControlFlow::Continue(())) => {}
                        Err(e @ (Error::UnknownCommand(_) | Error::MissingArgument { .. } | Error::Lib(CoreError::InvalidEndpoint { .. }))) => {
                            warn!("Rejected operator input {line:?}: {e}");
                            writeln!(self.out, "! {e}")?;
                        }
                        Err(e) => break Err(e),
                    }
                }
                Ok(()) = snapshots.changed() => self.render(&mut snapshots, &mut phase)?,
                Ok(()) = phase.changed() => self.render(&mut snapshots, &mut phase)?,
            }
        };

        self.shutdown().await?;
        result
    }

    async fn handle_line(&mut self, line: &str) -> Result<ControlFlow<()>> {
        if line.trim().is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        let command: OperatorCommand = line.parse()?;
        debug!(?command, "Operator command");
        match command {
            OperatorCommand::Connect => self.client.send(OutboundMessage::connect()).await?,
            OperatorCommand::Disconnect => self.client.send(OutboundMessage::disconnect()).await?,
            OperatorCommand::Url(endpoint) => {
                info!(%endpoint, "Switching endpoint");
                self.client.configure(Some(endpoint)).await?;
            }
            OperatorCommand::Reconnect => self.client.reconnect().await?,
            OperatorCommand::Status => {
                self.renderer
                    .status(&mut self.out, &self.store.snapshot(), self.client.phase())?;
            }
            OperatorCommand::Help => writeln!(self.out, "{HELP}")?,
            OperatorCommand::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn render(&mut self, snapshots: &mut watch::Receiver<ViewState>, phase: &mut watch::Receiver<Phase>) -> Result<()> {
        let phase = *phase.borrow_and_update();
        let state = snapshots.borrow_and_update().clone();
        self.renderer.render(&mut self.out, &state, phase)?;
        Ok(())
    }

    async fn shutdown(self) -> Result<()> {
        self.clock.abort();
        self.client.shutdown().await?;
        info!("Session closed");
        Ok(())
    }
}
