use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, interval_at},
};
use tracing::Instrument;

use crate::{messages::InboundMessage, prelude::*, state::ViewState};

/// Latest [`ViewState`] snapshot. Writers replace the whole snapshot, readers
/// only ever see complete ones.
#[derive(Debug, Clone)]
pub struct ViewStore {
    tx: Arc<watch::Sender<ViewState>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl ViewStore {
    pub fn new(initial: ViewState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn dispatch(&self, message: &InboundMessage) {
        trace!(?message, "dispatch");
        self.tx.send_modify(|state| *state = std::mem::take(state).apply(message));
    }

    pub fn tick(&self) {
        self.tx.send_modify(|state| *state = std::mem::take(state).tick());
    }

    pub fn snapshot(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }
}

/// Ticks `store` once per `period`, first tick one period from now. Runs until
/// the returned task is aborted. A zero `period` is rejected.
#[instrument(skip(store))]
pub fn spawn_clock(store: ViewStore, period: Duration) -> Result<JoinHandle<()>> {
    if period.is_zero() {
        return Err(Error::ZeroPeriod);
    }
    let span = tracing::Span::current();
    Ok(tokio::spawn(
        async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                store.tick();
            }
        }
        .instrument(span),
    ))
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::messages::StatusUpdate;

    #[tokio::test]
    async fn test_dispatch_publishes_snapshot() {
        let store = ViewStore::default();
        let mut rx = store.subscribe();
        store.dispatch(&StatusUpdate::Mode { value: "guided".to_string() }.into());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status.mode, "guided");
        assert_eq!(store.snapshot().status.mode, "guided");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_ticks_every_period() {
        let store = ViewStore::default();
        let clock = spawn_clock(store.clone(), Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(store.snapshot().status.time_since_last_message, 3);

        store.dispatch(&StatusUpdate::NewMsg.into());
        assert_eq!(store.snapshot().status.time_since_last_message, 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.snapshot().status.time_since_last_message, 1);

        clock.abort();
    }

    #[tokio::test]
    async fn test_clock_rejects_zero_period() {
        let store = ViewStore::default();
        assert!(matches!(spawn_clock(store.clone(), Duration::ZERO), Err(Error::ZeroPeriod)));
        assert_eq!(store.snapshot().status.time_since_last_message, 0);
    }
}
