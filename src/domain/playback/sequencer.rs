use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::session::{PlaybackEffect, PlaybackEvent, PlaybackSession, PlaybackView};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

const EVENT_QUEUE_CAPACITY: usize = 64;
const EFFECT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("playback sequencer has shut down")]
    Closed,
}

/// Handle to a playback session running on its own task.
///
/// All control events go through one queue, so clicks arriving together can
/// never leave two items marked as current. Bursts of `Next`/`Previous`
/// are folded into one move before any effect is emitted.
pub struct PlaybackSequencer {
    events: mpsc::Sender<PlaybackEvent>,
    view: watch::Receiver<PlaybackView>,
    task: JoinHandle<()>,
}

impl PlaybackSequencer {
    /// Start the actor. Effects are delivered on the returned receiver.
    ///
    /// The effect queue is bounded. While it is full the actor waits, so a
    /// receiver that stops draining also stalls `send` once the event queue
    /// fills. No effect is ever dropped while the receiver is alive.
    pub fn spawn(
        session: PlaybackSession,
        debounce: Duration,
    ) -> (Self, mpsc::Receiver<PlaybackEffect>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (effects_tx, effects_rx) = mpsc::channel(EFFECT_QUEUE_CAPACITY);
        let (view_tx, view_rx) = watch::channel(session.view());

        let task = tokio::spawn(run(session, debounce, events_rx, effects_tx, view_tx));

        (
            Self {
                events: events_tx,
                view: view_rx,
                task,
            },
            effects_rx,
        )
    }

    pub async fn send(&self, event: PlaybackEvent) -> Result<(), SequencerError> {
        self.events.send(event).await.map_err(|_| SequencerError::Closed)
    }

    /// Latest state after all processed events
    pub fn view(&self) -> PlaybackView {
        self.view.borrow().clone()
    }

    /// Subscribe to view updates
    pub fn watch(&self) -> watch::Receiver<PlaybackView> {
        self.view.clone()
    }

    /// Close the queue and wait until every queued event is applied
    pub async fn shutdown(self) {
        drop(self.events);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Playback sequencer task failed");
        }
    }
}

async fn run(
    mut session: PlaybackSession,
    debounce: Duration,
    mut events: mpsc::Receiver<PlaybackEvent>,
    effects: mpsc::Sender<PlaybackEffect>,
    view: watch::Sender<PlaybackView>,
) {
    let mut pending: Option<PlaybackEvent> = None;

    loop {
        let event = match pending.take() {
            Some(event) => event,
            None => match events.recv().await {
                Some(event) => event,
                None => break,
            },
        };

        let emitted = if event.is_navigation() {
            let mut burst = vec![event];
            loop {
                match tokio::time::timeout(debounce, events.recv()).await {
                    Ok(Some(next)) if next.is_navigation() => burst.push(next),
                    Ok(Some(other)) => {
                        pending = Some(other);
                        break;
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            if burst.len() > 1 {
                tracing::debug!(events = burst.len(), "Coalescing navigation burst");
            }

            // Intermediate loads are superseded within the burst, only the
            // final move's effects reach the player
            let mut last = Vec::new();
            for step in burst {
                let produced = session.dispatch(step);
                if !produced.is_empty() {
                    last = produced;
                }
            }
            last
        } else {
            session.dispatch(event)
        };

        for effect in emitted {
            if effects.send(effect).await.is_err() {
                tracing::debug!("Effect receiver dropped, discarding playback effect");
            }
        }
        view.send_replace(session.view());
    }

    tracing::debug!("Playback sequencer stopped");
}
