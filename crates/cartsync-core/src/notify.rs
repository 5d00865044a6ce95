//! Change notification for cart and category state.
//!
//! Services raise an event after every state change; any number of
//! observers (a badge, a list view) can subscribe. Raising an event with
//! nobody listening is fine.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffer size for the change channel.
/// Observers that fall further behind see a `Lagged` error and should re-read state.
const CHANNEL_BUFFER_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The cart badge count was refreshed
    CartCount(i32),
    /// The category lists were replaced or edited
    Categories,
}

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_BUFFER_SIZE);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn notify(&self, event: ChangeEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "Change raised with no subscribers");
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
