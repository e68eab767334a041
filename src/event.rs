use tokio::sync::mpsc;

use crate::sync::MutationKind;

/// Outcome notifications emitted by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
  /// The server accepted a mutation
  Confirmed { kind: MutationKind },
  /// A mutation failed and its speculative change was undone
  RolledBack { kind: MutationKind, message: String },
  /// A mutation failed before anything was speculated
  Failed { kind: MutationKind, message: String },
}

/// Collects sync events for whoever renders notifications
pub struct EventHandler {
  tx: mpsc::UnboundedSender<SyncEvent>,
  rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Sender handed to the coordinator
  pub fn sender(&self) -> mpsc::UnboundedSender<SyncEvent> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<SyncEvent> {
    self.rx.recv().await
  }

  /// Take every event queued so far without waiting
  pub fn drain(&mut self) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = self.rx.try_recv() {
      events.push(event);
    }
    events
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}
