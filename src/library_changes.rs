//! # Library Change Notifications
//!
//! Canale iniettato con cui l'host segnala i cambiamenti di permessi della
//! libreria media e della fotocamera.
//!
//! ## Responsabilità:
//! - `post()`: pubblica un evento a tutti gli iscritti correnti
//! - `subscribe()`: nuovo ricevitore, riceve solo gli eventi successivi
//! - Nessuno stato globale: ogni componente riceve un clone del notifier

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// Change reported by the host platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryChange {
    /// Photo library authorization changed
    PermissionChanged,
    /// The user edited the limited selection of accessible assets
    LimitedSelectionChanged,
    CameraPermissionChanged,
}

/// Broadcasts [`LibraryChange`] events to any number of subscribers
#[derive(Debug, Clone)]
pub struct LibraryChangeNotifier {
    sender: broadcast::Sender<LibraryChange>,
}

impl Default for LibraryChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish a change; returns how many subscribers will see it
    pub fn post(&self, change: LibraryChange) -> usize {
        match self.sender.send(change) {
            Ok(receivers) => {
                debug!("Library change {:?} sent to {} subscribers", change, receivers);
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_subscriber_receives_changes() {
        let notifier = LibraryChangeNotifier::new();
        let mut first = notifier.subscribe();
        let mut second = notifier.clone().subscribe();

        assert_eq!(notifier.post(LibraryChange::PermissionChanged), 2);
        assert_eq!(first.recv().await.unwrap(), LibraryChange::PermissionChanged);
        assert_eq!(second.recv().await.unwrap(), LibraryChange::PermissionChanged);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_changes() {
        let notifier = LibraryChangeNotifier::new();
        assert_eq!(notifier.post(LibraryChange::CameraPermissionChanged), 0);

        let mut late = notifier.subscribe();
        notifier.post(LibraryChange::LimitedSelectionChanged);
        assert_eq!(late.recv().await.unwrap(), LibraryChange::LimitedSelectionChanged);
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&LibraryChange::LimitedSelectionChanged).unwrap();
        assert_eq!(json, "\"limited_selection_changed\"");
    }
}
