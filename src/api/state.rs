use dashmap::DashMap;
use std::time::Instant;

use crate::recording::RecorderControl;

/// Connected WebSocket client info
#[derive(Debug)]
pub struct ConnectedClient {
    pub connected_at: Instant,
}

/// Shared application state
pub struct AppState {
    /// Panel-side commands against the shared session
    pub control: RecorderControl,

    /// Connected WebSocket clients: client_id -> client info
    pub connected_clients: DashMap<String, ConnectedClient>,
}

impl AppState {
    pub fn new(control: RecorderControl) -> Self {
        Self {
            control,
            connected_clients: DashMap::new(),
        }
    }

    pub fn client_connected(&self, client_id: &str) {
        self.connected_clients.insert(
            client_id.to_string(),
            ConnectedClient {
                connected_at: Instant::now(),
            },
        );
        tracing::debug!(
            "Client {} connected (active: {})",
            client_id,
            self.connected_clients.len()
        );
    }

    pub fn client_disconnected(&self, client_id: &str) {
        if let Some((_, client)) = self.connected_clients.remove(client_id) {
            tracing::debug!(
                "Client {} disconnected after {:?} (active: {})",
                client_id,
                client.connected_at.elapsed(),
                self.connected_clients.len()
            );
        }
    }
}
