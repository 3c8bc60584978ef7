use std::sync::Arc;

use crate::services::rooms::RoomRegistry;
use crate::ws::hub::WsRegistry;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    ws_registry: Arc<WsRegistry>,
    rooms: Arc<RoomRegistry>,
}

impl AppState {
    pub fn new(ws_registry: Arc<WsRegistry>, rooms: Arc<RoomRegistry>) -> Self {
        Self { ws_registry, rooms }
    }

    pub fn ws_registry(&self) -> Arc<WsRegistry> {
        Arc::clone(&self.ws_registry)
    }

    pub fn rooms(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.rooms)
    }
}
