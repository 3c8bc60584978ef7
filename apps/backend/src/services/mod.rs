//! Service layer: room lifecycle and phase orchestration over the pure
//! domain, plus the outbound push seam.

pub mod game_flow;
pub mod game_room;
pub mod outbound;
pub mod rooms;

pub use game_flow::GameFlow;
pub use game_room::GameRoom;
pub use outbound::Outbound;
pub use rooms::RoomRegistry;
