//! Wire types shared by the ws transport and the services. Services speak
//! these enums; the transport only frames and parses them.

pub mod messages;

pub use messages::{ClientMsg, RoomSummary, SeatInfo, ServerMsg};
