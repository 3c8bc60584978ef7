pub mod hub;
pub mod session;

pub use hub::WsRegistry;
pub use session::upgrade;
