/// TaskHub Web - Request handlers module.
pub mod api;
pub mod websocket;

pub use websocket::notifications_ws;
