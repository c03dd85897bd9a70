pub mod events;
pub mod hub;
mod socket;

pub use socket::ws_handler;
