pub mod comm;
pub mod endpoint;
pub mod error;
pub mod messages;
pub mod session;
pub mod state;
mod prelude;
