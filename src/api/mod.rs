//! REST API
//!
//! Serves the zone analysis endpoints over HTTP.

pub mod handlers;
mod server;
mod types;

pub use handlers::ApiState;
pub use server::{router, ApiServer};
pub use types::*;
