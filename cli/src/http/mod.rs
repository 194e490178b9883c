//! HTTP control panel: the streaming page plus a small JSON API behind it.

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use models::*;
pub use routes::create_router;
pub use server::*;
pub use state::*;
