//! Session status API — the serving layer's read-only poll surface.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::status_api_router;
pub use server::{start_status_server, StatusServer};
pub use types::ApiContext;
