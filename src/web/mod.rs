//! Web API module for assetvault.
//!
//! Serves the chunked upload endpoint, the picker used by the content
//! editor, and the directory and asset management forms of the admin panel.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
