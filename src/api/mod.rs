//! Publisher API Service
//!
//! HTTP surface over the session and ledger cores. Callers are
//! authenticated by API key and scoped to their own publisher data.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
