//! Local web interface.
//!
//! Serves the welcome and question screens as a single page and pushes
//! session updates to the browser over a WebSocket.

pub mod routes;
pub mod server;
pub mod state;
pub mod templates;
pub mod websocket;

pub use server::start_dashboard;
pub use state::{DashboardState, SessionView};
