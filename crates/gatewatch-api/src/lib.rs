// gatewatch-api: Async Rust client for the Claude proxy gateway monitor API
//
// Two surfaces: the REST API (dashboard hydration, monitor shares, health
// history) and the WebSocket event stream feeding live node updates.

pub mod error;
pub mod rest;
pub mod transport;
pub mod types;
pub mod ws;

pub use error::Error;
pub use rest::GatewayClient;
pub use transport::{TlsMode, TransportConfig};
pub use ws::{MonitorSocket, ReconnectConfig, SocketState, WsMessage};
