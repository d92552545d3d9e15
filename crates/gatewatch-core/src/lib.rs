// gatewatch-core: Reactive monitor state layer between gatewatch-api and
// consumers (CLI).

pub mod coalescer;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod monitor;
pub mod reducer;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use coalescer::Coalescer;
pub use config::{MonitorAuth, MonitorConfig, TlsVerification};
pub use error::CoreError;
pub use monitor::{ConnectionState, Monitor};
pub use reducer::DashboardState;
pub use store::MonitorStore;
pub use stream::StateStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{HealthCheckRecord, MonitorDashboard, MonitorNode, NodeStatus, TrendPoint};
