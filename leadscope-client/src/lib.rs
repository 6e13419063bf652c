//! Leadscope client library exports.

pub mod api_client;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod prefetch;
pub mod telemetry;

pub use api_client::HttpResultSource;
pub use config::{ClientConfig, ConfigError};
pub use coordinator::{
    CoordinatorConfig, LoadReason, LoadState, LoadingKind, Outcome, QueryCoordinator, Selection,
    ViewSnapshot,
};
pub use debounce::SearchDebouncer;
pub use error::ClientError;
pub use prefetch::{PrefetchJob, PrefetchOutcome, PrefetchScheduler};
