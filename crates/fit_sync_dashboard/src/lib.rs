//! Connection, polling and data-loading components for the fitness dashboard,
//! plus the view binding that renders them.
//!
//! Each mounted [`ViewBinding`] owns its own [`ConnectionManager`],
//! [`StatusPoller`] and [`DataFetcher`]. Components publish their state on
//! `tokio::sync::watch` channels; the view only reads and renders.

pub mod connection;
pub mod error;
pub mod fetcher;
pub mod poller;
pub mod scope;
pub mod settings;
pub mod state;
pub mod view;

mod test_utils;

pub use connection::ConnectionManager;
pub use error::{DashboardError, DashboardResult};
pub use fetcher::DataFetcher;
pub use poller::{MIN_POLL_INTERVAL, PollHandle, StatusPoller};
pub use scope::Scope;
pub use settings::{DisplaySettings, SettingsStore};
pub use state::{ConnectionState, DashboardSnapshot, FetchPhase, FetchState, PollerState};
pub use view::{ViewBinding, ViewOptions, ViewWatchers, render};
