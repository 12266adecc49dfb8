//! Custom error types for the dashboard components.

use thiserror::Error;

/// Dashboard errors.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("service error: {0}")]
    Service(#[from] fit_sync_client::FitSyncError),

    #[error("view is no longer mounted")]
    Unmounted,
}

/// Result type alias for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;
