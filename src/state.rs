//! Application state management
//!
//! Shared across all handlers. The datamodel is immutable once built; the
//! database pool is optional.

use crate::datamodel::Datamodel;
use crate::duplication::ScanExecutor;
use crate::error::AppError;
use deadpool_postgres::Pool;
use std::sync::Arc;

pub struct AppState {
    /// Schema registry built at startup
    pub datamodel: Arc<Datamodel>,

    /// Project database pool, absent when no DATABASE_URL is configured
    pub db_pool: Option<Pool>,
}

impl AppState {
    pub fn new(datamodel: Arc<Datamodel>, db_pool: Option<Pool>) -> Self {
        Self { datamodel, db_pool }
    }

    /// Executor over the project database
    pub fn scan_executor(&self) -> Result<ScanExecutor, AppError> {
        self.db_pool
            .clone()
            .map(ScanExecutor::new)
            .ok_or_else(|| {
                AppError::NotConnected(
                    "No project database configured. Set DATABASE_URL to count rows.".to_string(),
                )
            })
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
