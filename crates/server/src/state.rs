//! Shared router state

use crate::error::{ApiError, ApiResult, Surface};
use healthtrack_core::{Error, Result};
use healthtrack_engine::Database;
use std::sync::Arc;
use tokio::task;

/// Everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
    expose_internal_errors: bool,
}

impl AppState {
    /// Wrap an opened database. `expose_internal_errors` is the
    /// development-mode switch.
    pub fn new(db: Arc<Database>, expose_internal_errors: bool) -> Self {
        AppState {
            db,
            expose_internal_errors,
        }
    }

    /// Error converter for one route group, for use with `map_err`.
    pub fn fail(&self, surface: Surface) -> impl Fn(Error) -> ApiError {
        let expose = self.expose_internal_errors;
        move |err| ApiError::from_core(err, surface, expose)
    }

    /// Run a service call on the blocking pool.
    ///
    /// Service calls hash passwords and may fsync the journal, so they stay
    /// off the async workers.
    pub async fn run<T, F>(&self, surface: Surface, op: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| {
                self.fail(surface)(Error::storage(format!("service task failed: {}", e)))
            })?
            .map_err(self.fail(surface))
    }
}
