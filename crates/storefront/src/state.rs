//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::tmdb::{MetadataStore, TmdbClient, TmdbError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    tmdb: TmdbClient,
    metadata: MetadataStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The metadata store starts empty; call
    /// [`MetadataStore::spawn_refresh`] to populate it.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError::Http` if the TMDB HTTP client cannot be built.
    pub fn new(config: SiteConfig, pool: PgPool) -> Result<Self, TmdbError> {
        let tmdb = TmdbClient::new(&config.tmdb)?;
        let metadata = MetadataStore::new(tmdb.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tmdb,
                metadata,
            }),
        })
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the TMDB API client.
    #[must_use]
    pub fn tmdb(&self) -> &TmdbClient {
        &self.inner.tmdb
    }

    /// Get a reference to the TMDB metadata store.
    #[must_use]
    pub fn metadata(&self) -> &MetadataStore {
        &self.inner.metadata
    }
}
