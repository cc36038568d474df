//! TMDB configuration and genre list, refreshed in the background.
//!
//! The store starts empty. A background task loads the metadata right away and
//! then again on every refresh interval, swapping the snapshot in whole.
//! Readers clone the current `Arc` and never hold the lock across an await.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelcart_core::GenreId;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

use super::types::{ConfigurationResponse, GenreListResponse};
use super::{TmdbClient, TmdbError};

/// Poster width requested for search results and cart entries.
pub const POSTER_SIZE: &str = "w342";

/// Fallback size TMDB always serves.
const ORIGINAL_SIZE: &str = "original";

/// A snapshot of the TMDB image configuration and genre names.
#[derive(Debug, Clone)]
pub struct ApiMetadata {
    image_base_url: String,
    poster_size: String,
    genres: HashMap<GenreId, String>,
    loaded_at: DateTime<Utc>,
}

impl ApiMetadata {
    /// Build a snapshot from the two TMDB responses.
    #[must_use]
    pub fn from_responses(config: ConfigurationResponse, genres: GenreListResponse) -> Self {
        let images = config.images;
        let image_base_url = if images.secure_base_url.is_empty() {
            images.base_url
        } else {
            images.secure_base_url
        };

        // An empty size list means TMDB did not say; assume the usual sizes.
        let poster_size = if images.poster_sizes.is_empty()
            || images.poster_sizes.iter().any(|s| s == POSTER_SIZE)
        {
            POSTER_SIZE
        } else {
            ORIGINAL_SIZE
        };

        Self {
            image_base_url,
            poster_size: poster_size.to_string(),
            genres: genres
                .genres
                .into_iter()
                .map(|genre| (genre.id, genre.name))
                .collect(),
            loaded_at: Utc::now(),
        }
    }

    /// Resolve genre ids to names, keeping the order of `ids`.
    ///
    /// Ids missing from the genre list are skipped.
    #[must_use]
    pub fn genre_names(&self, ids: &[GenreId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect()
    }

    /// Full poster URL for a TMDB poster path, or `None` if there is no poster.
    #[must_use]
    pub fn poster_url(&self, poster_path: Option<&str>) -> Option<String> {
        let path = poster_path.filter(|p| !p.is_empty())?;
        Some(format!(
            "{}{}{}",
            self.image_base_url, self.poster_size, path
        ))
    }

    /// Number of known genres.
    #[must_use]
    pub fn genre_count(&self) -> usize {
        self.genres.len()
    }

    /// When this snapshot was fetched.
    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

/// Holds the latest [`ApiMetadata`] snapshot.
#[derive(Clone)]
pub struct MetadataStore {
    client: TmdbClient,
    current: Arc<RwLock<Option<Arc<ApiMetadata>>>>,
}

impl MetadataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(client: TmdbClient) -> Self {
        Self {
            client,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// The latest snapshot, if one has been loaded.
    #[must_use]
    pub fn current(&self) -> Option<Arc<ApiMetadata>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a snapshot has been loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// Fetch the configuration and genre list and replace the snapshot.
    ///
    /// On failure the previous snapshot is left in place.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError` if either request fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Arc<ApiMetadata>, TmdbError> {
        let config = self.client.configuration().await?;
        let genres = self.client.movie_genres().await?;

        let metadata = Arc::new(ApiMetadata::from_responses(config, genres));
        self.replace(Arc::clone(&metadata));

        info!(genres = metadata.genre_count(), "Loaded TMDB metadata");
        Ok(metadata)
    }

    /// The current snapshot, loading it first if the store is still empty.
    ///
    /// # Errors
    ///
    /// Returns `TmdbError` if the store is empty and loading fails.
    pub async fn get_or_load(&self) -> Result<Arc<ApiMetadata>, TmdbError> {
        match self.current() {
            Some(metadata) => Ok(metadata),
            None => self.load().await,
        }
    }

    /// Spawn the background refresh task.
    ///
    /// The first load happens immediately; subsequent loads run every
    /// `interval`. Failures are logged and retried at the next tick.
    pub fn spawn_refresh(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        info!(interval_secs = interval.as_secs(), "Spawning TMDB metadata refresh task");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = store.load().await {
                    warn!(
                        error = %e,
                        previous_loaded_at = ?store.current().map(|m| m.loaded_at()),
                        "Failed to refresh TMDB metadata"
                    );
                }
            }
        })
    }

    fn replace(&self, metadata: Arc<ApiMetadata>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(metadata);
    }

    /// Install a snapshot directly (tests only).
    #[cfg(test)]
    pub(crate) fn set(&self, metadata: ApiMetadata) {
        self.replace(Arc::new(metadata));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tmdb::types::{Genre, ImagesConfiguration};

    /// Metadata resembling what TMDB returns.
    pub(crate) fn sample_metadata() -> ApiMetadata {
        ApiMetadata::from_responses(
            ConfigurationResponse {
                images: ImagesConfiguration {
                    base_url: "http://image.tmdb.org/t/p/".to_string(),
                    secure_base_url: "https://image.tmdb.org/t/p/".to_string(),
                    poster_sizes: vec![
                        "w92".to_string(),
                        "w342".to_string(),
                        "original".to_string(),
                    ],
                },
            },
            GenreListResponse {
                genres: vec![
                    Genre {
                        id: GenreId::new(28),
                        name: "Action".to_string(),
                    },
                    Genre {
                        id: GenreId::new(80),
                        name: "Crime".to_string(),
                    },
                    Genre {
                        id: GenreId::new(53),
                        name: "Thriller".to_string(),
                    },
                ],
            },
        )
    }

    #[test]
    fn test_genre_names_keep_order_and_skip_unknown() {
        let metadata = sample_metadata();
        let names = metadata.genre_names(&[
            GenreId::new(80),
            GenreId::new(9999),
            GenreId::new(28),
        ]);
        assert_eq!(names, vec!["Crime".to_string(), "Action".to_string()]);
    }

    #[test]
    fn test_genre_names_empty() {
        assert!(sample_metadata().genre_names(&[]).is_empty());
    }

    #[test]
    fn test_poster_url() {
        let metadata = sample_metadata();
        assert_eq!(
            metadata.poster_url(Some("/poster.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w342/poster.jpg")
        );
        assert_eq!(metadata.poster_url(None), None);
        assert_eq!(metadata.poster_url(Some("")), None);
    }

    #[test]
    fn test_poster_size_falls_back_to_original() {
        let metadata = ApiMetadata::from_responses(
            ConfigurationResponse {
                images: ImagesConfiguration {
                    base_url: "http://image.tmdb.org/t/p/".to_string(),
                    secure_base_url: String::new(),
                    poster_sizes: vec!["w500".to_string(), "original".to_string()],
                },
            },
            GenreListResponse { genres: vec![] },
        );
        assert_eq!(
            metadata.poster_url(Some("/p.jpg")).as_deref(),
            Some("http://image.tmdb.org/t/p/original/p.jpg")
        );
    }

    /// A store whose client points at a port nothing listens on.
    fn unreachable_store() -> MetadataStore {
        let config = crate::config::TmdbConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: secrecy::SecretString::from("test-key"),
            refresh_interval: Duration::from_secs(60),
        };
        MetadataStore::new(TmdbClient::new(&config).expect("client builds"))
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_snapshot() {
        let store = unreachable_store();
        store.set(sample_metadata());
        let before = store.current().expect("snapshot is present");

        assert!(store.load().await.is_err());

        let after = store.current().expect("snapshot survives the failure");
        assert_eq!(after.genre_count(), 3);
        assert_eq!(after.loaded_at(), before.loaded_at());
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn test_failed_load_on_empty_store_stays_empty() {
        let store = unreachable_store();
        assert!(store.load().await.is_err());
        assert!(!store.is_ready());
        assert!(store.get_or_load().await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_task_survives_failures() {
        let store = unreachable_store();
        store.set(sample_metadata());

        let handle = store.spawn_refresh(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Several refreshes have failed; the task is still running and the
        // snapshot is untouched
        assert!(!handle.is_finished());
        let metadata = store.current().expect("snapshot survives refresh failures");
        assert_eq!(metadata.genre_count(), 3);

        handle.abort();
    }

    #[tokio::test]
    async fn test_store_swaps_snapshot() {
        let store = unreachable_store();
        assert!(!store.is_ready());

        store.set(sample_metadata());
        let metadata = store.get_or_load().await.expect("snapshot is present");
        assert_eq!(metadata.genre_count(), 3);
    }
}
