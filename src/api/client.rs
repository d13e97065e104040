//! PokeAPI client
//!
//! Every fetch follows the same path: build a cache key from the resource kind
//! and the resolved URL, answer from the cache when possible, otherwise GET the
//! URL, decode the body and only then cache the raw bytes.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::transport::{HttpTransport, Transport};
use super::{LocationArea, LocationPage, PageDirection, PaginationState, Pokemon, Species};
use crate::cache::ResponseCache;
use crate::error::{PokedexError, Result};

/// Base URL for the PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Default bound on a single request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Remote resources the client knows how to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    LocationList,
    Area,
    Pokemon,
    Species,
}

impl ResourceKind {
    fn cache_prefix(self) -> &'static str {
        match self {
            ResourceKind::LocationList => "location",
            ResourceKind::Area => "area",
            ResourceKind::Pokemon => "pokemon",
            ResourceKind::Species => "species",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ResourceKind::LocationList => "location list",
            ResourceKind::Area => "location area",
            ResourceKind::Pokemon => "pokemon",
            ResourceKind::Species => "pokemon species",
        }
    }
}

/// Canonical cache key for a resource kind and resolved URL
fn cache_key(kind: ResourceKind, url: &str) -> String {
    format!("{}-key-{}", kind.cache_prefix(), url)
}

/// Result of asking for the next or previous page of locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A page was fetched; `state` holds the cursors to use next time
    Page {
        page: LocationPage,
        state: PaginationState,
    },
    /// Already at that end of the listing; nothing was fetched
    NoMorePages,
}

/// Client for the PokeAPI backed by a shared response cache
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    base_url: String,
}

impl PokeApiClient {
    /// Creates a client that talks HTTP with the given request timeout
    pub fn new(cache: ResponseCache, timeout: Duration) -> Result<Self> {
        debug!(?timeout, "creating PokeAPI client");
        let transport = HttpTransport::new(timeout)?;
        Ok(Self::with_transport(Arc::new(transport), cache))
    }

    /// Creates a client with a custom transport
    pub fn with_transport(transport: Arc<dyn Transport>, cache: ResponseCache) -> Self {
        Self {
            transport,
            cache,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// URL of the first page of the location listing
    pub fn first_locations_url(&self) -> String {
        format!("{}/location-area", self.base_url)
    }

    /// Fetches a page of location areas
    ///
    /// `cursor` is a `next`/`previous` URL from an earlier page, passed back
    /// verbatim; `None` fetches the first page.
    pub async fn list_locations(&self, cursor: Option<&str>) -> Result<LocationPage> {
        let url = match cursor {
            Some(cursor) => {
                let cursor = cursor.trim();
                if cursor.is_empty() {
                    return Err(PokedexError::Validation(
                        "page cursor must not be empty".to_string(),
                    ));
                }
                cursor.to_string()
            }
            None => self.first_locations_url(),
        };
        self.fetch(ResourceKind::LocationList, &url).await
    }

    /// Moves through the location listing in `direction` from `state`
    pub async fn page_locations(
        &self,
        state: &PaginationState,
        direction: PageDirection,
    ) -> Result<PageOutcome> {
        let Some(cursor) = state.cursor(direction) else {
            debug!(?direction, "no more location pages");
            return Ok(PageOutcome::NoMorePages);
        };
        let page = self.list_locations(cursor).await?;
        let state = PaginationState::after(&page);
        Ok(PageOutcome::Page { page, state })
    }

    /// Fetches a location area with its encounter list
    pub async fn fetch_area(&self, name: &str) -> Result<LocationArea> {
        let url = self.resource_url("location-area", "area", name)?;
        self.fetch(ResourceKind::Area, &url).await
    }

    /// Fetches a Pokemon by name or id
    pub async fn fetch_creature(&self, name: &str) -> Result<Pokemon> {
        let url = self.resource_url("pokemon", "pokemon", name)?;
        self.fetch(ResourceKind::Pokemon, &url).await
    }

    /// Fetches species data, including the capture rate
    pub async fn fetch_species(&self, name: &str) -> Result<Species> {
        let url = self.resource_url("pokemon-species", "species", name)?;
        self.fetch(ResourceKind::Species, &url).await
    }

    fn resource_url(&self, path: &str, what: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PokedexError::Validation(format!("{what} name is required")));
        }
        // PokeAPI identifiers are lowercase ASCII letters, digits and hyphens
        let name = name.to_ascii_lowercase();
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(PokedexError::Validation(format!(
                "{what} name must not contain '{bad}': {name}"
            )));
        }
        Ok(format!("{}/{}/{}", self.base_url, path, name))
    }

    async fn fetch<T: DeserializeOwned>(&self, kind: ResourceKind, url: &str) -> Result<T> {
        let key = cache_key(kind, url);

        if let Some(cached) = self.cache.get(&key) {
            debug!(%url, "serving {} from cache", kind.label());
            return serde_json::from_slice(&cached).map_err(|source| {
                error!(%url, %source, "cached {} is corrupt", kind.label());
                PokedexError::Decode {
                    what: format!("cached {}", kind.label()),
                    source,
                }
            });
        }

        debug!(%url, "cache miss for {}, fetching", kind.label());
        let body = self.transport.get(url).await.map_err(|err| {
            error!(%url, %err, "failed to fetch {}", kind.label());
            err
        })?;

        let decoded = serde_json::from_slice(&body).map_err(|source| PokedexError::Decode {
            what: kind.label().to_string(),
            source,
        })?;
        self.cache.put(key, body);
        Ok(decoded)
    }
}
