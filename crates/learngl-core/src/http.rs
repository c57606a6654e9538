use crate::error::{DocsError, Result};
use crate::source::{DocumentId, DocumentSource};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::Instant;

/// Maximum number of cached entries to prevent unbounded memory growth.
const MAX_CACHE_ENTRIES: usize = 1000;

/// Cached HTTP response with validation headers.
///
/// The body is wrapped in `Arc` so revalidated hits hand out the same buffer.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Arc<Vec<u8>>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: Instant,
}

/// Addressing and caching options for [`HttpSource`].
///
/// # Defaults
///
/// - `base_url`: `"http://localhost:5173"`
/// - `docs_path`: `"/docs/"`
/// - `extension`: `".mdx"`
/// - `cache`: `true`
#[derive(Debug, Clone)]
pub struct HttpSourceOptions {
    pub base_url: String,
    pub docs_path: String,
    pub extension: String,
    pub cache: bool,
}

impl Default for HttpSourceOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".into(),
            docs_path: "/docs/".into(),
            extension: ".mdx".into(),
            cache: true,
        }
    }
}

/// Fetches documents over HTTP: `GET {base_url}{docs_path}{id}{extension}`.
///
/// A 2xx response yields the body; anything else is an error. With caching
/// enabled, responses are stored with their ETag/Last-Modified headers and
/// later requests for the same URL are sent as conditional GETs, serving the
/// stored body on `304 Not Modified`. Transport failures are always reported,
/// never papered over with a cached copy.
///
/// # Examples
///
/// ```no_run
/// use learngl_core::http::{HttpSource, HttpSourceOptions};
/// use learngl_core::source::{DocumentId, DocumentSource};
///
/// # async fn example() -> learngl_core::Result<()> {
/// let source = HttpSource::new(HttpSourceOptions {
///     base_url: "https://learngl.example".into(),
///     ..Default::default()
/// })?;
/// let id = DocumentId::new("introduction")?;
/// assert_eq!(source.location(&id), "https://learngl.example/docs/introduction.mdx");
/// let text = source.fetch(&id).await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpSource {
    options: HttpSourceOptions,
    entries: DashMap<String, CachedResponse>,
    client: Client,
}

impl HttpSource {
    /// Creates a new source.
    ///
    /// # Errors
    ///
    /// Returns `DocsError::RequestFailed` if the HTTP client cannot be built.
    pub fn new(mut options: HttpSourceOptions) -> Result<Self> {
        while options.base_url.ends_with('/') {
            options.base_url.pop();
        }

        let client = Client::builder()
            .user_agent(concat!("learngl-reader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DocsError::RequestFailed {
                url: options.base_url.clone(),
                source: e,
            })?;

        Ok(Self {
            options,
            entries: DashMap::new(),
            client,
        })
    }

    /// Full URL for a document.
    pub fn url_for(&self, id: &DocumentId) -> String {
        format!(
            "{}{}{}{}",
            self.options.base_url,
            self.options.docs_path,
            id.encoded(),
            self.options.extension
        )
    }

    /// Retrieves `url`, revalidating a cached copy when one exists.
    ///
    /// # Errors
    ///
    /// Returns `DocsError::RequestFailed` on transport failure and
    /// `DocsError::HttpStatus` for non-success responses.
    pub async fn get_cached(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if self.entries.len() >= MAX_CACHE_ENTRIES {
            self.evict_entries();
        }

        // Clone out of the map so no shard lock is held across the request.
        let cached = self.entries.get(url).map(|entry| entry.value().clone());

        if let Some(cached) = cached {
            return match self.conditional_request(url, &cached).await? {
                Some(new_body) => Ok(new_body),
                None => {
                    tracing::debug!("not modified, serving cached body: {}", url);
                    Ok(cached.body)
                }
            };
        }

        self.fetch_and_store(url).await
    }

    /// Sends `If-None-Match`/`If-Modified-Since` for a cached entry.
    ///
    /// Returns `Ok(None)` on 304, `Ok(Some(body))` when the content changed.
    async fn conditional_request(
        &self,
        url: &str,
        cached: &CachedResponse,
    ) -> Result<Option<Arc<Vec<u8>>>> {
        let mut request = self.client.get(url);

        if let Some(etag) = &cached.etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &cached.last_modified {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(|e| DocsError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }

        self.store_response(url, response).await.map(Some)
    }

    /// Fetches a fresh response and stores it in the cache.
    pub(crate) async fn fetch_and_store(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        tracing::debug!("fetching fresh: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocsError::RequestFailed {
                url: url.to_string(),
                source: e,
            })?;

        self.store_response(url, response).await
    }

    async fn store_response(&self, url: &str, response: reqwest::Response) -> Result<Arc<Vec<u8>>> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            self.entries.remove(url);
            return Err(DocsError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let etag = header_string(&response, header::ETAG);
        let last_modified = header_string(&response, header::LAST_MODIFIED);

        let body = response
            .bytes()
            .await
            .map_err(|e| DocsError::RequestFailed {
                url: url.to_string(),
                source: e,
            })?;

        let body_arc = Arc::new(body.to_vec());

        if self.options.cache && (etag.is_some() || last_modified.is_some()) {
            self.entries.insert(
                url.to_string(),
                CachedResponse {
                    body: Arc::clone(&body_arc),
                    etag,
                    last_modified,
                    fetched_at: Instant::now(),
                },
            );
        }

        Ok(body_arc)
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts the oldest ~10% of entries once capacity is reached.
    fn evict_entries(&self) {
        let target_removals = MAX_CACHE_ENTRIES / 10;

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, time)| *time);

        let mut removed = 0;
        for (url, _) in by_age.iter().take(target_removals) {
            self.entries.remove(url);
            removed += 1;
        }

        tracing::debug!("evicted {} cache entries", removed);
    }
}

fn header_string(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, id: &DocumentId) -> Result<String> {
        let url = self.url_for(id);
        let body = self.get_cached(&url).await?;
        String::from_utf8(body.to_vec()).map_err(|_| DocsError::InvalidEncoding(url))
    }

    fn location(&self, id: &DocumentId) -> String {
        self.url_for(id)
    }
}
