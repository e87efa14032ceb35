//! Remote option resolution and dependency cascades.
//!
//! The [`OptionResolver`] keeps an [`OptionsCache`] in sync with the remote
//! sources and dependency edges of a schema. It never performs I/O itself:
//! it hands out [`FetchRequest`]s and applies their results, so ordering is
//! explicit and stale results can be recognized by generation. An
//! [`OptionSource`] performs the actual fetch; [`HttpOptionSource`] does it
//! over HTTP.
//!
//! ## Cascade
//!
//! When a parent's value changes, each direct dependent has its value,
//! error, and options cleared and, if the parent now has a value, is fetched
//! from `childUrl + <percent-encoded parent value>`. Deeper descendants are
//! cleared without fetching; they are fetched once their own parent is set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use dynform_core::{FetchError, FormError, FormResult, RemoteSettings};

use crate::dependency::{DependencyGraph, Edge};
use crate::schema::{FieldId, FormSchema, SelectOption};
use crate::state::{FormState, OptionsCache};
use crate::value::FieldValue;

/// Characters left unescaped when a parent value is appended to a URL.
const PARENT_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Fetches the option list behind a URL.
#[async_trait]
pub trait OptionSource: Send + Sync {
    /// Returns the options at `url` in endpoint order.
    async fn fetch(&self, url: &str) -> Result<Vec<SelectOption>, FetchError>;
}

#[async_trait]
impl<T: OptionSource + ?Sized> OptionSource for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Vec<SelectOption>, FetchError> {
        (**self).fetch(url).await
    }
}

/// Option source backed by `reqwest`.
///
/// Expects `GET <url>` to answer with a JSON array of `{id, value}` objects.
#[derive(Debug, Clone)]
pub struct HttpOptionSource {
    client: reqwest::Client,
}

impl HttpOptionSource {
    /// Builds a client from remote settings (timeout, user agent, headers).
    pub fn from_settings(settings: &RemoteSettings) -> FormResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                FormError::ConfigurationError(format!("invalid header name '{name}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                FormError::ConfigurationError(format!("invalid value for header '{name}': {e}"))
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers);
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        let client = builder.build().map_err(|e| {
            FormError::ConfigurationError(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OptionSource for HttpOptionSource {
    async fn fetch(&self, url: &str) -> Result<Vec<SelectOption>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// In-memory option source keyed by exact URL.
///
/// Unknown URLs answer `404`. Every requested URL is recorded.
#[derive(Debug, Default)]
pub struct MemoryOptionSource {
    responses: HashMap<String, Result<Vec<SelectOption>, FetchError>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryOptionSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `options` at `url`.
    #[must_use]
    pub fn with_options(mut self, url: impl Into<String>, options: Vec<SelectOption>) -> Self {
        self.responses.insert(url.into(), Ok(options));
        self
    }

    /// Fails requests for `url` with `error`.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OptionSource for MemoryOptionSource {
    async fn fetch(&self, url: &str) -> Result<Vec<SelectOption>, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

/// A fetch the resolver wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The field whose options are fetched.
    pub field: FieldId,
    /// The full URL.
    pub url: String,
    /// The slot generation this request was issued under.
    pub generation: u64,
}

/// What happened when a fetch result was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Options were stored.
    Applied,
    /// The fetch failed; options are empty.
    Failed,
    /// The field changed since the request was issued; the result was dropped.
    Stale,
}

/// Performs every request concurrently and pairs each with its result.
pub async fn fetch_all<S: OptionSource + ?Sized>(
    source: &S,
    requests: Vec<FetchRequest>,
) -> Vec<(FetchRequest, Result<Vec<SelectOption>, FetchError>)> {
    let results = join_all(requests.iter().map(|r| source.fetch(&r.url))).await;
    requests.into_iter().zip(results).collect()
}

/// Appends a percent-encoded parent value to a dependent's URL prefix.
pub fn dependent_url(child_url: &str, parent_value: &FieldValue) -> String {
    let encoded = utf8_percent_encode(&parent_value.to_display_string(), PARENT_VALUE).to_string();
    format!("{child_url}{encoded}")
}

/// Keeps the options cache consistent with the schema's dependency graph.
#[derive(Debug, Clone)]
pub struct OptionResolver {
    graph: DependencyGraph,
}

impl OptionResolver {
    /// Creates a resolver over a checked dependency graph.
    pub const fn new(graph: DependencyGraph) -> Self {
        Self { graph }
    }

    /// The dependency graph.
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Requests to issue when a form is mounted.
    ///
    /// Independent remote fields are fetched from their source URL.
    /// Dependents are fetched only when their parent starts with a value.
    pub fn mount_requests(
        &self,
        schema: &FormSchema,
        state: &FormState,
        cache: &mut OptionsCache,
    ) -> Vec<FetchRequest> {
        schema
            .ids()
            .filter_map(|id| self.source_url(schema, state, id))
            .map(|(id, url)| Self::issue(cache, id, url))
            .collect()
    }

    /// Re-issues the fetch for one field, if it currently has a source.
    pub fn refetch(
        &self,
        schema: &FormSchema,
        state: &FormState,
        cache: &mut OptionsCache,
        field: FieldId,
    ) -> Option<FetchRequest> {
        let (id, url) = self.source_url(schema, state, field)?;
        Some(Self::issue(cache, id, url))
    }

    /// Applies a parent's new value to its dependents.
    ///
    /// Returns the fetches for direct dependents and every field that was
    /// cleared, direct dependents first.
    pub fn propagate(
        &self,
        schema: &FormSchema,
        state: &mut FormState,
        cache: &mut OptionsCache,
        parent: FieldId,
    ) -> (Vec<FetchRequest>, Vec<FieldId>) {
        let parent_value = state.value(parent).clone();
        let mut requests = Vec::new();
        let mut cleared = Vec::new();

        for Edge { child, child_url } in self.graph.dependents(parent) {
            state.clear(*child);
            cache.clear(*child);
            cleared.push(*child);
            if !parent_value.is_null() {
                let url = dependent_url(child_url, &parent_value);
                requests.push(Self::issue(cache, *child, url));
            }
        }
        for descendant in self.graph.descendants(parent) {
            state.clear(descendant);
            cache.clear(descendant);
            cleared.push(descendant);
        }

        tracing::debug!(
            parent = %schema.field(parent).name,
            value = %parent_value,
            fetches = requests.len(),
            cleared = cleared.len(),
            "Propagated dependency change"
        );
        (requests, cleared)
    }

    /// Stores a fetch result if the request is still current.
    pub fn complete(
        &self,
        schema: &FormSchema,
        cache: &mut OptionsCache,
        request: &FetchRequest,
        result: Result<Vec<SelectOption>, FetchError>,
    ) -> FetchOutcome {
        let name = &schema.field(request.field).name;
        if !cache.is_current(request.field, request.generation) {
            tracing::debug!(
                field = %name,
                url = %request.url,
                generation = request.generation,
                "Discarding stale option fetch"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(options) => {
                tracing::debug!(
                    field = %name,
                    url = %request.url,
                    count = options.len(),
                    "Options resolved"
                );
                cache.resolve(request.field, options);
                FetchOutcome::Applied
            }
            Err(error) => {
                let error = FormError::Fetch {
                    url: request.url.clone(),
                    source: error,
                };
                tracing::warn!(field = %name, error = %error, "Option fetch failed");
                cache.fail(request.field);
                FetchOutcome::Failed
            }
        }
    }

    fn source_url(
        &self,
        schema: &FormSchema,
        state: &FormState,
        id: FieldId,
    ) -> Option<(FieldId, String)> {
        if let Some((parent, edge)) = self.graph.parent_of(id) {
            let value = state.value(parent);
            return (!value.is_null()).then(|| (id, dependent_url(&edge.child_url, value)));
        }
        schema
            .field(id)
            .remote_source
            .as_ref()
            .map(|remote| (id, remote.url.clone()))
    }

    fn issue(cache: &mut OptionsCache, field: FieldId, url: String) -> FetchRequest {
        let generation = cache.begin_fetch(field);
        FetchRequest {
            field,
            url,
            generation,
        }
    }
}
