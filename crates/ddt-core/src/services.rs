//! External collaborators
//!
//! The pipeline talks to four things it does not own:
//! - [`GenerationService`]: produces prompts, validators and test sets
//! - [`TemplateLookup`]: resolves reusable templates by id
//! - [`MonthCatalog`]: month-name constants per language
//! - [`TranslationSink`]: project-wide translation table
//!
//! Each is a trait so the pipeline runs against fakes in tests.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::template::Template;
use async_trait::async_trait;
use ddt_schema::BaseStep;
use moka::future::Cache;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Runtime key → localized text
pub type Translations = BTreeMap<String, String>;

/// Generation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// One of the base dialogue steps
    Step(BaseStep),
    /// Constraint recovery messages
    ConstraintMessages,
    /// Constraint validator
    Validator,
    /// Constraint test set
    Testset,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step(step) => write!(f, "{step}"),
            Self::ConstraintMessages => write!(f, "constraintMessages"),
            Self::Validator => write!(f, "validator"),
            Self::Testset => write!(f, "testset"),
        }
    }
}

/// Content generation service
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Call an endpoint with a JSON body
    async fn call(&self, endpoint: Endpoint, body: Value) -> Result<Value, ServiceError>;
}

/// Generation service over HTTP (JSON POST)
#[derive(Debug, Clone)]
pub struct HttpGenerationService {
    client: Client,
    config: ServiceConfig,
}

impl HttpGenerationService {
    /// Create service from configuration
    ///
    /// # Errors
    /// Returns `ServiceError::Transport` if the HTTP client cannot be built
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn call(&self, endpoint: Endpoint, body: Value) -> Result<Value, ServiceError> {
        let url = self.config.url(endpoint);
        debug!(%endpoint, %url, "Calling generation service");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;

        read_json(url, response).await
    }
}

/// Reusable template lookup
pub trait TemplateLookup: Send + Sync {
    /// Template by id, if known
    fn get_template(&self, guid: &str) -> Option<Template>;
}

/// In-memory template table
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, Template>,
}

impl StaticTemplates {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With template (keyed by its id)
    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.insert(template.id.clone(), template);
        self
    }

    /// Number of templates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateLookup for StaticTemplates {
    fn get_template(&self, guid: &str) -> Option<Template> {
        self.templates.get(guid).cloned()
    }
}

/// Month-name constants per language
#[async_trait]
pub trait MonthCatalog: Send + Sync {
    /// Month names (full and abbreviated) for an upper-case language code
    async fn months(&self, language: &str) -> Result<Vec<String>, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct MonthsResponse {
    #[serde(default)]
    values: Vec<String>,
}

/// Month constants over HTTP (`GET /constants/months/{LANG}`)
#[derive(Debug, Clone)]
pub struct HttpMonthCatalog {
    client: Client,
    config: ServiceConfig,
}

impl HttpMonthCatalog {
    /// Create catalog from configuration
    ///
    /// # Errors
    /// Returns `ServiceError::Transport` if the HTTP client cannot be built
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MonthCatalog for HttpMonthCatalog {
    async fn months(&self, language: &str) -> Result<Vec<String>, ServiceError> {
        let url = self.config.months_url(language);
        debug!(%language, %url, "Fetching month constants");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;
        let value = read_json(url.clone(), response).await?;
        let parsed: MonthsResponse =
            serde_json::from_value(value).map_err(|e| ServiceError::InvalidResponse {
                url,
                message: e.to_string(),
            })?;
        Ok(parsed.values)
    }
}

/// In-memory month table
#[derive(Debug, Clone, Default)]
pub struct StaticMonthCatalog {
    by_language: HashMap<String, Vec<String>>,
}

impl StaticMonthCatalog {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With month names for a language
    #[must_use]
    pub fn with_language<I, S>(mut self, language: &str, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_language.insert(
            language.to_ascii_uppercase(),
            months.into_iter().map(Into::into).collect(),
        );
        self
    }
}

#[async_trait]
impl MonthCatalog for StaticMonthCatalog {
    async fn months(&self, language: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .by_language
            .get(&language.to_ascii_uppercase())
            .cloned()
            .unwrap_or_default())
    }
}

/// Month catalog with a moka cache in front
///
/// Lookups for the same language within one process hit the inner catalog
/// once. Failures are not cached.
#[derive(Clone)]
pub struct CachedMonthCatalog<C> {
    inner: Arc<C>,
    cache: Cache<String, Arc<Vec<String>>>,
}

impl<C: MonthCatalog + 'static> CachedMonthCatalog<C> {
    /// Wrap a catalog
    #[must_use]
    pub fn new(inner: C, max_languages: u64) -> Self {
        Self {
            inner: Arc::new(inner),
            cache: Cache::new(max_languages),
        }
    }

    /// Wrap a catalog with time-based expiration
    #[must_use]
    pub fn with_ttl(inner: C, max_languages: u64, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            cache: Cache::builder()
                .max_capacity(max_languages)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl<C: MonthCatalog + 'static> MonthCatalog for CachedMonthCatalog<C> {
    async fn months(&self, language: &str) -> Result<Vec<String>, ServiceError> {
        let key = language.to_ascii_uppercase();
        let inner = Arc::clone(&self.inner);
        let lookup = key.clone();
        let months = self
            .cache
            .try_get_with(key, async move { inner.months(&lookup).await.map(Arc::new) })
            .await
            .map_err(|e| ServiceError::Failed(e.to_string()))?;
        Ok(months.as_ref().clone())
    }
}

/// Receiver of newly minted translations
pub trait TranslationSink: Send + Sync {
    /// Add translations to the project table
    fn push(&self, translations: &Translations);
}

impl<F> TranslationSink for F
where
    F: Fn(&Translations) + Send + Sync,
{
    fn push(&self, translations: &Translations) {
        self(translations);
    }
}

/// Shared project translation table
#[derive(Debug, Clone, Default)]
pub struct SharedTranslations {
    inner: Arc<Mutex<Translations>>,
}

impl SharedTranslations {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current table
    #[must_use]
    pub fn snapshot(&self) -> Translations {
        self.inner.lock().clone()
    }

    /// Text for a runtime key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().get(key).cloned()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl TranslationSink for SharedTranslations {
    fn push(&self, translations: &Translations) {
        self.inner
            .lock()
            .extend(translations.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

fn build_client(config: &ServiceConfig) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|source| ServiceError::Transport {
            url: config.base_url.clone(),
            source,
        })
}

async fn read_json(url: String, response: reqwest::Response) -> Result<Value, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Status {
            url,
            status: status.as_u16(),
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ServiceError::InvalidResponse {
            url,
            message: e.to_string(),
        })
}
