//! Shared handler state

use crate::types::{IngressError, IngressResult};
use msbt_core::{DataSource, SourceKind};
use msbt_egress::salesforce_oauth::SalesforceOAuth;
use msbt_observability::Metrics;
use msbt_session::{DEFAULT_COOKIE_MAX_AGE_SECS, TokenCache, TokenSigner};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    sources: HashMap<SourceKind, Arc<dyn DataSource>>,
    pub signer: Arc<TokenSigner>,
    pub cache: TokenCache,
    pub oauth: Option<Arc<SalesforceOAuth>>,
    pub metrics: Option<Arc<Metrics>>,
    pub cookie_max_age_secs: i64,
}

impl AppState {
    pub fn new(signer: TokenSigner) -> Self {
        Self {
            sources: HashMap::new(),
            signer: Arc::new(signer),
            cache: TokenCache::new(),
            oauth: None,
            metrics: None,
            cookie_max_age_secs: DEFAULT_COOKIE_MAX_AGE_SECS,
        }
    }

    /// Register a source under its own kind, replacing any previous one
    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    pub fn with_oauth(mut self, oauth: Arc<SalesforceOAuth>) -> Self {
        self.oauth = Some(oauth);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_cache(mut self, cache: TokenCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cookie_max_age_secs(mut self, secs: i64) -> Self {
        self.cookie_max_age_secs = secs;
        self
    }

    pub fn is_configured(&self, kind: SourceKind) -> bool {
        self.sources.contains_key(&kind)
    }

    pub fn source(&self, kind: SourceKind) -> IngressResult<Arc<dyn DataSource>> {
        self.sources
            .get(&kind)
            .cloned()
            .ok_or(IngressError::NotConfigured(kind))
    }

    pub fn oauth(&self) -> IngressResult<Arc<SalesforceOAuth>> {
        self.oauth
            .clone()
            .ok_or(IngressError::NotConfigured(SourceKind::Salesforce))
    }
}
