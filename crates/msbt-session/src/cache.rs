//! Process-local token cache
//!
//! Holds the credentials of the most recent Salesforce login under three
//! fixed keys. The cache is shared by every request; the last login wins.

use dashmap::DashMap;
use msbt_core::SessionToken;
use std::sync::Arc;
use tracing::{error, info};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const INSTANCE_URL_KEY: &str = "instanceUrl";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Which keys were written by a `store` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOutcome {
    pub access_token: bool,
    pub instance_url: bool,
    pub refresh_token: bool,
}

impl StoreOutcome {
    pub fn all_stored(&self) -> bool {
        self.access_token && self.instance_url && self.refresh_token
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    entries: Arc<DashMap<&'static str, String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a login's credentials. Empty values are not cached and the
    /// previous entry for that key is left in place.
    pub fn store(&self, session: &SessionToken) -> StoreOutcome {
        let outcome = StoreOutcome {
            access_token: self.set(ACCESS_TOKEN_KEY, &session.access_token),
            instance_url: self.set(INSTANCE_URL_KEY, &session.instance_url),
            refresh_token: self.set(REFRESH_TOKEN_KEY, &session.refresh_token),
        };

        if !outcome.access_token {
            error!("Failed to set access token in cache");
        }
        if !outcome.instance_url {
            error!("Failed to set instance URL in cache");
        }
        if !outcome.refresh_token {
            error!("Failed to set refresh token in cache");
        }
        if outcome.all_stored() {
            info!("Session credentials cached");
        }

        outcome
    }

    fn set(&self, key: &'static str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.entries.insert(key, value.to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Cached credentials; `None` until a login has stored an access token
    /// and instance URL
    pub fn snapshot(&self) -> Option<SessionToken> {
        Some(SessionToken::new(
            self.get(INSTANCE_URL_KEY)?,
            self.get(ACCESS_TOKEN_KEY)?,
            self.get(REFRESH_TOKEN_KEY).unwrap_or_default(),
        ))
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
