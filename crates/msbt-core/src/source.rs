//! Data source trait definitions

use crate::{QueryEnvelope, Result, SessionToken};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The external platforms the dashboard can query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Monday,
    Salesforce,
    Smartsheet,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Salesforce,
        SourceKind::Monday,
        SourceKind::Smartsheet,
    ];

    /// Route segment and metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Monday => "monday",
            SourceKind::Salesforce => "salesforce",
            SourceKind::Smartsheet => "smartsheet",
        }
    }

    /// Human readable name shown in the form
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Monday => "Monday",
            SourceKind::Salesforce => "Salesforce",
            SourceKind::Smartsheet => "Smartsheet",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "monday" => Ok(SourceKind::Monday),
            "salesforce" => Ok(SourceKind::Salesforce),
            "smartsheet" => Ok(SourceKind::Smartsheet),
            other => Err(crate::Error::InvalidRequest(format!(
                "Unknown data source: {}",
                other
            ))),
        }
    }
}

/// A query routed to one data source
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
    pub envelope: QueryEnvelope,
    /// Salesforce session; other sources authenticate with static keys
    pub credentials: Option<SessionToken>,
}

impl SourceRequest {
    pub fn new(envelope: QueryEnvelope) -> Self {
        Self {
            envelope,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: SessionToken) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Which platform this source talks to
    fn kind(&self) -> SourceKind;

    /// Run the query and shape the result into JSON
    async fn execute(&self, request: SourceRequest) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests;
