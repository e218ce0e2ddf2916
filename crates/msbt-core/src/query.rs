//! Query envelope posted by the dashboard form

use serde::{Deserialize, Serialize};

/// Body of every `POST /api/<source>` request.
///
/// `query` is a GraphQL selection for Monday, SOQL for Salesforce and a
/// virtual function call for Smartsheet. `info` is only read by Salesforce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl QueryEnvelope {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Trimmed query text, `None` when absent or blank
    pub fn query_text(&self) -> Option<&str> {
        non_blank(self.query.as_deref())
    }

    /// Trimmed info selector, `None` when absent or blank
    pub fn info_text(&self) -> Option<&str> {
        non_blank(self.info.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
