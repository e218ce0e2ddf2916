//! Salesforce session credentials carried in the signed cookie

use serde::{Deserialize, Serialize};

/// Credentials obtained from the Salesforce OAuth2 exchange.
///
/// Field names serialize in camelCase so the signed payload keeps the
/// `instanceUrl` / `accessToken` / `refreshToken` claim names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub instance_url: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl SessionToken {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_claims() {
        let token = SessionToken::new("https://na1.salesforce.com", "00Dxx", "5Aep");
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["instanceUrl"], "https://na1.salesforce.com");
        assert_eq!(json["accessToken"], "00Dxx");
        assert_eq!(json["refreshToken"], "5Aep");
    }

    #[test]
    fn test_missing_refresh_token_defaults_empty() {
        let token: SessionToken =
            serde_json::from_str(r#"{"instanceUrl":"https://x","accessToken":"a"}"#).unwrap();
        assert!(!token.has_refresh_token());
    }
}
