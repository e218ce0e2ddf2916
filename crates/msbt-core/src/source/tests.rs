//! Tests for the data source trait

use super::*;
use serde_json::json;

struct EchoSource;

#[async_trait::async_trait]
impl DataSource for EchoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Monday
    }

    async fn execute(&self, request: SourceRequest) -> Result<serde_json::Value> {
        Ok(json!({ "query": request.envelope.query }))
    }
}

#[test]
fn test_source_kind_round_trip_names() {
    for kind in SourceKind::ALL {
        assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
    }
}

#[test]
fn test_source_kind_case_insensitive() {
    assert_eq!("SalesForce".parse::<SourceKind>().unwrap(), SourceKind::Salesforce);
}

#[test]
fn test_unknown_source_kind() {
    let err = "hubspot".parse::<SourceKind>().unwrap_err();
    assert!(err.to_string().contains("hubspot"));
}

#[test]
fn test_source_kind_serde() {
    assert_eq!(serde_json::to_value(SourceKind::Smartsheet).unwrap(), json!("smartsheet"));
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    let source: Box<dyn DataSource> = Box::new(EchoSource);
    let result = source
        .execute(SourceRequest::new(QueryEnvelope::with_query("{ me { id } }")))
        .await
        .unwrap();

    assert_eq!(source.kind(), SourceKind::Monday);
    assert_eq!(result["query"], "{ me { id } }");
}

#[test]
fn test_request_with_credentials() {
    let request = SourceRequest::default()
        .with_credentials(SessionToken::new("https://x", "tok", ""));
    assert_eq!(request.credentials.unwrap().access_token, "tok");
}
