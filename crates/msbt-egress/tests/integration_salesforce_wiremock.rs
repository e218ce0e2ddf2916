//! Integration tests for the Salesforce connector and OAuth client using wiremock

use msbt_core::{DataSource, QueryEnvelope, SessionToken, SourceRequest};
use msbt_egress::{
    EgressError,
    client::HttpClientConfig,
    salesforce::{SalesforceConfig, SalesforceConnector},
    salesforce_oauth::{SalesforceOAuth, SalesforceOAuthConfig},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path, query_param},
};

fn no_retry() -> HttpClientConfig {
    HttpClientConfig {
        max_retries: 0,
        ..Default::default()
    }
}

fn connector() -> SalesforceConnector {
    SalesforceConnector::new(SalesforceConfig {
        client_config: no_retry(),
        ..Default::default()
    })
    .unwrap()
}

fn session(server: &MockServer) -> SessionToken {
    SessionToken::new(server.uri(), "sf-access", "sf-refresh")
}

fn oauth(server: &MockServer) -> SalesforceOAuth {
    let mut config = SalesforceOAuthConfig::new("client-id", "client-secret", "http://localhost:3000/api/oauth")
        .with_login_url(server.uri());
    config.client_config = no_retry();
    SalesforceOAuth::new(config).unwrap()
}

#[tokio::test]
async fn test_salesforce_soql_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .and(query_param("q", "SELECT Id, Name FROM Entitlement"))
        .and(header("authorization", "Bearer sf-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 1,
            "done": true,
            "records": [{ "attributes": { "type": "Entitlement" }, "Id": "550x", "Name": "Gold" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = SourceRequest::new(QueryEnvelope::with_query("SELECT Id, Name FROM Entitlement"))
        .with_credentials(session(&mock_server));
    let result = connector().execute(request).await.unwrap();

    assert_eq!(result["totalSize"], 1);
    assert_eq!(result["records"][0]["Name"], "Gold");
}

#[tokio::test]
async fn test_salesforce_configured_instance_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalSize": 0, "done": true, "records": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = SalesforceConnector::new(SalesforceConfig {
        instance_url: Some(mock_server.uri()),
        client_config: no_retry(),
        ..Default::default()
    })
    .unwrap();

    let credentials = SessionToken::new("https://unreachable.invalid", "sf-access", "");
    let result = connector.query(&credentials, "SELECT Id FROM Account").await.unwrap();
    assert_eq!(result["done"], true);
}

#[tokio::test]
async fn test_salesforce_describe_single_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Account",
            "fields": [{ "name": "Id" }, { "name": "Name" }, { "name": "Industry" }]
        })))
        .mount(&mock_server)
        .await;

    let request = SourceRequest::new(QueryEnvelope::default().with_info("Account"))
        .with_credentials(session(&mock_server));
    let result = connector().execute(request).await.unwrap();

    assert_eq!(result, json!(["Id", "Name", "Industry"]));
}

#[tokio::test]
async fn test_salesforce_describe_all_objects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "encoding": "UTF-8",
            "sobjects": [{ "name": "Account" }, { "name": "Case" }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Account/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fields": [{ "name": "Id" }] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Case/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": [{ "name": "Id" }, { "name": "Subject" }]
        })))
        .mount(&mock_server)
        .await;

    let request = SourceRequest::new(QueryEnvelope::default().with_info("all"))
        .with_credentials(session(&mock_server));
    let result = connector().execute(request).await.unwrap();

    assert_eq!(
        result,
        json!({ "Account": ["Id"], "Case": ["Id", "Subject"] })
    );
}

#[tokio::test]
async fn test_salesforce_info_replaces_query_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalSize": 0, "done": true, "records": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Case/describe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fields": [{ "name": "Subject" }] })))
        .mount(&mock_server)
        .await;

    let request = SourceRequest::new(QueryEnvelope::with_query("SELECT Id FROM Case").with_info("Case"))
        .with_credentials(session(&mock_server));
    let result = connector().execute(request).await.unwrap();

    assert_eq!(result, json!(["Subject"]));
}

#[tokio::test]
async fn test_salesforce_expired_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!([{
            "message": "Session expired or invalid",
            "errorCode": "INVALID_SESSION_ID"
        }])))
        .mount(&mock_server)
        .await;

    let err = connector()
        .query(&session(&mock_server), "SELECT Id FROM Account")
        .await
        .unwrap_err();
    assert!(matches!(err, EgressError::Unauthorized(ref body) if body.contains("INVALID_SESSION_ID")));
}

#[tokio::test]
async fn test_salesforce_malformed_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
            "message": "unexpected token: FORM",
            "errorCode": "MALFORMED_QUERY"
        }])))
        .mount(&mock_server)
        .await;

    let request = SourceRequest::new(QueryEnvelope::with_query("SELECT Id FORM Account"))
        .with_credentials(session(&mock_server));
    let err = connector().execute(request).await.unwrap_err();
    assert!(matches!(
        err,
        msbt_core::Error::Upstream { status_code: 400, .. }
    ));
}

#[tokio::test]
async fn test_oauth_exchange_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-123"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "00Dxx!AQ",
            "refresh_token": "5Aep861",
            "instance_url": "https://acme.my.salesforce.com",
            "id": "https://login.salesforce.com/id/00Dxx/005xx",
            "token_type": "Bearer",
            "issued_at": "1700000000000",
            "signature": "sig"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = oauth(&mock_server).exchange_code("auth-code-123").await.unwrap();
    assert_eq!(
        token,
        SessionToken::new("https://acme.my.salesforce.com", "00Dxx!AQ", "5Aep861")
    );
}

#[tokio::test]
async fn test_oauth_exchange_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "expired authorization code"
        })))
        .mount(&mock_server)
        .await;

    let err = oauth(&mock_server).exchange_code("stale").await.unwrap_err();
    assert!(matches!(
        err,
        EgressError::AuthorizationFailed(ref m) if m == "invalid_grant: expired authorization code"
    ));
}

#[tokio::test]
async fn test_oauth_refresh_keeps_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=sf-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-access",
            "instance_url": "https://acme.my.salesforce.com",
            "token_type": "Bearer"
        })))
        .mount(&mock_server)
        .await;

    let token = oauth(&mock_server).refresh("sf-refresh").await.unwrap();
    assert_eq!(token.access_token, "fresh-access");
    assert_eq!(token.refresh_token, "sf-refresh");
}
