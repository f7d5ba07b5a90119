// # RouterOS REST Client
//
// This crate provides the RouterOS implementation of `RouterApi` for the
// ExternalDNS webhook.
//
// - Makes exactly one HTTP request per call
// - Full error propagation to the caller (the controller retries next cycle)
// - HTTP timeout configured (30 seconds)
// - HTTP status codes mapped to error kinds (401/403, 404, other 4xx/5xx)
// - Dry-run mode for safe testing
// - Optional TLS verification skip for self-signed router certificates
//
// ## Security Requirements
//
// - The password NEVER appears in logs or `Debug` output
// - The client MUST fail fast if the username is empty
//
// ## API Reference
//
// - RouterOS REST API: https://help.mikrotik.com/docs/display/ROS/REST+API
// - System resource: GET `/rest/system/resource`
// - List static DNS: GET `/rest/ip/dns/static?type=...&name=...`
// - Create static DNS: PUT `/rest/ip/dns/static`
// - Delete static DNS: DELETE `/rest/ip/dns/static/:id`

use std::time::Duration;

use async_trait::async_trait;
use rosdns_core::config::RouterOsConfig;
use rosdns_core::traits::{RouterApi, SystemInfo};
use rosdns_core::{DnsRecord, Error, RecordFilter, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Name used in logs and provider errors
const API_NAME: &str = "routeros";

/// Static DNS table path
const DNS_STATIC_PATH: &str = "ip/dns/static";

/// Error body RouterOS returns on failed requests
#[derive(Debug, Default, Deserialize)]
struct RouterOsError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    detail: String,
}

/// RouterOS REST API client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform all GET requests (system info, record listing)
/// - Log the intended PUT and DELETE requests
/// - **NOT** actually modify the router
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct RouterOsClient {
    /// `<base_url>/rest`, without a trailing slash
    rest_url: String,

    /// API user
    username: String,

    /// API password
    /// ⚠️ NEVER log this value
    password: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT/DELETE
    dry_run: bool,
}

impl std::fmt::Debug for RouterOsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOsClient")
            .field("rest_url", &self.rest_url)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl RouterOsClient {
    /// Create a new RouterOS client
    ///
    /// # Parameters
    ///
    /// - `config`: router URL, credentials and TLS settings
    /// - `dry_run`: If true, perform GET requests but skip PUT/DELETE
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &RouterOsConfig, dry_run: bool) -> Result<Self> {
        config.validate()?;

        let base = url::Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("Invalid RouterOS base URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        if config.skip_tls_verify {
            tracing::warn!("TLS certificate verification is disabled for {}", base);
        }

        Ok(Self {
            rest_url: format!("{}/rest", base.as_str().trim_end_matches('/')),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
            dry_run,
        })
    }

    /// Create a new RouterOS client (production/live mode)
    pub fn new_live(config: &RouterOsConfig) -> Result<Self> {
        Self::new(config, false)
    }

    /// Create a new RouterOS client (dry-run mode)
    pub fn new_dry_run(config: &RouterOsConfig) -> Result<Self> {
        Self::new(config, true)
    }

    /// Whether mutating requests are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.rest_url, path)
    }

    /// Send a request with credentials and map failures to error kinds
    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| Error::http(format!("{what}: request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("{} succeeded with status {}", what, status);
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        let reason = match serde_json::from_str::<RouterOsError>(&body) {
            Ok(e) if !e.detail.is_empty() => format!("{} ({})", e.message, e.detail),
            Ok(e) if !e.message.is_empty() => e.message,
            _ => body,
        };

        match status.as_u16() {
            401 | 403 => Err(Error::auth(format!(
                "{what}: invalid credentials or insufficient policy. Status: {status}"
            ))),
            404 => Err(Error::not_found(format!("{what}: {reason}"))),
            _ => Err(Error::provider(
                API_NAME,
                format!("{what} failed: {status} - {reason}"),
            )),
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| Error::provider(API_NAME, format!("{what}: failed to parse response: {e}")))
    }
}

#[async_trait]
impl RouterApi for RouterOsClient {
    /// ```http
    /// GET /rest/system/resource
    /// ```
    async fn system_info(&self) -> Result<SystemInfo> {
        tracing::debug!("Fetching system information");
        let response = self
            .send(self.client.get(self.url("system/resource")), "system info")
            .await?;
        Self::parse(response, "system info").await
    }

    /// ```http
    /// GET /rest/ip/dns/static?type=A,AAAA,CNAME,TXT,MX,SRV,NS&name=www.example.com
    /// ```
    async fn list_records(&self, filter: &RecordFilter) -> Result<Vec<DnsRecord>> {
        let url = format!("{}?{}", self.url(DNS_STATIC_PATH), filter.to_query_string());
        tracing::debug!("Listing DNS records: {}", url);

        let response = self.send(self.client.get(&url), "list records").await?;
        let records: Vec<DnsRecord> = Self::parse(response, "list records").await?;
        tracing::debug!("Fetched {} DNS records", records.len());
        Ok(records)
    }

    /// ```http
    /// PUT /rest/ip/dns/static
    /// {"name": "www.example.com", "type": "A", "address": "192.0.2.1", "ttl": "1h"}
    /// ```
    async fn create_record(&self, record: &DnsRecord) -> Result<DnsRecord> {
        tracing::info!(
            "Creating DNS record: {} [mode: {}]",
            record,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would PUT {}: {}",
                self.url(DNS_STATIC_PATH),
                serde_json::to_string(record)?
            );
            return Ok(record.clone());
        }

        let response = self
            .send(
                self.client.put(self.url(DNS_STATIC_PATH)).json(record),
                "create record",
            )
            .await?;
        Self::parse(response, "create record").await
    }

    /// ```http
    /// DELETE /rest/ip/dns/static/*1A
    /// ```
    async fn delete_record(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("{DNS_STATIC_PATH}/{id}"));
        tracing::info!(
            "Deleting DNS record {} [mode: {}]",
            id,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would DELETE {}", url);
            return Ok(());
        }

        self.send(self.client.delete(&url), "delete record").await?;
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        API_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> RouterOsConfig {
        RouterOsConfig {
            base_url: base_url.to_string(),
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            skip_tls_verify: false,
        }
    }

    async fn client(server: &MockServer, dry_run: bool) -> RouterOsClient {
        RouterOsClient::new(&config(&server.uri()), dry_run).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(RouterOsClient::new_live(&config("")).is_err());
        assert!(RouterOsClient::new_live(&config("router.lan")).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let client = RouterOsClient::new_live(&config("https://router.lan/")).unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("https://router.lan/rest"));
    }

    #[tokio::test]
    async fn test_system_info() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/system/resource"))
            .and(basic_auth("admin", "hunter2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "board-name": "RB5009UG+S+",
                "version": "7.16 (stable)",
                "architecture-name": "arm64",
                "uptime": "1w2d"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = client(&server, false).await.system_info().await.unwrap();
        assert_eq!(info.board_name, "RB5009UG+S+");
        assert_eq!(info.version, "7.16 (stable)");
        assert_eq!(info.architecture_name, "arm64");
    }

    #[tokio::test]
    async fn test_list_records_sends_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip/dns/static"))
            .and(query_param("type", "A,AAAA,CNAME,TXT,MX,SRV,NS"))
            .and(query_param("name", "www.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {".id": "*1", "name": "www.example.com", "address": "192.0.2.1", "ttl": "1d", "disabled": "false", "dynamic": "false"},
                {".id": "*2", "name": "www.example.com", "type": "TXT", "text": "hello", "ttl": "1h"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let records = client(&server, false)
            .await
            .list_records(&RecordFilter::new("www.example.com", ""))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("*1"));
        assert_eq!(records[0].effective_type(), "A");
        assert_eq!(records[1].text, "hello");
    }

    #[tokio::test]
    async fn test_create_record() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/rest/ip/dns/static"))
            .and(body_json(serde_json::json!({
                "name": "mx.example.com",
                "type": "MX",
                "mx-exchange": "mail.example.com",
                "mx-preference": "10",
                "ttl": "10m"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                ".id": "*A",
                "name": "mx.example.com",
                "type": "MX",
                "mx-exchange": "mail.example.com",
                "mx-preference": "10",
                "ttl": "10m",
                "disabled": "false"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let record = DnsRecord {
            name: "mx.example.com".into(),
            record_type: "MX".into(),
            mx_exchange: "mail.example.com".into(),
            mx_preference: "10".into(),
            ttl: "10m".into(),
            ..Default::default()
        };
        let created = client(&server, false).await.create_record(&record).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("*A"));
        assert_eq!(created.disabled, "false");
    }

    #[tokio::test]
    async fn test_delete_record() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/ip/dns/static/*1A"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, false).await.delete_record("*1A").await.unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_skips_mutations() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server, true).await;
        assert!(client.is_dry_run());

        let record = DnsRecord {
            name: "www.example.com".into(),
            address: "192.0.2.1".into(),
            ..Default::default()
        };
        assert_eq!(client.create_record(&record).await.unwrap(), record);
        client.delete_record("*1").await.unwrap();
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/system/resource"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/ip/dns/static/*404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": 404, "message": "Not Found"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rest/ip/dns/static"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": 400, "message": "Bad Request", "detail": "failure: entry already exists"
            })))
            .mount(&server)
            .await;

        let client = client(&server, false).await;

        assert!(matches!(client.system_info().await, Err(Error::Authentication(_))));
        assert!(matches!(client.delete_record("*404").await, Err(Error::NotFound(_))));

        let err = client.create_record(&DnsRecord::default()).await.unwrap_err();
        match err {
            Error::Provider { provider, message } => {
                assert_eq!(provider, "routeros");
                assert!(message.contains("entry already exists"), "{message}");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip/dns/static"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server, false)
            .await
            .list_records(&RecordFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }
}
