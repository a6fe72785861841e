/// HTTP transport for the Cloud Controller API.
/// Uses reqwest-middleware for transient-failure retries.
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

use super::connection::CfConnection;
use crate::config::Config;
use crate::errors::CfMysqlError;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str, access_token: &str, skip_ssl: bool)
        -> Result<Vec<u8>, CfMysqlError>;

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        access_token: &str,
        skip_ssl: bool,
    ) -> Result<Vec<u8>, CfMysqlError>;
}

pub struct HttpWrapper {
    verified: Clients,
    /// Used when the connection has SSL validation disabled.
    unverified: Clients,
    trace_requests: bool,
}

/// GETs are retried on transient failures. POSTs are sent exactly once: a
/// request that timed out may still have created the resource.
struct Clients {
    retrying: ClientWithMiddleware,
    single: ClientWithMiddleware,
}

impl HttpWrapper {
    pub fn new(cfg: &Config) -> Result<Self, CfMysqlError> {
        Ok(Self {
            verified: build_clients(cfg, false)?,
            unverified: build_clients(cfg, true)?,
            trace_requests: cfg.trace_requests,
        })
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        access_token: &str,
        skip_ssl: bool,
    ) -> Result<Vec<u8>, CfMysqlError> {
        let clients = if skip_ssl {
            &self.unverified
        } else {
            &self.verified
        };
        let client = if method == Method::GET {
            &clients.retrying
        } else {
            &clients.single
        };

        let mut token = HeaderValue::from_str(access_token)
            .map_err(|_| CfMysqlError::Connection("access token is not a valid header value".into()))?;
        token.set_sensitive(true);

        let mut request = client
            .request(method.clone(), url)
            .header(AUTHORIZATION, token);
        if let Some(body) = body {
            if self.trace_requests {
                tracing::trace!(
                    target: "cf_mysql::http",
                    "REQUEST {} {} body={}",
                    method,
                    url,
                    String::from_utf8_lossy(&body)
                );
            }
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        } else if self.trace_requests {
            tracing::trace!(target: "cf_mysql::http", "REQUEST {} {}", method, url);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            if self.trace_requests {
                tracing::trace!(target: "cf_mysql::http", "RESPONSE {} {}", status, url);
            }
            return Err(CfMysqlError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        if self.trace_requests {
            tracing::trace!(
                target: "cf_mysql::http",
                "RESPONSE {} {} body={}",
                status,
                url,
                String::from_utf8_lossy(&bytes)
            );
        }

        Ok(bytes.to_vec())
    }
}

fn build_clients(cfg: &Config, skip_ssl: bool) -> Result<Clients, CfMysqlError> {
    let reqwest_client = reqwest::Client::builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(skip_ssl)
        .timeout(cfg.http_timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(concat!("cf-mysql/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(cfg.http_retries);

    Ok(Clients {
        retrying: ClientBuilder::new(reqwest_client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build(),
        single: ClientBuilder::new(reqwest_client).build(),
    })
}

#[async_trait]
impl HttpClient for HttpWrapper {
    async fn get(
        &self,
        url: &str,
        access_token: &str,
        skip_ssl: bool,
    ) -> Result<Vec<u8>, CfMysqlError> {
        self.send(Method::GET, url, None, access_token, skip_ssl).await
    }

    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        access_token: &str,
        skip_ssl: bool,
    ) -> Result<Vec<u8>, CfMysqlError> {
        self.send(Method::POST, url, Some(body), access_token, skip_ssl)
            .await
    }
}

// ── Authenticated API calls ───────────────────────────────────

/// GET `path` relative to the connection's API endpoint, authenticated with
/// the connection's current token.
pub async fn get_from_cf_api(
    http: &dyn HttpClient,
    conn: &dyn CfConnection,
    path: &str,
) -> Result<Vec<u8>, CfMysqlError> {
    let (url, token, skip_ssl) = resolve(conn, path).await?;
    http.get(&url, &token, skip_ssl).await
}

pub async fn post_to_cf_api(
    http: &dyn HttpClient,
    conn: &dyn CfConnection,
    path: &str,
    body: Vec<u8>,
) -> Result<Vec<u8>, CfMysqlError> {
    let (url, token, skip_ssl) = resolve(conn, path).await?;
    http.post(&url, body, &token, skip_ssl).await
}

async fn resolve(
    conn: &dyn CfConnection,
    path: &str,
) -> Result<(String, String, bool), CfMysqlError> {
    let endpoint = conn
        .api_endpoint()
        .await
        .map_err(|e| e.context("unable to get API endpoint"))?;
    let token = conn
        .access_token()
        .await
        .map_err(|e| e.context("unable to get access token"))?;
    let skip_ssl = conn
        .is_ssl_disabled()
        .await
        .map_err(|e| e.context("unable to check SSL validation setting"))?;

    Ok((format!("{}{}", endpoint, path), token, skip_ssl))
}
