//! Walks a paginated v2 collection by following `next_url` until the last
//! page, concatenating resources in server order.
//!
//! No retries here: a failure on any page aborts the walk and nothing
//! collected so far is returned.

use serde::de::DeserializeOwned;

use super::connection::CfConnection;
use super::http::{get_from_cf_api, HttpClient};
use crate::errors::CfMysqlError;
use crate::models::resources::Page;

/// Fetches every page starting at `initial_path`.
///
/// `endpoint` names the collection in deserialization errors.
pub async fn fetch_all<T>(
    http: &dyn HttpClient,
    conn: &dyn CfConnection,
    initial_path: &str,
    endpoint: &str,
) -> Result<Vec<T>, CfMysqlError>
where
    T: DeserializeOwned,
{
    let mut resources = Vec::new();
    let mut next_path = Some(initial_path.to_string());
    let mut pages = 0usize;

    while let Some(path) = next_path.take() {
        let body = get_from_cf_api(http, conn, &path).await?;
        let page: Page<T> = decode_page(&body, endpoint)?;
        pages += 1;

        tracing::debug!(
            endpoint,
            path = %path,
            page = pages,
            resources = page.resources.len(),
            total_results = page.total_results,
            "fetched page"
        );

        resources.extend(page.resources);
        // next_url is already a full relative path, used as-is.
        next_path = page.next_url.filter(|url| !url.is_empty());
    }

    Ok(resources)
}

/// Fetches only the first page. For filtered queries expected to match at
/// most a handful of resources.
pub async fn fetch_first_page<T>(
    http: &dyn HttpClient,
    conn: &dyn CfConnection,
    path: &str,
    endpoint: &str,
) -> Result<Vec<T>, CfMysqlError>
where
    T: DeserializeOwned,
{
    let body = get_from_cf_api(http, conn, path).await?;
    let page: Page<T> = decode_page(&body, endpoint)?;
    Ok(page.resources)
}

fn decode_page<T: DeserializeOwned>(body: &[u8], endpoint: &str) -> Result<Page<T>, CfMysqlError> {
    serde_json::from_slice(body).map_err(|source| CfMysqlError::Deserialize {
        endpoint: endpoint.to_string(),
        source,
    })
}
