use std::sync::Arc;

use async_trait::async_trait;

use super::connection::CfConnection;
use super::http::{post_to_cf_api, HttpClient};
use super::pagination::{fetch_all, fetch_first_page};
use crate::errors::{CfMysqlError, ResultExt};
use crate::models::resources::{
    AppResource, ServiceBindingResource, ServiceInstanceResource, ServiceKeyRequest,
    ServiceKeyResource,
};
use crate::models::{App, ServiceBinding, ServiceInstance, ServiceKey};

/// Typed access to the v2 resources the tool needs.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get_service_instances(
        &self,
        conn: &dyn CfConnection,
    ) -> Result<Vec<ServiceInstance>, CfMysqlError>;

    async fn get_service_bindings(
        &self,
        conn: &dyn CfConnection,
    ) -> Result<Vec<ServiceBinding>, CfMysqlError>;

    /// Looks up a service instance by name within a space.
    async fn get_service(
        &self,
        conn: &dyn CfConnection,
        space_guid: &str,
        name: &str,
    ) -> Result<ServiceInstance, CfMysqlError>;

    /// `Ok(None)` when the instance has no key of that name.
    async fn get_service_key(
        &self,
        conn: &dyn CfConnection,
        instance_guid: &str,
        key_name: &str,
    ) -> Result<Option<ServiceKey>, CfMysqlError>;

    async fn create_service_key(
        &self,
        conn: &dyn CfConnection,
        instance_guid: &str,
        key_name: &str,
    ) -> Result<ServiceKey, CfMysqlError>;

    /// Started apps in the current space, in API order.
    async fn get_started_apps(&self, conn: &dyn CfConnection) -> Result<Vec<App>, CfMysqlError>;
}

pub struct ApiClientImpl {
    http: Arc<dyn HttpClient>,
}

impl ApiClientImpl {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ApiClient for ApiClientImpl {
    async fn get_service_instances(
        &self,
        conn: &dyn CfConnection,
    ) -> Result<Vec<ServiceInstance>, CfMysqlError> {
        let resources: Vec<ServiceInstanceResource> = fetch_all(
            self.http.as_ref(),
            conn,
            "/v2/service_instances",
            "service instances",
        )
        .await
        .context("unable to retrieve service instances")?;

        Ok(resources.into_iter().map(|r| r.into_model()).collect())
    }

    async fn get_service_bindings(
        &self,
        conn: &dyn CfConnection,
    ) -> Result<Vec<ServiceBinding>, CfMysqlError> {
        let resources: Vec<ServiceBindingResource> = fetch_all(
            self.http.as_ref(),
            conn,
            "/v2/service_bindings",
            "service bindings",
        )
        .await
        .context("unable to retrieve service bindings")?;

        resources
            .into_iter()
            .map(|r| r.into_model())
            .collect::<Result<Vec<_>, _>>()
            .context("unable to deserialize service bindings")
    }

    async fn get_service(
        &self,
        conn: &dyn CfConnection,
        space_guid: &str,
        name: &str,
    ) -> Result<ServiceInstance, CfMysqlError> {
        let path = format!(
            "/v2/spaces/{}/service_instances?return_user_provided_service_instances=true&q={}",
            space_guid,
            urlencoding::encode(&format!("name:{}", name))
        );

        let resources: Vec<ServiceInstanceResource> =
            fetch_first_page(self.http.as_ref(), conn, &path, "service instances").await?;

        resources
            .into_iter()
            .next()
            .map(|r| r.into_model())
            .ok_or_else(|| CfMysqlError::ServiceNotFound(name.to_string()))
    }

    async fn get_service_key(
        &self,
        conn: &dyn CfConnection,
        instance_guid: &str,
        key_name: &str,
    ) -> Result<Option<ServiceKey>, CfMysqlError> {
        let path = format!(
            "/v2/service_instances/{}/service_keys?q={}",
            instance_guid,
            urlencoding::encode(&format!("name:{}", key_name))
        );

        let resources: Vec<ServiceKeyResource> =
            fetch_first_page(self.http.as_ref(), conn, &path, "service keys").await?;

        resources.into_iter().next().map(|r| r.into_model()).transpose()
    }

    async fn create_service_key(
        &self,
        conn: &dyn CfConnection,
        instance_guid: &str,
        key_name: &str,
    ) -> Result<ServiceKey, CfMysqlError> {
        let request = ServiceKeyRequest {
            name: key_name.to_string(),
            service_instance_guid: instance_guid.to_string(),
        };
        let body = serde_json::to_vec(&request).map_err(|source| CfMysqlError::Serialize {
            what: "service key request".into(),
            source,
        })?;

        let response = post_to_cf_api(self.http.as_ref(), conn, "/v2/service_keys", body).await?;

        let resource: ServiceKeyResource =
            serde_json::from_slice(&response).map_err(|source| CfMysqlError::Deserialize {
                endpoint: "service key".into(),
                source,
            })?;

        resource.into_model()
    }

    async fn get_started_apps(&self, conn: &dyn CfConnection) -> Result<Vec<App>, CfMysqlError> {
        let space = conn
            .current_space()
            .await
            .context("unable to retrieve current space")?;

        let resources: Vec<AppResource> = fetch_all(
            self.http.as_ref(),
            conn,
            &format!("/v2/spaces/{}/apps", space.guid),
            "apps",
        )
        .await
        .context("unable to retrieve apps")?;

        Ok(resources
            .into_iter()
            .map(|r| r.into_model())
            .filter(App::is_started)
            .collect())
    }
}
