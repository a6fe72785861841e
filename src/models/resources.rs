//! Cloud Controller v2 wire formats.
//!
//! Every field is defaulted: the API omits fields freely, and credentials of
//! non-MySQL bindings have an arbitrary shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use super::port::{deserialize_raw, resolve_port};
use super::service::{App, ServiceBinding, ServiceInstance, ServiceKey};
use crate::errors::CfMysqlError;

/// One page of a paginated collection.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
    /// Relative path of the next page, `None` or empty on the last page.
    #[serde(default)]
    pub next_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub guid: String,
}

// ── Service instances ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServiceInstanceResource {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub entity: ServiceInstanceEntity,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceInstanceEntity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub space_guid: Option<String>,
    #[serde(default)]
    pub space_url: String,
}

impl ServiceInstanceResource {
    pub fn into_model(self) -> ServiceInstance {
        let space_guid = match self.entity.space_guid {
            Some(guid) if !guid.is_empty() => guid,
            _ => self
                .entity
                .space_url
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        ServiceInstance {
            name: self.entity.name,
            guid: self.metadata.guid,
            space_guid,
        }
    }
}

// ── Credentials ───────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MysqlCredentials {
    #[serde(default, deserialize_with = "nullable_string")]
    pub uri: String,
    #[serde(default, rename = "name", deserialize_with = "nullable_string")]
    pub db_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub hostname: String,
    #[serde(default, rename = "port", deserialize_with = "deserialize_raw")]
    pub raw_port: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub password: String,
    /// Brokers disagree on the shape of `tls`; only `tls.cert.ca` is read.
    #[serde(default)]
    pub tls: Option<Value>,
}

impl MysqlCredentials {
    fn ca_cert(&self) -> Option<String> {
        self.tls
            .as_ref()
            .and_then(|tls| tls.pointer("/cert/ca"))
            .and_then(Value::as_str)
            .filter(|ca| !ca.is_empty())
            .map(str::to_string)
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Service bindings ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServiceBindingResource {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub entity: ServiceBindingEntity,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceBindingEntity {
    #[serde(default)]
    pub app_guid: String,
    #[serde(default)]
    pub service_instance_guid: String,
    #[serde(default)]
    pub credentials: MysqlCredentials,
}

impl ServiceBindingResource {
    pub fn into_model(self) -> Result<ServiceBinding, CfMysqlError> {
        let credentials = self.entity.credentials;
        let port = resolve_port(credentials.raw_port.as_deref())?;
        let ca_cert = credentials.ca_cert();

        Ok(ServiceBinding {
            service_instance_guid: self.entity.service_instance_guid,
            uri: credentials.uri,
            db_name: credentials.db_name,
            hostname: credentials.hostname,
            port,
            username: credentials.username,
            password: credentials.password,
            ca_cert,
        })
    }
}

// ── Service keys ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ServiceKeyResource {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub entity: ServiceKeyEntity,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceKeyEntity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service_instance_guid: String,
    #[serde(default)]
    pub credentials: MysqlCredentials,
}

impl ServiceKeyResource {
    pub fn into_model(self) -> Result<ServiceKey, CfMysqlError> {
        let credentials = self.entity.credentials;
        let port = resolve_port(credentials.raw_port.as_deref())?;
        let ca_cert = credentials.ca_cert();

        Ok(ServiceKey {
            service_instance_guid: self.entity.service_instance_guid,
            uri: credentials.uri,
            db_name: credentials.db_name,
            hostname: credentials.hostname,
            port,
            username: credentials.username,
            password: credentials.password,
            ca_cert,
        })
    }
}

/// Body of `POST /v2/service_keys`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceKeyRequest {
    pub name: String,
    pub service_instance_guid: String,
}

// ── Apps ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AppResource {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub entity: AppEntity,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppEntity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

impl AppResource {
    pub fn into_model(self) -> App {
        App {
            guid: self.metadata.guid,
            name: self.entity.name,
            state: self.entity.state,
        }
    }
}
