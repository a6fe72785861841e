use std::fmt;

/// A provisioned service instance within a space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceInstance {
    pub name: String,
    pub guid: String,
    pub space_guid: String,
}

/// Connection credentials bound to an instance through an app binding.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServiceBinding {
    pub service_instance_guid: String,
    pub uri: String,
    pub db_name: String,
    pub hostname: String,
    /// Always the decimal form, whatever shape the API used on the wire.
    pub port: String,
    pub username: String,
    pub password: String,
    pub ca_cert: Option<String>,
}

/// Long-lived credentials issued for an instance without an app binding.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServiceKey {
    pub service_instance_guid: String,
    pub uri: String,
    pub db_name: String,
    pub hostname: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub ca_cert: Option<String>,
}

/// A reachable MySQL database and the credentials to log in.
///
/// Recomputed on every lookup; never cached or persisted.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct MysqlService {
    pub name: String,
    pub hostname: String,
    pub port: String,
    pub db_name: String,
    pub username: String,
    pub password: String,
    pub ca_cert: Option<String>,
}

impl MysqlService {
    pub fn from_binding(name: &str, binding: &ServiceBinding) -> Self {
        Self {
            name: name.to_string(),
            hostname: binding.hostname.clone(),
            port: binding.port.clone(),
            db_name: binding.db_name.clone(),
            username: binding.username.clone(),
            password: binding.password.clone(),
            ca_cert: binding.ca_cert.clone(),
        }
    }

    pub fn from_key(name: &str, key: ServiceKey) -> Self {
        Self {
            name: name.to_string(),
            hostname: key.hostname,
            port: key.port,
            db_name: key.db_name,
            username: key.username,
            password: key.password,
            ca_cert: key.ca_cert,
        }
    }
}

/// An application in the current space, a potential tunnel relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct App {
    pub guid: String,
    pub name: String,
    pub state: String,
}

impl App {
    pub fn is_started(&self) -> bool {
        self.state.eq_ignore_ascii_case("started")
    }
}

// Secrets stay out of log lines and panic messages.

impl fmt::Debug for ServiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBinding")
            .field("service_instance_guid", &self.service_instance_guid)
            .field("db_name", &self.db_name)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ca_cert", &self.ca_cert.is_some())
            .finish()
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("service_instance_guid", &self.service_instance_guid)
            .field("db_name", &self.db_name)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ca_cert", &self.ca_cert.is_some())
            .finish()
    }
}

impl fmt::Debug for MysqlService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlService")
            .field("name", &self.name)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ca_cert", &self.ca_cert.is_some())
            .finish()
    }
}
