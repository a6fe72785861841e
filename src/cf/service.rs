//! Service discovery and tunnel orchestration on top of the API client.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::api_client::ApiClient;
use super::catalog::available_services;
use super::connection::CfConnection;
use crate::errors::{CfMysqlError, ResultExt};
use crate::models::{App, MysqlService};
use crate::tunnel::{PortWaiter, RelayPicker, SshRunner};

pub const DEFAULT_SERVICE_KEY_NAME: &str = "cf-mysql";

#[async_trait]
pub trait CfService: Send + Sync {
    /// MySQL databases bound to an app in the current space, in the order
    /// the API returned their instances.
    async fn get_mysql_services(
        &self,
        conn: Arc<dyn CfConnection>,
    ) -> Result<Vec<MysqlService>, CfMysqlError>;

    /// Credentials for one named instance, issued through a service key.
    /// The key is created on first use.
    async fn get_service(
        &self,
        conn: &dyn CfConnection,
        name: &str,
    ) -> Result<MysqlService, CfMysqlError>;

    async fn get_started_apps(&self, conn: &dyn CfConnection) -> Result<Vec<App>, CfMysqlError>;

    /// Starts a tunnel to `service` through one of `apps` and returns once
    /// `local_port` accepts connections. The tunnel keeps running after
    /// this returns.
    async fn open_ssh_tunnel(
        &self,
        conn: Arc<dyn CfConnection>,
        service: &MysqlService,
        apps: &[App],
        local_port: u16,
    ) -> Result<(), CfMysqlError>;
}

pub struct CfServiceImpl {
    api: Arc<dyn ApiClient>,
    ssh_runner: Arc<dyn SshRunner>,
    port_waiter: Arc<dyn PortWaiter>,
    relay_picker: Arc<dyn RelayPicker>,
    /// Progress messages for the user, e.g. service key creation.
    log: Mutex<Box<dyn Write + Send>>,
    service_key_name: String,
    tunnel_timeout: Option<Duration>,
}

impl CfServiceImpl {
    pub fn new(
        api: Arc<dyn ApiClient>,
        ssh_runner: Arc<dyn SshRunner>,
        port_waiter: Arc<dyn PortWaiter>,
        relay_picker: Arc<dyn RelayPicker>,
        log: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            api,
            ssh_runner,
            port_waiter,
            relay_picker,
            log: Mutex::new(log),
            service_key_name: DEFAULT_SERVICE_KEY_NAME.to_string(),
            tunnel_timeout: None,
        }
    }

    pub fn with_service_key_name(mut self, name: impl Into<String>) -> Self {
        self.service_key_name = name.into();
        self
    }

    pub fn with_tunnel_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tunnel_timeout = timeout;
        self
    }

    fn log_line(&self, line: &str) {
        if let Ok(mut log) = self.log.lock() {
            let _ = writeln!(log, "{}", line);
        }
    }

    /// Races the port waiter against the tunnel reporting an error.
    async fn wait_for_tunnel(
        &self,
        local_port: u16,
        failed: oneshot::Receiver<CfMysqlError>,
    ) -> Result<(), CfMysqlError> {
        tokio::select! {
            biased;

            _ = self.port_waiter.wait_until_open(local_port) => Ok(()),
            failure = failed => Err(CfMysqlError::TunnelFailed(Box::new(match failure {
                Ok(err) => err,
                // Runner finished without error, but the port never opened.
                Err(_) => CfMysqlError::Tunnel("exited before the local port opened".into()),
            }))),
        }
    }
}

#[async_trait]
impl CfService for CfServiceImpl {
    async fn get_mysql_services(
        &self,
        conn: Arc<dyn CfConnection>,
    ) -> Result<Vec<MysqlService>, CfMysqlError> {
        let (bindings_tx, bindings_rx) = oneshot::channel();
        let api = self.api.clone();
        let bindings_conn = conn.clone();
        tokio::spawn(async move {
            let result = api.get_service_bindings(bindings_conn.as_ref()).await;
            let _ = bindings_tx.send(result);
        });

        let instances = self.api.get_service_instances(conn.as_ref()).await;

        // Always collected, even when the instance fetch already failed.
        let bindings = bindings_rx.await.map_err(|_| {
            CfMysqlError::TaskFailed("service binding fetch ended without a result".into())
        });

        let instances = instances?;
        let bindings = bindings??;

        let space = conn
            .current_space()
            .await
            .context("unable to retrieve current space")?;

        let services = available_services(&instances, &bindings, &space.guid);
        tracing::debug!(
            space = %space.name,
            instances = instances.len(),
            bindings = bindings.len(),
            services = services.len(),
            "built service catalog"
        );
        Ok(services)
    }

    async fn get_service(
        &self,
        conn: &dyn CfConnection,
        name: &str,
    ) -> Result<MysqlService, CfMysqlError> {
        let space = conn
            .current_space()
            .await
            .context("unable to retrieve current space")?;

        let instance = self
            .api
            .get_service(conn, &space.guid, name)
            .await
            .with_context(|| format!("unable to retrieve metadata for service {}", name))?;

        let existing = self
            .api
            .get_service_key(conn, &instance.guid, &self.service_key_name)
            .await
            .context("unable to retrieve service key")?;

        let key = match existing {
            Some(key) => key,
            None => {
                self.log_line(&format!(
                    "Creating new service key {} for {}...",
                    self.service_key_name, name
                ));
                self.api
                    .create_service_key(conn, &instance.guid, &self.service_key_name)
                    .await
                    .context("unable to create service key")?
            }
        };

        Ok(MysqlService::from_key(name, key))
    }

    async fn get_started_apps(&self, conn: &dyn CfConnection) -> Result<Vec<App>, CfMysqlError> {
        self.api.get_started_apps(conn).await
    }

    async fn open_ssh_tunnel(
        &self,
        conn: Arc<dyn CfConnection>,
        service: &MysqlService,
        apps: &[App],
        local_port: u16,
    ) -> Result<(), CfMysqlError> {
        if apps.is_empty() {
            return Err(CfMysqlError::Tunnel("no app to relay through".into()));
        }
        let app = apps[self.relay_picker.pick(apps.len())].name.clone();

        let (failed_tx, failed_rx) = oneshot::channel();
        let runner = self.ssh_runner.clone();
        let target = service.clone();
        let tunnel = tokio::spawn(async move {
            if let Err(e) = runner
                .open_ssh_tunnel(conn, &target, &app, local_port)
                .await
            {
                // The receiver is gone once the port was seen open.
                if let Err(e) = failed_tx.send(e) {
                    tracing::error!(app = %app, local_port, error = %e, "ssh tunnel closed");
                }
            }
        });

        let ready = match self.tunnel_timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_for_tunnel(local_port, failed_rx))
                .await
                .unwrap_or(Err(CfMysqlError::TunnelTimeout {
                    port: local_port,
                    secs: limit.as_secs(),
                })),
            None => self.wait_for_tunnel(local_port, failed_rx).await,
        };

        if ready.is_err() {
            tunnel.abort();
        }
        ready
    }
}
