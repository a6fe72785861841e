use std::sync::Arc;

use async_trait::async_trait;

use crate::cf::CfConnection;
use crate::errors::CfMysqlError;
use crate::models::MysqlService;

/// Opens a port forward from `local_port` to the database through an app.
///
/// Runs for the lifetime of the tunnel: the future resolves only when the
/// forwarding process exits.
#[async_trait]
pub trait SshRunner: Send + Sync {
    async fn open_ssh_tunnel(
        &self,
        conn: Arc<dyn CfConnection>,
        service: &MysqlService,
        app: &str,
        local_port: u16,
    ) -> Result<(), CfMysqlError>;
}

/// `cf ssh <app> -N -L <local>:<host>:<port>`
pub struct CfSshRunner;

pub fn tunnel_args(service: &MysqlService, app: &str, local_port: u16) -> Vec<String> {
    vec![
        "ssh".to_string(),
        app.to_string(),
        "-N".to_string(),
        "-L".to_string(),
        format!("{}:{}:{}", local_port, service.hostname, service.port),
    ]
}

#[async_trait]
impl SshRunner for CfSshRunner {
    async fn open_ssh_tunnel(
        &self,
        conn: Arc<dyn CfConnection>,
        service: &MysqlService,
        app: &str,
        local_port: u16,
    ) -> Result<(), CfMysqlError> {
        tracing::info!(
            app,
            local_port,
            hostname = %service.hostname,
            port = %service.port,
            "opening ssh tunnel"
        );

        conn.cli_command(&tunnel_args(service, app, local_port))
            .await
            .map_err(|e| CfMysqlError::Tunnel(e.to_string()))?;

        tracing::debug!(app, local_port, "ssh tunnel closed");
        Ok(())
    }
}
