use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::exec::ExecWrapper;
use crate::errors::CfMysqlError;
use crate::models::MysqlService;

/// Where and as whom the client logs in.
#[derive(Clone, PartialEq, Eq)]
pub struct MysqlTarget {
    pub hostname: String,
    pub port: u16,
    pub db_name: String,
    pub username: String,
    pub password: String,
    pub ca_cert: Option<String>,
}

impl MysqlTarget {
    /// The service as seen through a tunnel listening on `local_port`.
    pub fn through_tunnel(service: &MysqlService, local_port: u16) -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: local_port,
            db_name: service.db_name.clone(),
            username: service.username.clone(),
            password: service.password.clone(),
            ca_cert: service.ca_cert.clone(),
        }
    }
}

impl std::fmt::Debug for MysqlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlTarget")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
pub trait MysqlRunner: Send + Sync {
    async fn run_mysql(&self, target: &MysqlTarget, args: &[String]) -> Result<(), CfMysqlError>;

    /// Leading arguments that do not start with `-` are table names.
    async fn run_mysqldump(
        &self,
        target: &MysqlTarget,
        args: &[String],
    ) -> Result<(), CfMysqlError>;
}

pub struct MysqlRunnerImpl {
    exec: Arc<dyn ExecWrapper>,
}

impl MysqlRunnerImpl {
    pub fn new(exec: Arc<dyn ExecWrapper>) -> Self {
        Self { exec }
    }

    fn find(&self, program: &str, missing: &str) -> Result<PathBuf, CfMysqlError> {
        self.exec
            .look_path(program)
            .ok_or_else(|| CfMysqlError::Mysql(missing.to_string()))
    }
}

#[async_trait]
impl MysqlRunner for MysqlRunnerImpl {
    async fn run_mysql(&self, target: &MysqlTarget, args: &[String]) -> Result<(), CfMysqlError> {
        let path = self.find("mysql", "'mysql' client not found in PATH")?;

        // Held until the client exits; the file is removed on drop.
        let ca_file = store_ca_cert(target.ca_cert.as_deref())
            .map_err(|e| CfMysqlError::Mysql(format!("error preparing TLS arguments: {}", e)))?;

        let mut argv = login_args(target, ca_file.as_ref());
        argv.extend(args.iter().cloned());
        argv.push(target.db_name.clone());

        self.exec
            .run(&path, &argv)
            .await
            .map_err(|e| CfMysqlError::Mysql(format!("error running mysql client: {}", e)))
    }

    async fn run_mysqldump(
        &self,
        target: &MysqlTarget,
        args: &[String],
    ) -> Result<(), CfMysqlError> {
        let path = self.find("mysqldump", "'mysqldump' not found in PATH")?;

        let (tables, options) = split_table_args(args);

        let ca_file = store_ca_cert(target.ca_cert.as_deref())
            .map_err(|e| CfMysqlError::Mysql(format!("error preparing TLS arguments: {}", e)))?;

        let mut argv = login_args(target, ca_file.as_ref());
        argv.extend(options.iter().cloned());
        argv.push(target.db_name.clone());
        argv.extend(tables.iter().cloned());

        self.exec
            .run(&path, &argv)
            .await
            .map_err(|e| CfMysqlError::Mysql(format!("error running mysqldump: {}", e)))
    }
}

fn login_args(target: &MysqlTarget, ca_file: Option<&NamedTempFile>) -> Vec<String> {
    let mut args = vec![
        "-u".to_string(),
        target.username.clone(),
        format!("-p{}", target.password),
        "-h".to_string(),
        target.hostname.clone(),
        "-P".to_string(),
        target.port.to_string(),
    ];
    if let Some(file) = ca_file {
        args.push(format!("--ssl-ca={}", file.path().display()));
    }
    args
}

/// Splits `args` at the first option into (tables, the rest).
fn split_table_args(args: &[String]) -> (&[String], &[String]) {
    let first_option = args
        .iter()
        .position(|arg| arg.starts_with('-'))
        .unwrap_or(args.len());
    args.split_at(first_option)
}

fn store_ca_cert(ca_cert: Option<&str>) -> std::io::Result<Option<NamedTempFile>> {
    let ca_cert = match ca_cert {
        Some(cert) if !cert.is_empty() => cert,
        _ => return Ok(None),
    };

    let mut file = tempfile::Builder::new()
        .prefix("mysql-ca-cert")
        .suffix(".pem")
        .tempfile()?;
    file.write_all(ca_cert.as_bytes())?;
    file.flush()?;
    Ok(Some(file))
}
