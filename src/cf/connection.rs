//! Connection context: where the API lives, who we are, and which space is
//! targeted. Backed by the locally installed cf CLI.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::errors::CfMysqlError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Space {
    pub guid: String,
    pub name: String,
}

#[async_trait]
pub trait CfConnection: Send + Sync {
    async fn api_endpoint(&self) -> Result<String, CfMysqlError>;

    /// Token including its scheme, ready for the `Authorization` header.
    async fn access_token(&self) -> Result<String, CfMysqlError>;

    async fn is_ssl_disabled(&self) -> Result<bool, CfMysqlError>;

    async fn current_space(&self) -> Result<Space, CfMysqlError>;

    /// Runs a cf CLI command to completion.
    async fn cli_command(&self, args: &[String]) -> Result<(), CfMysqlError>;
}

// ── cf CLI config file ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct CfConfigFile {
    #[serde(rename = "Target", default)]
    target: String,
    #[serde(rename = "SSLDisabled", default)]
    ssl_disabled: bool,
    #[serde(rename = "SpaceFields", default)]
    space_fields: SpaceFields,
}

#[derive(Debug, Default, Deserialize)]
struct SpaceFields {
    #[serde(rename = "GUID", default)]
    guid: String,
    #[serde(rename = "Name", default)]
    name: String,
}

fn config_path(cf_home: &Path) -> PathBuf {
    cf_home.join(".cf").join("config.json")
}

async fn read_config_file(path: &Path) -> Result<CfConfigFile, CfMysqlError> {
    let contents = tokio::fs::read(path).await.map_err(|e| {
        CfMysqlError::Connection(format!(
            "unable to read cf CLI config {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_slice(&contents).map_err(|source| CfMysqlError::Deserialize {
        endpoint: path.display().to_string(),
        source,
    })
}

// ── CfCliConnection ───────────────────────────────────────────

/// `CfConnection` for a user logged in with the cf CLI.
///
/// Endpoint, SSL flag and targeted space are read from `.cf/config.json`.
/// The token is fetched once through `cf oauth-token`, which refreshes it
/// when it has expired.
pub struct CfCliConnection {
    config_path: PathBuf,
    cf_binary: String,
    token: OnceCell<String>,
}

impl CfCliConnection {
    pub fn new(cfg: &Config) -> Self {
        Self {
            config_path: config_path(&cfg.cf_home),
            cf_binary: cfg.cf_binary.clone(),
            token: OnceCell::new(),
        }
    }

    async fn config(&self) -> Result<CfConfigFile, CfMysqlError> {
        read_config_file(&self.config_path).await
    }

    async fn fetch_token(&self) -> Result<String, CfMysqlError> {
        let output = Command::new(&self.cf_binary)
            .arg("oauth-token")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                CfMysqlError::Connection(format!("unable to run '{}': {}", self.cf_binary, e))
            })?;

        if !output.status.success() {
            return Err(CfMysqlError::Connection(format!(
                "'{} oauth-token' failed: {}",
                self.cf_binary,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(CfMysqlError::Connection(
                "not logged in, use 'cf login'".into(),
            ));
        }
        Ok(token)
    }
}

#[async_trait]
impl CfConnection for CfCliConnection {
    async fn api_endpoint(&self) -> Result<String, CfMysqlError> {
        let config = self.config().await?;
        if config.target.is_empty() {
            return Err(CfMysqlError::Connection(
                "no API endpoint set, use 'cf login'".into(),
            ));
        }
        Ok(config.target.trim_end_matches('/').to_string())
    }

    async fn access_token(&self) -> Result<String, CfMysqlError> {
        self.token
            .get_or_try_init(|| self.fetch_token())
            .await
            .cloned()
    }

    async fn is_ssl_disabled(&self) -> Result<bool, CfMysqlError> {
        Ok(self.config().await?.ssl_disabled)
    }

    async fn current_space(&self) -> Result<Space, CfMysqlError> {
        let space = self.config().await?.space_fields;
        if space.guid.is_empty() {
            return Err(CfMysqlError::Connection(
                "no space targeted, use 'cf target -s SPACE'".into(),
            ));
        }
        Ok(Space {
            guid: space.guid,
            name: space.name,
        })
    }

    async fn cli_command(&self, args: &[String]) -> Result<(), CfMysqlError> {
        tracing::debug!(binary = %self.cf_binary, ?args, "running cf CLI command");

        // kill_on_drop ties long-running children (cf ssh) to the runtime.
        let output = Command::new(&self.cf_binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CfMysqlError::Connection(if stderr.is_empty() {
                format!("'cf {}' exited with {}", args.join(" "), output.status)
            } else {
                stderr
            }));
        }
        Ok(())
    }
}
