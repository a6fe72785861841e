use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// Finding and running external programs.
#[async_trait]
pub trait ExecWrapper: Send + Sync {
    /// Absolute path of `program` if it is on `PATH`.
    fn look_path(&self, program: &str) -> Option<PathBuf>;

    /// Runs `program` with the terminal attached and waits for it to exit.
    /// A non-zero exit status is an error.
    async fn run(&self, program: &Path, args: &[String]) -> std::io::Result<()>;
}

pub struct OsExecWrapper;

#[async_trait]
impl ExecWrapper for OsExecWrapper {
    fn look_path(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, program: &Path, args: &[String]) -> std::io::Result<()> {
        tracing::debug!(program = %program.display(), "starting client");

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                status.to_string(),
            ))
        }
    }
}
