use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfMysqlError {
    #[error("{0}")]
    Transport(#[from] reqwest_middleware::Error),

    #[error("HTTP status {status} accessing {url}")]
    HttpStatus { status: u16, url: String },

    #[error("unable to deserialize {endpoint}: {source}")]
    Deserialize {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to deserialize port: '{raw}'")]
    InvalidPort { raw: String },

    #[error("{0} not found in current space")]
    ServiceNotFound(String),

    #[error("{0}")]
    Connection(String),

    #[error("SSH tunnel failed: {0}")]
    Tunnel(String),

    /// The tunnel process died before its local port became connectable.
    #[error("tunnel aborted: {0}")]
    TunnelFailed(#[source] Box<CfMysqlError>),

    #[error("tunnel on local port {port} not ready after {secs}s")]
    TunnelTimeout { port: u16, secs: u64 },

    #[error("{0}")]
    Mysql(String),

    /// A spawned task panicked or was cancelled before reporting.
    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CfMysqlError>,
    },
}

impl CfMysqlError {
    pub fn context(self, context: impl Into<String>) -> Self {
        CfMysqlError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error below any `Context` layers.
    pub fn root(&self) -> &CfMysqlError {
        match self {
            CfMysqlError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.root(), CfMysqlError::TunnelFailed(_))
    }
}

impl From<reqwest::Error> for CfMysqlError {
    fn from(err: reqwest::Error) -> Self {
        CfMysqlError::Transport(reqwest_middleware::Error::Reqwest(err))
    }
}

/// Adds one line of context to the error of a `Result`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, CfMysqlError>;

    fn with_context<F, S>(self, f: F) -> Result<T, CfMysqlError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for Result<T, CfMysqlError> {
    fn context(self, context: impl Into<String>) -> Result<T, CfMysqlError> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> Result<T, CfMysqlError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
