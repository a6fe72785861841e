//! Blocks until a local TCP port accepts connections.
//!
//! A fixed-interval poll with no attempt limit: the tunnel normally comes up
//! within seconds, and a caller wanting a bound wraps the wait in a timeout.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connect and close primitives behind the waiter.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Conn: Send;

    async fn dial(&self, addr: &str) -> std::io::Result<Self::Conn>;

    async fn close(&self, conn: Self::Conn);
}

pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    type Conn = TcpStream;

    async fn dial(&self, addr: &str) -> std::io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }

    async fn close(&self, mut conn: TcpStream) {
        let _ = conn.shutdown().await;
    }
}

#[async_trait]
pub trait PortWaiter: Send + Sync {
    /// Returns once `127.0.0.1:<local_port>` is connectable. Never gives up.
    async fn wait_until_open(&self, local_port: u16);
}

pub struct TcpPortWaiter<D = TcpDialer> {
    dialer: D,
    interval: Duration,
}

impl TcpPortWaiter<TcpDialer> {
    pub fn new(interval: Duration) -> Self {
        Self::with_dialer(TcpDialer, interval)
    }
}

impl<D: Dialer> TcpPortWaiter<D> {
    pub fn with_dialer(dialer: D, interval: Duration) -> Self {
        Self { dialer, interval }
    }
}

#[async_trait]
impl<D: Dialer> PortWaiter for TcpPortWaiter<D> {
    async fn wait_until_open(&self, local_port: u16) {
        let addr = format!("127.0.0.1:{}", local_port);
        let mut attempts = 0u64;

        loop {
            attempts += 1;
            match self.dialer.dial(&addr).await {
                Ok(conn) => {
                    self.dialer.close(conn).await;
                    tracing::debug!(port = local_port, attempts, "local port is open");
                    return;
                }
                Err(e) => {
                    tracing::trace!(port = local_port, attempts, error = %e, "port not open yet");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}
