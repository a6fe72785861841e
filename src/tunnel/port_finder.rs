use std::net::{Ipv4Addr, TcpListener};

pub trait PortFinder: Send + Sync {
    fn get_port(&self) -> std::io::Result<u16>;
}

/// Asks the kernel for an unused port on the loopback interface.
///
/// The listener is closed before returning, so another process could grab
/// the port in between. Good enough for a short-lived local tunnel.
pub struct FreePortFinder;

impl PortFinder for FreePortFinder {
    fn get_port(&self) -> std::io::Result<u16> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        Ok(listener.local_addr()?.port())
    }
}
