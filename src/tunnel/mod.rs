//! Everything needed to reach a database through a running app: picking
//! the relay app, running the tunnel, and noticing when it is usable.

pub mod port_finder;
pub mod port_waiter;
pub mod relay;
pub mod ssh;

pub use port_finder::{FreePortFinder, PortFinder};
pub use port_waiter::{Dialer, PortWaiter, TcpDialer, TcpPortWaiter};
pub use relay::{RandomRelayPicker, RelayPicker};
pub use ssh::{CfSshRunner, SshRunner};
