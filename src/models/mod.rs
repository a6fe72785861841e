//! Control-plane data: wire resources as the v2 API returns them and the
//! domain records they are converted into.

pub mod port;
pub mod resources;
pub mod service;

pub use service::{App, MysqlService, ServiceBinding, ServiceInstance, ServiceKey};
