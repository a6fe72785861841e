//! Cloud Foundry control plane: connection context, HTTP transport,
//! paginated fetching, and the service discovery built on top of them.

pub mod api_client;
pub mod catalog;
pub mod connection;
pub mod http;
pub mod pagination;
pub mod service;

pub use api_client::{ApiClient, ApiClientImpl};
pub use connection::{CfCliConnection, CfConnection, Space};
pub use http::{HttpClient, HttpWrapper};
pub use service::{CfService, CfServiceImpl};
