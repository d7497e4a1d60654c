//! Mixer configuration API
//!
//! Client side of the Mixer configuration service: rules, adapters and
//! descriptors stored per scope.
//!
//! # Module Structure
//!
//! - [`paths`] - REST paths for each resource kind
//! - [`http`] - The [`Requester`] seam and the direct HTTP implementation
//! - [`service`] - Requester that resolves the service inside the cluster
//! - [`client`] - Get, create and delete operations
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mixerctl::mixer::{HttpRequester, MixerClient};
//!
//! async fn example() -> mixerctl::error::Result<()> {
//!     let requester = HttpRequester::new("localhost:9096")?;
//!     let client = MixerClient::new(Arc::new(requester));
//!     let rules = client.rule_get("global", "myservice.ns.svc.cluster.local").await?;
//!     println!("{}", rules);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod paths;
pub mod service;

pub use client::{ApiResponse, ApiStatus, MixerClient, Outcome, UNKNOWN_MESSAGE};
pub use http::{HttpRequester, RawResponse, Requester, REQUEST_TIMEOUT};
pub use paths::{resource_path, rule_path, ResourceKind};
pub use service::{
    service_base_url, KubeServiceRegistry, ServiceRegistry, ServiceRequester, ServiceTarget,
};
