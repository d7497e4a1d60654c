//! Cluster service resolution
//!
//! The configuration service normally runs inside the cluster. Instead of
//! a URL the user names the service (`istio-galley:9096`) and the address
//! is looked up in the namespace before each request. The ClusterIP it
//! resolves to is only routable from inside the cluster network.

use super::http::{HttpRequester, RawResponse, Requester};
use crate::error::{MixerError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::Api;
use reqwest::Method;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Service name with an optional port, as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub name: String,
    pub port: Option<u16>,
}

impl FromStr for ServiceTarget {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, port) = match s.rsplit_once(':') {
            Some((name, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    MixerError::Resolution(format!("invalid port in service {}", s))
                })?;
                (name, Some(port))
            }
            None => (s, None),
        };

        if name.is_empty() || name.contains('/') {
            return Err(MixerError::Resolution(format!("invalid service name: {}", s)));
        }

        Ok(Self {
            name: name.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.name, port),
            None => f.write_str(&self.name),
        }
    }
}

/// Looks up the base URL of a service in a namespace
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// `None` when the service does not exist
    async fn resolve(&self, namespace: &str, target: &ServiceTarget) -> Result<Option<String>>;
}

/// Registry backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeServiceRegistry {
    client: kube::Client,
}

impl KubeServiceRegistry {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Connect using the given kubeconfig, or the default configuration
    /// (in-cluster or `$KUBECONFIG`) when none is given
    pub async fn connect(kubeconfig: Option<&str>) -> Result<Self> {
        let client = match kubeconfig {
            Some(path) => {
                let kubeconfig = kube::config::Kubeconfig::read_from(path).map_err(|e| {
                    MixerError::Resolution(format!("failed reading kubeconfig {}: {}", path, e))
                })?;
                let config = kube::Config::from_custom_kubeconfig(
                    kubeconfig,
                    &kube::config::KubeConfigOptions::default(),
                )
                .await
                .map_err(|e| {
                    MixerError::Resolution(format!("invalid kubeconfig {}: {}", path, e))
                })?;
                kube::Client::try_from(config)?
            }
            None => kube::Client::try_default().await?,
        };

        Ok(Self::new(client))
    }
}

#[async_trait]
impl ServiceRegistry for KubeServiceRegistry {
    async fn resolve(&self, namespace: &str, target: &ServiceTarget) -> Result<Option<String>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let Some(service) = api.get_opt(&target.name).await? else {
            return Ok(None);
        };

        let spec = service.spec.unwrap_or_default();
        let port = match target.port {
            Some(port) => port,
            None => spec
                .ports
                .as_deref()
                .and_then(|ports| ports.first())
                .and_then(|p| u16::try_from(p.port).ok())
                .ok_or_else(|| {
                    MixerError::Resolution(format!(
                        "service {}/{} exposes no port",
                        namespace, target.name
                    ))
                })?,
        };

        let host = match spec.cluster_ip.as_deref() {
            Some(ip) if !ip.is_empty() && ip != "None" => ip.to_string(),
            _ => format!("{}.{}.svc", target.name, namespace),
        };

        tracing::debug!(service = %target, namespace, %host, port, "resolved service");
        Ok(Some(service_base_url(&host, port)))
    }
}

/// Base URL for a resolved host. IPv6 literals are bracketed.
pub fn service_base_url(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) => format!("http://{}", SocketAddr::new(ip, port)),
        Err(_) => format!("http://{}:{}", host, port),
    }
}

/// Requester that resolves the configuration service before each call
pub struct ServiceRequester<S> {
    registry: S,
    namespace: String,
    target: ServiceTarget,
}

impl<S: ServiceRegistry> ServiceRequester<S> {
    pub fn new(registry: S, namespace: impl Into<String>, service: &str) -> Result<Self> {
        Ok(Self {
            registry,
            namespace: namespace.into(),
            target: service.parse()?,
        })
    }

    async fn resolve(&self) -> Result<HttpRequester> {
        let base = self
            .registry
            .resolve(&self.namespace, &self.target)
            .await?
            .ok_or_else(|| {
                MixerError::Resolution(format!(
                    "service {} not found in namespace {}",
                    self.target, self.namespace
                ))
            })?;
        HttpRequester::new(&base)
    }
}

#[async_trait]
impl<S: ServiceRegistry> Requester for ServiceRequester<S> {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse> {
        let requester = self.resolve().await?;
        requester.request(method, path, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyRegistry;

    #[async_trait]
    impl ServiceRegistry for EmptyRegistry {
        async fn resolve(&self, _: &str, _: &ServiceTarget) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn target_parses_name_and_port() {
        let target: ServiceTarget = "istio-galley:9096".parse().unwrap();
        assert_eq!(target.name, "istio-galley");
        assert_eq!(target.port, Some(9096));
        assert_eq!(target.to_string(), "istio-galley:9096");

        let target: ServiceTarget = "istio-galley".parse().unwrap();
        assert_eq!(target.port, None);
    }

    #[test]
    fn target_rejects_bad_port_and_empty_name() {
        assert!("istio-galley:http".parse::<ServiceTarget>().is_err());
        assert!(":9096".parse::<ServiceTarget>().is_err());
    }

    #[test]
    fn base_url_brackets_ipv6_cluster_ips() {
        let url = service_base_url("fd00:10:96::1", 9096);
        assert_eq!(url, "http://[fd00:10:96::1]:9096");

        let requester = HttpRequester::new(&url).unwrap();
        assert_eq!(requester.base_url().port(), Some(9096));
        assert_eq!(
            requester.url_for("core/rules/v1/a/b"),
            "http://[fd00:10:96::1]:9096/core/rules/v1/a/b"
        );
    }

    #[test]
    fn base_url_for_ipv4_and_dns_names() {
        assert_eq!(service_base_url("10.96.0.12", 9096), "http://10.96.0.12:9096");
        assert_eq!(
            service_base_url("istio-galley.istio-system.svc", 9096),
            "http://istio-galley.istio-system.svc:9096"
        );
    }

    #[test]
    fn unknown_service_is_a_resolution_error() {
        let requester = ServiceRequester::new(EmptyRegistry, "istio-system", "istio-galley:9096")
            .unwrap();
        let err = tokio_test::block_on(requester.request(Method::GET, "core/rules/v1/a/b", None))
            .unwrap_err();
        assert!(matches!(err, MixerError::Resolution(_)));
        assert_eq!(
            err.to_string(),
            "service istio-galley:9096 not found in namespace istio-system"
        );
    }
}
