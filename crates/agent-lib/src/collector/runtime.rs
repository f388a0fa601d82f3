//! Container runtime (CRI) source adapter
//!
//! Talks to the runtime's `RuntimeService` over its unix socket.

use super::RuntimeSource;
use crate::models::{SandboxState, UnitState};
use crate::proto::runtime::v1 as cri;
use crate::proto::RuntimeServiceClient;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::{debug, info};

/// Well-known runtime sockets, probed in order
pub const DEFAULT_SOCKET_CANDIDATES: &[&str] = &[
    "/run/containerd/containerd.sock",
    "/var/run/containerd/containerd.sock",
    "/var/run/crio/crio.sock",
    "/var/run/dockershim.sock",
];

/// Return the first candidate that exists and is not a directory
pub fn discover_runtime_socket<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf> {
    for candidate in candidates {
        let path = candidate.as_ref();
        match std::fs::metadata(path) {
            Ok(meta) if !meta.is_dir() => {
                debug!(path = %path.display(), "Found runtime socket");
                return Ok(path.to_path_buf());
            }
            _ => continue,
        }
    }

    let tried: Vec<String> = candidates
        .iter()
        .map(|c| c.as_ref().display().to_string())
        .collect();
    Err(anyhow!(
        "No container runtime socket found (tried: {})",
        tried.join(", ")
    ))
}

/// `RuntimeSource` backed by a CRI gRPC client
#[derive(Clone)]
pub struct CriClient {
    client: RuntimeServiceClient<Channel>,
    socket: PathBuf,
}

impl CriClient {
    /// Create a client for a socket path or a `unix://` endpoint
    ///
    /// The connection is established lazily on first use so a runtime that
    /// is not up yet surfaces as per-tick source failures.
    pub fn connect(endpoint: &str) -> Result<Self> {
        let socket = PathBuf::from(endpoint.strip_prefix("unix://").unwrap_or(endpoint));

        // The authority is ignored; every connection goes to the socket.
        let connector_path = socket.clone();
        let channel = Endpoint::try_from("http://[::]:50051")
            .context("Failed to build runtime endpoint")?
            .connect_with_connector_lazy(service_fn(move |_: Uri| {
                UnixStream::connect(connector_path.clone())
            }));

        info!(socket = %socket.display(), "Configured container runtime client");

        Ok(Self {
            client: RuntimeServiceClient::new(channel),
            socket,
        })
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }
}

fn sandbox_filter(state: Option<SandboxState>) -> Option<cri::PodSandboxFilter> {
    let state = match state? {
        SandboxState::Ready => cri::PodSandboxState::SandboxReady,
        SandboxState::NotReady => cri::PodSandboxState::SandboxNotready,
        SandboxState::Unknown => return None,
    };
    Some(cri::PodSandboxFilter {
        state: Some(cri::PodSandboxStateValue {
            state: state as i32,
        }),
        ..Default::default()
    })
}

fn container_filter(state: Option<UnitState>) -> Option<cri::ContainerFilter> {
    let state = match state? {
        UnitState::Created => cri::ContainerState::ContainerCreated,
        UnitState::Running => cri::ContainerState::ContainerRunning,
        UnitState::Exited => cri::ContainerState::ContainerExited,
        UnitState::Unknown => cri::ContainerState::ContainerUnknown,
    };
    Some(cri::ContainerFilter {
        state: Some(cri::ContainerStateValue {
            state: state as i32,
        }),
        ..Default::default()
    })
}

#[async_trait]
impl RuntimeSource for CriClient {
    async fn list_sandboxes(&self, state: Option<SandboxState>) -> Result<Vec<cri::PodSandbox>> {
        let request = cri::ListPodSandboxRequest {
            filter: sandbox_filter(state),
        };
        let response = self
            .client
            .clone()
            .list_pod_sandbox(request)
            .await
            .context("ListPodSandbox failed")?;
        Ok(response.into_inner().items)
    }

    async fn list_sandbox_stats(&self) -> Result<Vec<cri::PodSandboxStats>> {
        let response = self
            .client
            .clone()
            .list_pod_sandbox_stats(cri::ListPodSandboxStatsRequest::default())
            .await
            .context("ListPodSandboxStats failed")?;
        Ok(response.into_inner().stats)
    }

    async fn list_containers(&self, state: Option<UnitState>) -> Result<Vec<cri::Container>> {
        let request = cri::ListContainersRequest {
            filter: container_filter(state),
        };
        let response = self
            .client
            .clone()
            .list_containers(request)
            .await
            .context("ListContainers failed")?;
        Ok(response.into_inner().containers)
    }

    async fn list_container_stats(&self) -> Result<Vec<cri::ContainerStats>> {
        let response = self
            .client
            .clone()
            .list_container_stats(cri::ListContainerStatsRequest::default())
            .await
            .context("ListContainerStats failed")?;
        Ok(response.into_inner().stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_returns_first_existing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("containerd.sock");
        let crio = dir.path().join("crio.sock");
        let docker = dir.path().join("dockershim.sock");
        std::fs::write(&crio, "").unwrap();
        std::fs::write(&docker, "").unwrap();

        let found = discover_runtime_socket(&[&missing, &crio, &docker]).unwrap();
        assert_eq!(found, crio);
    }

    #[test]
    fn test_discover_skips_directories() {
        let dir = TempDir::new().unwrap();
        let as_dir = dir.path().join("containerd.sock");
        std::fs::create_dir(&as_dir).unwrap();

        let err = discover_runtime_socket(&[&as_dir]).unwrap_err();
        assert!(err.to_string().contains("containerd.sock"));
    }

    #[test]
    fn test_sandbox_filter_mapping() {
        let filter = sandbox_filter(Some(SandboxState::Ready)).unwrap();
        assert_eq!(
            filter.state.unwrap().state,
            cri::PodSandboxState::SandboxReady as i32
        );
        assert!(sandbox_filter(None).is_none());
        assert!(sandbox_filter(Some(SandboxState::Unknown)).is_none());
    }

    #[test]
    fn test_container_filter_mapping() {
        let filter = container_filter(Some(UnitState::Running)).unwrap();
        assert_eq!(
            filter.state.unwrap().state,
            cri::ContainerState::ContainerRunning as i32
        );
    }

    #[tokio::test]
    async fn test_connect_strips_unix_scheme() {
        let client = CriClient::connect("unix:///run/containerd/containerd.sock").unwrap();
        assert_eq!(client.socket(), Path::new("/run/containerd/containerd.sock"));
    }
}
