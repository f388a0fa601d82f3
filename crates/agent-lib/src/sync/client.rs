//! gRPC client for the relay's snapshot stream
//!
//! This module provides:
//! - the `StreamOpener`/`OutboundStream` seams used by the delivery loop
//! - a tonic implementation that opens a fresh channel per stream
//! - endpoint normalization for bare `host:port` relay addresses

use super::wire;
use crate::error::AgentError;
use crate::models::Snapshot;
use crate::proto::relay::v1 as relay;
use crate::proto::MetricsServiceClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Endpoint;
use tracing::{debug, info};

/// One open client-streaming call to the relay
#[async_trait]
pub trait OutboundStream: Send {
    /// Send one snapshot; a failure means the stream is unusable
    async fn send(&mut self, snapshot: &Snapshot) -> Result<(), AgentError>;

    /// Close the send side and wait for the relay's acknowledgment
    async fn close(&mut self) -> Result<String, AgentError>;
}

/// Opens outbound streams to the relay
#[async_trait]
pub trait StreamOpener: Send {
    async fn open(&mut self) -> Result<Box<dyn OutboundStream>, AgentError>;
}

/// Configuration for the relay client
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Relay address, `host:port` or a full URL
    pub endpoint: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Upper bound on a single send
    pub send_timeout: Duration,
    /// How long to wait for the acknowledgment on close
    pub ack_timeout: Duration,
    /// Keepalive interval
    pub keepalive_interval: Duration,
    /// Keepalive timeout
    pub keepalive_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            connect_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            ack_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(10),
        }
    }
}

/// Turn a relay address into a URI tonic accepts
///
/// Addresses without a scheme are treated as plaintext `http`.
pub fn normalize_endpoint(address: &str) -> Result<String> {
    let address = address.trim();
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    let url = url::Url::parse(&candidate)
        .with_context(|| format!("Invalid relay address: {address}"))?;
    if url.host_str().is_none() {
        anyhow::bail!("No host in relay address: {address}");
    }

    Ok(candidate)
}

/// `StreamOpener` over tonic
pub struct RelayClient {
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(mut config: RelayConfig) -> Result<Self> {
        config.endpoint = normalize_endpoint(&config.endpoint)?;
        Ok(Self { config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl StreamOpener for RelayClient {
    async fn open(&mut self) -> Result<Box<dyn OutboundStream>, AgentError> {
        let endpoint = self.config.endpoint.as_str();
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| open_error(endpoint, e))?
            .connect_timeout(self.config.connect_timeout)
            .http2_keep_alive_interval(self.config.keepalive_interval)
            .keep_alive_timeout(self.config.keepalive_timeout)
            .keep_alive_while_idle(true)
            .connect()
            .await
            .map_err(|e| open_error(endpoint, e))?;

        let mut client = MetricsServiceClient::new(channel);
        let (tx, rx) = mpsc::channel::<relay::Metrics>(1);
        let response = tokio::spawn(async move {
            client
                .send_metrics(ReceiverStream::new(rx))
                .await
                .map(|r| r.into_inner().message)
        });

        info!(endpoint = %self.config.endpoint, "Opened relay stream");

        Ok(Box::new(GrpcOutboundStream {
            tx: Some(tx),
            response: Some(response),
            send_timeout: self.config.send_timeout,
            ack_timeout: self.config.ack_timeout,
        }))
    }
}

fn open_error(endpoint: &str, err: impl std::fmt::Display) -> AgentError {
    AgentError::DeliveryOpen(format!("{endpoint}: {err}"))
}

type AckHandle = JoinHandle<Result<String, tonic::Status>>;

/// Outbound half of a `SendMetrics` call
///
/// Messages go through a single-slot channel into the spawned call, so a
/// send that returns `Ok` may still be lost if the relay fails right after.
struct GrpcOutboundStream {
    tx: Option<mpsc::Sender<relay::Metrics>>,
    response: Option<AckHandle>,
    send_timeout: Duration,
    ack_timeout: Duration,
}

impl GrpcOutboundStream {
    /// Reason the call ended, when it already has
    async fn finished_reason(&mut self) -> Option<String> {
        let finished = self.response.as_ref().map_or(true, |h| h.is_finished());
        if !finished {
            return None;
        }
        Some(match self.response.take() {
            Some(handle) => match handle.await {
                Ok(Ok(ack)) => format!("relay closed the stream: {ack}"),
                Ok(Err(status)) => format!("relay stream failed: {}", status.message()),
                Err(e) => format!("relay stream task failed: {e}"),
            },
            None => "relay stream already ended".to_string(),
        })
    }
}

#[async_trait]
impl OutboundStream for GrpcOutboundStream {
    async fn send(&mut self, snapshot: &Snapshot) -> Result<(), AgentError> {
        if let Some(reason) = self.finished_reason().await {
            return Err(AgentError::DeliverySend(reason));
        }
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| AgentError::DeliverySend("stream already closed".to_string()))?;

        let sent = tokio::time::timeout(self.send_timeout, tx.send(wire::to_metrics(snapshot))).await;
        match sent {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(AgentError::DeliverySend(
                self.finished_reason()
                    .await
                    .unwrap_or_else(|| "relay stream closed".to_string()),
            )),
            Err(_) => Err(AgentError::DeliverySend(format!(
                "send timed out after {:?}",
                self.send_timeout
            ))),
        }
    }

    async fn close(&mut self) -> Result<String, AgentError> {
        drop(self.tx.take());
        let handle = self
            .response
            .take()
            .ok_or_else(|| AgentError::DeliverySend("stream already closed".to_string()))?;

        match tokio::time::timeout(self.ack_timeout, handle).await {
            Ok(Ok(Ok(ack))) => {
                debug!(ack = %ack, "Relay acknowledged stream");
                Ok(ack)
            }
            Ok(Ok(Err(status))) => Err(AgentError::DeliverySend(status.message().to_string())),
            Ok(Err(e)) => Err(AgentError::DeliverySend(e.to_string())),
            Err(_) => Err(AgentError::DeliverySend(format!(
                "no acknowledgment within {:?}",
                self.ack_timeout
            ))),
        }
    }
}

impl Drop for GrpcOutboundStream {
    fn drop(&mut self) {
        if let Some(handle) = self.response.take() {
            handle.abort();
        }
    }
}
