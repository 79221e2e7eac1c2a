//! Outbound calls to elements and orbits.

use std::sync::Arc;

use async_trait::async_trait;
use reactor_core::{ReactorConfig, ReactorError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::ExecContext;

/// Lexical class of a block target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A single symbol (`H`, `Na,extra`), served by its own atom service.
    Element,
    /// A molecule expression (`2H+O`), handed to another reactor instance.
    Orbit,
}

impl TargetKind {
    /// Targets starting with a letter are elements, everything else is an orbit.
    pub fn classify(target: &str) -> Self {
        match target.chars().next() {
            Some(first) if first.is_alphabetic() => TargetKind::Element,
            _ => TargetKind::Orbit,
        }
    }
}

/// A target resolved to the URL that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub url: String,
    pub kind: TargetKind,
}

/// Performs a single GET for the dispatcher.
///
/// Implementations must be safe to share between concurrent dispatches.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and discard the response body.
    async fn get(&self, url: &str, ctx: &ExecContext) -> Result<()>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, ctx: &ExecContext) -> Result<()> {
        let mut request = self.client.get(url);
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }

        let round_trip = async {
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            response.bytes().await.map_err(transport_error)?;
            debug!(url, %status, "dispatch complete");
            Ok(())
        };

        tokio::select! {
            result = round_trip => result,
            _ = ctx.done() => Err(ReactorError::Cancelled),
        }
    }
}

/// A request that ran into the context deadline counts as cancelled.
fn transport_error(err: reqwest::Error) -> ReactorError {
    if err.is_timeout() {
        ReactorError::Cancelled
    } else {
        ReactorError::Transport(err.to_string())
    }
}

/// Resolves targets and sends the outbound calls.
///
/// Failures are logged and swallowed: a dispatch that could not reach its
/// target still counts as completed.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ReactorConfig>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// Create a dispatcher over any transport.
    pub fn new(config: Arc<ReactorConfig>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Create a dispatcher that speaks HTTP.
    pub fn http(config: Arc<ReactorConfig>) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Resolve a target to its URL, classifying it lexically.
    pub fn resolve(&self, target: &str) -> ResolvedTarget {
        self.resolve_as(TargetKind::classify(target), target)
    }

    /// Resolve a target as the given kind.
    pub fn resolve_as(&self, kind: TargetKind, target: &str) -> ResolvedTarget {
        let url = match kind {
            TargetKind::Element => self.config.element_url(target),
            TargetKind::Orbit => self.config.orbit_url(target),
        };
        ResolvedTarget { url, kind }
    }

    /// Call the atom service for `symbol`.
    pub async fn call_element(&self, ctx: &ExecContext, symbol: &str) {
        let resolved = self.resolve_as(TargetKind::Element, symbol);
        self.send(ctx, &resolved).await;
    }

    /// Hand `molecule` to the next orbit.
    pub async fn call_orbit(&self, ctx: &ExecContext, molecule: &str) {
        let resolved = self.resolve_as(TargetKind::Orbit, molecule);
        self.send(ctx, &resolved).await;
    }

    async fn send(&self, ctx: &ExecContext, target: &ResolvedTarget) {
        let url = target.url.as_str();
        if let Err(e) = self.transport.get(url, ctx).await {
            warn!(url, kind = ?target.kind, error = %e, "dispatch failed");
        }
    }
}
