//! Process configuration.
//!
//! Built once at startup, then shared read-only (typically as
//! `Arc<ReactorConfig>`). Also owns the rules that turn a symbolic target
//! into the URL of the instance that serves it.

use serde::{Deserialize, Serialize};

use crate::error::{ReactorError, Result};

/// Path prefix every Reactor endpoint lives under.
pub const BASE_PATH: &str = "/rr";

/// Upper bound on orbit hops.
pub const MAX_ORBIT: u32 = 5;

/// Orbit identifier handed out while depth tracking is not implemented.
const STUB_ORBIT: &str = "inf";

/// Where the other instances live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Deployment {
    /// Every call goes back to this process on localhost.
    Local,
    /// Instances are reached by conventional service names.
    Kubernetes,
    /// No mode given; treated like a clustered deployment.
    #[default]
    Unspecified,
}

impl Deployment {
    fn from_env_value(value: &str) -> Self {
        match value {
            "local" => Deployment::Local,
            "k8s" => Deployment::Kubernetes,
            _ => Deployment::Unspecified,
        }
    }
}

/// Read-only configuration for a Reactor process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Port this service listens on; also used for local-mode URLs.
    pub port: u16,

    /// Application name reported by the health endpoint.
    pub app_name: String,

    /// Application version reported by the health endpoint.
    pub app_version: String,

    /// Deployment mode.
    pub deployment: Deployment,

    /// Verbose logging.
    pub debug: bool,

    /// Profiling toggle. Not consulted by plan execution.
    pub profiling: bool,

    /// Fixed path prefix.
    pub base_path: String,

    /// Maximum orbit depth.
    pub max_orbit: u32,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            app_name: "reactor".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            deployment: Deployment::default(),
            debug: false,
            profiling: false,
            base_path: BASE_PATH.to_string(),
            max_orbit: MAX_ORBIT,
        }
    }
}

impl ReactorConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ReactorError::InvalidConfig(format!("PORT '{}': {}", raw, e)))?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            app_name: lookup("APP_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.app_name),
            app_version: lookup("APP_VERSION")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.app_version),
            deployment: lookup("REACTOR_MODE")
                .map(|v| Deployment::from_env_value(&v))
                .unwrap_or_default(),
            debug: lookup("REACTOR_DEBUG").as_deref() == Some("1"),
            profiling: lookup("REACTOR_PROFILE").as_deref() == Some("1"),
            base_path: defaults.base_path,
            max_orbit: defaults.max_orbit,
        })
    }

    /// Returns true when every call targets localhost.
    pub fn is_local_mode(&self) -> bool {
        self.deployment == Deployment::Local
    }

    /// Returns true when running inside a Kubernetes cluster.
    pub fn is_kubernetes_mode(&self) -> bool {
        self.deployment == Deployment::Kubernetes
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    /// Identifier of the orbit the next molecule hop should go to.
    ///
    /// Always the same value for now; depth tracking against `max_orbit`
    /// has no agreed policy yet.
    pub fn next_orbit(&self) -> String {
        STUB_ORBIT.to_string()
    }

    /// URL serving an element.
    ///
    /// `payload` may carry extra comma-separated data (`"H,extra"`). Only the
    /// leading symbol selects the host and path; the whole payload is passed
    /// on as the `symbol` query parameter.
    pub fn element_url(&self, payload: &str) -> String {
        let symbol = leading_symbol(payload);
        format!(
            "http://{}{}/atom/{}?symbol={}",
            self.host_for(&format!("atom-{}", symbol.to_lowercase())),
            self.base_path,
            symbol,
            payload
        )
    }

    /// URL serving the next orbit hop for a molecule.
    pub fn orbit_url(&self, molecule: &str) -> String {
        let next = self.next_orbit();
        format!(
            "http://{}{}/orbit/{}?molecule={}",
            self.host_for(&format!("orbit-{}", next)),
            self.base_path,
            next,
            molecule
        )
    }

    fn host_for(&self, service: &str) -> String {
        if self.is_local_mode() {
            format!("localhost:{}", self.port)
        } else {
            service.to_string()
        }
    }
}

/// The part of a target before the first comma.
pub fn leading_symbol(payload: &str) -> &str {
    payload.split(',').next().unwrap_or(payload)
}
