use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::netlogon::nt_version;

pub const DEFAULT_SERVICE_PREFIX: &str = "_ldap._tcp.dc._msdcs";
pub const CLDAP_PORT: u16 = 389;

/// DC locator behaviour: what to look up and how long to wait for each DC.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocatorConfig {
    #[serde(default = "default_service_prefix")]
    pub service_prefix: String,

    /// Wait for one candidate's ping reply, in milliseconds.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    /// Upper bound for the whole probing phase. Unbounded when unset.
    #[serde(default)]
    pub total_timeout_ms: Option<u64>,

    #[serde(default = "default_cldap_port")]
    pub cldap_port: u16,

    #[serde(default = "default_nt_version")]
    pub nt_version: u32,

    /// Fail the lookup when a DC answers with an unknown NetLogon layout.
    #[serde(default = "default_true")]
    pub abort_on_protocol_mismatch: bool,

    #[serde(default)]
    pub host_filter: Option<String>,
}

impl LocatorConfig {
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            service_prefix: default_service_prefix(),
            ping_timeout_ms: default_ping_timeout_ms(),
            total_timeout_ms: None,
            cldap_port: default_cldap_port(),
            nt_version: default_nt_version(),
            abort_on_protocol_mismatch: true,
            host_filter: None,
        }
    }
}

fn default_service_prefix() -> String {
    DEFAULT_SERVICE_PREFIX.to_string()
}

fn default_ping_timeout_ms() -> u64 {
    100
}

fn default_cldap_port() -> u16 {
    CLDAP_PORT
}

fn default_nt_version() -> u32 {
    nt_version::V5EX
}

fn default_true() -> bool {
    true
}
