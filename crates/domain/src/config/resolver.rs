use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Nameservers as `ip` or `ip:port`. Empty means read `/etc/resolv.conf`.
    #[serde(default)]
    pub nameservers: Vec<String>,

    #[serde(default = "default_dns_port")]
    pub dns_port: u16,

    /// Use TCP (virtual circuit) before falling back to UDP.
    #[serde(default = "default_true")]
    pub prefer_tcp: bool,

    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Retry the SRV query under parent domains when there is no answer.
    #[serde(default = "default_true")]
    pub walk_parent_domains: bool,

    #[serde(default = "default_resolv_conf")]
    pub resolv_conf: String,
}

impl ResolverConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            dns_port: default_dns_port(),
            prefer_tcp: true,
            query_timeout_ms: default_query_timeout_ms(),
            walk_parent_domains: true,
            resolv_conf: default_resolv_conf(),
        }
    }
}

fn default_dns_port() -> u16 {
    53
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_resolv_conf() -> String {
    "/etc/resolv.conf".to_string()
}

fn default_true() -> bool {
    true
}
