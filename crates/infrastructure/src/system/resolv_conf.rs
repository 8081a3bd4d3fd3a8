use dclocate_domain::DomainError;
use std::net::{IpAddr, SocketAddr};
use tokio::fs;
use tracing::{debug, warn};

/// Reads `nameserver` entries from a resolv.conf(5) file.
pub struct ResolvConfReader {
    path: String,
}

impl ResolvConfReader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub async fn read_nameservers(&self) -> Result<Vec<IpAddr>, DomainError> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::NoNameservers(format!("Failed to read {}: {}", self.path, e))
        })?;

        let servers = Self::parse(&content);
        debug!(path = %self.path, count = servers.len(), "Loaded nameservers");

        if servers.is_empty() {
            return Err(DomainError::NoNameservers(format!(
                "No nameserver entries in {}",
                self.path
            )));
        }
        Ok(servers)
    }

    pub fn parse(content: &str) -> Vec<IpAddr> {
        let mut servers = Vec::new();

        for line in content.lines() {
            let line = line.split(['#', ';']).next().unwrap_or_default().trim();
            let mut fields = line.split_whitespace();

            if fields.next() != Some("nameserver") {
                continue;
            }
            let Some(value) = fields.next() else {
                continue;
            };

            // Link-local IPv6 entries may carry a zone suffix.
            let address = value.split('%').next().unwrap_or(value);
            match address.parse::<IpAddr>() {
                Ok(ip) => servers.push(ip),
                Err(_) => warn!(entry = value, "Ignoring invalid nameserver entry"),
            }
        }

        servers
    }
}

impl Default for ResolvConfReader {
    fn default() -> Self {
        Self::new("/etc/resolv.conf")
    }
}

/// Parses a configured nameserver: `ip`, `ip:port` or `[v6]:port`.
pub fn parse_nameserver(value: &str, default_port: u16) -> Result<SocketAddr, DomainError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, default_port))
        .map_err(|_| DomainError::ConfigError(format!("Invalid nameserver '{}'", value)))
}
