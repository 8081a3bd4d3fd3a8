use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A domain controller advertised by an SRV record (RFC 2782).
///
/// Addresses are always held in IPv6 form; IPv4 glue is stored as an
/// IPv4-mapped address (`::ffff:a.b.c.d`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SrvCandidate {
    pub target_name: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
    pub address: Option<Ipv6Addr>,
    #[serde(skip)]
    pub used: bool,
}

impl SrvCandidate {
    pub fn new(target_name: impl Into<String>, port: u16, priority: u16, weight: u16) -> Self {
        Self {
            target_name: target_name.into(),
            port,
            priority,
            weight,
            address: None,
            used: false,
        }
    }

    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(normalize_ip(address));
        self
    }

    /// Two candidates are the same entry when target, priority and weight match.
    pub fn same_entry(&self, other: &SrvCandidate) -> bool {
        self.priority == other.priority
            && self.weight == other.weight
            && self.target_name.eq_ignore_ascii_case(&other.target_name)
    }

    /// Address in its natural family, for display and for v4-only sockets.
    pub fn display_address(&self) -> Option<IpAddr> {
        self.address.map(|a| IpAddr::V6(a).to_canonical())
    }
}

impl fmt::Display for SrvCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} (priority {}, weight {})",
            self.target_name, self.port, self.priority, self.weight
        )?;
        if let Some(addr) = self.display_address() {
            write!(f, " at {}", addr)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

/// An A or AAAA record seen while stitching glue onto SRV targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub name: String,
    pub address: Ipv6Addr,
    pub family: AddressFamily,
}

impl AddressRecord {
    pub fn v4(name: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address: address.to_ipv6_mapped(),
            family: AddressFamily::V4,
        }
    }

    pub fn v6(name: impl Into<String>, address: Ipv6Addr) -> Self {
        Self {
            name: name.into(),
            address,
            family: AddressFamily::V6,
        }
    }
}

pub fn normalize_ip(address: IpAddr) -> Ipv6Addr {
    match address {
        IpAddr::V4(v4) => v4.to_ipv6_mapped(),
        IpAddr::V6(v6) => v6,
    }
}
