use serde::{Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;

use crate::netlogon::NetlogonResponse;
use crate::srv_candidate::SrvCandidate;

/// Bits of the `Flags` field returned in a NetLogon response.
pub mod dc_flags {
    pub const PDC: u32 = 0x0000_0001;
    pub const GC: u32 = 0x0000_0004;
    pub const LDAP: u32 = 0x0000_0008;
    pub const DS: u32 = 0x0000_0010;
    pub const KDC: u32 = 0x0000_0020;
    pub const TIMESERV: u32 = 0x0000_0040;
    pub const CLOSEST: u32 = 0x0000_0080;
    pub const WRITABLE: u32 = 0x0000_0100;
    pub const GOOD_TIMESERV: u32 = 0x0000_0200;
    pub const NDNC: u32 = 0x0000_0400;
    pub const SELECT_SECRET_DOMAIN_6: u32 = 0x0000_0800;
    pub const FULL_SECRET_DOMAIN_6: u32 = 0x0000_1000;
    pub const PING_FLAGS: u32 = 0x0000_ffff;
    pub const DNS_CONTROLLER: u32 = 0x2000_0000;
    pub const DNS_DOMAIN: u32 = 0x4000_0000;
    pub const DNS_FOREST: u32 = 0x8000_0000;

    pub(crate) const NAMES: [(u32, &str); 15] = [
        (PDC, "PDC"),
        (GC, "GC"),
        (LDAP, "LDAP"),
        (DS, "DS"),
        (KDC, "KDC"),
        (TIMESERV, "TIMESERV"),
        (CLOSEST, "CLOSEST"),
        (WRITABLE, "WRITABLE"),
        (GOOD_TIMESERV, "GOOD_TIMESERV"),
        (NDNC, "NDNC"),
        (SELECT_SECRET_DOMAIN_6, "SELECT_SECRET_DOMAIN_6"),
        (FULL_SECRET_DOMAIN_6, "FULL_SECRET_DOMAIN_6"),
        (DNS_CONTROLLER, "DNS_CONTROLLER"),
        (DNS_DOMAIN, "DNS_DOMAIN"),
        (DNS_FOREST, "DNS_FOREST"),
    ];
}

/// Names of the documented bits set in `flags`, lowest bit first.
pub fn flag_names(flags: u32) -> Vec<&'static str> {
    dc_flags::NAMES
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DcAddressType {
    /// `DS_INET_ADDRESS`
    Inet,
    /// `DS_NETBIOS_ADDRESS`
    Netbios,
}

impl DcAddressType {
    pub fn as_u32(self) -> u32 {
        match self {
            DcAddressType::Inet => 0x0001,
            DcAddressType::Netbios => 0x0002,
        }
    }
}

/// A domain GUID as the 16 bytes sent on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DomainGuid(pub [u8; 16]);

impl DomainGuid {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == [0u8; 16]
    }
}

impl fmt::Display for DomainGuid {
    /// Data1..Data3 are little-endian on the wire; Data4 is a byte string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            data1, data2, data3, b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
        )
    }
}

impl fmt::Debug for DomainGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainGuid({})", self)
    }
}

impl Serialize for DomainGuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The located domain controller, in the shape of `DOMAIN_CONTROLLER_INFO`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainControllerInfo {
    pub domain_controller_name: String,
    pub domain_controller_address: IpAddr,
    pub domain_controller_address_type: DcAddressType,
    pub domain_guid: DomainGuid,
    pub domain_name: Option<String>,
    pub dns_forest_name: Option<String>,
    pub flags: u32,
    pub dc_site_name: Option<String>,
    pub client_site_name: Option<String>,
}

impl DomainControllerInfo {
    /// Assembles the result from a decoded reply.
    ///
    /// `source` is the address the reply datagram actually came from; the
    /// SRV record's address is not used for it.
    pub fn from_reply(reply: NetlogonResponse, source: IpAddr, candidate: &SrvCandidate) -> Self {
        let domain_controller_name = reply
            .dns_host_name
            .unwrap_or_else(|| format!("\\\\{}", candidate.target_name));

        Self {
            domain_controller_name,
            domain_controller_address: source.to_canonical(),
            domain_controller_address_type: DcAddressType::Inet,
            domain_guid: DomainGuid(reply.domain_guid),
            domain_name: reply.dns_domain_name,
            dns_forest_name: reply.forest_name,
            flags: reply.flags,
            dc_site_name: reply.dc_site_name,
            client_site_name: reply.client_site_name,
        }
    }

    /// `DomainControllerAddress` as Windows renders it.
    pub fn address_unc(&self) -> String {
        format!("\\\\{}", self.domain_controller_address)
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}
