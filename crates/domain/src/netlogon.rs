//! NetLogon ping vocabulary (MS-ADTS 6.3.1 / 6.3.3).

use std::net::SocketAddr;
use thiserror::Error;

pub const NETLOGON_ATTR_NAME: &str = "NetLogon";

/// `NtVer` request bits.
pub mod nt_version {
    pub const V1: u32 = 0x0000_0001;
    pub const V5: u32 = 0x0000_0002;
    pub const V5EX: u32 = 0x0000_0004;
    pub const V5EX_WITH_IP: u32 = 0x0000_0008;
    pub const WITH_CLOSEST_SITE: u32 = 0x0000_0010;
    pub const AVOID_NT4EMUL: u32 = 0x0100_0000;
}

/// Opcodes of the `NETLOGON_SAM_LOGON_RESPONSE_EX` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetlogonOpcode {
    LogonResponseEx,
    PauseResponseEx,
    UserUnknownEx,
}

impl NetlogonOpcode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            23 => Some(Self::LogonResponseEx),
            24 => Some(Self::PauseResponseEx),
            25 => Some(Self::UserUnknownEx),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Self::LogonResponseEx => 23,
            Self::PauseResponseEx => 24,
            Self::UserUnknownEx => 25,
        }
    }
}

/// Fully decoded NetLogon response payload.
///
/// Name fields are `None` when the DC sent an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlogonResponse {
    pub message_id: u32,
    pub opcode: NetlogonOpcode,
    pub flags: u32,
    pub domain_guid: [u8; 16],
    pub forest_name: Option<String>,
    pub dns_domain_name: Option<String>,
    /// Stored with the UNC `\\` prefix.
    pub dns_host_name: Option<String>,
    pub netbios_domain_name: Option<String>,
    pub netbios_computer_name: Option<String>,
    pub user_name: Option<String>,
    pub dc_site_name: Option<String>,
    pub client_site_name: Option<String>,
    pub dc_sock_addr: Option<SocketAddr>,
    pub next_closest_site_name: Option<String>,
    pub nt_version: Option<u32>,
    pub lm_nt_token: Option<u16>,
    pub lm_20_token: Option<u16>,
}

impl NetlogonResponse {
    pub fn new(message_id: u32, opcode: NetlogonOpcode) -> Self {
        Self {
            message_id,
            opcode,
            flags: 0,
            domain_guid: [0u8; 16],
            forest_name: None,
            dns_domain_name: None,
            dns_host_name: None,
            netbios_domain_name: None,
            netbios_computer_name: None,
            user_name: None,
            dc_site_name: None,
            client_site_name: None,
            dc_sock_addr: None,
            next_closest_site_name: None,
            nt_version: None,
            lm_nt_token: None,
            lm_20_token: None,
        }
    }
}

/// Failure decoding one CLDAP reply.
///
/// Codes 1 and 2 only disqualify the reply; code 3 means the peer speaks a
/// different protocol revision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetlogonParseError {
    #[error("malformed CLDAP reply: {0}")]
    Malformed(String),

    #[error("allocation failed while decoding {0}")]
    Allocation(&'static str),

    #[error("unknown NetLogon field: {0}")]
    UnknownField(String),
}

impl NetlogonParseError {
    pub fn code(&self) -> u8 {
        match self {
            Self::Malformed(_) => 1,
            Self::Allocation(_) => 2,
            Self::UnknownField(_) => 3,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::UnknownField(_))
    }
}
