use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Malformed DNS message: {0}")]
    MalformedDnsMessage(String),

    #[error("No SRV records for {service} in {domain}")]
    NoSrvRecords { service: String, domain: String },

    #[error("Failed to resolve address for SRV target {host}")]
    AddressResolution { host: String },

    #[error("No nameservers available: {0}")]
    NoNameservers(String),

    #[error("Transport timeout connecting to {server}")]
    TransportTimeout { server: String },

    #[error("Transport error talking to {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("Failed to open CLDAP socket: {0}")]
    SocketSetup(String),

    #[error("LDAP filter exceeds {capacity} bytes")]
    FilterOverflow { capacity: usize },

    #[error("Invalid LDAP filter: {0}")]
    InvalidFilter(String),

    #[error("BER encoding failed: {0}")]
    BerEncode(String),

    #[error("Peer speaks an incompatible NetLogon revision: {0}")]
    ProtocolMismatch(String),

    #[error("Candidate directory is already being iterated")]
    DirectorySealed,

    #[error("No domain controller found for {domain}")]
    DcNotFound { domain: String },

    #[error("Domain controller lookup cancelled")]
    Cancelled,

    #[error("Domain controller lookup exceeded its deadline")]
    DeadlineExceeded,

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    /// True for failures that end the whole lookup without a result.
    pub fn is_not_found(&self) -> bool {
        !matches!(
            self,
            DomainError::Cancelled | DomainError::ConfigError(_) | DomainError::InvalidDomainName(_)
        )
    }
}
