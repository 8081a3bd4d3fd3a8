//! dclocate Domain Layer
pub mod config;
pub mod dc_info;
pub mod errors;
pub mod netlogon;
pub mod srv_candidate;

pub use config::{CliOverrides, Config, LocatorConfig, ResolverConfig};
pub use dc_info::{dc_flags, flag_names, DcAddressType, DomainControllerInfo, DomainGuid};
pub use errors::DomainError;
pub use netlogon::{nt_version, NetlogonOpcode, NetlogonParseError, NetlogonResponse};
pub use srv_candidate::{normalize_ip, AddressFamily, AddressRecord, SrvCandidate};
