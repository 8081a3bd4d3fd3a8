//! CLDAP NetLogon ping (MS-ADTS 6.3.3): request encoding, reply decoding
//! and the UDP socket the orchestrator probes through.

pub mod codec;
pub mod filter;
pub mod netlogon;
pub mod reply;
pub mod request;
pub mod socket;

pub use codec::CldapNetlogonCodec;
pub use socket::UdpPingTransport;
