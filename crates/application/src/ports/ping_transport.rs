use async_trait::async_trait;
use dclocate_domain::DomainError;
use std::net::SocketAddr;

/// One datagram socket owned by a single lookup. Dropping it closes it.
#[async_trait]
pub trait PingSocket: Send + Sync {
    async fn send_to(&self, pdu: &[u8], target: SocketAddr) -> Result<usize, DomainError>;

    /// Waits for the next datagram. Callers bound the wait themselves.
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), DomainError>;
}

#[async_trait]
pub trait PingTransport: Send + Sync {
    /// Opens a socket on an ephemeral local port that can reach both
    /// IPv4 and IPv6 candidates.
    async fn open(&self) -> Result<Box<dyn PingSocket>, DomainError>;
}
