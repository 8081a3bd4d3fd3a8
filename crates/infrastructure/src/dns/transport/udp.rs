//! DNS over UDP (RFC 1035 4.2.1).
//!
//! The caller retries over TCP when the answer has TC set.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use dclocate_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn local_bind(&self) -> SocketAddr {
        match self.server_addr {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        }
    }

    fn io_error(&self, what: &str, e: std::io::Error) -> DomainError {
        DomainError::Transport {
            server: self.server_addr.to_string(),
            reason: format!("{}: {}", what, e),
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    /// One datagram out, the first datagram back from the server within
    /// `timeout`. Datagrams from other sources are dropped.
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let deadline = Instant::now() + timeout;
        let timed_out = || DomainError::TransportTimeout {
            server: self.server_addr.to_string(),
        };

        let socket = UdpSocket::bind(self.local_bind())
            .await
            .map_err(|e| self.io_error("bind", e))?;

        tokio::time::timeout_at(deadline, socket.send_to(message_bytes, self.server_addr))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| self.io_error("send", e))?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let (len, from) = tokio::time::timeout_at(deadline, socket.recv_from(&mut buf))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| self.io_error("receive", e))?;

            if from != self.server_addr {
                warn!(expected = %self.server_addr, received_from = %from, "Dropping UDP datagram from unexpected source");
                continue;
            }

            buf.truncate(len);
            debug!(server = %self.server_addr, bytes = len, "UDP response received");
            return Ok(TransportResponse {
                bytes: buf,
                protocol_used: self.protocol_name(),
            });
        }
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
