use async_trait::async_trait;
use dclocate_application::ports::{PingSocket, PingTransport};
use dclocate_domain::DomainError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Opens one UDP socket per lookup, dual-stack when the host allows it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpPingTransport;

impl UdpPingTransport {
    pub fn new() -> Self {
        Self
    }

    fn dual_stack_socket() -> Result<UdpSocket, std::io::Error> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_only_v6(false)?;
        socket.bind(&SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)).into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket)
    }
}

#[async_trait]
impl PingTransport for UdpPingTransport {
    async fn open(&self) -> Result<Box<dyn PingSocket>, DomainError> {
        match Self::dual_stack_socket() {
            Ok(socket) => {
                debug!(local = ?socket.local_addr().ok(), "Opened dual-stack CLDAP socket");
                return Ok(Box::new(UdpPingSocket {
                    socket,
                    v4_only: false,
                }));
            }
            Err(e) => warn!(error = %e, "IPv6 socket unavailable, using IPv4 only"),
        }

        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .await
            .map_err(|e| DomainError::SocketSetup(e.to_string()))?;
        Ok(Box::new(UdpPingSocket {
            socket,
            v4_only: true,
        }))
    }
}

pub struct UdpPingSocket {
    socket: UdpSocket,
    v4_only: bool,
}

impl UdpPingSocket {
    /// Puts `target` in the family the socket was opened with.
    fn route(&self, target: SocketAddr) -> Result<SocketAddr, DomainError> {
        let ip = match (target.ip(), self.v4_only) {
            (IpAddr::V6(v6), true) => match v6.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => {
                    return Err(DomainError::Transport {
                        server: target.to_string(),
                        reason: "IPv6 target on an IPv4-only socket".to_string(),
                    })
                }
            },
            (IpAddr::V4(v4), false) => IpAddr::V6(v4.to_ipv6_mapped()),
            (ip, _) => ip,
        };
        Ok(SocketAddr::new(ip, target.port()))
    }
}

#[async_trait]
impl PingSocket for UdpPingSocket {
    async fn send_to(&self, pdu: &[u8], target: SocketAddr) -> Result<usize, DomainError> {
        let routed = self.route(target)?;
        self.socket
            .send_to(pdu, routed)
            .await
            .map_err(|e| DomainError::Transport {
                server: target.to_string(),
                reason: e.to_string(),
            })
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), DomainError> {
        let (len, source) = self
            .socket
            .recv_from(buf)
            .await
            .map_err(|e| DomainError::IoError(e.to_string()))?;
        Ok((len, SocketAddr::new(source.ip().to_canonical(), source.port())))
    }
}
