use super::answer_parser::{
    parse_record, skip_question, DnsHeader, ParseOutcome, ResourceRecord, SrvRecord, RCODE_NOERROR,
    RCODE_NXDOMAIN,
};
use super::message_builder::MessageBuilder;
use super::transport::resolver::resolve_all;
use super::transport::tcp::TcpTransport;
use super::transport::udp::UdpTransport;
use super::transport::{DnsTransport, TransportResponse};
use crate::system::{parse_nameserver, ResolvConfReader};
use crate::wire::WireCursor;
use async_trait::async_trait;
use dclocate_application::ports::SrvResolver;
use dclocate_application::services::CandidateDirectory;
use dclocate_domain::{normalize_ip, AddressFamily, AddressRecord, DomainError, ResolverConfig, SrvCandidate};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// What one nameserver said about one query name.
enum SrvAnswer {
    Records {
        srv: Vec<SrvRecord>,
        addresses: Vec<AddressRecord>,
    },
    /// NXDOMAIN or no answers; worth retrying under the parent domain.
    Empty,
}

/// SRV lookups over plain DNS against the configured or system nameservers.
pub struct DnsSrvResolver {
    nameservers: Vec<SocketAddr>,
    prefer_tcp: bool,
    timeout: Duration,
    walk_parent_domains: bool,
}

impl DnsSrvResolver {
    pub fn new(nameservers: Vec<SocketAddr>, config: &ResolverConfig) -> Self {
        Self {
            nameservers,
            prefer_tcp: config.prefer_tcp,
            timeout: config.query_timeout(),
            walk_parent_domains: config.walk_parent_domains,
        }
    }

    /// Uses `config.nameservers`, or the system resolv.conf when none are set.
    pub async fn from_config(config: &ResolverConfig) -> Result<Self, DomainError> {
        let nameservers = if config.nameservers.is_empty() {
            ResolvConfReader::new(config.resolv_conf.clone())
                .read_nameservers()
                .await?
                .into_iter()
                .map(|ip| SocketAddr::new(ip, config.dns_port))
                .collect()
        } else {
            config
                .nameservers
                .iter()
                .map(|ns| parse_nameserver(ns, config.dns_port))
                .collect::<Result<Vec<_>, _>>()?
        };

        info!(nameservers = ?nameservers, prefer_tcp = config.prefer_tcp, "SRV resolver ready");
        Ok(Self::new(nameservers, config))
    }

    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    async fn query_srv(&self, qname: &str) -> Result<SrvAnswer, DomainError> {
        if self.nameservers.is_empty() {
            return Err(DomainError::NoNameservers(
                "no nameservers configured".to_string(),
            ));
        }

        let mut last_error = None;
        for server in &self.nameservers {
            let (id, query) = MessageBuilder::build_srv_query(qname)?;

            let response = match self.exchange(*server, &query).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(server = %server, error = %e, "Nameserver failed, trying next");
                    last_error = Some(e);
                    continue;
                }
            };

            match parse_srv_response(&response.bytes, id) {
                Ok(answer) => {
                    debug!(server = %server, protocol = response.protocol_used, qname, "SRV response accepted");
                    return Ok(answer);
                }
                Err(e @ DomainError::Transport { .. }) => {
                    warn!(server = %server, error = %e, "Unusable response, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DomainError::NoNameservers("all nameservers failed".to_string())
        }))
    }

    /// Sends one query to one server, preferring TCP when configured and
    /// retrying a truncated UDP answer over TCP.
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
    ) -> Result<TransportResponse, DomainError> {
        let tcp = TcpTransport::new(server);

        if self.prefer_tcp {
            match tcp.send(query, self.timeout).await {
                Ok(response) => return Ok(response),
                Err(e) => debug!(server = %server, error = %e, "TCP failed, falling back to UDP"),
            }
        }

        let response = UdpTransport::new(server).send(query, self.timeout).await?;
        let truncated = DnsHeader::parse(&mut WireCursor::new(&response.bytes))
            .map(|h| h.is_truncated())
            .unwrap_or(false);

        if truncated {
            debug!(server = %server, "UDP response truncated, retrying over TCP");
            return tcp.send(query, self.timeout).await;
        }
        Ok(response)
    }
}

#[async_trait]
impl SrvResolver for DnsSrvResolver {
    #[instrument(skip(self, directory))]
    async fn lookup(
        &self,
        service: &str,
        domain: &str,
        directory: &mut CandidateDirectory,
    ) -> Result<usize, DomainError> {
        let mut current = domain.trim_end_matches('.');

        let (srv, addresses) = loop {
            let qname = format!("{}.{}", service, current);
            match self.query_srv(&qname).await? {
                SrvAnswer::Records { srv, addresses } => break (srv, addresses),
                SrvAnswer::Empty => {
                    let parent = parent_domain(current).filter(|_| self.walk_parent_domains);
                    match parent {
                        Some(parent) => {
                            debug!(from = current, to = parent, "No SRV answer, trying parent domain");
                            current = parent;
                        }
                        None => {
                            return Err(DomainError::NoSrvRecords {
                                service: service.to_string(),
                                domain: domain.to_string(),
                            })
                        }
                    }
                }
            }
        };

        let mut inserted = 0;
        for record in srv {
            let address = match stitch_address(&record.target, &addresses) {
                Some(address) => address,
                None => self.fallback_address(&record).await?,
            };

            let candidate = SrvCandidate::new(record.target, record.port, record.priority, record.weight)
                .with_address(IpAddr::V6(address));
            if directory.insert(candidate)? {
                inserted += 1;
            }
        }

        if inserted == 0 {
            return Err(DomainError::NoSrvRecords {
                service: service.to_string(),
                domain: domain.to_string(),
            });
        }

        info!(candidates = inserted, "SRV lookup complete");
        Ok(inserted)
    }
}

impl DnsSrvResolver {
    async fn fallback_address(&self, record: &SrvRecord) -> Result<Ipv6Addr, DomainError> {
        debug!(target = %record.target, "No glue record, resolving target directly");
        let addrs = resolve_all(&record.target, record.port, self.timeout)
            .await
            .map_err(|e| {
                warn!(target = %record.target, error = %e, "SRV target did not resolve");
                DomainError::AddressResolution {
                    host: record.target.clone(),
                }
            })?;

        let chosen = addrs
            .iter()
            .find(|a| a.is_ipv6())
            .or_else(|| addrs.first())
            .ok_or_else(|| DomainError::AddressResolution {
                host: record.target.clone(),
            })?;
        Ok(normalize_ip(chosen.ip()))
    }
}

/// Validates a raw SRV response and collects its records.
///
/// A response too short to carry a header, one that does not belong to this
/// query (`id`, QR bit) or one that signals a server-side failure comes back
/// as `DomainError::Transport`, so the caller can try another nameserver.
fn parse_srv_response(msg: &[u8], expected_id: u16) -> Result<SrvAnswer, DomainError> {
    let unusable = |reason: String| DomainError::Transport {
        server: "nameserver".to_string(),
        reason,
    };

    let mut cursor = WireCursor::new(msg);
    let header = DnsHeader::parse(&mut cursor)
        .map_err(|e| unusable(format!("response shorter than a header: {}", e)))?;

    if header.id != expected_id {
        return Err(unusable(format!(
            "response id {} does not match query id {}",
            header.id, expected_id
        )));
    }
    if !header.is_response() {
        return Err(unusable("QR bit not set".to_string()));
    }
    match header.rcode() {
        RCODE_NOERROR => {}
        RCODE_NXDOMAIN => return Ok(SrvAnswer::Empty),
        rcode => return Err(unusable(format!("RCODE {}", rcode))),
    }
    if header.qdcount != 1 {
        return Err(DomainError::InvalidDnsResponse(format!(
            "expected 1 question, got {}",
            header.qdcount
        )));
    }
    if header.ancount == 0 {
        return Ok(SrvAnswer::Empty);
    }

    skip_question(&mut cursor)?;

    let mut srv = Vec::new();
    let mut addresses = Vec::new();

    for _ in 0..header.ancount {
        match parse_record(&mut cursor)? {
            ParseOutcome::Parsed(ResourceRecord::Srv(record)) => srv.push(record),
            ParseOutcome::Parsed(ResourceRecord::Address(record)) => addresses.push(record),
            ParseOutcome::Skip => {}
        }
    }

    let glue_count = u32::from(header.nscount) + u32::from(header.arcount);
    for _ in 0..glue_count {
        if let ParseOutcome::Parsed(ResourceRecord::Address(record)) = parse_record(&mut cursor)? {
            addresses.push(record);
        }
    }

    debug!(srv = srv.len(), glue = addresses.len(), "Parsed SRV response");
    Ok(SrvAnswer::Records { srv, addresses })
}

/// Picks the glue address for `target`: IPv6 first, then IPv4.
fn stitch_address(target: &str, addresses: &[AddressRecord]) -> Option<Ipv6Addr> {
    let matching = |family: AddressFamily| {
        addresses
            .iter()
            .find(|a| a.family == family && a.name.eq_ignore_ascii_case(target))
            .map(|a| a.address)
    };
    matching(AddressFamily::V6).or_else(|| matching(AddressFamily::V4))
}

/// `a.b.c` becomes `b.c`; a two-label domain has no parent worth querying.
fn parent_domain(domain: &str) -> Option<&str> {
    let (_, parent) = domain.split_once('.')?;
    parent.contains('.').then_some(parent)
}
