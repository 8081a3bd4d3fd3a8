use crate::ports::{LocatorObserver, NetlogonCodec, NoopObserver, PingSocket, PingTransport, SrvResolver};
use crate::services::CandidateDirectory;
use dclocate_domain::config::locator::{CLDAP_PORT, DEFAULT_SERVICE_PREFIX};
use dclocate_domain::{
    normalize_ip, nt_version, DomainControllerInfo, DomainError, LocatorConfig, SrvCandidate,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug, Clone)]
pub struct LocateOptions {
    pub service_prefix: String,
    pub ping_timeout: Duration,
    pub total_timeout: Option<Duration>,
    pub cldap_port: u16,
    pub nt_version: u32,
    pub abort_on_protocol_mismatch: bool,
}

impl LocateOptions {
    pub fn from_config(config: &LocatorConfig) -> Self {
        Self {
            service_prefix: config.service_prefix.clone(),
            ping_timeout: config.ping_timeout(),
            total_timeout: config.total_timeout(),
            cldap_port: config.cldap_port,
            nt_version: config.nt_version,
            abort_on_protocol_mismatch: config.abort_on_protocol_mismatch,
        }
    }
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            service_prefix: DEFAULT_SERVICE_PREFIX.to_string(),
            ping_timeout: Duration::from_millis(100),
            total_timeout: None,
            cldap_port: CLDAP_PORT,
            nt_version: nt_version::V5EX,
            abort_on_protocol_mismatch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocateRequest {
    pub domain: String,
    /// Client host name placed in the `Host=` filter term.
    pub host: Option<String>,
}

impl LocateRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            host: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

/// Why one candidate did not produce a result.
enum ProbeFailure {
    /// Move on to the next candidate.
    Skip(String),
    /// Abort the whole lookup.
    Fatal(DomainError),
}

pub struct LocateDcUseCase {
    resolver: Arc<dyn SrvResolver>,
    transport: Arc<dyn PingTransport>,
    codec: Arc<dyn NetlogonCodec>,
    observer: Arc<dyn LocatorObserver>,
    options: LocateOptions,
    rng_seed: Option<u64>,
}

impl LocateDcUseCase {
    pub fn new(
        resolver: Arc<dyn SrvResolver>,
        transport: Arc<dyn PingTransport>,
        codec: Arc<dyn NetlogonCodec>,
        options: LocateOptions,
    ) -> Self {
        Self {
            resolver,
            transport,
            codec,
            observer: Arc::new(NoopObserver),
            options,
            rng_seed: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LocatorObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Makes the weighted draw reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn options(&self) -> &LocateOptions {
        &self.options
    }

    pub async fn execute(&self, request: &LocateRequest) -> Result<DomainControllerInfo, DomainError> {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but returns `DomainError::Cancelled`
    /// as soon as `cancel` fires. Everything the lookup opened is dropped.
    pub async fn execute_with_cancel(
        &self,
        request: &LocateRequest,
        cancel: CancellationToken,
    ) -> Result<DomainControllerInfo, DomainError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(domain = %request.domain, "Domain controller lookup cancelled");
                Err(DomainError::Cancelled)
            }
            result = self.locate(request) => result,
        }
    }

    /// Resolves the SRV candidates only, in the order they would be probed.
    #[instrument(skip(self))]
    pub async fn resolve_candidates(&self, domain: &str) -> Result<Vec<SrvCandidate>, DomainError> {
        let domain = normalize_domain(domain)?;
        let mut directory = self.new_directory();
        self.resolver
            .lookup(&self.options.service_prefix, &domain, &mut directory)
            .await?;
        self.observer
            .candidates_resolved(&domain, directory.candidates());
        Ok(directory.selection_order())
    }

    #[instrument(skip(self, request), fields(domain = %request.domain))]
    async fn locate(&self, request: &LocateRequest) -> Result<DomainControllerInfo, DomainError> {
        let domain = normalize_domain(&request.domain)?;

        let mut directory = self.new_directory();
        let count = self
            .resolver
            .lookup(&self.options.service_prefix, &domain, &mut directory)
            .await
            .inspect_err(|e| warn!(error = %e, "SRV resolution failed"))?;

        if count == 0 || directory.is_empty() {
            return Err(DomainError::NoSrvRecords {
                service: self.options.service_prefix.clone(),
                domain,
            });
        }
        debug!(candidates = count, "SRV candidates resolved");
        self.observer
            .candidates_resolved(&domain, directory.candidates());

        let socket = self.transport.open().await?;
        let overall_deadline = self.options.total_timeout.map(|t| Instant::now() + t);
        let mut buf = vec![0u8; MAX_DATAGRAM];

        let mut current = directory.next(None);
        while let Some(id) = current {
            let Some(candidate) = directory.get(id).cloned() else {
                break;
            };

            match self
                .probe(
                    socket.as_ref(),
                    &candidate,
                    &domain,
                    request.host.as_deref(),
                    overall_deadline,
                    &mut buf,
                )
                .await
            {
                Ok(info) => {
                    info!(
                        dc = %info.domain_controller_name,
                        address = %info.domain_controller_address,
                        flags = format_args!("0x{:08x}", info.flags),
                        "Domain controller located"
                    );
                    self.observer.located(&info);
                    return Ok(info);
                }
                Err(ProbeFailure::Skip(reason)) => {
                    warn!(candidate = %candidate, reason = %reason, "Probe failed, trying next candidate");
                    self.observer.probe_failed(&candidate, &reason);
                }
                Err(ProbeFailure::Fatal(e)) => {
                    warn!(candidate = %candidate, error = %e, "Aborting lookup");
                    self.observer.probe_failed(&candidate, &e.to_string());
                    return Err(e);
                }
            }

            current = directory.next(Some(id));
        }

        info!("No domain controller answered");
        Err(DomainError::DcNotFound { domain })
    }

    async fn probe(
        &self,
        socket: &dyn PingSocket,
        candidate: &SrvCandidate,
        domain: &str,
        host: Option<&str>,
        overall_deadline: Option<Instant>,
        buf: &mut [u8],
    ) -> Result<DomainControllerInfo, ProbeFailure> {
        if overall_deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ProbeFailure::Fatal(DomainError::DeadlineExceeded));
        }

        let address = candidate
            .address
            .ok_or_else(|| ProbeFailure::Skip("candidate has no address".to_string()))?;
        let target = SocketAddr::new(IpAddr::V6(address), self.options.cldap_port);

        let request = self
            .codec
            .build_request(domain, host, self.options.nt_version)
            .map_err(ProbeFailure::Fatal)?;

        socket
            .send_to(&request.pdu, target)
            .await
            .map_err(|e| ProbeFailure::Skip(e.to_string()))?;
        self.observer
            .probe_sent(candidate, target, request.message_id);

        let ping_deadline = Instant::now() + self.options.ping_timeout;
        let (deadline, bounded_by_total) = match overall_deadline {
            Some(total) if total < ping_deadline => (total, true),
            _ => (ping_deadline, false),
        };

        loop {
            let received = tokio::time::timeout_at(deadline, socket.recv_from(buf)).await;

            let (len, source) = match received {
                Err(_) if bounded_by_total => {
                    return Err(ProbeFailure::Fatal(DomainError::DeadlineExceeded));
                }
                Err(_) => return Err(ProbeFailure::Skip("timed out".to_string())),
                Ok(Err(e)) => return Err(ProbeFailure::Skip(e.to_string())),
                Ok(Ok(received)) => received,
            };

            let reply = match self.codec.parse_reply(
                &buf[..len],
                request.message_id,
                self.options.nt_version,
            ) {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    debug!(
                        expected = request.message_id,
                        %source,
                        "Discarding reply to another probe"
                    );
                    continue;
                }
                Err(e) if e.is_recoverable() || !self.options.abort_on_protocol_mismatch => {
                    return Err(ProbeFailure::Skip(format!("{} (code {})", e, e.code())));
                }
                Err(e) => {
                    return Err(ProbeFailure::Fatal(DomainError::ProtocolMismatch(
                        e.to_string(),
                    )));
                }
            };

            if candidate.address != Some(normalize_ip(source.ip())) {
                debug!(
                    candidate = %candidate,
                    %source,
                    "Reply came from an address other than the probed one"
                );
            }

            return Ok(DomainControllerInfo::from_reply(reply, source.ip(), candidate));
        }
    }

    fn new_directory(&self) -> CandidateDirectory {
        match self.rng_seed {
            Some(seed) => CandidateDirectory::with_rng(fastrand::Rng::with_seed(seed)),
            None => CandidateDirectory::new(),
        }
    }
}

/// Strips a trailing dot and rejects names DNS cannot carry.
fn normalize_domain(domain: &str) -> Result<String, DomainError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(DomainError::InvalidDomainName("empty domain".to_string()));
    }
    if trimmed.len() > 253 {
        return Err(DomainError::InvalidDomainName(format!(
            "{} exceeds 253 characters",
            trimmed
        )));
    }
    if trimmed
        .split('.')
        .any(|label| label.is_empty() || label.len() > 63)
    {
        return Err(DomainError::InvalidDomainName(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
