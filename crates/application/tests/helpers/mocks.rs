#![allow(dead_code)]

use async_trait::async_trait;
use dclocate_application::ports::{
    LocatorObserver, NetlogonCodec, NetlogonRequest, PingSocket, PingTransport, SrvResolver,
};
use dclocate_application::services::CandidateDirectory;
use dclocate_domain::{
    dc_flags, DomainControllerInfo, DomainError, NetlogonOpcode, NetlogonParseError,
    NetlogonResponse, SrvCandidate,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

// ── SRV resolver ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSrvResolver {
    candidates: Arc<Mutex<Vec<SrvCandidate>>>,
    error: Arc<Mutex<Option<DomainError>>>,
    lookups: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSrvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(candidates: Vec<SrvCandidate>) -> Self {
        let resolver = Self::new();
        *resolver.candidates.lock().unwrap() = candidates;
        resolver
    }

    pub fn set_error(&self, error: DomainError) {
        *self.error.lock().unwrap() = Some(error);
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SrvResolver for MockSrvResolver {
    async fn lookup(
        &self,
        service: &str,
        domain: &str,
        directory: &mut CandidateDirectory,
    ) -> Result<usize, DomainError> {
        self.lookups
            .lock()
            .unwrap()
            .push((service.to_string(), domain.to_string()));

        if let Some(error) = self.error.lock().unwrap().clone() {
            return Err(error);
        }

        let candidates = self.candidates.lock().unwrap().clone();
        let mut inserted = 0;
        for candidate in candidates {
            if directory.insert(candidate)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

// ── NetLogon codec ─────────────────────────────────────────────────────────
//
// Datagrams exchanged with the mock transport are `[kind, id_hi, id_lo]`.

pub const KIND_OK: u8 = 0;
pub const KIND_MALFORMED: u8 = 1;
pub const KIND_ALLOCATION: u8 = 2;
pub const KIND_UNKNOWN_FIELD: u8 = 3;

pub struct MockNetlogonCodec {
    next_id: AtomicU16,
    template: NetlogonResponse,
}

impl MockNetlogonCodec {
    pub fn new() -> Self {
        let mut template = NetlogonResponse::new(0, NetlogonOpcode::LogonResponseEx);
        template.flags = dc_flags::GC;
        template.dns_domain_name = Some("example.com".to_string());
        template.forest_name = Some("example.com".to_string());
        template.dc_site_name = Some("Default-First-Site-Name".to_string());
        Self {
            next_id: AtomicU16::new(1),
            template,
        }
    }

    pub fn with_host_name(mut self, host: &str) -> Self {
        self.template.dns_host_name = Some(format!("\\\\{}", host));
        self
    }
}

impl Default for MockNetlogonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl NetlogonCodec for MockNetlogonCodec {
    fn build_request(
        &self,
        domain: &str,
        _host: Option<&str>,
        _nt_version: u32,
    ) -> Result<NetlogonRequest, DomainError> {
        if domain.len() > 200 {
            return Err(DomainError::FilterOverflow { capacity: 256 });
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(NetlogonRequest {
            message_id,
            pdu: message_id.to_be_bytes().to_vec(),
        })
    }

    fn parse_reply(
        &self,
        buf: &[u8],
        expected_id: u16,
        _nt_version: u32,
    ) -> Result<Option<NetlogonResponse>, NetlogonParseError> {
        if buf.len() != 3 {
            return Err(NetlogonParseError::Malformed("short datagram".into()));
        }
        let message_id = u16::from_be_bytes([buf[1], buf[2]]);
        if message_id != expected_id {
            return Ok(None);
        }
        match buf[0] {
            KIND_OK => {
                let mut reply = self.template.clone();
                reply.message_id = u32::from(message_id);
                Ok(Some(reply))
            }
            KIND_ALLOCATION => Err(NetlogonParseError::Allocation("name")),
            KIND_UNKNOWN_FIELD => Err(NetlogonParseError::UnknownField("opcode 19".into())),
            _ => Err(NetlogonParseError::Malformed("bad BER".into())),
        }
    }
}

// ── Ping transport ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBehavior {
    Reply,
    Silent,
    Malformed,
    Allocation,
    UnknownField,
    /// Sends a datagram of the given kind carrying the previous probe's
    /// message id, then the real reply.
    StaleThenReply(u8),
    /// Answers from a different address than the one probed.
    ReplyFrom(IpAddr),
    SendFails,
}

#[derive(Clone, Default)]
pub struct MockPingTransport {
    behaviors: Arc<Mutex<HashMap<IpAddr, PeerBehavior>>>,
    sent: Arc<Mutex<Vec<SocketAddr>>>,
    open_sockets: Arc<AtomicUsize>,
    opened_total: Arc<AtomicUsize>,
    fail_open: Arc<Mutex<bool>>,
}

impl MockPingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, ip: &str, behavior: PeerBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(ip.parse().unwrap(), behavior);
    }

    pub fn set_fail_open(&self, fail: bool) {
        *self.fail_open.lock().unwrap() = fail;
    }

    /// Probe targets in send order, with IPv4-mapped addresses unmapped.
    pub fn sent_targets(&self) -> Vec<IpAddr> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.ip().to_canonical())
            .collect()
    }

    pub fn sent_ports(&self) -> Vec<u16> {
        self.sent.lock().unwrap().iter().map(|t| t.port()).collect()
    }

    pub fn open_sockets(&self) -> usize {
        self.open_sockets.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PingTransport for MockPingTransport {
    async fn open(&self) -> Result<Box<dyn PingSocket>, DomainError> {
        if *self.fail_open.lock().unwrap() {
            return Err(DomainError::SocketSetup("address in use".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.open_sockets.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPingSocket {
            behaviors: Arc::clone(&self.behaviors),
            sent: Arc::clone(&self.sent),
            open_sockets: Arc::clone(&self.open_sockets),
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }))
    }
}

pub struct MockPingSocket {
    behaviors: Arc<Mutex<HashMap<IpAddr, PeerBehavior>>>,
    sent: Arc<Mutex<Vec<SocketAddr>>>,
    open_sockets: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<(Vec<u8>, SocketAddr)>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<(Vec<u8>, SocketAddr)>>,
}

#[async_trait]
impl PingSocket for MockPingSocket {
    async fn send_to(&self, pdu: &[u8], target: SocketAddr) -> Result<usize, DomainError> {
        self.sent.lock().unwrap().push(target);

        let peer = target.ip().to_canonical();
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&peer)
            .copied()
            .unwrap_or(PeerBehavior::Silent);

        let id = [pdu[0], pdu[1]];
        let source = SocketAddr::new(peer, target.port());
        let reply = |kind: u8| vec![kind, id[0], id[1]];

        match behavior {
            PeerBehavior::Reply => self.tx.send((reply(KIND_OK), source)).unwrap(),
            PeerBehavior::Silent => {}
            PeerBehavior::Malformed => self.tx.send((reply(KIND_MALFORMED), source)).unwrap(),
            PeerBehavior::Allocation => self.tx.send((reply(KIND_ALLOCATION), source)).unwrap(),
            PeerBehavior::UnknownField => {
                self.tx.send((reply(KIND_UNKNOWN_FIELD), source)).unwrap()
            }
            PeerBehavior::StaleThenReply(kind) => {
                let stale = u16::from_be_bytes(id).wrapping_sub(1).to_be_bytes();
                self.tx
                    .send((vec![kind, stale[0], stale[1]], source))
                    .unwrap();
                self.tx.send((reply(KIND_OK), source)).unwrap();
            }
            PeerBehavior::ReplyFrom(other) => self
                .tx
                .send((reply(KIND_OK), SocketAddr::new(other, target.port())))
                .unwrap(),
            PeerBehavior::SendFails => {
                return Err(DomainError::Transport {
                    server: target.to_string(),
                    reason: "network unreachable".into(),
                })
            }
        }
        Ok(pdu.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), DomainError> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some((datagram, source)) => {
                buf[..datagram.len()].copy_from_slice(&datagram);
                Ok((datagram.len(), source))
            }
            None => std::future::pending().await,
        }
    }
}

impl Drop for MockPingSocket {
    fn drop(&mut self) {
        self.open_sockets.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Observer ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl LocatorObserver for RecordingObserver {
    fn candidates_resolved(&self, domain: &str, candidates: &[SrvCandidate]) {
        self.events
            .lock()
            .unwrap()
            .push(format!("resolved {} {}", domain, candidates.len()));
    }

    fn probe_sent(&self, candidate: &SrvCandidate, _target: SocketAddr, _message_id: u16) {
        self.events
            .lock()
            .unwrap()
            .push(format!("sent {}", candidate.target_name));
    }

    fn probe_failed(&self, candidate: &SrvCandidate, _reason: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("failed {}", candidate.target_name));
    }

    fn located(&self, info: &DomainControllerInfo) {
        self.events
            .lock()
            .unwrap()
            .push(format!("located {}", info.domain_controller_name));
    }
}

// ── Builders ───────────────────────────────────────────────────────────────

pub fn candidate(target: &str, priority: u16, weight: u16, ip: &str) -> SrvCandidate {
    SrvCandidate::new(target, 389, priority, weight).with_address(ip.parse().unwrap())
}
