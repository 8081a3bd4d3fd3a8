use dclocate_domain::{DomainControllerInfo, SrvCandidate};
use std::net::SocketAddr;

/// Diagnostic hooks for a lookup. Every method defaults to doing nothing.
pub trait LocatorObserver: Send + Sync {
    fn candidates_resolved(&self, _domain: &str, _candidates: &[SrvCandidate]) {}

    fn probe_sent(&self, _candidate: &SrvCandidate, _target: SocketAddr, _message_id: u16) {}

    fn probe_failed(&self, _candidate: &SrvCandidate, _reason: &str) {}

    fn located(&self, _info: &DomainControllerInfo) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LocatorObserver for NoopObserver {}
