use dclocate_application::ports::LocatorObserver;
use dclocate_domain::{flag_names, DomainControllerInfo, SrvCandidate};
use std::net::SocketAddr;
use tracing::info;

/// Logs every locator step at `info`. Enabled by `--dump-candidates`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LocatorObserver for TracingObserver {
    fn candidates_resolved(&self, domain: &str, candidates: &[SrvCandidate]) {
        info!(domain, count = candidates.len(), "SRV candidates");
        for (index, candidate) in candidates.iter().enumerate() {
            info!(
                index,
                host = %candidate.target_name,
                port = candidate.port,
                priority = candidate.priority,
                weight = candidate.weight,
                address = ?candidate.display_address(),
                "Candidate"
            );
        }
    }

    fn probe_sent(&self, candidate: &SrvCandidate, target: SocketAddr, message_id: u16) {
        info!(host = %candidate.target_name, %target, message_id, "NetLogon ping sent");
    }

    fn probe_failed(&self, candidate: &SrvCandidate, reason: &str) {
        info!(host = %candidate.target_name, reason, "NetLogon ping failed");
    }

    fn located(&self, info: &DomainControllerInfo) {
        info!(
            dc = %info.domain_controller_name,
            address = %info.domain_controller_address,
            flags = ?flag_names(info.flags),
            "Domain controller selected"
        );
    }
}
