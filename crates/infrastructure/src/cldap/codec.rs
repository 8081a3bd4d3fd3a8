use super::netlogon::decode_payload;
use super::reply::extract_netlogon;
use super::request::encode_search_request;
use dclocate_application::ports::{NetlogonCodec, NetlogonRequest};
use dclocate_domain::{DomainError, NetlogonParseError, NetlogonResponse};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// BER/NetLogon codec used against real domain controllers.
pub struct CldapNetlogonCodec {
    sequence: AtomicU16,
}

impl CldapNetlogonCodec {
    pub fn new() -> Self {
        Self {
            sequence: AtomicU16::new(0),
        }
    }

    /// Clock-derived 16-bit id, never zero. The sequence keeps back-to-back
    /// probes within one clock tick apart.
    fn next_message_id(&self) -> u16 {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_micros())
            .unwrap_or_default();
        let step = self.sequence.fetch_add(1, Ordering::Relaxed);
        match ((micros & 0xffff) as u16).wrapping_add(step) {
            0 => 1,
            id => id,
        }
    }
}

impl Default for CldapNetlogonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl NetlogonCodec for CldapNetlogonCodec {
    fn build_request(
        &self,
        domain: &str,
        host: Option<&str>,
        nt_version: u32,
    ) -> Result<NetlogonRequest, DomainError> {
        let message_id = self.next_message_id();
        let pdu = encode_search_request(message_id, domain, host, nt_version)?;
        trace!(message_id, len = pdu.len(), "Encoded NetLogon ping");
        Ok(NetlogonRequest { message_id, pdu })
    }

    fn parse_reply(
        &self,
        buf: &[u8],
        expected_id: u16,
        nt_version: u32,
    ) -> Result<Option<NetlogonResponse>, NetlogonParseError> {
        let entry = extract_netlogon(buf)?;
        if entry.message_id != u32::from(expected_id) {
            trace!(expected_id, got = entry.message_id, "Reply belongs to another request");
            return Ok(None);
        }
        decode_payload(&entry.payload, nt_version, entry.message_id).map(Some)
    }
}
