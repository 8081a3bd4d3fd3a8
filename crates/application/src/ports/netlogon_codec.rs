use dclocate_domain::{DomainError, NetlogonParseError, NetlogonResponse};

/// An encoded CLDAP search request and the id its reply must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlogonRequest {
    pub message_id: u16,
    pub pdu: Vec<u8>,
}

pub trait NetlogonCodec: Send + Sync {
    fn build_request(
        &self,
        domain: &str,
        host: Option<&str>,
        nt_version: u32,
    ) -> Result<NetlogonRequest, DomainError>;

    /// Decodes a reply to the request numbered `expected_id`.
    ///
    /// The envelope's message id is checked before the payload is touched;
    /// a datagram carrying any other id is `Ok(None)`. `nt_version` is the
    /// value that was sent and decides which optional fields the reply
    /// carries.
    fn parse_reply(
        &self,
        buf: &[u8],
        expected_id: u16,
        nt_version: u32,
    ) -> Result<Option<NetlogonResponse>, NetlogonParseError>;
}
