//! SRV query construction in wire format using `hickory-proto`.

use dclocate_domain::DomainError;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};

pub struct MessageBuilder;

impl MessageBuilder {
    /// Builds a recursive `SRV IN` query for `qname` with a random id.
    ///
    /// Service labels start with `_`, so the name is taken as ASCII without
    /// IDNA processing.
    pub fn build_srv_query(qname: &str) -> Result<(u16, Vec<u8>), DomainError> {
        let fqdn = if qname.ends_with('.') {
            qname.to_string()
        } else {
            format!("{}.", qname)
        };
        let name = Name::from_ascii(&fqdn).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid query name '{}': {}", qname, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(RecordType::SRV);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::InvalidDnsResponse(format!("Failed to serialize SRV query: {}", e))
        })?;

        Ok((id, buf))
    }
}
