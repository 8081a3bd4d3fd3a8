//! Unwraps a CLDAP search reply down to the NetLogon attribute value.
//!
//! Both the LDAPv3 envelope `{ messageID, protocolOp }` and the RFC 1798
//! one with a `user` DN between them are accepted. Only the first message
//! in the datagram is read; the trailing searchResDone is ignored.

use dclocate_domain::NetlogonParseError;
use ldap3::asn1::{parse_tag, StructureTag, TagClass, PL};

const UNIVERSAL_INTEGER: u64 = 2;
const UNIVERSAL_OCTET_STRING: u64 = 4;
const UNIVERSAL_SEQUENCE: u64 = 16;
const UNIVERSAL_SET: u64 = 17;
const OP_SEARCH_RESULT_ENTRY: u64 = 4;

/// Message id and raw NetLogon payload of one searchResEntry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetlogonEntry {
    pub message_id: u32,
    pub payload: Vec<u8>,
}

fn malformed(what: &str) -> NetlogonParseError {
    NetlogonParseError::Malformed(what.to_string())
}

fn is_universal(tag: &StructureTag, id: u64) -> bool {
    matches!(tag.class, TagClass::Universal) && tag.id == id
}

fn constructed(tag: StructureTag, what: &str) -> Result<Vec<StructureTag>, NetlogonParseError> {
    match tag.payload {
        PL::C(inner) => Ok(inner),
        PL::P(_) => Err(malformed(what)),
    }
}

fn primitive(tag: StructureTag, what: &str) -> Result<Vec<u8>, NetlogonParseError> {
    match tag.payload {
        PL::P(bytes) => Ok(bytes),
        PL::C(_) => Err(malformed(what)),
    }
}

/// Decodes a BER INTEGER content that must fit a message id.
fn message_id(bytes: &[u8]) -> Result<u32, NetlogonParseError> {
    if bytes.is_empty() || bytes.len() > 5 {
        return Err(malformed("messageID length"));
    }
    if bytes[0] & 0x80 != 0 {
        return Err(malformed("negative messageID"));
    }
    let value = bytes
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    u32::try_from(value).map_err(|_| malformed("messageID out of range"))
}

pub fn extract_netlogon(buf: &[u8]) -> Result<NetlogonEntry, NetlogonParseError> {
    let (_, message) = parse_tag(buf).map_err(|_| malformed("not a BER message"))?;
    if !is_universal(&message, UNIVERSAL_SEQUENCE) {
        return Err(malformed("LDAPMessage is not a SEQUENCE"));
    }

    let mut items = constructed(message, "LDAPMessage")?.into_iter();

    let id_tag = items.next().ok_or_else(|| malformed("missing messageID"))?;
    if !is_universal(&id_tag, UNIVERSAL_INTEGER) {
        return Err(malformed("messageID is not an INTEGER"));
    }
    let message_id = message_id(&primitive(id_tag, "messageID")?)?;

    let mut op = items.next().ok_or_else(|| malformed("missing protocolOp"))?;
    if is_universal(&op, UNIVERSAL_OCTET_STRING) {
        op = items.next().ok_or_else(|| malformed("missing protocolOp"))?;
    }
    if !matches!(op.class, TagClass::Application) || op.id != OP_SEARCH_RESULT_ENTRY {
        return Err(malformed("protocolOp is not a searchResEntry"));
    }

    let mut entry = constructed(op, "searchResEntry")?.into_iter();
    let _object_name = entry.next().ok_or_else(|| malformed("missing objectName"))?;
    let attributes = entry
        .next()
        .ok_or_else(|| malformed("missing attributes"))?;
    if !is_universal(&attributes, UNIVERSAL_SEQUENCE) {
        return Err(malformed("attributes is not a SEQUENCE"));
    }

    for attribute in constructed(attributes, "attributes")? {
        let mut parts = constructed(attribute, "PartialAttribute")?.into_iter();
        let (Some(kind), Some(values)) = (parts.next(), parts.next()) else {
            return Err(malformed("incomplete PartialAttribute"));
        };
        let kind = primitive(kind, "attribute type")?;
        if !kind.eq_ignore_ascii_case(b"netlogon") {
            continue;
        }
        if !is_universal(&values, UNIVERSAL_SET) {
            return Err(malformed("attribute values are not a SET"));
        }

        let value = constructed(values, "attribute values")?
            .into_iter()
            .next()
            .ok_or_else(|| malformed("empty Netlogon attribute"))?;
        let payload = primitive(value, "Netlogon value")?;
        return Ok(NetlogonEntry {
            message_id,
            payload,
        });
    }

    Err(malformed("no Netlogon attribute in reply"))
}
