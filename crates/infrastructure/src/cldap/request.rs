//! CLDAP search request for the NetLogon attribute.
//!
//! ```text
//! LDAPMessage ::= SEQUENCE {          -- RFC 1798
//!     messageID   INTEGER,
//!     user        LDAPDN,             -- always ""
//!     searchRequest [APPLICATION 3] SEQUENCE {
//!         baseObject "", scope baseObject, derefAliases never,
//!         sizeLimit 0, timeLimit 0, typesOnly FALSE,
//!         filter, attributes { "NetLogon" } } }
//! ```

use super::filter::{compile, netlogon_filter};
use bytes::BytesMut;
use dclocate_domain::netlogon::NETLOGON_ATTR_NAME;
use dclocate_domain::DomainError;
use ldap3::asn1::{write, ASNTag, Boolean, Enumerated, Integer, OctetString, Sequence, Tag, TagClass};

const OP_SEARCH_REQUEST: u64 = 3;
const SCOPE_BASE_OBJECT: i64 = 0;
const DEREF_NEVER: i64 = 0;

pub fn encode_search_request(
    message_id: u16,
    domain: &str,
    host: Option<&str>,
    nt_version: u32,
) -> Result<Vec<u8>, DomainError> {
    let filter = compile(&netlogon_filter(domain, host, nt_version)?)?;

    let search = Tag::Sequence(Sequence {
        class: TagClass::Application,
        id: OP_SEARCH_REQUEST,
        inner: vec![
            octet_string(Vec::new()),
            Tag::Enumerated(Enumerated {
                inner: SCOPE_BASE_OBJECT,
                ..Default::default()
            }),
            Tag::Enumerated(Enumerated {
                inner: DEREF_NEVER,
                ..Default::default()
            }),
            integer(0),
            integer(0),
            Tag::Boolean(Boolean {
                inner: false,
                ..Default::default()
            }),
            filter,
            Tag::Sequence(Sequence {
                inner: vec![octet_string(NETLOGON_ATTR_NAME.as_bytes().to_vec())],
                ..Default::default()
            }),
        ],
    });

    let envelope = Tag::Sequence(Sequence {
        inner: vec![integer(i64::from(message_id)), octet_string(Vec::new()), search],
        ..Default::default()
    });

    let mut buf = BytesMut::with_capacity(128);
    write::encode_into(&mut buf, envelope.into_structure())
        .map_err(|e| DomainError::BerEncode(e.to_string()))?;
    Ok(buf.to_vec())
}

fn integer(value: i64) -> Tag {
    Tag::Integer(Integer {
        inner: value,
        ..Default::default()
    })
}

fn octet_string(value: Vec<u8>) -> Tag {
    Tag::OctetString(OctetString {
        inner: value,
        ..Default::default()
    })
}
