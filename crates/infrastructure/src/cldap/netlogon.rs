//! `NETLOGON_SAM_LOGON_RESPONSE_EX` payload decoding (MS-ADTS 6.3.1.9).
//!
//! The payload has no tags: fields follow each other in a fixed order,
//! and which optional fields are present depends on the NtVersion the
//! request asked for. The order lives in [`schema`]; [`decode_payload`]
//! walks it once.

use crate::wire::{decompress, WireCursor, WireError};
use dclocate_domain::{nt_version, NetlogonOpcode, NetlogonParseError, NetlogonResponse};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

const AF_INET: u16 = 2;
/// Opcode, Sbz, Flags and DomainGuid.
const FIXED_HEADER_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Opcode,
    Sbz,
    Flags,
    DomainGuid,
    DnsForestName,
    DnsDomainName,
    DnsHostName,
    NetbiosDomainName,
    NetbiosComputerName,
    UserName,
    DcSiteName,
    ClientSiteName,
    DcSockAddrSize,
    DcSockAddr,
    NextClosestSiteName,
    NtVersion,
    LmNtToken,
    Lm20Token,
}

/// Field order for a reply to a request carrying `requested`.
pub fn schema(requested: u32) -> Vec<Field> {
    let mut fields = vec![
        Field::Opcode,
        Field::Sbz,
        Field::Flags,
        Field::DomainGuid,
        Field::DnsForestName,
        Field::DnsDomainName,
        Field::DnsHostName,
        Field::NetbiosDomainName,
        Field::NetbiosComputerName,
        Field::UserName,
        Field::DcSiteName,
        Field::ClientSiteName,
    ];
    if requested & nt_version::V5EX_WITH_IP != 0 {
        fields.push(Field::DcSockAddrSize);
        fields.push(Field::DcSockAddr);
    }
    if requested & nt_version::WITH_CLOSEST_SITE != 0 {
        fields.push(Field::NextClosestSiteName);
    }
    fields.extend([Field::NtVersion, Field::LmNtToken, Field::Lm20Token]);
    fields
}

fn field_error(field: Field) -> impl Fn(WireError) -> NetlogonParseError {
    move |err| match err {
        WireError::Allocation => NetlogonParseError::Allocation("NetLogon name"),
        other => NetlogonParseError::Malformed(format!("{:?}: {}", field, other)),
    }
}

/// Reads a compressed name; pointers resolve against the payload itself.
fn read_name(cursor: &mut WireCursor<'_>, field: Field) -> Result<Option<String>, NetlogonParseError> {
    let (name, consumed) = decompress(cursor.buffer(), cursor.position()).map_err(field_error(field))?;
    cursor.skip(consumed).map_err(field_error(field))?;
    Ok((!name.is_empty()).then_some(name))
}

fn unc(name: String) -> Result<String, NetlogonParseError> {
    let mut out = String::new();
    out.try_reserve_exact(name.len() + 2)
        .map_err(|_| NetlogonParseError::Allocation("DNS host name"))?;
    out.push_str("\\\\");
    out.push_str(&name);
    Ok(out)
}

fn sockaddr_in(bytes: &[u8]) -> Option<SocketAddr> {
    if bytes.len() < 8 || u16::from_le_bytes([bytes[0], bytes[1]]) != AF_INET {
        return None;
    }
    let port = u16::from_be_bytes([bytes[2], bytes[3]]);
    let ip = Ipv4Addr::new(bytes[4], bytes[5], bytes[6], bytes[7]);
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

/// Decodes a NetLogon payload into a response stamped with `message_id`.
///
/// Decoding stops cleanly when the payload ends on a field boundary after
/// the fixed header. A field cut short is malformed; an opcode outside the
/// `*_EX` family is an unknown field.
pub fn decode_payload(
    payload: &[u8],
    requested: u32,
    message_id: u32,
) -> Result<NetlogonResponse, NetlogonParseError> {
    if payload.len() < FIXED_HEADER_LEN {
        return Err(NetlogonParseError::Malformed(format!(
            "NetLogon payload is {} bytes, need at least {}",
            payload.len(),
            FIXED_HEADER_LEN
        )));
    }

    let mut cursor = WireCursor::new(payload);
    let mut reply = NetlogonResponse::new(message_id, NetlogonOpcode::LogonResponseEx);
    let mut sockaddr_size = 0usize;

    for field in schema(requested) {
        if cursor.is_empty() {
            break;
        }
        let err = field_error(field);

        match field {
            Field::Opcode => {
                let raw = cursor.read_u16_le().map_err(&err)?;
                reply.opcode = NetlogonOpcode::from_u16(raw)
                    .ok_or_else(|| NetlogonParseError::UnknownField(format!("opcode {}", raw)))?;
            }
            Field::Sbz => cursor.skip(2).map_err(&err)?,
            Field::Flags => reply.flags = cursor.read_u32_le().map_err(&err)?,
            Field::DomainGuid => reply.domain_guid = cursor.read_array().map_err(&err)?,
            Field::DnsForestName => reply.forest_name = read_name(&mut cursor, field)?,
            Field::DnsDomainName => reply.dns_domain_name = read_name(&mut cursor, field)?,
            Field::DnsHostName => {
                reply.dns_host_name = read_name(&mut cursor, field)?.map(unc).transpose()?;
            }
            Field::NetbiosDomainName => {
                reply.netbios_domain_name = read_name(&mut cursor, field)?;
            }
            Field::NetbiosComputerName => {
                reply.netbios_computer_name = read_name(&mut cursor, field)?;
            }
            Field::UserName => reply.user_name = read_name(&mut cursor, field)?,
            Field::DcSiteName => reply.dc_site_name = read_name(&mut cursor, field)?,
            Field::ClientSiteName => reply.client_site_name = read_name(&mut cursor, field)?,
            Field::DcSockAddrSize => sockaddr_size = usize::from(cursor.read_u8().map_err(&err)?),
            Field::DcSockAddr => {
                let bytes = cursor.read_bytes(sockaddr_size).map_err(&err)?;
                reply.dc_sock_addr = sockaddr_in(bytes);
            }
            Field::NextClosestSiteName => {
                reply.next_closest_site_name = read_name(&mut cursor, field)?;
            }
            Field::NtVersion => reply.nt_version = Some(cursor.read_u32_le().map_err(&err)?),
            Field::LmNtToken => reply.lm_nt_token = Some(cursor.read_u16_le().map_err(&err)?),
            Field::Lm20Token => reply.lm_20_token = Some(cursor.read_u16_le().map_err(&err)?),
        }
    }

    Ok(reply)
}
