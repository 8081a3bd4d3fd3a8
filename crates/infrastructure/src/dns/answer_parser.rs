//! Resource-record decoding for SRV lookups (RFC 1035 4.1, RFC 2782).
//!
//! Only SRV, A and AAAA records are interpreted; everything else is
//! stepped over by its RDLENGTH.

use crate::wire::{decompress, WireCursor, WireError};
use dclocate_domain::AddressRecord;
use std::net::{Ipv4Addr, Ipv6Addr};

pub const HEADER_LEN: usize = 12;

pub const TYPE_A: u16 = 1;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;
pub const CLASS_IN: u16 = 1;

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_NXDOMAIN: u8 = 3;

const FLAG_QR: u16 = 0x8000;
const FLAG_TC: u16 = 0x0200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

impl DnsHeader {
    pub fn parse(cursor: &mut WireCursor<'_>) -> Result<Self, WireError> {
        Ok(Self {
            id: cursor.read_u16_be()?,
            flags: cursor.read_u16_be()?,
            qdcount: cursor.read_u16_be()?,
            ancount: cursor.read_u16_be()?,
            nscount: cursor.read_u16_be()?,
            arcount: cursor.read_u16_be()?,
        })
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub owner: String,
    pub ttl: u32,
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRecord {
    Srv(SrvRecord),
    Address(AddressRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(ResourceRecord),
    /// Well-formed but of no use to the locator.
    Skip,
}

/// Steps over the question entry at the cursor and returns its name.
pub fn skip_question(cursor: &mut WireCursor<'_>) -> Result<String, WireError> {
    let name = cursor.read_name()?;
    cursor.skip(4)?;
    Ok(name)
}

/// Decodes the resource record at the cursor and leaves the cursor on the
/// next one.
///
/// The cursor must span the whole DNS message so compression pointers
/// resolve against its first byte.
pub fn parse_record(cursor: &mut WireCursor<'_>) -> Result<ParseOutcome, WireError> {
    let owner = cursor.read_name()?;
    let rtype = cursor.read_u16_be()?;
    let class = cursor.read_u16_be()?;
    let ttl = cursor.read_u32_be()?;
    let rdlength = usize::from(cursor.read_u16_be()?);

    let rdata_start = cursor.position();
    let rdata = cursor.read_bytes(rdlength)?;
    let rdata_end = cursor.position();

    if class != CLASS_IN {
        return Ok(ParseOutcome::Skip);
    }

    let record = match rtype {
        TYPE_SRV => {
            let mut fields = WireCursor::new(rdata);
            let priority = fields.read_u16_be()?;
            let weight = fields.read_u16_be()?;
            let port = fields.read_u16_be()?;

            let (target, consumed) = decompress(cursor.buffer(), rdata_start + 6)?;
            if rdata_start + 6 + consumed > rdata_end {
                return Err(WireError::Truncated {
                    offset: rdata_start + 6,
                    wanted: consumed,
                });
            }

            // RFC 2782: a target of "." means the service is not offered.
            if target.is_empty() {
                return Ok(ParseOutcome::Skip);
            }

            ResourceRecord::Srv(SrvRecord {
                owner,
                ttl,
                priority,
                weight,
                port,
                target,
            })
        }
        TYPE_A => {
            let octets: [u8; 4] = rdata.try_into().map_err(|_| WireError::Truncated {
                offset: rdata_start,
                wanted: 4,
            })?;
            ResourceRecord::Address(AddressRecord::v4(owner, Ipv4Addr::from(octets)))
        }
        TYPE_AAAA => {
            let octets: [u8; 16] = rdata.try_into().map_err(|_| WireError::Truncated {
                offset: rdata_start,
                wanted: 16,
            })?;
            ResourceRecord::Address(AddressRecord::v6(owner, Ipv6Addr::from(octets)))
        }
        _ => return Ok(ParseOutcome::Skip),
    };

    Ok(ParseOutcome::Parsed(record))
}
