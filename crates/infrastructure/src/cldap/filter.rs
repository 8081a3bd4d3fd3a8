//! NetLogon search filter: text form (RFC 4515) and its BER encoding
//! (RFC 4511 4.5.1).

use dclocate_domain::DomainError;
use ldap3::asn1::{OctetString, Sequence, Tag, TagClass};
use std::fmt::{self, Write};

/// Size of the buffer the filter text is formatted into.
pub const FILTER_CAPACITY: usize = 256;

const FILTER_AND: u64 = 0;
const FILTER_OR: u64 = 1;
const FILTER_NOT: u64 = 2;
const FILTER_EQUALITY: u64 = 3;
const FILTER_PRESENT: u64 = 7;

/// Fixed-capacity text buffer. Writes that do not fit fail instead of
/// truncating.
struct FilterBuffer {
    buf: [u8; FILTER_CAPACITY],
    len: usize,
}

impl FilterBuffer {
    fn new() -> Self {
        Self {
            buf: [0u8; FILTER_CAPACITY],
            len: 0,
        }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }
}

impl fmt::Write for FilterBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > FILTER_CAPACITY {
            return Err(fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// Writes `value` with the RFC 4515 special characters escaped.
fn write_escaped(out: &mut impl Write, value: &str) -> fmt::Result {
    for ch in value.chars() {
        match ch {
            '*' => out.write_str("\\2a")?,
            '(' => out.write_str("\\28")?,
            ')' => out.write_str("\\29")?,
            '\\' => out.write_str("\\5c")?,
            '\0' => out.write_str("\\00")?,
            _ => out.write_char(ch)?,
        }
    }
    Ok(())
}

/// `(&(DnsDomain=<domain>)[(Host=<host>)](NtVer=<ntver>))` with `NtVer`
/// as four little-endian `\xx` escapes.
pub fn netlogon_filter(
    domain: &str,
    host: Option<&str>,
    nt_version: u32,
) -> Result<String, DomainError> {
    let mut out = FilterBuffer::new();
    write_netlogon_filter(&mut out, domain, host, nt_version).map_err(|_| {
        DomainError::FilterOverflow {
            capacity: FILTER_CAPACITY,
        }
    })?;
    Ok(out.as_str().to_string())
}

fn write_netlogon_filter(
    out: &mut FilterBuffer,
    domain: &str,
    host: Option<&str>,
    nt_version: u32,
) -> fmt::Result {
    out.write_str("(&(DnsDomain=")?;
    write_escaped(out, domain)?;
    out.write_str(")")?;
    if let Some(host) = host {
        out.write_str("(Host=")?;
        write_escaped(out, host)?;
        out.write_str(")")?;
    }
    out.write_str("(NtVer=")?;
    for byte in nt_version.to_le_bytes() {
        write!(out, "\\{:02x}", byte)?;
    }
    out.write_str("))")
}

/// Compiles filter text into its BER `Filter` choice.
///
/// Supports `&`, `|`, `!`, equality and presence items, which is all the
/// NetLogon ping needs.
pub fn compile(text: &str) -> Result<Tag, DomainError> {
    let mut parser = FilterParser {
        input: text.as_bytes(),
        pos: 0,
    };
    let tag = parser.filter()?;
    if parser.pos != parser.input.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(tag)
}

struct FilterParser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl FilterParser<'_> {
    fn error(&self, what: &str) -> DomainError {
        DomainError::InvalidFilter(format!("{} at offset {}", what, self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), DomainError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn filter(&mut self) -> Result<Tag, DomainError> {
        self.expect(b'(')?;
        let tag = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                self.set(FILTER_AND)?
            }
            Some(b'|') => {
                self.pos += 1;
                self.set(FILTER_OR)?
            }
            Some(b'!') => {
                self.pos += 1;
                let inner = self.filter()?;
                context_sequence(FILTER_NOT, vec![inner])
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.expect(b')')?;
        Ok(tag)
    }

    fn set(&mut self, id: u64) -> Result<Tag, DomainError> {
        let mut inner = Vec::new();
        while self.peek() == Some(b'(') {
            inner.push(self.filter()?);
        }
        if inner.is_empty() {
            return Err(self.error("empty filter set"));
        }
        Ok(context_sequence(id, inner))
    }

    fn item(&mut self) -> Result<Tag, DomainError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'=' || b == b'(' || b == b')' {
                break;
            }
            self.pos += 1;
        }
        let attribute = self.input[start..self.pos].to_vec();
        if attribute.is_empty() {
            return Err(self.error("missing attribute description"));
        }
        if matches!(attribute.last(), Some(b'~' | b'>' | b'<' | b':')) {
            return Err(self.error("unsupported match type"));
        }
        self.expect(b'=')?;

        let value_start = self.pos;
        while let Some(b) = self.peek() {
            if b == b')' || b == b'(' {
                break;
            }
            self.pos += 1;
        }
        let raw = &self.input[value_start..self.pos];

        if raw == b"*" {
            return Ok(Tag::OctetString(OctetString {
                class: TagClass::Context,
                id: FILTER_PRESENT,
                inner: attribute,
            }));
        }
        if raw.contains(&b'*') {
            return Err(self.error("substring filters are not supported"));
        }

        let value = self.unescape(raw)?;
        Ok(context_sequence(
            FILTER_EQUALITY,
            vec![
                Tag::OctetString(OctetString {
                    inner: attribute,
                    ..Default::default()
                }),
                Tag::OctetString(OctetString {
                    inner: value,
                    ..Default::default()
                }),
            ],
        ))
    }

    fn unescape(&self, raw: &[u8]) -> Result<Vec<u8>, DomainError> {
        let mut out = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'\\' {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| self.error("bad escape in value"))?;
                out.push(hex);
                i += 3;
            } else {
                out.push(raw[i]);
                i += 1;
            }
        }
        Ok(out)
    }
}

fn context_sequence(id: u64, inner: Vec<Tag>) -> Tag {
    Tag::Sequence(Sequence {
        class: TagClass::Context,
        id,
        inner,
    })
}
