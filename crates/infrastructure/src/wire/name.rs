use super::WireError;

/// Longest name in wire form, length octets included (RFC 1035 3.1).
pub const MAX_NAME_LEN: usize = 255;

const MAX_POINTER_HOPS: usize = 64;

/// Decodes the DNS-style name starting at `start` in `base`.
///
/// Compression pointers resolve against `base`, which is the DNS message for
/// resource records and the NetLogon payload for CLDAP replies. Returns the
/// dotted name (the root name decodes to `""`) and the number of bytes the
/// name occupies at `start`, which stops after the first pointer when one is
/// followed.
pub fn decompress(base: &[u8], start: usize) -> Result<(String, usize), WireError> {
    let mut pos = start;
    let mut consumed = None;
    let mut hops = 0;
    let mut wire_len = 0usize;
    let mut out: Vec<u8> = Vec::new();

    loop {
        let len_byte = *base.get(pos).ok_or(WireError::Truncated {
            offset: pos,
            wanted: 1,
        })?;

        match len_byte & 0xC0 {
            0x00 => {
                let len = usize::from(len_byte);
                if len == 0 {
                    pos += 1;
                    break;
                }

                let label = base.get(pos + 1..pos + 1 + len).ok_or(WireError::Truncated {
                    offset: pos + 1,
                    wanted: len,
                })?;

                wire_len += len + 1;
                if wire_len + 1 > MAX_NAME_LEN {
                    return Err(WireError::NameTooLong);
                }

                let needed = len + usize::from(!out.is_empty());
                out.try_reserve_exact(needed)
                    .map_err(|_| WireError::Allocation)?;
                if !out.is_empty() {
                    out.push(b'.');
                }
                out.extend_from_slice(label);
                pos += 1 + len;
            }
            0xC0 => {
                let low = *base.get(pos + 1).ok_or(WireError::Truncated {
                    offset: pos + 1,
                    wanted: 1,
                })?;
                let target = (usize::from(len_byte & 0x3F) << 8) | usize::from(low);

                if consumed.is_none() {
                    consumed = Some(pos + 2 - start);
                }

                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(WireError::PointerLoop);
                }
                if target >= base.len() {
                    return Err(WireError::BadPointer {
                        offset: pos,
                        target,
                    });
                }
                pos = target;
            }
            other => return Err(WireError::BadLabelType(other)),
        }
    }

    let consumed = consumed.unwrap_or(pos - start);
    let name = match String::from_utf8(out) {
        Ok(name) => name,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    Ok((name, consumed))
}
