#![allow(dead_code)]
use std::net::{Ipv4Addr, Ipv6Addr};

pub const TYPE_A: u16 = 1;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;
pub const CLASS_IN: u16 = 1;
pub const CLASS_CH: u16 = 3;

/// Offset of the question name in every message built here.
pub const QNAME_OFFSET: u16 = 12;

pub fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

pub fn pointer(offset: u16) -> Vec<u8> {
    (0xC000 | offset).to_be_bytes().to_vec()
}

/// Reads the id and uncompressed question name out of a query.
pub fn parse_query(query: &[u8]) -> Option<(u16, String)> {
    if query.len() < 12 {
        return None;
    }
    let id = u16::from_be_bytes([query[0], query[1]]);
    let mut pos = 12;
    let mut labels = Vec::new();
    loop {
        let len = usize::from(*query.get(pos)?);
        pos += 1;
        if len == 0 {
            break;
        }
        labels.push(String::from_utf8_lossy(query.get(pos..pos + len)?).into_owned());
        pos += len;
    }
    Some((id, labels.join(".")))
}

/// One resource record; `owner` is written as raw name bytes so tests can
/// use compression pointers.
#[derive(Clone)]
pub struct RecordBytes {
    pub owner: Vec<u8>,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl RecordBytes {
    pub fn srv(owner: &str, priority: u16, weight: u16, port: u16, target: &str) -> Self {
        let mut rdata = Vec::new();
        rdata.extend_from_slice(&priority.to_be_bytes());
        rdata.extend_from_slice(&weight.to_be_bytes());
        rdata.extend_from_slice(&port.to_be_bytes());
        rdata.extend_from_slice(&encode_name(target));
        Self {
            owner: encode_name(owner),
            rtype: TYPE_SRV,
            class: CLASS_IN,
            ttl: 600,
            rdata,
        }
    }

    pub fn a(owner: &str, ip: Ipv4Addr) -> Self {
        Self {
            owner: encode_name(owner),
            rtype: TYPE_A,
            class: CLASS_IN,
            ttl: 600,
            rdata: ip.octets().to_vec(),
        }
    }

    pub fn aaaa(owner: &str, ip: Ipv6Addr) -> Self {
        Self {
            owner: encode_name(owner),
            rtype: TYPE_AAAA,
            class: CLASS_IN,
            ttl: 600,
            rdata: ip.octets().to_vec(),
        }
    }

    pub fn txt(owner: &str, text: &str) -> Self {
        let mut rdata = vec![text.len() as u8];
        rdata.extend_from_slice(text.as_bytes());
        Self {
            owner: encode_name(owner),
            rtype: TYPE_TXT,
            class: CLASS_IN,
            ttl: 600,
            rdata,
        }
    }

    pub fn with_class(mut self, class: u16) -> Self {
        self.class = class;
        self
    }

    /// Owner becomes a pointer to the question name.
    pub fn owner_is_qname(mut self) -> Self {
        self.owner = pointer(QNAME_OFFSET);
        self
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.owner);
        out.extend_from_slice(&self.rtype.to_be_bytes());
        out.extend_from_slice(&self.class.to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        out.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.rdata);
    }
}

pub struct DnsResponseBuilder {
    id: u16,
    flags: u16,
    qname: String,
    answers: Vec<RecordBytes>,
    additional: Vec<RecordBytes>,
    qdcount: Option<u16>,
}

impl DnsResponseBuilder {
    pub fn new(id: u16, qname: &str) -> Self {
        Self {
            id,
            flags: 0x8180,
            qname: qname.to_string(),
            answers: Vec::new(),
            additional: Vec::new(),
            qdcount: None,
        }
    }

    pub fn rcode(mut self, rcode: u8) -> Self {
        self.flags = (self.flags & 0xFFF0) | u16::from(rcode & 0x0F);
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn qdcount(mut self, count: u16) -> Self {
        self.qdcount = Some(count);
        self
    }

    pub fn answer(mut self, record: RecordBytes) -> Self {
        self.answers.push(record);
        self
    }

    pub fn additional(mut self, record: RecordBytes) -> Self {
        self.additional.push(record);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.extend_from_slice(&self.qdcount.unwrap_or(1).to_be_bytes());
        out.extend_from_slice(&(self.answers.len() as u16).to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(self.additional.len() as u16).to_be_bytes());

        out.extend_from_slice(&encode_name(&self.qname));
        out.extend_from_slice(&TYPE_SRV.to_be_bytes());
        out.extend_from_slice(&CLASS_IN.to_be_bytes());

        for record in self.answers.iter().chain(&self.additional) {
            record.write(&mut out);
        }
        out
    }
}

/// A `NETLOGON_SAM_LOGON_RESPONSE_EX` payload with a compressed name,
/// as a Windows DC sends it for NtVer 5EX.
pub struct NetlogonPayloadBuilder {
    pub opcode: u16,
    pub flags: u32,
    pub guid: [u8; 16],
    pub forest: String,
    pub host_label: String,
    pub netbios_domain: String,
    pub netbios_computer: String,
    pub dc_site: String,
    pub client_site: String,
    pub sockaddr: Option<[u8; 16]>,
}

impl Default for NetlogonPayloadBuilder {
    fn default() -> Self {
        Self {
            opcode: 23,
            flags: 0x0000_03fd,
            guid: [
                0x78, 0x56, 0x34, 0x12, 0x34, 0x12, 0x78, 0x56, 0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc,
                0xde, 0xf0,
            ],
            forest: "example.com".to_string(),
            host_label: "dc1".to_string(),
            netbios_domain: "EXAMPLE".to_string(),
            netbios_computer: "DC1".to_string(),
            dc_site: "Default-First-Site-Name".to_string(),
            client_site: "Default-First-Site-Name".to_string(),
            sockaddr: None,
        }
    }
}

impl NetlogonPayloadBuilder {
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn opcode(mut self, opcode: u16) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn sockaddr(mut self, ip: Ipv4Addr, port: u16) -> Self {
        let mut raw = [0u8; 16];
        raw[0..2].copy_from_slice(&2u16.to_le_bytes());
        raw[2..4].copy_from_slice(&port.to_be_bytes());
        raw[4..8].copy_from_slice(&ip.octets());
        self.sockaddr = Some(raw);
        self
    }

    /// Domain and host names point back into the forest name at offset 24.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.opcode.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.guid);

        let forest_offset = out.len() as u16;
        out.extend_from_slice(&encode_name(&self.forest));
        out.extend_from_slice(&pointer(forest_offset));

        out.push(self.host_label.len() as u8);
        out.extend_from_slice(self.host_label.as_bytes());
        out.extend_from_slice(&pointer(forest_offset));

        out.extend_from_slice(&encode_name(&self.netbios_domain));
        out.extend_from_slice(&encode_name(&self.netbios_computer));
        out.push(0);

        let site_offset = out.len() as u16;
        out.extend_from_slice(&encode_name(&self.dc_site));
        if self.client_site == self.dc_site {
            out.extend_from_slice(&pointer(site_offset));
        } else {
            out.extend_from_slice(&encode_name(&self.client_site));
        }

        if let Some(raw) = self.sockaddr {
            out.push(raw.len() as u8);
            out.extend_from_slice(&raw);
        }

        out.extend_from_slice(&0x0000_0005u32.to_le_bytes());
        out.extend_from_slice(&0xffffu16.to_le_bytes());
        out.extend_from_slice(&0xffffu16.to_le_bytes());
        out
    }
}

fn ber(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.extend_from_slice(&[0x81, len as u8]);
    } else {
        out.extend_from_slice(&[0x82, (len >> 8) as u8, len as u8]);
    }
    out.extend_from_slice(content);
    out
}

fn ber_integer(value: u32) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 && bytes[1] & 0x80 == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    ber(0x02, &bytes)
}

/// searchResEntry carrying `payload`, followed by searchResDone.
pub fn cldap_reply(message_id: u32, payload: &[u8], with_user_dn: bool) -> Vec<u8> {
    let value_set = ber(0x31, &ber(0x04, payload));
    let mut attribute = ber(0x04, b"Netlogon");
    attribute.extend_from_slice(&value_set);
    let attributes = ber(0x30, &ber(0x30, &attribute));

    let mut entry = ber(0x04, b"");
    entry.extend_from_slice(&attributes);

    let mut message = ber_integer(message_id);
    if with_user_dn {
        message.extend_from_slice(&ber(0x04, b""));
    }
    message.extend_from_slice(&ber(0x64, &entry));

    let mut done_op = ber(0x0a, &[0]);
    done_op.extend_from_slice(&ber(0x04, b""));
    done_op.extend_from_slice(&ber(0x04, b""));
    let mut done = ber_integer(message_id);
    done.extend_from_slice(&ber(0x65, &done_op));

    let mut out = ber(0x30, &message);
    out.extend_from_slice(&ber(0x30, &done));
    out
}

/// Pulls the message id out of a CLDAP request built by the codec.
pub fn request_message_id(request: &[u8]) -> Option<u32> {
    // SEQUENCE header, then INTEGER
    let (header_len, _) = match request.get(1)? {
        len if len & 0x80 == 0 => (2, usize::from(*len)),
        0x81 => (3, usize::from(*request.get(2)?)),
        0x82 => (4, 0),
        _ => return None,
    };
    let int = request.get(header_len..)?;
    if *int.first()? != 0x02 {
        return None;
    }
    let len = usize::from(*int.get(1)?);
    let bytes = int.get(2..2 + len)?;
    Some(bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}
