// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer-side IPP/1.1 wire format (RFC 8010 SS3): parse the requests a
// client sends and write the responses a printer returns.
//
// ```text
// version-number:   2 bytes (major, minor)
// operation-id or
//   status-code:    2 bytes (big-endian u16)
// request-id:       4 bytes (big-endian u32)
// attribute-groups: variable
//   delimiter-tag:  1 byte
//   attributes:     variable
//     value-tag:    1 byte
//     name-length:  2 bytes (big-endian u16)
//     name:         name-length bytes
//     value-length: 2 bytes (big-endian u16)
//     value:        value-length bytes
// end-of-attributes-tag: 1 byte (0x03)
// data:             remainder
// ```

use std::fmt;

use tracing::warn;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const IPP_VERSION_MAJOR: u8 = 0x01;
pub const IPP_VERSION_MINOR: u8 = 0x01;

/// Print-Job operation identifier (RFC 8011 SS4.2.1).
pub const OP_PRINT_JOB: u16 = 0x0002;

pub const TAG_OPERATION_ATTRIBUTES: u8 = 0x01;
pub const TAG_JOB_ATTRIBUTES: u8 = 0x02;
pub const TAG_END_OF_ATTRIBUTES: u8 = 0x03;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// IPP value tag: the wire type of one attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    /// 4-byte signed big-endian integer.
    Integer,
    /// 1 byte: 0x00 = false, 0x01 = true.
    Boolean,
    /// Same encoding as `Integer`.
    Enum,
    TextWithoutLanguage,
    NameWithoutLanguage,
    Keyword,
    Uri,
    Charset,
    NaturalLanguage,
    MimeMediaType,
    /// Anything else; the value is kept raw.
    Other(u8),
}

impl ValueTag {
    pub fn code(&self) -> u8 {
        match self {
            Self::Integer => 0x21,
            Self::Boolean => 0x22,
            Self::Enum => 0x23,
            Self::TextWithoutLanguage => 0x41,
            Self::NameWithoutLanguage => 0x42,
            Self::Keyword => 0x44,
            Self::Uri => 0x45,
            Self::Charset => 0x47,
            Self::NaturalLanguage => 0x48,
            Self::MimeMediaType => 0x49,
            Self::Other(code) => *code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0x21 => Self::Integer,
            0x22 => Self::Boolean,
            0x23 => Self::Enum,
            0x41 => Self::TextWithoutLanguage,
            0x42 => Self::NameWithoutLanguage,
            0x44 => Self::Keyword,
            0x45 => Self::Uri,
            0x47 => Self::Charset,
            0x48 => Self::NaturalLanguage,
            0x49 => Self::MimeMediaType,
            other => Self::Other(other),
        }
    }

    fn is_string(&self) -> bool {
        matches!(
            self,
            Self::TextWithoutLanguage
                | Self::NameWithoutLanguage
                | Self::Keyword
                | Self::Uri
                | Self::Charset
                | Self::NaturalLanguage
                | Self::MimeMediaType
        )
    }
}

/// Decoded attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Integer(i32),
    Boolean(bool),
    String(String),
    Raw(Vec<u8>),
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
            Self::Raw(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

/// One named attribute with a single value, as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireAttribute {
    /// Empty for additional values of a 1setOf (RFC 8010 SS3.1.5).
    pub name: String,
    pub tag: ValueTag,
    pub value: WireValue,
}

impl WireAttribute {
    fn string(tag: ValueTag, name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            tag,
            value: WireValue::String(value.to_string()),
        }
    }

    pub fn integer(name: &str, value: i32) -> Self {
        Self {
            name: name.to_string(),
            tag: ValueTag::Integer,
            value: WireValue::Integer(value),
        }
    }

    pub fn enumeration(name: &str, value: i32) -> Self {
        Self {
            name: name.to_string(),
            tag: ValueTag::Enum,
            value: WireValue::Integer(value),
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self::string(ValueTag::TextWithoutLanguage, name, value)
    }

    pub fn charset(name: &str, value: &str) -> Self {
        Self::string(ValueTag::Charset, name, value)
    }

    pub fn natural_language(name: &str, value: &str) -> Self {
        Self::string(ValueTag::NaturalLanguage, name, value)
    }

    /// Value as an integer, for `Integer` and `Enum` attributes.
    pub fn as_integer(&self) -> Option<i32> {
        match self.value {
            WireValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            WireValue::String(value) => Some(value),
            _ => None,
        }
    }

    fn encode_value(&self) -> Vec<u8> {
        match &self.value {
            WireValue::Integer(value) => value.to_be_bytes().to_vec(),
            WireValue::Boolean(value) => vec![u8::from(*value)],
            WireValue::String(value) => value.as_bytes().to_vec(),
            WireValue::Raw(bytes) => bytes.clone(),
        }
    }

    /// Interpret raw value bytes according to `tag`. Values that do not fit
    /// their tag (e.g. a 3-byte integer) are kept raw.
    pub fn decode(tag: ValueTag, name: String, bytes: &[u8]) -> Self {
        let value = match tag {
            ValueTag::Integer | ValueTag::Enum => match <[u8; 4]>::try_from(bytes) {
                Ok(array) => WireValue::Integer(i32::from_be_bytes(array)),
                Err(_) => WireValue::Raw(bytes.to_vec()),
            },
            ValueTag::Boolean if bytes.len() == 1 => WireValue::Boolean(bytes[0] != 0),
            tag if tag.is_string() => {
                WireValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => WireValue::Raw(bytes.to_vec()),
        };
        Self { name, tag, value }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Builder for IPP responses.
pub struct IppMessageWriter {
    buf: Vec<u8>,
}

impl IppMessageWriter {
    pub fn new(status: u16, request_id: u32) -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.push(IPP_VERSION_MAJOR);
        buf.push(IPP_VERSION_MINOR);
        buf.extend_from_slice(&status.to_be_bytes());
        buf.extend_from_slice(&request_id.to_be_bytes());
        Self { buf }
    }

    pub fn begin_group(&mut self, delimiter: u8) -> &mut Self {
        self.buf.push(delimiter);
        self
    }

    /// Append one attribute. Names and values are short literals here, well
    /// under the u16 length limit.
    pub fn attribute(&mut self, attr: &WireAttribute) -> &mut Self {
        let value = attr.encode_value();
        self.buf.push(attr.tag.code());
        self.buf
            .extend_from_slice(&(attr.name.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(attr.name.as_bytes());
        self.buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(&value);
        self
    }

    /// Write the end-of-attributes tag.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(TAG_END_OF_ATTRIBUTES);
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Attributes under one delimiter tag.
#[derive(Debug, Clone)]
pub struct AttributeGroup {
    pub delimiter: u8,
    pub attributes: Vec<WireAttribute>,
}

impl AttributeGroup {
    pub fn get(&self, name: &str) -> Option<&WireAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// A parsed IPP request or response.
#[derive(Debug, Clone)]
pub struct IppMessage {
    pub version: (u8, u8),
    /// Operation-id (requests) or status-code (responses).
    pub code: u16,
    pub request_id: u32,
    pub groups: Vec<AttributeGroup>,
    pub data: Vec<u8>,
}

impl IppMessage {
    pub fn group(&self, delimiter: u8) -> Option<&AttributeGroup> {
        self.groups.iter().find(|group| group.delimiter == delimiter)
    }

    /// Look `name` up in the job group, then the operation group.
    pub fn attribute(&self, name: &str) -> Option<&WireAttribute> {
        [TAG_JOB_ATTRIBUTES, TAG_OPERATION_ATTRIBUTES]
            .into_iter()
            .find_map(|delimiter| self.group(delimiter)?.get(name))
    }
}

/// Parse a complete IPP message.
pub fn parse_ipp_message(data: &[u8]) -> Result<IppMessage, String> {
    if data.len() < 8 {
        return Err(format!(
            "IPP message too short: {} bytes (minimum 8)",
            data.len()
        ));
    }

    let version = (data[0], data[1]);
    let code = u16::from_be_bytes([data[2], data[3]]);
    let request_id = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

    let mut pos = 8;
    let mut groups = Vec::new();
    let mut current: Option<AttributeGroup> = None;
    let mut terminated = false;

    while pos < data.len() {
        let tag = data[pos];
        pos += 1;

        // Delimiter tags occupy 0x00..=0x0F.
        if tag <= 0x0F {
            if let Some(group) = current.take() {
                groups.push(group);
            }
            if tag == TAG_END_OF_ATTRIBUTES {
                terminated = true;
                break;
            }
            current = Some(AttributeGroup {
                delimiter: tag,
                attributes: Vec::new(),
            });
            continue;
        }

        let name = read_field(data, &mut pos, "attribute name")?;
        let name = String::from_utf8_lossy(name).into_owned();
        let value = read_field(data, &mut pos, "attribute value")?;
        let attr = WireAttribute::decode(ValueTag::from_code(tag), name, value);

        match current.as_mut() {
            Some(group) => group.attributes.push(attr),
            None => warn!(attribute = %attr.name, "IPP attribute outside of any group, discarded"),
        }
    }

    if !terminated {
        return Err("missing end-of-attributes tag".into());
    }

    Ok(IppMessage {
        version,
        code,
        request_id,
        groups,
        data: data[pos..].to_vec(),
    })
}

/// Read a u16 length-prefixed field at `pos`, advancing past it.
fn read_field<'a>(data: &'a [u8], pos: &mut usize, what: &str) -> Result<&'a [u8], String> {
    let length_bytes = data
        .get(*pos..*pos + 2)
        .ok_or_else(|| format!("truncated {what} length"))?;
    let length = u16::from_be_bytes([length_bytes[0], length_bytes[1]]) as usize;
    *pos += 2;
    let field = data
        .get(*pos..*pos + length)
        .ok_or_else(|| format!("truncated {what}"))?;
    *pos += length;
    Ok(field)
}

// ---------------------------------------------------------------------------
// HTTP framing
// ---------------------------------------------------------------------------

pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode a chunked HTTP body. `Ok(None)` means the last chunk has not
/// arrived yet.
pub fn decode_chunked(mut data: &[u8]) -> Result<Option<Vec<u8>>, String> {
    let mut body = Vec::new();
    loop {
        let Some(line_end) = find_subsequence(data, b"\r\n") else {
            return Ok(None);
        };
        let line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| format!("invalid chunk size '{size_hex}'"))?;
        data = &data[line_end + 2..];

        if size == 0 {
            // No trailers are expected; the body ends at the blank line.
            return Ok(find_subsequence(data, b"\r\n").map(|_| body));
        }
        if data.len() < size + 2 {
            return Ok(None);
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}
