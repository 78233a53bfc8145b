//! Encoding and decoding of netlink attribute streams.
//!
//! A netlink attribute is a 4 byte header (`u16` length including the header,
//! `u16` type) followed by the payload, padded to a 4 byte boundary. Nested
//! attributes are simply an attribute whose payload is another stream.
//!
//! [`AttrSet`] is the append-only encoder used to build requests. It refuses
//! to grow past its capacity and an append that does not fit leaves the set
//! untouched. [`AttrTree`] is a lazy, borrowing view over an encoded stream,
//! nothing is copied or parsed until an attribute is asked for.

use log::{error, trace};

use crate::error::{Error, Result};

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4;

/// Attributes are aligned to this many bytes.
pub const NLA_ALIGNTO: usize = 4;

/// Mask removing the nested and byte-order bits from the attribute type.
const NLA_TYPE_MASK: u16 = 0x3fff;

/// Rounds `len` up to the attribute alignment.
pub fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Append-only encoder for an attribute stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSet {
    buf: Vec<u8>,
    capacity: usize,
}

impl AttrSet {
    /// Creates an empty set able to hold `capacity` encoded bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::new(), capacity }
    }

    /// Appends an attribute with a raw payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::ProtocolBuild` if the attribute does not fit, in which
    /// case the set is left unchanged.
    pub fn put_raw(&mut self, kind: u16, payload: &[u8]) -> Result<()> {
        let nla_len = NLA_HDRLEN + payload.len();
        let needed = nla_align(nla_len);

        if nla_len > u16::MAX as usize
            || self.buf.len() + needed > self.capacity
        {
            error!(
                "Attribute {} ({} bytes) does not fit, {} of {} bytes used",
                kind,
                needed,
                self.buf.len(),
                self.capacity
            );
            return Err(Error::ProtocolBuild(format!(
                "attribute {} of {} bytes exceeds message capacity of {} bytes",
                kind, needed, self.capacity
            )));
        }

        self.buf.extend_from_slice(&(nla_len as u16).to_ne_bytes());
        self.buf.extend_from_slice(&(kind & NLA_TYPE_MASK).to_ne_bytes());
        self.buf.extend_from_slice(payload);
        self.buf.resize(self.buf.len() + (needed - nla_len), 0);

        Ok(())
    }

    /// Appends a `u32` attribute in host byte order.
    pub fn put_u32(&mut self, kind: u16, value: u32) -> Result<()> {
        self.put_raw(kind, &value.to_ne_bytes())
    }

    /// Appends a NUL terminated string attribute.
    pub fn put_str(&mut self, kind: u16, value: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value.as_bytes());
        payload.push(0);
        self.put_raw(kind, &payload)
    }

    /// Appends a flag, an attribute without payload.
    pub fn put_flag(&mut self, kind: u16) -> Result<()> {
        self.put_raw(kind, &[])
    }

    /// Appends `child` as the payload of a single nested attribute.
    pub fn put_nested(&mut self, kind: u16, child: &AttrSet) -> Result<()> {
        self.put_raw(kind, child.as_bytes())
    }

    /// The encoded stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the set, returning the encoded stream.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Maximum number of encoded bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A decoding view over the encoded stream.
    pub fn tree(&self) -> AttrTree<'_> {
        AttrTree::new(&self.buf)
    }
}

/// A lazily decoded attribute stream.
#[derive(Debug, Clone, Copy)]
pub struct AttrTree<'a> {
    buf: &'a [u8],
}

impl<'a> AttrTree<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Iterates the attributes in encounter order.
    pub fn iter(&self) -> AttrIter<'a> {
        AttrIter { rest: self.buf }
    }

    /// Returns the attribute of the given type. When the type is repeated the
    /// last occurrence wins.
    pub fn get(&self, kind: u16) -> Option<Attr<'a>> {
        self.iter().filter(|attr| attr.kind() == kind).last()
    }

    /// Whether an attribute of the given type is present.
    pub fn has(&self, kind: u16) -> bool {
        self.iter().any(|attr| attr.kind() == kind)
    }
}

/// One decoded attribute, borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr<'a> {
    kind: u16,
    payload: &'a [u8],
}

impl<'a> Attr<'a> {
    pub fn kind(&self) -> u16 {
        self.kind
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Reads the payload as a host order `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.payload.get(..4)?.try_into().ok()?;
        Some(u32::from_ne_bytes(bytes))
    }

    /// Reads the payload as a string, dropping the trailing NUL.
    pub fn as_str(&self) -> Option<&'a str> {
        let end = self
            .payload
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.payload.len());
        std::str::from_utf8(&self.payload[..end]).ok()
    }

    /// Interprets the payload as a nested attribute stream.
    pub fn nested(&self) -> AttrTree<'a> {
        AttrTree::new(self.payload)
    }
}

/// Iterator over an attribute stream. Stops at the first malformed header,
/// like the kernel's `nla_ok`.
#[derive(Debug, Clone)]
pub struct AttrIter<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = Attr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < NLA_HDRLEN {
            return None;
        }

        let nla_len = u16::from_ne_bytes([self.rest[0], self.rest[1]]) as usize;
        let kind = u16::from_ne_bytes([self.rest[2], self.rest[3]]) & NLA_TYPE_MASK;

        if nla_len < NLA_HDRLEN || nla_len > self.rest.len() {
            trace!(
                "Malformed attribute header, len {} with {} bytes left",
                nla_len,
                self.rest.len()
            );
            self.rest = &[];
            return None;
        }

        let attr = Attr { kind, payload: &self.rest[NLA_HDRLEN..nla_len] };
        let advance = nla_align(nla_len).min(self.rest.len());
        self.rest = &self.rest[advance..];

        Some(attr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_aligned() -> Result<()> {
        let mut set = AttrSet::with_capacity(64);
        set.put_str(4, "mon0")?;

        // header + "mon0\0" = 9, padded to 12
        assert_eq!(set.len(), 12);
        assert_eq!(&set.as_bytes()[..2], &9u16.to_ne_bytes());
        assert_eq!(&set.as_bytes()[9..], &[0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_decode_scalars() -> Result<()> {
        let mut set = AttrSet::with_capacity(128);
        set.put_u32(3, 7)?;
        set.put_str(4, "wlan0mon")?;
        set.put_flag(2)?;

        let tree = set.tree();
        assert_eq!(tree.get(3).and_then(|a| a.as_u32()), Some(7));
        assert_eq!(tree.get(4).and_then(|a| a.as_str()), Some("wlan0mon"));
        assert!(tree.has(2));
        assert!(tree.get(2).map(|a| a.payload().is_empty()).unwrap_or(false));
        assert!(tree.get(9).is_none());
        assert_eq!(tree.iter().count(), 3);
        Ok(())
    }

    #[test]
    fn test_nested_tree() -> Result<()> {
        let mut flags = AttrSet::with_capacity(64);
        flags.put_flag(3)?;
        flags.put_flag(4)?;

        let mut set = AttrSet::with_capacity(64);
        set.put_u32(5, 6)?;
        set.put_nested(23, &flags)?;

        let nested = set.tree().get(23).map(|a| a.nested());
        let kinds: Vec<u16> = nested
            .map(|tree| tree.iter().map(|a| a.kind()).collect())
            .unwrap_or_default();
        assert_eq!(kinds, vec![3, 4]);
        Ok(())
    }

    #[test]
    fn test_capacity_overflow_leaves_set_untouched() -> Result<()> {
        let mut set = AttrSet::with_capacity(16);
        set.put_u32(3, 1)?;
        let before = set.clone();

        let result = set.put_str(4, "a-name-that-does-not-fit");

        assert!(matches!(result, Err(Error::ProtocolBuild(_))));
        assert_eq!(set, before);
        Ok(())
    }

    #[test]
    fn test_last_duplicate_wins() -> Result<()> {
        let mut set = AttrSet::with_capacity(64);
        set.put_u32(38, 2412)?;
        set.put_u32(38, 2437)?;

        assert_eq!(set.tree().get(38).and_then(|a| a.as_u32()), Some(2437));
        Ok(())
    }

    #[test]
    fn test_truncated_stream_stops_iteration() {
        // length claims 8 bytes but only 6 are present
        let mut buf = Vec::new();
        buf.extend_from_slice(&8u16.to_ne_bytes());
        buf.extend_from_slice(&1u16.to_ne_bytes());
        buf.extend_from_slice(&[1, 2]);

        assert_eq!(AttrTree::new(&buf).iter().count(), 0);
    }

    #[test]
    fn test_short_u32_payload() -> Result<()> {
        let mut set = AttrSet::with_capacity(16);
        set.put_raw(1, &[1, 2])?;
        assert_eq!(set.tree().get(1).and_then(|a| a.as_u32()), None);
        Ok(())
    }
}
