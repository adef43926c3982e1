// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use {
    failure::{ensure, Error, Fail},
    std::{collections::BTreeMap, fmt, mem::size_of},
    zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned},
};

macro_rules! pub_const {
    ($name:ident, $val:expr) => {
        pub const $name: Self = Self($val);
    };
}

// IEEE Std 802.11-2016, 9.4.2.1
#[repr(C)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct Id(pub u8);

impl Id {
    pub_const!(SSID, 0);
    // The sweep rig repurposes these two element ids for its own payloads.
    pub_const!(SWEEP_META, 10);
    pub_const!(SWEEP_DESCRIPTION, 11);
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned)]
pub struct Header {
    pub id: Id,
    pub body_len: u8,
}

pub const MAX_BODY_LEN: usize = std::u8::MAX as usize;

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum ScanError {
    #[fail(display = "element at offset {} overruns buffer ({} bytes remaining)", offset, remaining)]
    Truncated { offset: usize, remaining: usize },
}

/// Walks a chain of elements. Iteration stops at the end of the buffer or at the first element
/// that does not fit; `bytes_remaining` tells the two apart.
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn bytes_remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = (Id, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.bytes;
        let rest = &bytes[self.offset..];
        let (header, rest) = LayoutVerified::<_, Header>::new_unaligned_from_prefix(rest)?;
        let body_len = header.body_len as usize;
        if rest.len() < body_len {
            return None;
        }
        self.offset += size_of::<Header>() + body_len;
        Some((header.id, &rest[..body_len]))
    }
}

/// Element bodies of one frame keyed by element id. A repeated id keeps the last body seen.
#[derive(Debug, Default)]
pub struct TagMap<'a> {
    elements: BTreeMap<Id, &'a [u8]>,
}

impl<'a> TagMap<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ScanError> {
        let mut reader = Reader::new(bytes);
        let mut elements = BTreeMap::new();
        for (id, body) in &mut reader {
            elements.insert(id, body);
        }
        if reader.bytes_remaining() > 0 {
            return Err(ScanError::Truncated {
                offset: reader.offset(),
                remaining: reader.bytes_remaining(),
            });
        }
        Ok(TagMap { elements })
    }

    pub fn get(&self, id: Id) -> Option<&'a [u8]> {
        self.elements.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &'a [u8])> + '_ {
        self.elements.iter().map(|(id, body)| (*id, *body))
    }
}

/// Appends one element to `buf`.
pub fn write_element(buf: &mut Vec<u8>, id: Id, body: &[u8]) -> Result<(), Error> {
    ensure!(body.len() <= MAX_BODY_LEN, "element {} body too long: {} bytes", id, body.len());
    let header = Header { id, body_len: body.len() as u8 };
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(body);
    Ok(())
}
