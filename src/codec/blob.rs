use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

/// An immutable byte sequence assembled from shared `Bytes` chunks.
///
/// Slicing and concatenation never copy payload bytes; they only clone chunk
/// handles. Bytes are copied once, by `to_bytes`, when more than one chunk
/// has to be flattened.
#[derive(Clone, Default)]
pub struct Blob {
    chunks: Arc<[Bytes]>,
    len: usize,
}

impl Blob {
    pub fn new() -> Self {
        Blob::default()
    }

    pub fn from_static(data: &'static [u8]) -> Self {
        Blob::from(Bytes::from_static(data))
    }

    pub fn copy_from_slice(data: &[u8]) -> Self {
        Blob::from(Bytes::copy_from_slice(data))
    }

    pub(crate) fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let chunks: Vec<Bytes> = chunks.into_iter().filter(|c| !c.is_empty()).collect();
        let len = chunks.iter().map(Bytes::len).sum();
        Blob {
            chunks: chunks.into(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The shared chunks, in output order. Never contains empty chunks.
    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// Iterates every byte in order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks.iter().flat_map(|c| c.iter().copied())
    }

    /// A blob yielding `self` followed by `other`.
    pub fn concat(&self, other: &Blob) -> Blob {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut chunks = Vec::with_capacity(self.chunks.len() + other.chunks.len());
        chunks.extend(self.chunks.iter().cloned());
        chunks.extend(other.chunks.iter().cloned());
        Blob {
            chunks: chunks.into(),
            len: self.len + other.len,
        }
    }

    /// A view of `range`, sharing storage with `self`.
    ///
    /// # Panics
    ///
    /// Panics if the range is decreasing or ends past `self.len()`, like
    /// `Bytes::slice`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Blob {
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n + 1,
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.len,
        };
        assert!(
            start <= end && end <= self.len,
            "range {}..{} out of bounds for blob of length {}",
            start,
            end,
            self.len
        );
        if start == 0 && end == self.len {
            return self.clone();
        }

        let mut chunks = Vec::new();
        let mut offset = 0;
        for chunk in self.chunks.iter() {
            let chunk_end = offset + chunk.len();
            if chunk_end > start && offset < end {
                let from = start.saturating_sub(offset);
                let to = chunk.len().min(end - offset);
                chunks.push(chunk.slice(from..to));
            }
            if chunk_end >= end {
                break;
            }
            offset = chunk_end;
        }
        Blob::from_chunks(chunks)
    }

    /// Flattens into contiguous bytes. Free for zero or one chunk.
    pub fn to_bytes(&self) -> Bytes {
        match self.chunks.len() {
            0 => Bytes::new(),
            1 => self.chunks[0].clone(),
            _ => {
                let mut buf = BytesMut::with_capacity(self.len);
                self.write_to(&mut buf);
                buf.freeze()
            }
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        self.write_to(&mut out);
        out
    }

    /// Copies the content into `buf`.
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        for chunk in self.chunks.iter() {
            buf.put_slice(chunk);
        }
    }
}

impl From<Bytes> for Blob {
    fn from(bytes: Bytes) -> Self {
        Blob::from_chunks(vec![bytes])
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob::from(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Blob {
    fn from(bytes: &'static [u8]) -> Self {
        Blob::from_static(bytes)
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Blob) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Blob {}

impl PartialEq<[u8]> for Blob {
    fn eq(&self, other: &[u8]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter().copied())
    }
}

impl PartialEq<&[u8]> for Blob {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}

impl Hash for Blob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashers may mix per `write` call, so hash one contiguous slice.
        self.to_bytes().hash(state);
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({} bytes: {})", self.len, hex::encode(self.to_vec()))
    }
}
