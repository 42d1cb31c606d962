//! Non-contiguous byte buffers shared by the frame checker and the binary
//! protocol.
//!
//! A [`NonContiguousBuffer`] is a queue of [`Bytes`] segments: appends and
//! [`cut`](NonContiguousBuffer::cut) move segment handles around without
//! copying payload bytes, which is what lets a decoded frame hand its
//! struct body onwards untouched.

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};

use crate::Error;

/// A non-contiguous sequence of bytes.
///
/// The buffer owns an ordered queue of segments. Consuming operations
/// (`skip`, `cut`) work from the front; [`flatten_to`] copies without
/// consuming.
///
/// [`flatten_to`]: NonContiguousBuffer::flatten_to
#[derive(Debug, Default, Clone)]
pub struct NonContiguousBuffer {
    segments: VecDeque<Bytes>,
    size: usize,
}

impl NonContiguousBuffer {
    /// The total number of bytes held across all segments.
    pub fn byte_size(&self) -> usize {
        self.size
    }

    /// Returns true when the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Appends a segment to the back of the buffer.
    pub fn append(&mut self, segment: Bytes) {
        if segment.is_empty() {
            return;
        }
        self.size += segment.len();
        self.segments.push_back(segment);
    }

    /// Moves every segment of `other` to the back of the buffer.
    pub fn extend(&mut self, other: NonContiguousBuffer) {
        self.size += other.size;
        self.segments.extend(other.segments);
    }

    /// Copies the first `dst.len()` bytes into `dst` without consuming
    /// them.
    pub fn flatten_to(&self, dst: &mut [u8]) -> Result<(), Error> {
        if dst.len() > self.size {
            return Err(Error::ShortBuffer {
                expected: dst.len(),
                available: self.size,
            });
        }

        let mut copied = 0;
        for segment in &self.segments {
            if copied == dst.len() {
                break;
            }
            let n = segment.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&segment[..n]);
            copied += n;
        }

        Ok(())
    }

    /// Discards the first `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        if n > self.size {
            return Err(Error::ShortBuffer {
                expected: n,
                available: self.size,
            });
        }

        let mut remaining = n;
        while remaining > 0 {
            // The size check above guarantees a front segment exists.
            let front = match self.segments.front_mut() {
                Some(s) => s,
                None => break,
            };
            if front.len() <= remaining {
                remaining -= front.len();
                self.segments.pop_front();
            } else {
                front.advance(remaining);
                remaining = 0;
            }
        }
        self.size -= n;

        Ok(())
    }

    /// Removes the first `n` bytes and returns them as a new buffer.
    ///
    /// Whole segments transfer by handle; at most one segment is split.
    pub fn cut(&mut self, n: usize) -> Result<NonContiguousBuffer, Error> {
        if n > self.size {
            return Err(Error::ShortBuffer {
                expected: n,
                available: self.size,
            });
        }

        let mut out = NonContiguousBuffer::default();
        while out.size < n {
            let mut front = match self.segments.pop_front() {
                Some(s) => s,
                None => break,
            };
            let want = n - out.size;
            if front.len() <= want {
                out.size += front.len();
                out.segments.push_back(front);
            } else {
                let head = front.split_to(want);
                out.size += head.len();
                out.segments.push_back(head);
                self.segments.push_front(front);
            }
        }
        self.size -= n;

        Ok(out)
    }

    /// Copies the entire buffer into a single contiguous [`Vec`].
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size);
        for segment in &self.segments {
            out.extend_from_slice(segment);
        }
        out
    }
}

impl PartialEq for NonContiguousBuffer {
    /// Buffers compare by their logical byte content, not by how the
    /// content happens to be segmented.
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        let a = self.segments.iter().flat_map(|s| s.iter());
        let b = other.segments.iter().flat_map(|s| s.iter());
        a.eq(b)
    }
}

impl From<Bytes> for NonContiguousBuffer {
    fn from(v: Bytes) -> Self {
        let mut buf = Self::default();
        buf.append(v);
        buf
    }
}

impl From<Vec<u8>> for NonContiguousBuffer {
    fn from(v: Vec<u8>) -> Self {
        Bytes::from(v).into()
    }
}

impl From<&[u8]> for NonContiguousBuffer {
    fn from(v: &[u8]) -> Self {
        Bytes::copy_from_slice(v).into()
    }
}

/// An append-only builder producing a [`NonContiguousBuffer`].
///
/// Raw byte appends accumulate in a tail block; appending an existing
/// buffer seals the tail and adopts the buffer's segments unchanged, so a
/// pre-serialised body is never copied into the envelope around it.
#[derive(Debug, Default)]
pub struct BufferBuilder {
    done: NonContiguousBuffer,
    tail: BytesMut,
}

impl BufferBuilder {
    /// Appends raw bytes to the builder.
    pub fn append(&mut self, bytes: &[u8]) {
        self.tail.extend_from_slice(bytes);
    }

    /// Appends a whole buffer, transferring its segments without copying.
    pub fn append_buffer(&mut self, buffer: NonContiguousBuffer) {
        self.seal_tail();
        self.done.extend(buffer);
    }

    /// The number of bytes appended so far.
    pub fn byte_size(&self) -> usize {
        self.done.byte_size() + self.tail.len()
    }

    /// Terminates the builder, returning everything appended so far and
    /// leaving the builder empty.
    pub fn destructive_get(&mut self) -> NonContiguousBuffer {
        self.seal_tail();
        std::mem::take(&mut self.done)
    }

    fn seal_tail(&mut self) {
        if !self.tail.is_empty() {
            let sealed = self.tail.split().freeze();
            self.done.append(sealed);
        }
    }
}
