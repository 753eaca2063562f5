//! Bump allocator over a caller-supplied byte region.
//!
//! Grounded on the teacher's `acram::OneWayCounter` / `protected_rram::Reram`
//! style of wrapping a raw byte range with offset-checked accessors, generalized
//! here to a generic arena rather than a fixed hardware window.

use crate::error::{VbError, VbResult};

pub const ALIGN: usize = 8;

const fn align_up(n: usize) -> usize { (n + (ALIGN - 1)) & !(ALIGN - 1) }

/// A span of bytes inside the arena, identified by its offset and length.
/// Resolved back to a pointer via `arena_base + offset` on every access, never
/// cached as a raw pointer — the arena's backing storage may be relocated by
/// the caller (e.g. copied out for debugging) between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn empty() -> Self { Span { offset: 0, len: 0 } }
}

/// Bump allocator over `region`. `used` is a monotonically increasing watermark;
/// `realloc_last` is the only way to grow a region, and only when it is the most
/// recent allocation.
pub struct WorkBuffer<'a> {
    region: &'a mut [u8],
    used: usize,
}

impl<'a> WorkBuffer<'a> {
    /// `region.len()` must be representable in a `usize` and the caller is
    /// responsible for giving an `ALIGN`-aligned starting address; the engine
    /// only rounds up *lengths*, never adjusts the base pointer.
    pub fn init(region: &'a mut [u8]) -> Self { WorkBuffer { region, used: 0 } }

    pub fn size(&self) -> usize { self.region.len() }

    pub fn used(&self) -> usize { self.used }

    pub fn remaining(&self) -> usize { self.region.len() - self.used }

    /// Allocates `n` bytes (rounded up to `ALIGN`), zero-initialized.
    pub fn alloc(&mut self, n: usize) -> VbResult<Span> {
        let rounded = align_up(n);
        if rounded > self.remaining() {
            return Err(VbError::WorkbufExhausted);
        }
        let offset = self.used;
        self.region[offset..offset + rounded].fill(0);
        self.used += rounded;
        Ok(Span { offset, len: n })
    }

    /// Grows `span` (the most recent allocation) to `new_len`. Fails (without
    /// side effects) unless `span` is exactly the high watermark minus its own
    /// rounded length — i.e. unless nothing has been allocated since.
    pub fn realloc_last(&mut self, span: Span, new_len: usize) -> VbResult<Span> {
        let old_rounded = align_up(span.len);
        if span.offset + old_rounded != self.used {
            return Err(VbError::WorkbufNotLastAlloc);
        }
        let new_rounded = align_up(new_len);
        if span.offset + new_rounded > self.region.len() {
            return Err(VbError::WorkbufExhausted);
        }
        if new_rounded > old_rounded {
            self.region[span.offset + old_rounded..span.offset + new_rounded].fill(0);
        }
        self.used = span.offset + new_rounded;
        Ok(Span { offset: span.offset, len: new_len })
    }

    /// Releases `span` if it is the most recent allocation; otherwise a no-op.
    /// Matches spec.md's "silent failure, caller maps to its own error kind" —
    /// callers that rely on `free_last` succeeding should check `used()` themselves.
    pub fn free_last(&mut self, span: Span) {
        let rounded = align_up(span.len);
        if span.offset + rounded == self.used {
            self.used = span.offset;
        }
    }

    pub fn bytes(&self, span: Span) -> &[u8] { &self.region[span.offset..span.offset + span.len] }

    pub fn bytes_mut(&mut self, span: Span) -> &mut [u8] { &mut self.region[span.offset..span.offset + span.len] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_rounds_up_and_tracks_used() {
        let mut buf = [0u8; 64];
        let mut wb = WorkBuffer::init(&mut buf);
        let s = wb.alloc(3).unwrap();
        assert_eq!(s.len, 3);
        assert_eq!(wb.used(), ALIGN);
        assert_eq!(wb.remaining(), 64 - ALIGN);
    }

    #[test]
    fn alloc_fails_when_out_of_space() {
        let mut buf = [0u8; 16];
        let mut wb = WorkBuffer::init(&mut buf);
        assert!(wb.alloc(8).is_ok());
        assert_eq!(wb.alloc(16), Err(VbError::WorkbufExhausted));
    }

    #[test]
    fn realloc_last_only_succeeds_on_most_recent_allocation() {
        let mut buf = [0u8; 64];
        let mut wb = WorkBuffer::init(&mut buf);
        let a = wb.alloc(8).unwrap();
        let b = wb.alloc(8).unwrap();
        // a is no longer the high-water allocation, so it cannot grow.
        assert_eq!(wb.realloc_last(a, 16), Err(VbError::WorkbufNotLastAlloc));
        let b2 = wb.realloc_last(b, 24).unwrap();
        assert_eq!(b2.len, 24);
        assert_eq!(wb.used(), 8 + align_up(24));
    }

    #[test]
    fn free_last_releases_only_the_top_allocation() {
        let mut buf = [0u8; 32];
        let mut wb = WorkBuffer::init(&mut buf);
        let a = wb.alloc(8).unwrap();
        let b = wb.alloc(8).unwrap();
        wb.free_last(a); // not top; no-op
        assert_eq!(wb.used(), 16);
        wb.free_last(b);
        assert_eq!(wb.used(), 8);
    }

    #[quickcheck_macros::quickcheck]
    fn used_never_exceeds_size(sizes: Vec<u16>) -> bool {
        let mut buf = [0u8; 4096];
        let cap = buf.len();
        let mut wb = WorkBuffer::init(&mut buf);
        for sz in sizes {
            let _ = wb.alloc(sz as usize % 512);
        }
        wb.used() <= cap
    }
}
