//! WebAssembly linear memory: `LinearMemory`.
//!
//! Unlike a per-module memory, a `LinearMemory` is a reusable handle: the
//! sandbox keeps a small pool of them and re-targets one at every module it
//! runs by calling [`LinearMemory::reset`]. Capacity is retained across
//! resets so steady-state invocations do not reallocate.
//!
//! Every accessor is bounds-checked against the active size and returns
//! `Trap::OutOfBounds` instead of panicking.

use alloc::vec::Vec;

use crate::{Trap, TrapResult, PAGE_SIZE};

/// A resettable, heap-backed Wasm linear memory.
#[derive(Debug, Default)]
pub struct LinearMemory {
    /// Active bytes. `bytes.len()` is always a multiple of `PAGE_SIZE`.
    bytes: Vec<u8>,
}

impl LinearMemory {
    /// Create an empty memory with zero active pages.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create a zeroed memory with `pages` active pages.
    pub fn with_pages(pages: u32) -> Self {
        let mut memory = Self::new();
        memory.bytes.resize(pages as usize * PAGE_SIZE, 0);
        memory
    }

    /// Current number of active pages.
    #[inline(always)]
    pub fn page_count(&self) -> u32 {
        (self.bytes.len() / PAGE_SIZE) as u32
    }

    /// Current active size in bytes.
    #[inline(always)]
    pub fn active_size(&self) -> usize {
        self.bytes.len()
    }

    /// Resize to `pages`, zero everything, then copy `image` to offset 0.
    ///
    /// # Errors
    /// Returns `Trap::OutOfBounds` if `image` does not fit in `pages`.
    pub fn reset(&mut self, pages: u32, image: &[u8]) -> TrapResult<()> {
        let size = pages as usize * PAGE_SIZE;
        if image.len() > size {
            return Err(Trap::OutOfBounds);
        }
        self.bytes.clear();
        self.bytes.resize(size, 0);
        self.bytes[..image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Wasm `memory.grow`: returns the previous page count, or -1 when the
    /// new size would exceed `max_pages`.
    pub fn grow(&mut self, delta: u32, max_pages: u32) -> i32 {
        let old = self.page_count();
        let new = match old.checked_add(delta) {
            Some(new) if new <= max_pages => new,
            _ => return -1,
        };
        self.bytes.resize(new as usize * PAGE_SIZE, 0);
        old as i32
    }

    // ── Bounds-checked access ────────────────────────────────────────

    /// Borrow `len` bytes starting at `offset`.
    #[inline]
    pub fn slice(&self, offset: u32, len: u32) -> TrapResult<&[u8]> {
        let (start, end) = checked_range(self.bytes.len(), offset, len)?;
        self.bytes.get(start..end).ok_or(Trap::OutOfBounds)
    }

    /// Mutably borrow `len` bytes starting at `offset`.
    #[inline]
    pub fn slice_mut(&mut self, offset: u32, len: u32) -> TrapResult<&mut [u8]> {
        let (start, end) = checked_range(self.bytes.len(), offset, len)?;
        self.bytes.get_mut(start..end).ok_or(Trap::OutOfBounds)
    }

    /// Read a fixed-size array starting at `offset`.
    #[inline]
    pub fn read_array<const N: usize>(&self, offset: u32) -> TrapResult<[u8; N]> {
        let s = self.slice(offset, N as u32)?;
        s.try_into().map_err(|_| Trap::OutOfBounds)
    }

    /// Copy `data` into memory at `offset`.
    pub fn write(&mut self, offset: u32, data: &[u8]) -> TrapResult<()> {
        let len = u32::try_from(data.len()).map_err(|_| Trap::OutOfBounds)?;
        self.slice_mut(offset, len)?.copy_from_slice(data);
        Ok(())
    }

    /// Load a little-endian u64.
    pub fn load_u64(&self, offset: u32) -> TrapResult<u64> {
        self.read_array::<8>(offset).map(u64::from_le_bytes)
    }

    /// Store a little-endian u128 (16 bytes).
    pub fn store_u128(&mut self, offset: u32, value: u128) -> TrapResult<()> {
        self.write(offset, &value.to_le_bytes())
    }

    /// Load a little-endian u128 (16 bytes).
    pub fn load_u128(&self, offset: u32) -> TrapResult<u128> {
        self.read_array::<16>(offset).map(u128::from_le_bytes)
    }

    // ── Bulk operations ──────────────────────────────────────────────

    /// Copy `len` bytes from `src` to `dst` with `memmove` semantics.
    pub fn copy_within(&mut self, dst: u32, src: u32, len: u32) -> TrapResult<()> {
        let active = self.bytes.len();
        let (src_start, src_end) = checked_range(active, src, len)?;
        let (dst_start, _) = checked_range(active, dst, len)?;
        self.bytes.copy_within(src_start..src_end, dst_start);
        Ok(())
    }

    /// Set `len` bytes starting at `dst` to `value`.
    pub fn fill(&mut self, dst: u32, value: u8, len: u32) -> TrapResult<()> {
        self.slice_mut(dst, len)?.fill(value);
        Ok(())
    }

    /// Borrow a NUL-terminated string starting at `offset`, excluding the NUL.
    ///
    /// At most `limit` bytes are scanned; when no terminator appears within
    /// `limit` bytes the first `limit` bytes are returned. Running off the
    /// end of memory before either happens is an out-of-bounds trap.
    pub fn c_str(&self, offset: u32, limit: usize) -> TrapResult<&[u8]> {
        let tail = self
            .bytes
            .get(offset as usize..)
            .ok_or(Trap::OutOfBounds)?;
        let window = &tail[..tail.len().min(limit)];
        match window.iter().position(|&b| b == 0) {
            Some(nul) => Ok(&window[..nul]),
            None if window.len() == limit => Ok(window),
            None => Err(Trap::OutOfBounds),
        }
    }

    /// Read-only access to the active memory region.
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable access to the active memory region.
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Bounds-check `offset..offset+len` against `active_bytes`.
/// Returns `Err(OutOfBounds)` on overflow or out-of-range, never panics.
#[inline(always)]
fn checked_range(active_bytes: usize, offset: u32, len: u32) -> TrapResult<(usize, usize)> {
    let start = offset as usize;
    let end = start.checked_add(len as usize).ok_or(Trap::OutOfBounds)?;
    if end > active_bytes {
        return Err(Trap::OutOfBounds);
    }
    Ok((start, end))
}
