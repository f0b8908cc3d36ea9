//! Command-scoped bump arena.
//!
//! Every string and row object produced while answering one command is
//! allocated here and released together when the arena drops. Nothing is
//! freed individually. Only plain borrowed data (`&str`, slices, `Copy`
//! structs) is stored, since a bump arena never runs destructors.
//!
//! ```
//! use ks_core::Arena;
//!
//! let arena = Arena::new();
//! let title = arena.alloc_str("Tax return 2023");
//! let tags = arena.alloc_slice_copy(&["tax", "2023"]);
//! assert_eq!(title, "Tax return 2023");
//! assert_eq!(tags.len(), 2);
//! ```

use bumpalo::Bump;

#[derive(Default)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// Copies `s` into the arena.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    #[inline]
    pub fn alloc_slice_copy<T: Copy>(&self, vals: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(vals)
    }

    /// Zero-filled buffer of `len` bytes. Aborts on allocation failure, like
    /// every arena allocation.
    #[inline]
    pub fn alloc_bytes(&self, len: usize) -> &mut [u8] {
        self.bump.alloc_slice_fill_copy(len, 0u8)
    }

    /// Underlying bump, for collections rooted in the arena.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_str_copies() {
        let arena = Arena::new();
        let owned = String::from("receipt");
        let copy = arena.alloc_str(&owned);
        drop(owned);
        assert_eq!(copy, "receipt");
    }

    #[test]
    fn test_alloc_empty_str() {
        let arena = Arena::new();
        assert_eq!(arena.alloc_str(""), "");
    }

    #[test]
    fn test_with_capacity() {
        let arena = Arena::with_capacity(1024);
        let _ = arena.alloc_str("x");
        assert!(arena.allocated_bytes() >= 1);
    }

    #[test]
    fn test_alloc_bytes_is_zeroed_and_writable() {
        let arena = Arena::new();
        let buf = arena.alloc_bytes(16);
        assert_eq!(buf, &[0u8; 16]);
        buf[3] = 7;
        assert_eq!(buf[3], 7);
        assert!(arena.alloc_bytes(0).is_empty());
    }

    #[test]
    fn test_reset_releases_chunks_and_stays_usable() {
        let mut arena = Arena::new();
        for i in 0..10_000 {
            let _ = arena.alloc_str(&i.to_string());
        }
        let before = arena.allocated_bytes();
        arena.reset();
        assert!(arena.allocated_bytes() < before);

        assert_eq!(arena.alloc_str("after reset"), "after reset");
        assert_eq!(arena.alloc_slice_copy(&[1, 2, 3]), &[1, 2, 3]);
    }
}
