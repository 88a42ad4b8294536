//! Bundled `BuildHasher`s.
//!
//! Tables default to hashbrown's `DefaultHashBuilder`. These two cover the
//! cases where a caller wants a deterministic hash instead: FNV-1a (from the
//! `fnv` crate) for arbitrary keys, and an identity hash that makes an
//! integer key's ideal bucket simply `key mod capacity`.

use core::hash::{BuildHasher, Hasher};

/// FNV-1a, from the `fnv` crate.
pub use fnv::{FnvBuildHasher, FnvHasher};

/// Hasher under which a single integer hashes to its own value.
///
/// Several writes are folded together, so composite keys still hash, but
/// without any mixing: only use it where placement should be predictable.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher {
    hash: u64,
}

impl IdentityHasher {
    #[inline]
    fn fold(&mut self, word: u64) {
        self.hash = self.hash.wrapping_mul(31).wrapping_add(word);
    }
}

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.fold(u64::from(byte));
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }

    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }

    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }

    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    fn write_i8(&mut self, i: i8) {
        self.fold(i as u8 as u64);
    }

    fn write_i16(&mut self, i: i16) {
        self.fold(i as u16 as u64);
    }

    fn write_i32(&mut self, i: i32) {
        self.fold(i as u32 as u64);
    }

    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64);
    }

    fn write_isize(&mut self, i: isize) {
        self.fold(i as usize as u64);
    }
}

/// Builds [`IdentityHasher`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_hash_of_integers() {
        let b = IdentityBuildHasher;
        assert_eq!(b.hash_one(42u64), 42);
        assert_eq!(b.hash_one(7usize), 7);
        assert_eq!(b.hash_one(13u32), 13);
        assert_eq!(b.hash_one(-1i32), u64::from(u32::MAX));
    }

    #[test]
    fn fnv_known_vectors() {
        let mut h = FnvHasher::default();
        assert_eq!(h.finish(), 0xcbf2_9ce4_8422_2325);
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn fnv_is_deterministic_across_builders() {
        let (a, b) = (FnvBuildHasher::default(), FnvBuildHasher::default());
        assert_eq!(a.hash_one("hello"), b.hash_one("hello"));
        assert_ne!(a.hash_one("a"), a.hash_one("b"));
    }
}
