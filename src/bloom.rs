//! Probabilistic set membership.
//!
//! A bloom filter answers "definitely not present" or "probably present"
//! in constant space. Inserting a key sets `k` bits derived from a single
//! SHA-256 digest of the key; a lookup reports present only if all `k` bits
//! are set. False positives are possible, false negatives are not.
//!
//! Each probe takes an 8-byte window from the front of the digest and an
//! 8-byte window walking back from byte 24, concatenates them into a fresh
//! 16-byte buffer, and hashes that with FNV to pick the target bit.

use core::fmt;
use std::hash::Hasher;

use fnv::FnvHasher;
use sha2::{Digest, Sha256};

/// A fixed-size bloom filter over byte or string keys.
///
/// # Example
///
/// ```
/// use peercache_rs::BloomFilter;
///
/// let mut filter = BloomFilter::new(1 << 16, 5);
/// filter.put("apple");
///
/// assert!(filter.has("apple"));       // never a false negative
/// // "banana" is almost certainly reported absent.
/// ```
pub struct BloomFilter {
    probes: u32,
    bits: Vec<u64>,
    words: u64,
}

impl BloomFilter {
    /// Creates a filter sized for `n` bit positions with `probes` probes per
    /// key.
    ///
    /// The bit vector is rounded up to whole 64-bit words.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= probes <= 25`; larger probe counts would walk
    /// outside the 32-byte digest windows.
    pub fn new(n: usize, probes: u32) -> Self {
        assert!(
            (1..=25).contains(&probes),
            "probe count must be between 1 and 25"
        );
        let words = n as u64 / 64 + 1;
        BloomFilter {
            probes,
            bits: vec![0u64; words as usize],
            words,
        }
    }

    /// Number of probes per key.
    pub fn probes(&self) -> u32 {
        self.probes
    }

    fn probe_index(&self, digest: &[u8], i: usize) -> u64 {
        // Fresh buffer per probe; the two digest windows overlap for
        // adjacent probe indexes and must not be rewritten in place.
        let mut derived = [0u8; 16];
        derived[..8].copy_from_slice(&digest[i..i + 8]);
        derived[8..].copy_from_slice(&digest[24 - i..32 - i]);

        let mut hasher = FnvHasher::default();
        hasher.write(&derived);
        u64::from(hasher.finish() as u32) % self.words
    }

    fn set(&mut self, index: u64) {
        let (word, bit) = (index / 64, index % 64);
        self.bits[word as usize] |= 1 << bit;
    }

    fn is_set(&self, index: u64) -> bool {
        let (word, bit) = (index / 64, index % 64);
        self.bits[word as usize] & (1 << bit) != 0
    }

    /// Records `data` in the filter.
    pub fn put(&mut self, data: impl AsRef<[u8]>) {
        let digest: [u8; 32] = Sha256::digest(data.as_ref()).into();
        for i in 0..self.probes as usize {
            let index = self.probe_index(&digest, i);
            self.set(index);
        }
    }

    /// Tests whether `data` was possibly recorded.
    ///
    /// Returns `false` only when `data` was definitely never inserted.
    pub fn has(&self, data: impl AsRef<[u8]>) -> bool {
        let digest: [u8; 32] = Sha256::digest(data.as_ref()).into();
        for i in 0..self.probes as usize {
            if !self.is_set(self.probe_index(&digest, i)) {
                return false;
            }
        }
        true
    }
}

impl fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("probes", &self.probes)
            .field("words", &self.words)
            .finish()
    }
}
