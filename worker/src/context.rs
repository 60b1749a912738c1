use std::hash::{Hash, Hasher};

use rand::{SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};

/// The execution context handed to every local trainer call.
///
/// Holds what used to be process wide state: the base seed all randomness in a
/// run derives from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecContext {
    seed: Option<u64>,
}

impl ExecContext {
    /// Creates a new `ExecContext`.
    ///
    /// # Arguments
    /// * `seed` - The base seed, `None` draws from the operating system.
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns a random number generator for a single call.
    ///
    /// With a seed, the generator is seeded with the SHA-256 digest of the seed and
    /// `key`, so two calls with different keys never share a stream and reruns are
    /// reproducible across toolchains and platforms.
    pub fn rng<K: Hash>(&self, key: K) -> StdRng {
        let Some(seed) = self.seed else {
            return StdRng::from_os_rng();
        };

        let mut hasher = DigestHasher::default();
        hasher.write_u64(seed);
        key.hash(&mut hasher);
        StdRng::from_seed(hasher.digest())
    }
}

/// Feeds `Hash` input into SHA-256, integers as fixed width little endian bytes.
#[derive(Default)]
struct DigestHasher(Sha256);

impl DigestHasher {
    fn digest(self) -> [u8; 32] {
        let mut seed = [0; 32];
        seed.copy_from_slice(&self.0.finalize());
        seed
    }
}

impl Hasher for DigestHasher {
    fn finish(&self) -> u64 {
        let digest = self.0.clone().finalize();
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    fn write_u8(&mut self, i: u8) {
        self.0.update([i]);
    }

    fn write_u32(&mut self, i: u32) {
        self.0.update(i.to_le_bytes());
    }

    fn write_u64(&mut self, i: u64) {
        self.0.update(i.to_le_bytes());
    }

    fn write_usize(&mut self, i: usize) {
        self.write_u64(i as u64);
    }

    fn write_isize(&mut self, i: isize) {
        self.write_u64(i as u64);
    }
}
