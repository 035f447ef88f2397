use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5f1d_c0a7_7e4b_9c31;

/// Stable 128-bit fingerprint of an algorithm configuration or request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

impl Fingerprint {
    /// 32 lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Seeded xxh3 hasher with explicit little-endian writers.
///
/// Values are written field by field so fingerprints do not depend on struct layout or
/// `Hash` implementations.
pub struct StableHasher {
    inner: Xxh3,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StableHasher {
    /// Fresh hasher.
    pub fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    /// Raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    /// One byte.
    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    /// Bool as one byte.
    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// `u64`, little endian.
    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// `i64`, little endian.
    pub fn write_i64(&mut self, v: i64) {
        self.write_u64(v as u64);
    }

    /// `f64` bit pattern.
    pub fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Length-prefixed UTF-8.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    /// Nested fingerprint.
    pub fn write_fingerprint(&mut self, f: Fingerprint) {
        self.write_u64(f.hi);
        self.write_u64(f.lo);
    }

    /// 128-bit digest.
    pub fn finish(self) -> Fingerprint {
        let v = self.inner.digest128();
        Fingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}
