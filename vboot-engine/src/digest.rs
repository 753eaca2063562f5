//! Algorithm-tagged streaming digest pipeline.
//!
//! The *pipeline* (algorithm dispatch, buffering, one-shot verify) is in-core;
//! the actual SHA-1/256/512 compression rounds are a capability supplied by the
//! host, mirroring how `sha2-bao1x` plugs a hardware accelerator in behind the
//! RustCrypto `digest::Digest` trait for `bao1x-hal::sigcheck`.

use crate::error::{VbError, VbResult};

pub const MAX_DIGEST_SIZE: usize = 64; // SHA-512

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgo {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgo {
    pub const fn digest_size(self) -> usize {
        match self {
            HashAlgo::Sha1 => 20,
            HashAlgo::Sha256 => 32,
            HashAlgo::Sha512 => 64,
        }
    }
}

/// Capability supplying the SHA-1/256/512 core rounds. One instance handles
/// whichever algorithm it was `init`-ed with; the discriminated-union state
/// lives inside the backend implementation, not here.
pub trait HashBackend: Sized {
    fn init(algo: HashAlgo) -> Self;
    fn extend(&mut self, buf: &[u8]);
    /// Writes exactly `algo.digest_size()` bytes into `out`.
    fn finalize(self, out: &mut [u8]) -> VbResult<()>;
}

/// Lookup table from a composite "signature+hash" crypto-algorithm id (as
/// stored in a packed key/signature) to the underlying hash algorithm.
pub fn crypto_to_hash(alg_id: u32) -> VbResult<HashAlgo> {
    // Values follow the vboot2 crypto algorithm numbering: RSA-{1024,2048,4096,8192}
    // crossed with {SHA1, SHA256, SHA512}, plus bare hash-only ids at the tail.
    match alg_id {
        0 | 3 | 6 | 9 => Ok(HashAlgo::Sha1),
        1 | 4 | 7 | 10 => Ok(HashAlgo::Sha256),
        2 | 5 | 8 | 11 => Ok(HashAlgo::Sha512),
        12 => Ok(HashAlgo::Sha1),
        13 => Ok(HashAlgo::Sha256),
        14 => Ok(HashAlgo::Sha512),
        _ => Err(VbError::CryptoAlgorithmInvalid),
    }
}

pub struct DigestContext<B: HashBackend> {
    algo: HashAlgo,
    backend: B,
}

impl<B: HashBackend> DigestContext<B> {
    pub fn init(algo: HashAlgo) -> Self { DigestContext { algo, backend: B::init(algo) } }

    pub fn algo(&self) -> HashAlgo { self.algo }

    pub fn extend(&mut self, buf: &[u8]) { self.backend.extend(buf); }

    pub fn finalize(self, out: &mut [u8]) -> VbResult<()> {
        if out.len() < self.algo.digest_size() {
            return Err(VbError::DigestBufferTooSmall);
        }
        self.backend.finalize(&mut out[..self.algo.digest_size()])
    }
}

/// Streaming one-shot: hash `buf` and compare against `hash`.
pub fn verify_hash<B: HashBackend>(algo: HashAlgo, buf: &[u8], hash: &[u8]) -> VbResult<()> {
    let mut ctx = DigestContext::<B>::init(algo);
    ctx.extend(buf);
    let mut scratch = [0u8; MAX_DIGEST_SIZE];
    ctx.finalize(&mut scratch[..algo.digest_size()])?;
    if &scratch[..algo.digest_size()] == hash { Ok(()) } else { Err(VbError::ShaMismatch) }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trivial, deterministic stand-in backend used only to exercise the
    /// pipeline's buffering/dispatch logic, not real cryptographic strength.
    #[derive(Default)]
    pub struct XorBackend {
        algo: Option<HashAlgo>,
        acc: [u8; MAX_DIGEST_SIZE],
        len: u64,
    }
    impl HashBackend for XorBackend {
        fn init(algo: HashAlgo) -> Self { XorBackend { algo: Some(algo), acc: [0u8; MAX_DIGEST_SIZE], len: 0 } }
        fn extend(&mut self, buf: &[u8]) {
            for (i, &b) in buf.iter().enumerate() {
                self.acc[(self.len as usize + i) % MAX_DIGEST_SIZE] ^= b;
            }
            self.len += buf.len() as u64;
        }
        fn finalize(self, out: &mut [u8]) -> VbResult<()> {
            out.copy_from_slice(&self.acc[..out.len()]);
            Ok(())
        }
    }

    #[test]
    fn digest_size_matches_algorithm() {
        assert_eq!(HashAlgo::Sha1.digest_size(), 20);
        assert_eq!(HashAlgo::Sha256.digest_size(), 32);
        assert_eq!(HashAlgo::Sha512.digest_size(), 64);
    }

    #[test]
    fn finalize_rejects_undersized_buffer() {
        let ctx = DigestContext::<XorBackend>::init(HashAlgo::Sha256);
        let mut small = [0u8; 4];
        assert_eq!(ctx.finalize(&mut small), Err(VbError::DigestBufferTooSmall));
    }

    #[test]
    fn verify_hash_detects_mismatch() {
        let data = b"firmware body bytes";
        let mut good = [0u8; 32];
        let mut ctx = DigestContext::<XorBackend>::init(HashAlgo::Sha256);
        ctx.extend(data);
        ctx.finalize(&mut good).unwrap();
        assert!(verify_hash::<XorBackend>(HashAlgo::Sha256, data, &good).is_ok());
        let mut bad = good;
        bad[0] ^= 0xff;
        assert_eq!(verify_hash::<XorBackend>(HashAlgo::Sha256, data, &bad), Err(VbError::ShaMismatch));
    }

    #[test]
    fn crypto_to_hash_rejects_unknown_ids() {
        assert_eq!(crypto_to_hash(255), Err(VbError::CryptoAlgorithmInvalid));
        assert_eq!(crypto_to_hash(1), Ok(HashAlgo::Sha256));
    }
}
