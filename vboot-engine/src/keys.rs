//! Packed public keys and signatures, and RSA-over-arena verification.
//!
//! `unpack_key`/`verify_digest` operate purely on byte spans handed to them —
//! no allocation, no ownership of the underlying arena. The RSA modular
//! exponentiation itself is a capability (spec.md §1 lists "RSA verify" as an
//! external primitive); this module owns the packing format, bounds checks,
//! and PKCS#1-v1.5 padding comparison around that primitive, the same split
//! the teacher draws between `bao1x-hal::sigcheck` (orchestration) and the
//! `ed25519-dalek-bao1x` crate (the primitive).

use crate::digest::{crypto_to_hash, HashAlgo, HashBackend};
use crate::error::{VbError, VbResult};

/// One entry per vboot2 crypto-algorithm id: RSA key size in 32-bit words and
/// the hash algorithm it is paired with.
const ALGO_TABLE: [(usize, HashAlgo); 12] = [
    (32, HashAlgo::Sha1),    // RSA1024-SHA1
    (32, HashAlgo::Sha256),  // RSA1024-SHA256
    (32, HashAlgo::Sha512),  // RSA1024-SHA512
    (64, HashAlgo::Sha1),    // RSA2048-SHA1
    (64, HashAlgo::Sha256),  // RSA2048-SHA256
    (64, HashAlgo::Sha512),  // RSA2048-SHA512
    (128, HashAlgo::Sha1),   // RSA4096-SHA1
    (128, HashAlgo::Sha256), // RSA4096-SHA256
    (128, HashAlgo::Sha512), // RSA4096-SHA512
    (256, HashAlgo::Sha1),   // RSA8192-SHA1
    (256, HashAlgo::Sha256), // RSA8192-SHA256
    (256, HashAlgo::Sha512), // RSA8192-SHA512
];

/// Fixed-size header prefixing a packed key in flash/arena bytes:
/// `algorithm (u32) | key_version (u32) | n0inv (u32) | arrsize_words (u32)`,
/// followed by `arrsize` words of modulus `n` then `arrsize` words of the
/// Montgomery `rr` constant, all little-endian u32.
pub const PACKED_KEY_HEADER_LEN: usize = 16;

pub struct PublicKey<'a> {
    pub algorithm: u32,
    pub hash_alg: HashAlgo,
    pub key_version: u16,
    pub arrsize: usize,
    pub n0inv: u32,
    pub n: &'a [u8],
    pub rr: &'a [u8],
}

/// Parses a packed key out of `buf`. Every field is bounds-checked against
/// `buf.len()` before use; nothing here trusts the header's own claims about
/// length beyond that check.
pub fn unpack_key(buf: &[u8]) -> VbResult<PublicKey<'_>> {
    if buf.len() < PACKED_KEY_HEADER_LEN {
        return Err(VbError::UnpackKeySize);
    }
    let algorithm = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let key_version_raw = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if key_version_raw > u16::MAX as u32 {
        return Err(VbError::UnpackKeySize);
    }
    let n0inv = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    let arrsize_words = u32::from_le_bytes(buf[12..16].try_into().unwrap()) as usize;

    let (expected_arrsize, hash_alg) =
        *ALGO_TABLE.get(algorithm as usize).ok_or(VbError::UnpackKeyAlgorithm)?;
    if arrsize_words != expected_arrsize {
        return Err(VbError::UnpackKeyArraySize);
    }

    let word_bytes = arrsize_words * 4;
    let total = PACKED_KEY_HEADER_LEN + 2 * word_bytes;
    if buf.len() < total {
        return Err(VbError::UnpackKeySize);
    }
    let n = &buf[PACKED_KEY_HEADER_LEN..PACKED_KEY_HEADER_LEN + word_bytes];
    let rr = &buf[PACKED_KEY_HEADER_LEN + word_bytes..total];

    Ok(PublicKey {
        algorithm,
        hash_alg,
        key_version: key_version_raw as u16,
        arrsize: arrsize_words,
        n0inv,
        n,
        rr,
    })
}

/// Capability performing RSA modular exponentiation (`sig^e mod n`, with `e`
/// implied to be 65537 as in vboot2) using Montgomery parameters `n`/`rr`/`n0inv`
/// from an already-unpacked key. `scratch` is intermediate storage taken from
/// the arena, sized at least `key.n.len()` bytes; `out` receives the recovered
/// EM block (same length as `key.n`).
pub trait RsaBackend {
    fn modexp(&self, key: &PublicKey<'_>, sig: &[u8], scratch: &mut [u8], out: &mut [u8]) -> VbResult<()>;
}

/// Verifies `sig` is a valid PKCS#1-v1.5 signature of `digest` under `key`.
pub fn verify_digest<R: RsaBackend>(
    rsa: &R,
    key: &PublicKey<'_>,
    sig: &[u8],
    digest: &[u8],
    scratch: &mut [u8],
) -> VbResult<()> {
    let word_bytes = key.arrsize * 4;
    if sig.len() != word_bytes || scratch.len() < word_bytes {
        return Err(VbError::UnpackKeySize);
    }
    if digest.len() != key.hash_alg.digest_size() {
        return Err(VbError::UnpackKeyHash);
    }

    let mut em = [0u8; 1024]; // supports up to RSA8192 (arrsize 256 words)
    let em = &mut em[..word_bytes];
    rsa.modexp(key, sig, scratch, em)?;

    // PKCS#1-v1.5: 0x00 0x01 FF..FF 0x00 || DigestInfo(hash_alg) || digest
    if em[0] != 0x00 || em[1] != 0x01 {
        return Err(VbError::KeyblockSigInvalid);
    }
    let digest_info = digest_info_prefix(key.hash_alg);
    let tail_len = digest_info.len() + digest.len();
    if word_bytes < tail_len + 3 {
        return Err(VbError::KeyblockSigInvalid);
    }
    let pad_end = word_bytes - tail_len;
    if em[pad_end - 1] != 0x00 {
        return Err(VbError::KeyblockSigInvalid);
    }
    if em[2..pad_end - 1].iter().any(|&b| b != 0xff) {
        return Err(VbError::KeyblockSigInvalid);
    }
    if &em[pad_end..pad_end + digest_info.len()] != digest_info {
        return Err(VbError::KeyblockSigInvalid);
    }
    if &em[pad_end + digest_info.len()..] != digest {
        return Err(VbError::KeyblockSigInvalid);
    }
    Ok(())
}

fn digest_info_prefix(algo: HashAlgo) -> &'static [u8] {
    match algo {
        HashAlgo::Sha1 => &[0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14],
        HashAlgo::Sha256 => &[
            0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05, 0x00,
            0x04, 0x20,
        ],
        HashAlgo::Sha512 => &[
            0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05, 0x00,
            0x04, 0x40,
        ],
    }
}

/// Convenience helper used by keyblock/preamble verification: hash a byte
/// span with the given algorithm and compare against a digest, without
/// needing to name a `DigestContext` at the call site.
pub fn hash_matches<H: HashBackend>(algo: HashAlgo, buf: &[u8], expect: &[u8]) -> VbResult<()> {
    crate::digest::verify_hash::<H>(algo, buf, expect)
}

/// Resolves the hash algorithm implied by a key's `algorithm` id, for callers
/// that only have the raw id (e.g. reading it straight out of a `Keyblock`).
pub fn hash_algo_for(algorithm: u32) -> VbResult<HashAlgo> { crypto_to_hash(algorithm) }

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(algorithm: u32, key_version: u32, n0inv: u32, arrsize: u32) -> [u8; PACKED_KEY_HEADER_LEN] {
        let mut buf = [0u8; PACKED_KEY_HEADER_LEN];
        buf[0..4].copy_from_slice(&algorithm.to_le_bytes());
        buf[4..8].copy_from_slice(&key_version.to_le_bytes());
        buf[8..12].copy_from_slice(&n0inv.to_le_bytes());
        buf[12..16].copy_from_slice(&arrsize.to_le_bytes());
        buf
    }

    #[test]
    fn unpack_key_rejects_unknown_algorithm() {
        let mut buf = header_bytes(99, 1, 0, 32).to_vec();
        buf.extend(core::iter::repeat(0u8).take(32 * 4 * 2));
        assert_eq!(unpack_key(&buf), Err(VbError::UnpackKeyAlgorithm));
    }

    #[test]
    fn unpack_key_rejects_mismatched_array_size() {
        // algorithm 1 (RSA1024-SHA256) expects arrsize 32, we claim 64.
        let mut buf = header_bytes(1, 1, 0, 64).to_vec();
        buf.extend(core::iter::repeat(0u8).take(64 * 4 * 2));
        assert_eq!(unpack_key(&buf), Err(VbError::UnpackKeyArraySize));
    }

    #[test]
    fn unpack_key_rejects_truncated_buffer() {
        let buf = header_bytes(1, 1, 0, 32);
        assert_eq!(unpack_key(&buf), Err(VbError::UnpackKeySize));
    }

    #[test]
    fn unpack_key_accepts_well_formed_buffer() {
        let mut buf = header_bytes(1, 2, 0xdead_beef, 32).to_vec();
        buf.extend(core::iter::repeat(0xabu8).take(32 * 4));
        buf.extend(core::iter::repeat(0xcdu8).take(32 * 4));
        let key = unpack_key(&buf).unwrap();
        assert_eq!(key.key_version, 2);
        assert_eq!(key.hash_alg, HashAlgo::Sha256);
        assert_eq!(key.arrsize, 32);
        assert_eq!(key.n[0], 0xab);
        assert_eq!(key.rr[0], 0xcd);
    }

    struct IdentityRsa;
    impl RsaBackend for IdentityRsa {
        // Test double: treats `sig` as already being the padded EM block, so
        // verify_digest exercises the PKCS#1 comparison logic in isolation
        // from any real modexp implementation.
        fn modexp(&self, _key: &PublicKey<'_>, sig: &[u8], _scratch: &mut [u8], out: &mut [u8]) -> VbResult<()> {
            out.copy_from_slice(sig);
            Ok(())
        }
    }

    fn build_em(word_bytes: usize, hash_alg: HashAlgo, digest: &[u8]) -> Vec<u8> {
        let info = digest_info_prefix(hash_alg);
        let tail_len = info.len() + digest.len();
        let mut em = vec![0xffu8; word_bytes];
        em[0] = 0x00;
        em[1] = 0x01;
        let pad_end = word_bytes - tail_len;
        em[pad_end - 1] = 0x00;
        em[pad_end..pad_end + info.len()].copy_from_slice(info);
        em[pad_end + info.len()..].copy_from_slice(digest);
        em
    }

    #[test]
    fn verify_digest_accepts_well_formed_padding() {
        let mut buf = header_bytes(1, 1, 0, 32).to_vec();
        buf.extend(core::iter::repeat(0u8).take(32 * 4 * 2));
        let key = unpack_key(&buf).unwrap();
        let digest = [0x42u8; 32];
        let em = build_em(32 * 4, HashAlgo::Sha256, &digest);
        let mut scratch = [0u8; 128];
        assert!(verify_digest(&IdentityRsa, &key, &em, &digest, &mut scratch).is_ok());
    }

    #[test]
    fn verify_digest_rejects_flipped_bit() {
        let mut buf = header_bytes(1, 1, 0, 32).to_vec();
        buf.extend(core::iter::repeat(0u8).take(32 * 4 * 2));
        let key = unpack_key(&buf).unwrap();
        let digest = [0x42u8; 32];
        let mut em = build_em(32 * 4, HashAlgo::Sha256, &digest);
        *em.last_mut().unwrap() ^= 0x01;
        let mut scratch = [0u8; 128];
        assert_eq!(verify_digest(&IdentityRsa, &key, &em, &digest, &mut scratch), Err(VbError::KeyblockSigInvalid));
    }
}
