//! Fixtures and fake capability implementations shared between this crate's
//! own tests and the scenario tests under `tests/`. Not part of the public
//! verification surface — gated behind `feature = "std"` since it leans on
//! `Vec` to build fixtures.

use crate::digest::{HashAlgo, HashBackend, MAX_DIGEST_SIZE};
use crate::error::VbResult;
use crate::hal::{CommitSink, ResourceIndex, ResourceReader, Tpm, TpmMode};
use crate::keys::{PublicKey, RsaBackend};

/// Deterministic non-cryptographic stand-in for a real SHA backend: XORs
/// bytes into a fixed-size accumulator. Exercises buffering/dispatch only.
#[derive(Default)]
pub struct XorBackend {
    acc: [u8; MAX_DIGEST_SIZE],
    len: usize,
}

impl HashBackend for XorBackend {
    fn init(_algo: HashAlgo) -> Self { XorBackend::default() }
    fn extend(&mut self, buf: &[u8]) {
        for (i, &b) in buf.iter().enumerate() {
            self.acc[(self.len + i) % MAX_DIGEST_SIZE] ^= b;
        }
        self.len += buf.len();
    }
    fn finalize(self, out: &mut [u8]) -> VbResult<()> {
        out.copy_from_slice(&self.acc[..out.len()]);
        Ok(())
    }
}

/// Treats `sig` as an already-padded EM block, verbatim. Lets scenario
/// fixtures build a valid PKCS#1 block directly instead of performing real
/// RSA modular exponentiation (which is the externally-supplied primitive
/// per spec.md §1).
pub struct IdentityRsa;

impl RsaBackend for IdentityRsa {
    fn modexp(&self, _key: &PublicKey<'_>, sig: &[u8], _scratch: &mut [u8], out: &mut [u8]) -> VbResult<()> {
        out.copy_from_slice(sig);
        Ok(())
    }
}

pub fn digest_info_prefix(algo: HashAlgo) -> &'static [u8] {
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

/// Computes the `XorBackend` digest of `covered` and builds a PKCS#1-v1.5 EM
/// block of `word_bytes` around it — the signature `IdentityRsa` will hand
/// straight back to the caller.
pub fn sign_with_xor(covered: &[u8], algo: HashAlgo, word_bytes: usize) -> Vec<u8> {
    let mut acc = [0u8; MAX_DIGEST_SIZE];
    for (i, &b) in covered.iter().enumerate() {
        acc[i % MAX_DIGEST_SIZE] ^= b;
    }
    let digest = &acc[..algo.digest_size()];
    let info = digest_info_prefix(algo);
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

pub fn packed_key_bytes(algorithm: u32, key_version: u32, arrsize_words: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16 + arrsize_words as usize * 8);
    buf.extend_from_slice(&algorithm.to_le_bytes());
    buf.extend_from_slice(&key_version.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // n0inv, unused by IdentityRsa fixtures
    buf.extend_from_slice(&arrsize_words.to_le_bytes());
    buf.extend(core::iter::repeat(0xabu8).take(arrsize_words as usize * 4)); // n
    buf.extend(core::iter::repeat(0xcdu8).take(arrsize_words as usize * 4)); // rr
    buf
}

pub struct FakeHost {
    pub gbb: Vec<u8>,
    pub vblock: Vec<u8>,
}

impl ResourceReader for FakeHost {
    fn read_resource(&self, index: ResourceIndex, offset: usize, buf: &mut [u8]) -> VbResult<()> {
        let src = match index {
            ResourceIndex::Gbb => &self.gbb,
            ResourceIndex::FwVblock => &self.vblock,
        };
        let end = offset + buf.len();
        if end > src.len() {
            return Err(crate::error::VbError::ResourceRead);
        }
        buf.copy_from_slice(&src[offset..end]);
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopTpm;

impl Tpm for NoopTpm {
    fn clear_owner(&mut self) -> VbResult<()> { Ok(()) }
    fn set_mode(&mut self, _mode: TpmMode) -> VbResult<()> { Ok(()) }
}

#[derive(Default)]
pub struct NoopCommit;

impl CommitSink for NoopCommit {
    fn commit_data(&mut self) -> VbResult<()> { Ok(()) }
}
