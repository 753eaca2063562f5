//! Kernel-verify pipeline (spec.md §4.8).

use crate::digest::HashBackend;
use crate::error::{VbError, VbResult};
use crate::hal::{ResourceIndex, ResourceReader};
use crate::keys::{self, PublicKey, RsaBackend};
use crate::nvdata::{NvContext, NvField};
use crate::rollback;
use crate::secdata::{SecdataFwmp, SecdataKernel};
use crate::shared_state::SharedState;
use crate::structs::{GbbHeader, PreambleHeader};
use crate::workbuf::WorkBuffer;

pub const RECOVERY_SECDATA_KERNEL_INIT: u16 = 0x20;
pub const RECOVERY_KERNEL_KEYBLOCK: u16 = 0x21;
pub const RECOVERY_KERNEL_PREAMBLE: u16 = 0x22;
pub const RECOVERY_KERNEL_ROLLBACK: u16 = 0x23;

/// spec.md §4.8 `kernel_phase1`: record the kernel-TPM version, then select
/// the key source phase 2 loads from — the GBB recovery key in recovery
/// mode, otherwise the firmware preamble's kernel subkey — bounds-checking
/// the chosen region and recording it as `state.kernel_data_key`.
pub fn kernel_phase1<R: ResourceReader>(
    host: &R,
    wb: &mut WorkBuffer<'_>,
    gbb: &GbbHeader,
    fw_preamble_buf: &[u8],
    fw_preamble: &PreambleHeader,
    secdata_kernel: &SecdataKernel,
    in_recovery: bool,
    state: &mut SharedState,
) -> VbResult<u32> {
    state.secdata_kernel_version = secdata_kernel.version();

    let span = if in_recovery {
        let span = wb.alloc(gbb.recovery_key_size as usize)?;
        host.read_resource(ResourceIndex::Gbb, gbb.recovery_key_offset as usize, wb.bytes_mut(span))?;
        span
    } else {
        let offset = fw_preamble.kernel_subkey_offset as usize;
        let size = fw_preamble.kernel_subkey_size as usize;
        if size != 0 && offset.checked_add(size).map(|end| end > fw_preamble_buf.len()).unwrap_or(true) {
            return Err(VbError::PreambleSize);
        }
        let span = wb.alloc(size)?;
        if size != 0 {
            wb.bytes_mut(span).copy_from_slice(&fw_preamble_buf[offset..offset + size]);
        }
        span
    };
    state.kernel_data_key = span;
    Ok(state.secdata_kernel_version)
}

/// spec.md §4.8 `load_kernel_vblock`: reuse of the firmware keyblock/preamble
/// verification logic, but keyed by the kernel subkey (or recovery key in
/// recovery mode) and `secdata_kernel`'s version instead of firmware's.
pub fn load_kernel_vblock<H: HashBackend, R: RsaBackend>(
    rsa: &R,
    subkey_buf: &[u8],
    keyblock_buf: &[u8],
    secdata_kernel_version: u32,
    bypass_rollback: bool,
    scratch: &mut [u8],
) -> VbResult<(u32, usize)> {
    crate::firmware::load_fw_keyblock::<H, R>(
        rsa,
        subkey_buf,
        keyblock_buf,
        secdata_kernel_version,
        bypass_rollback,
        scratch,
    )
}

/// spec.md §4.8 `verify_kernel_data`: the body size must match the
/// preamble's declared `body_data_size` exactly, then the streamed digest is
/// verified as a signature under the kernel data key.
pub fn verify_kernel_data<H: HashBackend, R: RsaBackend>(
    rsa: &R,
    data_key: &PublicKey<'_>,
    preamble: &PreambleHeader,
    preamble_buf: &[u8],
    body: &[u8],
    scratch: &mut [u8],
) -> VbResult<()> {
    if body.len() != preamble.body_data_size as usize {
        return Err(VbError::PreambleSize);
    }

    let digest_size = data_key.hash_alg.digest_size();
    let mut digest = [0u8; crate::digest::MAX_DIGEST_SIZE];
    let mut ctx = crate::digest::DigestContext::<H>::init(data_key.hash_alg);
    ctx.extend(body);
    ctx.finalize(&mut digest[..digest_size])?;

    let sig_region = &preamble_buf[preamble.body_sig_offset as usize
        ..(preamble.body_sig_offset + preamble.body_sig_size) as usize];
    keys::verify_digest(rsa, data_key, sig_region, &digest[..digest_size], scratch)
        .map_err(|_| VbError::KeyblockSigInvalid)
}

/// spec.md §4.8 `kernel_phase3` plus the normal-boot cap. Returns `Some(new_version)`
/// when the engine should write the advanced version to `secdata_kernel`.
#[allow(clippy::too_many_arguments)]
pub fn kernel_phase3(
    secdata_kernel: &mut SecdataKernel,
    fwmp: Option<&SecdataFwmp>,
    kernel_version: u32,
    in_recovery: bool,
    allow_kernel_roll_forward: bool,
    fw_result_trying: bool,
    kernel_max_rollforward: u32,
) -> VbResult<Option<u32>> {
    if fw_result_trying {
        return Ok(None);
    }

    let kernel_signed = fwmp.is_none() || !fwmp.unwrap().get_flag(crate::secdata::FwmpFlags::DEV_DISABLE_BOOT);

    if !rollback::kernel_roll_forward_allowed(
        secdata_kernel.version(),
        kernel_version,
        kernel_signed,
        in_recovery,
        allow_kernel_roll_forward,
    ) {
        return Ok(None);
    }

    let capped = rollback::kernel_rollforward_cap(kernel_version, kernel_max_rollforward, secdata_kernel.version());
    secdata_kernel.set_version(capped)?;
    Ok(Some(capped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secdata::{SECDATA_KERNEL_VERSION};
    use crate::structs::SecdataKernelRaw;

    fn fresh_secdata_kernel(version: u32) -> SecdataKernel {
        let mut raw = SecdataKernelRaw {
            struct_version: SECDATA_KERNEL_VERSION,
            uid: 0,
            kernel_versions: version.to_le_bytes(),
            reserved: [0; 6],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crate::crc8::crc8(&bytes[..bytes.len() - 1]);
        SecdataKernel::init(raw).unwrap()
    }

    #[test]
    fn phase3_skips_advance_when_fw_result_trying() {
        let mut sd = fresh_secdata_kernel(1);
        let result = kernel_phase3(&mut sd, None, 5, false, true, true, 0xffff_ffff).unwrap();
        assert_eq!(result, None);
        assert_eq!(sd.version(), 1);
    }

    #[test]
    fn phase3_advances_and_caps_when_allowed() {
        let mut sd = fresh_secdata_kernel(1);
        let result = kernel_phase3(&mut sd, None, 10, false, true, false, 5).unwrap();
        assert_eq!(result, Some(5));
        assert_eq!(sd.version(), 5);
    }

    #[test]
    fn phase3_skips_advance_in_recovery() {
        let mut sd = fresh_secdata_kernel(1);
        let result = kernel_phase3(&mut sd, None, 10, true, true, false, 0xffff_ffff).unwrap();
        assert_eq!(result, None);
        assert_eq!(sd.version(), 1);
    }

    fn empty_gbb() -> GbbHeader {
        GbbHeader {
            magic: crate::structs::GBB_MAGIC,
            major_version: 1,
            minor_version: 1,
            header_size: core::mem::size_of::<GbbHeader>() as u32,
            flags: 0,
            hwid_offset: 0,
            hwid_size: 0,
            rootkey_offset: 0,
            rootkey_size: 0,
            bmpfv_offset: 0,
            bmpfv_size: 0,
            recovery_key_offset: 0,
            recovery_key_size: 16,
        }
    }

    fn empty_fw_preamble(subkey_offset: u32, subkey_size: u32) -> PreambleHeader {
        PreambleHeader {
            size: 0,
            header_version: 0,
            version: 0,
            kernel_subkey_offset: subkey_offset,
            kernel_subkey_size: subkey_size,
            body_digest_offset: 0,
            body_digest_size: 0,
            body_sig_offset: 0,
            body_sig_size: 0,
            body_data_size: 0,
            flags: 0,
            sig_offset: 0,
            sig_size: 0,
        }
    }

    #[test]
    fn phase1_in_recovery_loads_key_from_gbb_recovery_region() {
        let gbb = empty_gbb();
        let recovery_key_bytes = vec![0xabu8; gbb.recovery_key_size as usize];
        let host = crate::test_support::FakeHost { gbb: recovery_key_bytes.clone(), vblock: Vec::new() };
        let mut arena = [0u8; 256];
        let mut wb = WorkBuffer::init(&mut arena);
        let mut state = SharedState::new();
        let sd = fresh_secdata_kernel(3);
        let preamble = empty_fw_preamble(0, 0);

        let version = kernel_phase1(&host, &mut wb, &gbb, &[], &preamble, &sd, true, &mut state).unwrap();

        assert_eq!(version, 3);
        assert_eq!(state.kernel_data_key.len, gbb.recovery_key_size as usize);
        assert_eq!(wb.bytes(state.kernel_data_key), &recovery_key_bytes[..]);
    }

    #[test]
    fn phase1_outside_recovery_loads_key_from_firmware_preamble_subkey() {
        let gbb = empty_gbb();
        let host = crate::test_support::FakeHost { gbb: Vec::new(), vblock: Vec::new() };
        let mut arena = [0u8; 256];
        let mut wb = WorkBuffer::init(&mut arena);
        let mut state = SharedState::new();
        let sd = fresh_secdata_kernel(3);

        let mut preamble_buf = vec![0u8; 32];
        let subkey = [0xcdu8; 12];
        preamble_buf[4..4 + subkey.len()].copy_from_slice(&subkey);
        let preamble = empty_fw_preamble(4, subkey.len() as u32);

        let version = kernel_phase1(&host, &mut wb, &gbb, &preamble_buf, &preamble, &sd, false, &mut state).unwrap();

        assert_eq!(version, 3);
        assert_eq!(state.kernel_data_key.len, subkey.len());
        assert_eq!(wb.bytes(state.kernel_data_key), &subkey[..]);
    }

    #[test]
    fn phase1_allows_zero_size_subkey_with_out_of_bounds_offset() {
        // Mirrors PreambleHeader::check_bounds's own exception: an offset is
        // only meaningful when the declared size is non-zero.
        let gbb = empty_gbb();
        let host = crate::test_support::FakeHost { gbb: Vec::new(), vblock: Vec::new() };
        let mut arena = [0u8; 256];
        let mut wb = WorkBuffer::init(&mut arena);
        let mut state = SharedState::new();
        let sd = fresh_secdata_kernel(3);

        let preamble_buf = vec![0u8; 8];
        let preamble = empty_fw_preamble(1000, 0);

        let version = kernel_phase1(&host, &mut wb, &gbb, &preamble_buf, &preamble, &sd, false, &mut state).unwrap();
        assert_eq!(version, 3);
        assert_eq!(state.kernel_data_key.len, 0);
    }

    #[test]
    fn phase1_rejects_out_of_bounds_subkey_region() {
        let gbb = empty_gbb();
        let host = crate::test_support::FakeHost { gbb: Vec::new(), vblock: Vec::new() };
        let mut arena = [0u8; 256];
        let mut wb = WorkBuffer::init(&mut arena);
        let mut state = SharedState::new();
        let sd = fresh_secdata_kernel(3);

        let preamble_buf = vec![0u8; 8];
        let preamble = empty_fw_preamble(4, 16); // extends past preamble_buf

        assert_eq!(
            kernel_phase1(&host, &mut wb, &gbb, &preamble_buf, &preamble, &sd, false, &mut state),
            Err(VbError::PreambleSize)
        );
    }
}
