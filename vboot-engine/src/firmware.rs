//! Firmware-verify pipeline (spec.md §4.7): phase 1 preflight, phase 2
//! keyblock, phase 3 preamble, plus the shared failure-recording helper used
//! by both the firmware and kernel pipelines (spec.md §7).

use crate::digest::HashBackend;
use crate::error::{VbError, VbResult};
use crate::hal::{ResourceReader, Tpm, TpmMode};
use crate::keys::{self, PublicKey, RsaBackend};
use crate::nvdata::{NvContext, NvField};
use crate::secdata::SecdataFirmware;
use crate::shared_state::{BootResult, SharedState, StatusFlags};
use crate::structs::{GbbFlags, KeyblockHeader, PreambleHeader, KEYBLOCK_MAGIC};
use crate::workbuf::WorkBuffer;

pub const RECOVERY_NOT_REQUESTED: u16 = 0x00;
pub const RECOVERY_RO_MANUAL: u16 = 0x01;
pub const RECOVERY_SECDATA_FIRMWARE_INIT: u16 = 0x02;
pub const RECOVERY_RO_TPM_CLEAR_OWNER: u16 = 0x03;
pub const RECOVERY_FW_KEYBLOCK: u16 = 0x04;
pub const RECOVERY_FW_KEY_ROLLBACK: u16 = 0x05;
pub const RECOVERY_FW_PREAMBLE: u16 = 0x06;
pub const RECOVERY_FW_ROLLBACK: u16 = 0x07;

/// Records a phase failure (spec.md §7 "Propagation policy"). If a slot has
/// already been chosen this boot, marks it failed and advances try-state
/// instead of requesting recovery; otherwise requests recovery, but never
/// overwrites an existing request.
pub fn api_fail(nv: &mut NvContext, state: &mut SharedState, reason: u16, subcode: u8) {
    if state.status.contains(StatusFlags::CHOSE_SLOT) {
        let _ = nv.set(NvField::FwResult, BootResult::Failure.to_nv());
        let _ = nv.set(NvField::TryCount, 0);
        let alternate = 1 - state.fw_slot as u32;
        let prev_tried = nv.get(NvField::FwPrevTried);
        let prev_result = BootResult::from_nv(nv.get(NvField::FwPrevResult));
        let alternate_already_failed = prev_tried == alternate && prev_result == BootResult::Failure;
        if !alternate_already_failed {
            let _ = nv.set(NvField::TryNext, alternate);
        }
    } else if nv.get(NvField::RecoveryRequest) == 0 {
        let _ = nv.set(NvField::RecoveryRequest, reason as u32);
        let _ = nv.set(NvField::RecoverySubcode, subcode as u32);
        state.set_recovery_reason_if_unset(reason, subcode);
    }
}

/// spec.md §4.7 `check_recovery`. `manual_recovery_switch` is the external
/// signal (e.g. a physical recovery button) the boot-path selector observes
/// before the core runs.
pub fn check_recovery(nv: &NvContext, state: &mut SharedState, manual_recovery_switch: bool) {
    if state.recovery_reason != 0 {
        // already set by an earlier phase; nothing to do.
    } else if nv.get(NvField::RecoveryRequest) != 0 {
        state.recovery_reason = nv.get(NvField::RecoveryRequest) as u16;
        state.recovery_subcode = nv.get(NvField::RecoverySubcode) as u8;
    } else if manual_recovery_switch {
        let subcode = nv.get(NvField::RecoverySubcode) as u8;
        if subcode == 0 {
            state.recovery_reason = RECOVERY_RO_MANUAL;
        } else {
            state.recovery_reason = subcode as u16;
        }
    }
}

/// spec.md §4.7 `check_dev_switch`.
pub fn check_dev_switch<T: Tpm>(
    nv: &mut NvContext,
    secdata_fw: &mut SecdataFirmware,
    gbb_flags: GbbFlags,
    tpm: &mut T,
    disable_developer_mode: bool,
) -> VbResult<()> {
    use crate::secdata::FirmwareFlags;

    let was_dev = secdata_fw.flags().contains(FirmwareFlags::LAST_BOOT_DEVELOPER);
    let mut dev_mode = was_dev;

    if nv.get(NvField::DisableDevRequest) != 0 {
        let mut flags = secdata_fw.flags();
        flags.remove(FirmwareFlags::LAST_BOOT_DEVELOPER);
        secdata_fw.set_flags(flags);
        dev_mode = false;
        nv.set(NvField::DisableDevRequest, 0)?;
    }

    if disable_developer_mode {
        dev_mode = false;
    }
    if gbb_flags.contains(GbbFlags::FORCE_DEV_SWITCH_ON) {
        dev_mode = true;
    }

    let mut flags = secdata_fw.flags();
    flags.set(FirmwareFlags::LAST_BOOT_DEVELOPER, dev_mode);
    secdata_fw.set_flags(flags);

    if dev_mode != was_dev {
        let mode = if dev_mode { TpmMode::Disabled } else { TpmMode::Enabled };
        if tpm.clear_owner().is_err() {
            return Err(VbError::TpmClearOwner);
        }
        tpm.set_mode(mode).map_err(|_| VbError::TpmSetMode)?;
    }

    Ok(())
}

/// spec.md §4.7 phase 1 `check_tpm_clear` (`vb2_check_tpm_clear` in the
/// original source). A pending `clear_tpm_owner_request` is cleared up front
/// so a repeated failure doesn't loop forever; success records
/// `clear_tpm_owner_done`, failure records the `tpm-clear-owner` recovery
/// reason via `api_fail` and propagates.
pub fn check_tpm_clear<T: Tpm>(nv: &mut NvContext, state: &mut SharedState, tpm: &mut T) -> VbResult<()> {
    if nv.get(NvField::ClearTpmOwnerRequest) == 0 {
        return Ok(());
    }
    nv.set(NvField::ClearTpmOwnerRequest, 0)?;
    match tpm.clear_owner() {
        Ok(()) => {
            nv.set(NvField::ClearTpmOwnerDone, 1)?;
            Ok(())
        }
        Err(e) => {
            api_fail(nv, state, RECOVERY_RO_TPM_CLEAR_OWNER, e.subcode());
            Err(e)
        }
    }
}

/// spec.md §4.7 `select_fw_slot`.
pub fn select_fw_slot(nv: &mut NvContext, state: &mut SharedState) -> VbResult<()> {
    let prev_tried = nv.get(NvField::FwTried);
    let prev_result = nv.get(NvField::FwResult);
    nv.set(NvField::FwPrevTried, prev_tried)?;
    nv.set(NvField::FwPrevResult, prev_result)?;

    state.last_boot_slot = prev_tried as u8;
    state.last_boot_result = Some(BootResult::from_nv(prev_result));

    nv.set(NvField::FwResult, BootResult::Unknown.to_nv())?;

    let mut try_next = nv.get(NvField::TryNext);
    let try_count = nv.get(NvField::TryCount);

    if BootResult::from_nv(prev_result) == BootResult::Trying && prev_tried == try_next && try_count == 0 {
        try_next = 1 - try_next;
        nv.set(NvField::TryNext, try_next)?;
    }

    if try_count > 0 {
        nv.set(NvField::FwResult, BootResult::Trying.to_nv())?;
        let nofail = false; // NOFAIL_BOOT context flag is a UI-level override, not modeled in core.
        if !nofail {
            nv.set(NvField::TryCount, try_count - 1)?;
        }
    }

    nv.set(NvField::FwTried, try_next)?;
    state.fw_slot = try_next as u8;
    state.status.insert(StatusFlags::CHOSE_SLOT);
    Ok(())
}

/// Phase 1 preflight: NV/secdata init, recovery determination, GBB read,
/// dev-switch handling, slot selection.
#[allow(clippy::too_many_arguments)]
pub fn firmware_phase1<R: ResourceReader, T: Tpm>(
    nv: &mut NvContext,
    secdata_fw: &mut SecdataFirmware,
    state: &mut SharedState,
    host: &R,
    tpm: &mut T,
    wb: &mut WorkBuffer<'_>,
    manual_recovery_switch: bool,
    disable_developer_mode: bool,
) -> VbResult<()> {
    state.status.insert(StatusFlags::NV_INIT);
    state.status.insert(StatusFlags::SECDATA_FIRMWARE_INIT);

    check_recovery(nv, state, manual_recovery_switch);

    crate::gbb::fw_init_gbb(host, wb, state)?;
    let gbb: crate::structs::GbbHeader = *bytemuck::from_bytes(wb.bytes(state.gbb));

    let gbb_flags = GbbFlags::from_bits_truncate(gbb.flags);
    if check_dev_switch(nv, secdata_fw, gbb_flags, tpm, disable_developer_mode).is_err() {
        api_fail(nv, state, RECOVERY_RO_TPM_CLEAR_OWNER, 0);
        return Err(VbError::TpmClearOwner);
    }

    check_tpm_clear(nv, state, tpm)?;

    select_fw_slot(nv, state)?;
    Ok(())
}

/// Phase 2: load and verify the root key and keyblock (spec.md §4.7).
/// `rootkey_buf`/`keyblock_buf` are scratch regions the caller has already
/// sized generously (the work-buffer realloc dance of the original source
/// collapses here to "caller passes a big-enough span"; `unpack_key`/
/// `KeyblockHeader::check_bounds` still perform the same bounds checks).
pub fn load_fw_keyblock<H: HashBackend, R: RsaBackend>(
    rsa: &R,
    rootkey_buf: &[u8],
    keyblock_buf: &[u8],
    secdata_fw_version: u32,
    bypass_rollback: bool,
    scratch: &mut [u8],
) -> VbResult<(u32, usize)> {
    let rootkey = keys::unpack_key(rootkey_buf)?;

    if keyblock_buf.len() < core::mem::size_of::<KeyblockHeader>() {
        return Err(VbError::KeyblockSize);
    }
    let kb_header: KeyblockHeader = *bytemuck::from_bytes(&keyblock_buf[..core::mem::size_of::<KeyblockHeader>()]);
    if kb_header.magic != KEYBLOCK_MAGIC {
        return Err(VbError::KeyblockMagic);
    }
    kb_header.check_bounds(keyblock_buf.len())?;

    // Signature covers everything up to the signature field itself (spec.md §3).
    let covered = &keyblock_buf[..kb_header.sig_offset as usize];
    let mut digest = [0u8; crate::digest::MAX_DIGEST_SIZE];
    let digest_size = rootkey.hash_alg.digest_size();
    let mut ctx = crate::digest::DigestContext::<H>::init(rootkey.hash_alg);
    ctx.extend(covered);
    ctx.finalize(&mut digest[..digest_size])?;

    let sig_region =
        &keyblock_buf[kb_header.sig_offset as usize..(kb_header.sig_offset + kb_header.sig_size) as usize];
    keys::verify_digest(rsa, &rootkey, sig_region, &digest[..digest_size], scratch)
        .map_err(|_| VbError::KeyblockSigInvalid)?;

    let data_key_buf = &keyblock_buf[kb_header.data_key_offset as usize
        ..(kb_header.data_key_offset + kb_header.data_key_size) as usize];
    let data_key = keys::unpack_key(data_key_buf)?;

    crate::rollback::check_key_version_rollback(
        data_key.key_version as u32,
        secdata_fw_version,
        bypass_rollback,
    )?;

    Ok((data_key.key_version as u32, kb_header.size as usize))
}

/// Phase 3: load and verify the preamble, accumulate the composed firmware
/// version, and check/return whether roll-forward should occur.
pub fn load_fw_preamble<H: HashBackend, R: RsaBackend>(
    rsa: &R,
    data_key: &PublicKey<'_>,
    preamble_buf: &[u8],
    key_version: u32,
    secdata_fw_version: u32,
    bypass_rollback: bool,
    scratch: &mut [u8],
) -> VbResult<u32> {
    if preamble_buf.len() < core::mem::size_of::<PreambleHeader>() {
        return Err(VbError::PreambleSize);
    }
    let preamble: PreambleHeader = *bytemuck::from_bytes(&preamble_buf[..core::mem::size_of::<PreambleHeader>()]);
    preamble.check_bounds(preamble_buf.len())?;

    if preamble.version > u16::MAX as u32 {
        return Err(VbError::PreambleVersionRange);
    }

    // Preamble signature covers everything up to its own signature field.
    let covered = &preamble_buf[..preamble.sig_offset as usize];
    let mut digest = [0u8; crate::digest::MAX_DIGEST_SIZE];
    let digest_size = data_key.hash_alg.digest_size();
    let mut ctx = crate::digest::DigestContext::<H>::init(data_key.hash_alg);
    ctx.extend(covered);
    ctx.finalize(&mut digest[..digest_size])?;

    let sig_region =
        &preamble_buf[preamble.sig_offset as usize..(preamble.sig_offset + preamble.sig_size) as usize];
    keys::verify_digest(rsa, data_key, sig_region, &digest[..digest_size], scratch)
        .map_err(|_| VbError::PreambleSigInvalid)?;

    let fw_version = (key_version << 16) | preamble.version;
    crate::rollback::check_fw_version_rollback(fw_version, secdata_fw_version, bypass_rollback)?;

    Ok(fw_version)
}

/// Body-hash streaming context (spec.md §4.7 "Body hash"): the firmware body
/// is streamed in by the host one chunk at a time and checked against the
/// preamble's `body_signature` once complete. The body digest is verified as
/// a signature under the already-verified data key, not merely compared as a
/// bare hash.
pub struct BodyHashContext<H: HashBackend> {
    digest: crate::digest::DigestContext<H>,
}

impl<H: HashBackend> BodyHashContext<H> {
    pub fn init(algo: crate::digest::HashAlgo) -> Self {
        BodyHashContext { digest: crate::digest::DigestContext::init(algo) }
    }

    pub fn extend(&mut self, buf: &[u8]) { self.digest.extend(buf); }

    /// Finalizes the streamed digest and verifies it against `preamble`'s
    /// `body_sig` field under `data_key`.
    pub fn check_hash<R: RsaBackend>(
        self,
        rsa: &R,
        data_key: &PublicKey<'_>,
        preamble_buf: &[u8],
        preamble: &PreambleHeader,
        scratch: &mut [u8],
    ) -> VbResult<()> {
        let digest_size = data_key.hash_alg.digest_size();
        let mut digest = [0u8; crate::digest::MAX_DIGEST_SIZE];
        self.digest.finalize(&mut digest[..digest_size])?;

        let sig_region = &preamble_buf[preamble.body_sig_offset as usize
            ..(preamble.body_sig_offset + preamble.body_sig_size) as usize];
        keys::verify_digest(rsa, data_key, sig_region, &digest[..digest_size], scratch)
            .map_err(|_| VbError::KeyblockSigInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvdata::NV_DEFAULT;
    use crate::secdata::SECDATA_FIRMWARE_VERSION;
    use crate::structs::SecdataFirmwareRaw;

    fn fresh_secdata_fw(version: u32) -> SecdataFirmware {
        let mut raw = SecdataFirmwareRaw {
            struct_version: SECDATA_FIRMWARE_VERSION,
            flags: 0,
            fw_versions: version.to_le_bytes(),
            reserved: [0; 4],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crate::crc8::crc8(&bytes[..bytes.len() - 1]);
        SecdataFirmware::init(raw).unwrap()
    }

    #[test]
    fn select_fw_slot_exhausts_try_count_and_flips_slot() {
        // S5: try_next=0, fw_tried=0, fw_result=TRYING, try_count=0.
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.set(NvField::TryNext, 0).unwrap();
        nv.set(NvField::FwTried, 0).unwrap();
        nv.set(NvField::FwResult, BootResult::Trying.to_nv()).unwrap();
        nv.set(NvField::TryCount, 0).unwrap();

        let mut state = SharedState::new();
        select_fw_slot(&mut nv, &mut state).unwrap();

        assert_eq!(nv.get(NvField::TryNext), 1);
        assert_eq!(state.fw_slot, 1);
    }

    #[test]
    fn select_fw_slot_decrements_try_count_when_positive() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.set(NvField::TryNext, 0).unwrap();
        nv.set(NvField::TryCount, 3).unwrap();

        let mut state = SharedState::new();
        select_fw_slot(&mut nv, &mut state).unwrap();

        assert_eq!(nv.get(NvField::TryCount), 2);
        assert_eq!(nv.get(NvField::FwResult), BootResult::Trying.to_nv());
    }

    #[test]
    fn api_fail_sets_recovery_request_only_once() {
        let mut nv = NvContext::init(NV_DEFAULT);
        let mut state = SharedState::new();
        api_fail(&mut nv, &mut state, RECOVERY_SECDATA_FIRMWARE_INIT, 7);
        api_fail(&mut nv, &mut state, RECOVERY_FW_KEYBLOCK, 9);

        assert_eq!(nv.get(NvField::RecoveryRequest), RECOVERY_SECDATA_FIRMWARE_INIT as u32);
        assert_eq!(nv.get(NvField::RecoverySubcode), 7);
        assert_eq!(state.recovery_reason, RECOVERY_SECDATA_FIRMWARE_INIT);
    }

    #[test]
    fn api_fail_after_slot_chosen_marks_failure_and_flips_try_next() {
        let mut nv = NvContext::init(NV_DEFAULT);
        let mut state = SharedState::new();
        select_fw_slot(&mut nv, &mut state).unwrap(); // chooses slot 0
        api_fail(&mut nv, &mut state, RECOVERY_FW_KEYBLOCK, 1);

        assert_eq!(nv.get(NvField::FwResult), BootResult::Failure.to_nv());
        assert_eq!(nv.get(NvField::TryCount), 0);
        assert_eq!(nv.get(NvField::TryNext), 1);
        // no recovery request: a slot was available to retry instead.
        assert_eq!(nv.get(NvField::RecoveryRequest), 0);
    }

    #[test]
    fn rollback_bypass_allows_older_key_version() {
        let secdata = fresh_secdata_fw(2 << 16);
        assert_eq!(
            crate::rollback::check_key_version_rollback(1, secdata.version(), false),
            Err(VbError::KeyblockRollback)
        );
        assert!(crate::rollback::check_key_version_rollback(1, secdata.version(), true).is_ok());
    }

    struct FakeTpm {
        clear_result: VbResult<()>,
    }

    impl crate::hal::Tpm for FakeTpm {
        fn clear_owner(&mut self) -> VbResult<()> { self.clear_result }
        fn set_mode(&mut self, _mode: crate::hal::TpmMode) -> VbResult<()> { Ok(()) }
    }

    #[test]
    fn check_tpm_clear_is_a_no_op_without_a_pending_request() {
        let mut nv = NvContext::init(NV_DEFAULT);
        let mut state = SharedState::new();
        let mut tpm = FakeTpm { clear_result: Err(VbError::TpmClearOwner) };
        assert!(check_tpm_clear(&mut nv, &mut state, &mut tpm).is_ok());
        assert!(!nv.changed());
    }

    #[test]
    fn check_tpm_clear_clears_request_and_marks_done_on_success() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.set(NvField::ClearTpmOwnerRequest, 1).unwrap();
        let mut state = SharedState::new();
        let mut tpm = FakeTpm { clear_result: Ok(()) };
        check_tpm_clear(&mut nv, &mut state, &mut tpm).unwrap();
        assert_eq!(nv.get(NvField::ClearTpmOwnerRequest), 0);
        assert_eq!(nv.get(NvField::ClearTpmOwnerDone), 1);
        assert_eq!(nv.get(NvField::RecoveryRequest), 0);
    }

    #[test]
    fn check_tpm_clear_requests_recovery_on_failure() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.set(NvField::ClearTpmOwnerRequest, 1).unwrap();
        let mut state = SharedState::new();
        let mut tpm = FakeTpm { clear_result: Err(VbError::TpmClearOwner) };
        assert_eq!(check_tpm_clear(&mut nv, &mut state, &mut tpm), Err(VbError::TpmClearOwner));
        assert_eq!(nv.get(NvField::ClearTpmOwnerRequest), 0);
        assert_eq!(nv.get(NvField::ClearTpmOwnerDone), 0);
        assert_eq!(nv.get(NvField::RecoveryRequest), RECOVERY_RO_TPM_CLEAR_OWNER as u32);
        assert_eq!(nv.get(NvField::RecoverySubcode), VbError::TpmClearOwner.subcode() as u32);
    }
}
