//! `Context`: the single locus of engine state for one boot attempt
//! (spec.md §9 "Global mutable state" — replaces the original source's
//! file-scope `LoadKernelParams` with a value threaded explicitly through
//! every call instead of living at process scope).
//!
//! `Context` owns the typed state (`NvContext`, secdata spaces,
//! `SharedState`) but not the host capabilities (`ResourceReader`, `Tpm`,
//! `CommitSink`, the hash/RSA backends) or the arena — those are borrowed
//! for the duration of each call, matching spec.md §9's "capability
//! interface... passed in at construction" for I/O while keeping the state
//! itself by-value and non-reentrant (spec.md §5).

use crate::digest::HashBackend;
use crate::error::{VbError, VbResult};
use crate::firmware;
use crate::hal::{ResourceReader, Tpm};
use crate::keys::{PublicKey, RsaBackend};
use crate::kernel;
use crate::nvdata::NvContext;
use crate::secdata::{SecdataFirmware, SecdataFwmp, SecdataKernel};
use crate::shared_state::SharedState;
use crate::structs::{NvRaw, SecdataFirmwareRaw, SecdataFwmpRaw, SecdataKernelRaw};
use crate::workbuf::WorkBuffer;

pub struct Context {
    pub nv: NvContext,
    pub secdata_fw: SecdataFirmware,
    pub secdata_kernel: Option<SecdataKernel>,
    pub secdata_fwmp: Option<SecdataFwmp>,
    pub state: SharedState,
    pub secdata_changed: bool,
}

/// Returned by `Context::init` when `secdata_firmware_init` fails, so the
/// caller still has somewhere to commit the resulting recovery request to.
/// No `Context` can be constructed without a valid `SecdataFirmware`, but the
/// `NvContext` has already been mutated by `api_fail` to carry the
/// `secdata-firmware-init` recovery request (spec.md §4.3: "outside recovery
/// the engine must surface this as a recovery request"); dropping it here
/// the way the error-only return used to would silently discard that write.
pub struct InitFailure {
    pub nv: NvContext,
    pub state: SharedState,
    pub error: VbError,
}

impl Context {
    /// spec.md §4.7 phase 1's NV/secdata-firmware leg. A secdata-firmware
    /// init failure is recorded via `api_fail` with reason
    /// `secdata-firmware-init` (spec.md §4.3) into the returned `NvContext`
    /// so the caller can still commit it.
    pub fn init(nv_raw: NvRaw, secdata_fw_raw: SecdataFirmwareRaw) -> Result<Self, InitFailure> {
        let mut nv = NvContext::init(nv_raw);
        let mut state = SharedState::new();
        match SecdataFirmware::init(secdata_fw_raw) {
            Ok(secdata_fw) => {
                Ok(Context { nv, secdata_fw, secdata_kernel: None, secdata_fwmp: None, state, secdata_changed: false })
            }
            Err(e) => {
                firmware::api_fail(&mut nv, &mut state, firmware::RECOVERY_SECDATA_FIRMWARE_INIT, e.subcode());
                Err(InitFailure { nv, state, error: e })
            }
        }
    }

    pub fn init_secdata_kernel(&mut self, raw: SecdataKernelRaw) -> VbResult<()> {
        match SecdataKernel::init(raw) {
            Ok(sd) => {
                self.state.secdata_kernel_version = sd.version();
                self.secdata_kernel = Some(sd);
                Ok(())
            }
            Err(e) => {
                firmware::api_fail(&mut self.nv, &mut self.state, kernel::RECOVERY_SECDATA_KERNEL_INIT, e.subcode());
                Err(e)
            }
        }
    }

    pub fn init_secdata_fwmp(&mut self, raw: SecdataFwmpRaw) -> VbResult<()> {
        self.secdata_fwmp = Some(SecdataFwmp::init(raw)?);
        Ok(())
    }

    pub fn run_firmware_phase1<R: ResourceReader, T: Tpm>(
        &mut self,
        host: &R,
        tpm: &mut T,
        wb: &mut WorkBuffer<'_>,
        manual_recovery_switch: bool,
        disable_developer_mode: bool,
    ) -> VbResult<()> {
        firmware::firmware_phase1(
            &mut self.nv,
            &mut self.secdata_fw,
            &mut self.state,
            host,
            tpm,
            wb,
            manual_recovery_switch,
            disable_developer_mode,
        )
    }

    /// spec.md §4.8 `kernel_phase1`, wired the same way as `run_firmware_phase1`:
    /// on failure (an out-of-bounds kernel subkey) the recovery request is
    /// recorded via `api_fail` before the error propagates.
    pub fn run_kernel_phase1<R: ResourceReader>(
        &mut self,
        host: &R,
        wb: &mut WorkBuffer<'_>,
        gbb: &crate::structs::GbbHeader,
        fw_preamble_buf: &[u8],
        fw_preamble: &crate::structs::PreambleHeader,
    ) -> VbResult<u32> {
        let in_recovery = self.state.recovery_mode();
        let sd_kernel = self.secdata_kernel.as_ref().ok_or(VbError::ApiPrecondition)?;
        match kernel::kernel_phase1(host, wb, gbb, fw_preamble_buf, fw_preamble, sd_kernel, in_recovery, &mut self.state) {
            Ok(version) => Ok(version),
            Err(e) => {
                firmware::api_fail(&mut self.nv, &mut self.state, kernel::RECOVERY_KERNEL_PREAMBLE, e.subcode());
                Err(e)
            }
        }
    }

    pub fn load_fw_keyblock<H: HashBackend, R: RsaBackend>(
        &mut self,
        rsa: &R,
        rootkey_buf: &[u8],
        keyblock_buf: &[u8],
        bypass_rollback: bool,
        scratch: &mut [u8],
    ) -> VbResult<(u32, usize)> {
        match firmware::load_fw_keyblock::<H, R>(
            rsa,
            rootkey_buf,
            keyblock_buf,
            self.secdata_fw.version(),
            bypass_rollback,
            scratch,
        ) {
            Ok((key_version, size)) => {
                self.state.fw_version = key_version << 16;
                Ok((key_version, size))
            }
            Err(e @ crate::error::VbError::KeyblockRollback) => {
                firmware::api_fail(&mut self.nv, &mut self.state, firmware::RECOVERY_FW_KEY_ROLLBACK, e.subcode());
                Err(e)
            }
            Err(e) => {
                firmware::api_fail(&mut self.nv, &mut self.state, firmware::RECOVERY_FW_KEYBLOCK, e.subcode());
                Err(e)
            }
        }
    }

    pub fn load_fw_preamble<H: HashBackend, R: RsaBackend>(
        &mut self,
        rsa: &R,
        data_key: &PublicKey<'_>,
        preamble_buf: &[u8],
        key_version: u32,
        bypass_rollback: bool,
        scratch: &mut [u8],
    ) -> VbResult<()> {
        match firmware::load_fw_preamble::<H, R>(
            rsa,
            data_key,
            preamble_buf,
            key_version,
            self.secdata_fw.version(),
            bypass_rollback,
            scratch,
        ) {
            Ok(fw_version) => {
                self.state.fw_version = fw_version;
                Ok(())
            }
            Err(e @ crate::error::VbError::PreambleRollback) => {
                firmware::api_fail(&mut self.nv, &mut self.state, firmware::RECOVERY_FW_ROLLBACK, e.subcode());
                Err(e)
            }
            Err(e) => {
                firmware::api_fail(&mut self.nv, &mut self.state, firmware::RECOVERY_FW_PREAMBLE, e.subcode());
                Err(e)
            }
        }
    }

    /// Applies the firmware roll-forward rule (spec.md §4.7 phase 3) after
    /// the caller has confirmed this boot will commit as successful.
    pub fn maybe_roll_forward_firmware(&mut self) -> VbResult<bool> {
        let candidate = self.state.fw_version;
        if crate::rollback::fw_roll_forward_allowed(
            self.secdata_fw.version(),
            candidate,
            self.state.last_boot_slot,
            self.state.fw_slot,
            self.state.last_boot_result,
        ) {
            self.secdata_fw.set_version(candidate)?;
            self.secdata_changed = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn kernel_phase3(
        &mut self,
        kernel_version: u32,
        allow_kernel_roll_forward: bool,
        kernel_max_rollforward: u32,
    ) -> VbResult<Option<u32>> {
        let in_recovery = self.state.recovery_mode();
        let fw_result_trying =
            self.nv.get(crate::nvdata::NvField::FwResult) == crate::shared_state::BootResult::Trying.to_nv();
        let sd_kernel = self.secdata_kernel.as_mut().ok_or(crate::error::VbError::ApiPrecondition)?;
        let result = kernel::kernel_phase3(
            sd_kernel,
            self.secdata_fwmp.as_ref(),
            kernel_version,
            in_recovery,
            allow_kernel_roll_forward,
            fw_result_trying,
            kernel_max_rollforward,
        )?;
        if result.is_some() {
            self.secdata_changed = true;
        }
        Ok(result)
    }

    pub fn commit<S: crate::hal::CommitSink>(&mut self, host: &mut S) -> VbResult<()> {
        crate::commit::commit(host, &mut self.nv, &mut self.state, self.secdata_changed)?;
        self.secdata_changed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvdata::NV_DEFAULT;
    use crate::secdata::SECDATA_FIRMWARE_VERSION;

    fn valid_secdata_fw_raw(version: u32) -> SecdataFirmwareRaw {
        let mut raw = SecdataFirmwareRaw {
            struct_version: SECDATA_FIRMWARE_VERSION,
            flags: 0,
            fw_versions: version.to_le_bytes(),
            reserved: [0; 4],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crate::crc8::crc8(&bytes[..bytes.len() - 1]);
        raw
    }

    #[test]
    fn init_fails_and_persists_recovery_request_in_nv() {
        let mut raw = valid_secdata_fw_raw(5);
        raw.crc ^= 0xff;
        let failure = Context::init(NV_DEFAULT, raw).unwrap_err();
        assert_eq!(failure.error, crate::error::VbError::SecdataCrc);
        assert!(failure.nv.changed());
        assert_eq!(
            failure.nv.get(crate::nvdata::NvField::RecoveryRequest),
            firmware::RECOVERY_SECDATA_FIRMWARE_INIT as u32
        );
        assert_eq!(
            failure.nv.get(crate::nvdata::NvField::RecoverySubcode),
            crate::error::VbError::SecdataCrc.subcode() as u32
        );
        assert_eq!(failure.state.recovery_reason, firmware::RECOVERY_SECDATA_FIRMWARE_INIT);
    }

    #[test]
    fn init_succeeds_on_well_formed_inputs() {
        let ctx = Context::init(NV_DEFAULT, valid_secdata_fw_raw(0x20002)).unwrap();
        assert_eq!(ctx.secdata_fw.version(), 0x20002);
        assert!(!ctx.state.recovery_mode());
    }
}
