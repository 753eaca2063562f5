//! Anti-rollback policy (spec.md §4.7 rollback checks, §4.8 roll-forward cap,
//! §8 properties 6, 9, 10). Pure comparison/capping logic; no I/O, no state
//! of its own — callers thread secdata values through it.

use crate::error::{VbError, VbResult};
use crate::shared_state::BootResult;

/// `key_version < secdata_fw_version >> 16 ⇒ rollback`, unless `bypass` is set
/// (`gbb.disable_fw_rollback_check`, spec.md §8 property 6).
pub fn check_key_version_rollback(key_version: u32, secdata_fw_version: u32, bypass: bool) -> VbResult<()> {
    if bypass {
        return Ok(());
    }
    if key_version < (secdata_fw_version >> 16) {
        return Err(VbError::KeyblockRollback);
    }
    Ok(())
}

/// `fw_version ≥ secdata_fw_version`, unless bypassed (spec.md §4.7 phase 3).
pub fn check_fw_version_rollback(fw_version: u32, secdata_fw_version: u32, bypass: bool) -> VbResult<()> {
    if bypass {
        return Ok(());
    }
    if fw_version < secdata_fw_version {
        return Err(VbError::PreambleRollback);
    }
    Ok(())
}

/// Roll-forward is gated on all of: newer-than-secdata, the previous boot
/// used the same slot, and the previous boot's result was `Success`
/// (spec.md §4.7, §8 property 9).
pub fn fw_roll_forward_allowed(
    secdata_fw_version: u32,
    candidate_version: u32,
    last_boot_slot: u8,
    current_slot: u8,
    last_boot_result: Option<BootResult>,
) -> bool {
    candidate_version > secdata_fw_version
        && last_boot_slot == current_slot
        && last_boot_result == Some(BootResult::Success)
}

/// Kernel roll-forward additionally requires not being in recovery and an
/// explicit policy allowance (spec.md §4.8 `kernel_phase3`); those two
/// conditions are boolean flags the caller already has in hand.
pub fn kernel_roll_forward_allowed(
    secdata_kernel_version: u32,
    kernel_version: u32,
    kernel_signed: bool,
    in_recovery: bool,
    allow_kernel_roll_forward: bool,
) -> bool {
    kernel_version > secdata_kernel_version && kernel_signed && !in_recovery && allow_kernel_roll_forward
}

/// Caps the version written to secdata at `max(nv.kernel_max_rollforward,
/// secdata_kernel_start)` — i.e. the cap can never force the counter below
/// where it already was (spec.md §4.8, §8 property 10: "we are limiting
/// roll-*forward*, not allowing roll-*back*").
pub fn kernel_rollforward_cap(kernel_version_tpm: u32, max_rollforward: u32, secdata_kernel_start: u32) -> u32 {
    let floor = max_rollforward.max(secdata_kernel_start);
    kernel_version_tpm.min(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_version_rollback_rejected_unless_bypassed() {
        assert_eq!(
            check_key_version_rollback(1, 2 << 16, false),
            Err(VbError::KeyblockRollback)
        );
        assert!(check_key_version_rollback(1, 2 << 16, true).is_ok());
        assert!(check_key_version_rollback(2, 2 << 16, false).is_ok());
    }

    #[test]
    fn fw_version_rollback_rejected_unless_bypassed() {
        assert_eq!(check_fw_version_rollback(0x1_0001, 0x2_0002, false), Err(VbError::PreambleRollback));
        assert!(check_fw_version_rollback(0x1_0001, 0x2_0002, true).is_ok());
    }

    #[test]
    fn roll_forward_requires_same_slot_and_prior_success() {
        assert!(fw_roll_forward_allowed(0x20002, 0x20003, 0, 0, Some(BootResult::Success)));
        assert!(!fw_roll_forward_allowed(0x20002, 0x20003, 0, 1, Some(BootResult::Success)));
        assert!(!fw_roll_forward_allowed(0x20002, 0x20003, 0, 0, Some(BootResult::Trying)));
        assert!(!fw_roll_forward_allowed(0x20002, 0x20002, 0, 0, Some(BootResult::Success)));
    }

    #[test]
    fn kernel_cap_never_forces_counter_below_start() {
        assert_eq!(kernel_rollforward_cap(10, 0xffff_ffff, 3), 10);
        assert_eq!(kernel_rollforward_cap(10, 5, 7), 7);
        assert_eq!(kernel_rollforward_cap(2, 0, 7), 2);
    }
}
