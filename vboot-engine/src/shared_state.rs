//! Engine-wide state carried across pipeline phases (spec.md §3 `SharedState`).
//!
//! Lives at a fixed slot the caller owns (not inside the arena itself, unlike
//! the original source's "record at arena offset 0" — offsets into the arena
//! are still how every variable-length artifact is addressed, matching the
//! `WorkBuffer::Span` offset/length pairs used throughout this crate instead
//! of raw pointers, for the relocation reasons in spec.md §9).

use crate::workbuf::Span;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct StatusFlags: u32 {
        const NV_INIT                = 1 << 0;
        const SECDATA_FIRMWARE_INIT  = 1 << 1;
        const SECDATA_KERNEL_INIT    = 1 << 2;
        const CHOSE_SLOT             = 1 << 3;
        const EC_SYNC_COMPLETE       = 1 << 4;
        const DISPLAY_AVAILABLE      = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootResult {
    Unknown,
    Trying,
    Success,
    Failure,
}

impl BootResult {
    pub fn from_nv(v: u32) -> Self {
        match v {
            1 => BootResult::Trying,
            2 => BootResult::Success,
            3 => BootResult::Failure,
            _ => BootResult::Unknown,
        }
    }

    pub fn to_nv(self) -> u32 {
        match self {
            BootResult::Unknown => 0,
            BootResult::Trying => 1,
            BootResult::Success => 2,
            BootResult::Failure => 3,
        }
    }
}

/// Engine-wide state. Fields mirror spec.md §3 exactly; `Span::empty()`
/// stands in for "offset is non-zero only when size is non-zero" — an empty
/// span has `len == 0` so the invariant is structural rather than a separate
/// nullability check.
#[derive(Default)]
pub struct SharedState {
    pub status: StatusFlags,
    pub recovery_reason: u16,
    pub recovery_subcode: u8,

    pub fw_slot: u8,
    pub last_boot_slot: u8,
    pub last_boot_result: Option<BootResult>,

    pub fw_version: u32,
    pub kernel_version: u32,

    pub secdata_fw_version: u32,
    pub secdata_kernel_version: u32,

    pub gbb: Span,
    pub fw_data_key: Span,
    pub fw_preamble: Span,
    pub kernel_data_key: Span,
    pub kernel_preamble: Span,
}

impl SharedState {
    pub fn new() -> Self { SharedState { last_boot_result: None, ..Default::default() } }

    pub fn recovery_mode(&self) -> bool { self.recovery_reason != 0 }

    /// Sets the recovery reason only if none is already present — "earlier,
    /// more specific reasons win" (spec.md §4.7 `check_recovery`, §7).
    pub fn set_recovery_reason_if_unset(&mut self, reason: u16, subcode: u8) {
        if self.recovery_reason == 0 {
            self.recovery_reason = reason;
            self.recovery_subcode = subcode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_reason_does_not_overwrite() {
        let mut s = SharedState::new();
        s.set_recovery_reason_if_unset(5, 1);
        s.set_recovery_reason_if_unset(9, 2);
        assert_eq!(s.recovery_reason, 5);
        assert_eq!(s.recovery_subcode, 1);
    }

    #[test]
    fn empty_span_has_zero_len() {
        let s = SharedState::new();
        assert_eq!(s.gbb, Span::empty());
        assert_eq!(s.gbb.len, 0);
    }

    #[test]
    fn boot_result_round_trips_through_nv_encoding() {
        for r in [BootResult::Unknown, BootResult::Trying, BootResult::Success, BootResult::Failure] {
            assert_eq!(BootResult::from_nv(r.to_nv()), r);
        }
    }
}
