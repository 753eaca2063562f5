//! Boot-path selector (spec.md §4.7 "Boot-path selector"). Only the normal
//! path's decision logic lives in the core; developer/recovery/diagnostic
//! are UI collaborators that call back into `TryLoadKernel` — this module
//! only decides *which* path applies, not what that path does once chosen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPath {
    Normal,
    Developer,
    Recovery,
    Diagnostic,
}

/// External signals observed before the core pipeline runs (spec.md §5: the
/// core never polls these itself; a UI collaborator samples them once per
/// boot and passes the result in).
#[derive(Debug, Clone, Copy, Default)]
pub struct BootSignals {
    pub recovery_switch: bool,
    pub developer_mode: bool,
    pub diagnostic_request: bool,
}

/// Recovery takes priority over diagnostic, which takes priority over
/// developer; normal is the default when no signal and no pending NV
/// recovery request apply.
pub fn select_boot_path(signals: BootSignals, recovery_reason: u16) -> BootPath {
    if signals.recovery_switch || recovery_reason != 0 {
        BootPath::Recovery
    } else if signals.diagnostic_request {
        BootPath::Diagnostic
    } else if signals.developer_mode {
        BootPath::Developer
    } else {
        BootPath::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_switch_wins_over_every_other_signal() {
        let signals =
            BootSignals { recovery_switch: true, developer_mode: true, diagnostic_request: true };
        assert_eq!(select_boot_path(signals, 0), BootPath::Recovery);
    }

    #[test]
    fn pending_nv_recovery_request_forces_recovery_path() {
        let signals = BootSignals::default();
        assert_eq!(select_boot_path(signals, 0x05), BootPath::Recovery);
    }

    #[test]
    fn diagnostic_outranks_developer() {
        let signals = BootSignals { recovery_switch: false, developer_mode: true, diagnostic_request: true };
        assert_eq!(select_boot_path(signals, 0), BootPath::Diagnostic);
    }

    #[test]
    fn defaults_to_normal_path() {
        assert_eq!(select_boot_path(BootSignals::default(), 0), BootPath::Normal);
    }
}
