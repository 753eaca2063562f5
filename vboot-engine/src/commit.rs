//! Commit hook (spec.md §4.9): the single call site that flushes NV and
//! secure-storage changes.

use crate::error::{VbError, VbResult};
use crate::hal::CommitSink;
use crate::nvdata::NvContext;
use crate::shared_state::SharedState;

pub const RECOVERY_RW_TPM_WRITE_ERROR: u16 = 0x52; // "rw-tpm-w-error"

/// Flushes NV first, then secure storage. On an NV write failure while not
/// already in recovery the engine cannot record a recovery request (it has
/// nowhere to write it), so the contract is to halt — callers map the
/// returned error to their own abort path (spec.md §7 "Fatal").
///
/// A secdata write failure outside recovery is recoverable: mark recovery
/// with `rw-tpm-w-error` and retry the flush exactly once before giving up.
pub fn commit<S: CommitSink>(
    host: &mut S,
    nv: &mut NvContext,
    state: &mut SharedState,
    secdata_changed: bool,
) -> VbResult<()> {
    if nv.changed() {
        host.commit_data().map_err(|_| VbError::NvWrite)?;
        nv.clear_changed();
    }

    if !secdata_changed {
        return Ok(());
    }

    match host.commit_data() {
        Ok(()) => Ok(()),
        Err(_) if state.recovery_mode() => Err(VbError::SecdataWrite),
        Err(_) => {
            state.set_recovery_reason_if_unset(RECOVERY_RW_TPM_WRITE_ERROR, VbError::SecdataWrite.subcode());
            host.commit_data().map_err(|_| VbError::SecdataWrite)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nvdata::NV_DEFAULT;

    struct FlakyHost {
        calls: u32,
        fail_first_n: u32,
    }

    impl CommitSink for FlakyHost {
        fn commit_data(&mut self) -> VbResult<()> {
            self.calls += 1;
            if self.calls <= self.fail_first_n { Err(VbError::SecdataWrite) } else { Ok(()) }
        }
    }

    #[test]
    fn commit_clears_nv_changed_on_success() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.set(crate::nvdata::NvField::TryNext, 1).unwrap();
        assert!(nv.changed());
        let mut host = FlakyHost { calls: 0, fail_first_n: 0 };
        let mut state = SharedState::new();
        commit(&mut host, &mut nv, &mut state, false).unwrap();
        assert!(!nv.changed());
    }

    #[test]
    fn commit_retries_secdata_write_once_outside_recovery() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.clear_changed();
        let mut host = FlakyHost { calls: 0, fail_first_n: 1 };
        let mut state = SharedState::new();
        assert!(commit(&mut host, &mut nv, &mut state, true).is_ok());
        assert_eq!(host.calls, 2);
        assert_eq!(state.recovery_reason, RECOVERY_RW_TPM_WRITE_ERROR);
    }

    #[test]
    fn commit_gives_up_after_one_retry() {
        let mut nv = NvContext::init(NV_DEFAULT);
        nv.clear_changed();
        let mut host = FlakyHost { calls: 0, fail_first_n: 5 };
        let mut state = SharedState::new();
        assert_eq!(commit(&mut host, &mut nv, &mut state, true), Err(VbError::SecdataWrite));
        assert_eq!(host.calls, 2);
    }
}
