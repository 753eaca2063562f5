//! Host capability interfaces (spec.md §6 "host callbacks required by the
//! core"). Each is a trait with one method per callback, the same split the
//! teacher draws between `bao1x-hal`'s hardware-backed traits and the
//! software fakes its test crates substitute in.

use crate::error::VbResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceIndex {
    Gbb,
    FwVblock,
}

/// Random-access read of firmware resources. Must copy exactly `buf.len()`
/// bytes or fail; assumed idempotent and side-effect-free (spec.md §5).
pub trait ResourceReader {
    fn read_resource(&self, index: ResourceIndex, offset: usize, buf: &mut [u8]) -> VbResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TpmMode {
    Enabled,
    Disabled,
}

pub trait Tpm {
    fn clear_owner(&mut self) -> VbResult<()>;
    fn set_mode(&mut self, mode: TpmMode) -> VbResult<()>;
}

/// Persists NV and secdata (spec.md §4.9). The engine calls this exactly
/// once per `commit`, with one re-attempt on secdata write failure.
pub trait CommitSink {
    fn commit_data(&mut self) -> VbResult<()>;
}

/// EC software-sync callbacks. Out of the verification core proper, but the
/// engine mediates recovery on their failure (spec.md §6), so the contract
/// lives here even though no pipeline stage in this crate calls it directly.
pub trait EcSync {
    fn ec_trusted(&self) -> bool;
    fn ec_running_rw(&self) -> VbResult<bool>;
    fn ec_hash_image(&self, out: &mut [u8]) -> VbResult<()>;
    fn ec_get_expected_image_hash(&self, out: &mut [u8]) -> VbResult<()>;
    fn ec_update_image(&mut self) -> VbResult<()>;
    fn ec_protect(&mut self) -> VbResult<()>;
    fn ec_jump_to_rw(&mut self) -> VbResult<()>;
    fn ec_vboot_done(&mut self) -> VbResult<()>;
}
