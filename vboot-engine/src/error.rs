//! Error kinds returned by every engine operation.
//!
//! Flat enum, no `thiserror` — matches the hand-written error enums used
//! elsewhere in this tree (`OneWayErr`, `MboxError`, `protected_rram::Error`).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbError {
    WorkbufExhausted,
    WorkbufNotLastAlloc,
    ResourceRead,

    GbbMagic,
    GbbVersion,
    GbbTooOld,
    GbbHeaderSize,

    NvCrc,
    NvUnknownField,
    NvWrite,

    SecdataCrc,
    SecdataRange,
    SecdataWrite,
    SecdataVersion,

    UnpackKeyAlgorithm,
    UnpackKeyHash,
    UnpackKeySize,
    UnpackKeyArraySize,
    UnpackKeyPublicExponent,

    KeyblockMagic,
    KeyblockSize,
    KeyblockSigInvalid,
    KeyblockRollback,

    PreambleSize,
    PreambleSigInvalid,
    PreambleRollback,
    PreambleVersionRange,

    ApiPrecondition,

    EcSyncHash,
    EcSyncUpdate,
    EcSyncJump,
    EcSyncProtect,
    EcSyncExpected,
    EcSyncImage,
    EcSyncSize,

    ShutdownRequested,
    RebootRequired,
    EcRebootRoRequired,
    TpmSetMode,
    TpmClearOwner,

    ShaInit,
    ShaExtend,
    ShaFinalize,
    ShaMismatch,

    DigestBufferTooSmall,
    CryptoAlgorithmInvalid,

    ParameterError,
}

impl VbError {
    /// Low byte of a stable, source-order discriminant. Used when an error must be
    /// squeezed into an 8-bit NV subcode field (spec.md §4.3, §6).
    pub fn subcode(self) -> u8 { (self as u32 as u8) }
}

impl fmt::Display for VbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

#[cfg(feature = "std")]
impl std::error::Error for VbError {}

pub type VbResult<T> = Result<T, VbError>;
