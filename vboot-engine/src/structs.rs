//! On-flash / on-wire record layouts. `#[repr(C)]` + `bytemuck::Pod` mirrors
//! `bao1x_api::signatures::{SignatureInFlash, SealedFields, Pubkey}` — the
//! same zero-copy, offset-addressed approach applied here to GBB/keyblock/
//! preamble records instead of the teacher's single signature block.

use bytemuck::{Pod, Zeroable};

pub const GBB_MAGIC: [u8; 8] = *b"GBBGBBGB";
pub const GBB_MINOR_MIN: u16 = 1;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct GbbHeader {
    pub magic: [u8; 8],
    pub major_version: u16,
    pub minor_version: u16,
    pub header_size: u32,
    pub flags: u32,
    pub hwid_offset: u32,
    pub hwid_size: u32,
    pub rootkey_offset: u32,
    pub rootkey_size: u32,
    pub bmpfv_offset: u32,
    pub bmpfv_size: u32,
    pub recovery_key_offset: u32,
    pub recovery_key_size: u32,
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct GbbFlags: u32 {
        const DEV_SCREEN_SHORT_DELAY   = 1 << 0;
        const FORCE_DEV_SWITCH_ON      = 1 << 1;
        const FORCE_DEV_BOOT_USB       = 1 << 2;
        const DISABLE_FW_ROLLBACK_CHECK = 1 << 3;
        const ENTER_TRIGGERS_TONORM    = 1 << 4;
        const FORCE_DEV_BOOT_LEGACY    = 1 << 5;
        const FAAFT_KEY_OVERRIDE       = 1 << 6;
        const DISABLE_EC_SOFTWARE_SYNC = 1 << 7;
        const DEFAULT_DEV_BOOT_LEGACY  = 1 << 8;
        const FORCE_DEV_BOOT_FASTBOOT_FULL_CAP = 1 << 9;
        const ENABLE_SERIAL            = 1 << 10;
        const DISABLE_PHYSICAL_DEV_SWITCH = 1 << 11;
        const DISABLE_FW_ROLLBACK_CHECK_KERNEL = 1 << 12;
    }
}

impl GbbHeader {
    pub fn validate(&self, minor_min: u16) -> Result<(), crate::error::VbError> {
        use crate::error::VbError;
        if self.magic != GBB_MAGIC {
            return Err(VbError::GbbMagic);
        }
        if self.major_version != 1 {
            return Err(VbError::GbbVersion);
        }
        if self.minor_version < minor_min {
            return Err(VbError::GbbTooOld);
        }
        if (self.header_size as usize) < core::mem::size_of::<GbbHeader>() {
            return Err(VbError::GbbHeaderSize);
        }
        Ok(())
    }
}

/// `{magic, version, size, data_key (packed, variable-length, follows inline),
/// keyblock_hash, keyblock_signature}`. The fixed portion below carries
/// offsets into the surrounding buffer for the variable pieces, the same
/// pattern `PackedKeyHeader` uses for its modulus/rr arrays.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct KeyblockHeader {
    pub magic: [u8; 8],
    pub size: u32,
    pub data_key_algorithm: u32,
    pub data_key_version: u32,
    pub data_key_offset: u32,
    pub data_key_size: u32,
    pub hash_offset: u32,
    pub hash_size: u32,
    pub sig_offset: u32,
    pub sig_size: u32,
}

pub const KEYBLOCK_MAGIC: [u8; 8] = *b"CHROMEOS";

impl KeyblockHeader {
    /// Bounds-checks that `hash`, `sig`, and `data_key` each lie fully inside
    /// a buffer of `total_size` bytes.
    pub fn check_bounds(&self, total_size: usize) -> Result<(), crate::error::VbError> {
        use crate::error::VbError;
        if self.magic != KEYBLOCK_MAGIC {
            return Err(VbError::KeyblockMagic);
        }
        if self.size as usize != total_size {
            return Err(VbError::KeyblockSize);
        }
        let in_bounds = |off: u32, size: u32| -> bool {
            let off = off as usize;
            let size = size as usize;
            off.checked_add(size).map(|end| end <= total_size).unwrap_or(false)
        };
        if !in_bounds(self.data_key_offset, self.data_key_size)
            || !in_bounds(self.hash_offset, self.hash_size)
            || !in_bounds(self.sig_offset, self.sig_size)
        {
            return Err(VbError::KeyblockSize);
        }
        Ok(())
    }
}

/// Shared shape of `FwPreamble`/`KernelPreamble`: `{size, header_version,
/// version (firmware_version or kernel_version), body_signature, flags,
/// preamble_signature}`. `kernel_subkey_*` fields are only meaningful for
/// the firmware preamble (spec.md §3); they are zero in a kernel preamble.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct PreambleHeader {
    pub size: u32,
    pub header_version: u32,
    pub version: u32,
    pub kernel_subkey_offset: u32,
    pub kernel_subkey_size: u32,
    pub body_digest_offset: u32,
    pub body_digest_size: u32,
    pub body_sig_offset: u32,
    pub body_sig_size: u32,
    pub body_data_size: u32,
    pub flags: u32,
    pub sig_offset: u32,
    pub sig_size: u32,
}

impl PreambleHeader {
    pub fn check_bounds(&self, total_size: usize) -> Result<(), crate::error::VbError> {
        use crate::error::VbError;
        if self.size as usize != total_size {
            return Err(VbError::PreambleSize);
        }
        let in_bounds = |off: u32, size: u32| -> bool {
            let off = off as usize;
            let size = size as usize;
            off.checked_add(size).map(|end| end <= total_size).unwrap_or(false)
        };
        if !in_bounds(self.body_digest_offset, self.body_digest_size)
            || !in_bounds(self.body_sig_offset, self.body_sig_size)
            || !in_bounds(self.sig_offset, self.sig_size)
        {
            return Err(VbError::PreambleSize);
        }
        if self.kernel_subkey_size != 0 && !in_bounds(self.kernel_subkey_offset, self.kernel_subkey_size) {
            return Err(VbError::PreambleSize);
        }
        Ok(())
    }
}

/// `≤16`-byte NV record, CRC-8 protected, bit-exact per spec.md §6.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct NvRaw {
    pub header: u8,
    pub body: [u8; 14],
    pub crc: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct SecdataFirmwareRaw {
    pub struct_version: u8,
    pub flags: u8,
    pub fw_versions: [u8; 4], // u32 LE
    pub reserved: [u8; 4],
    pub crc: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct SecdataKernelRaw {
    pub struct_version: u8,
    pub uid: u8,
    pub kernel_versions: [u8; 4], // u32 LE
    pub reserved: [u8; 6],
    pub crc: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq, Eq)]
pub struct SecdataFwmpRaw {
    pub crc: u8,
    pub struct_version: u8,
    pub struct_size: u16,
    pub flags: u32,
    pub dev_key_hash: [u8; 32],
}
