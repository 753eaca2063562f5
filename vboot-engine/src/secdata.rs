//! Secure storage: `secdata_firmware`, `secdata_kernel`, `secdata_fwmp`
//! records held in a TPM-like back end (spec.md §4.3, §6). Versioned
//! counters plus feature flags, CRC-protected, committed through the same
//! hook as NV.
//!
//! Grounded on `bao1x-hal::acram::OneWayCounter` for the "counter only moves
//! forward, reads are volatile, writes can fail and must be checked"
//! semantics — secdata's version counters play the same role as the
//! one-way counters guarding key revocation there, just backed by a richer
//! CRC'd record instead of a single hardware bit-cell.

use crate::crc8::crc8;
use crate::error::{VbError, VbResult};
use crate::structs::{SecdataFirmwareRaw, SecdataFwmpRaw, SecdataKernelRaw};

pub const SECDATA_FIRMWARE_VERSION: u8 = 2;
pub const SECDATA_KERNEL_VERSION: u8 = 2;
pub const SECDATA_FWMP_VERSION: u8 = 1;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct FirmwareFlags: u8 {
        const LAST_BOOT_DEVELOPER = 1 << 0;
        const DISABLE_DEV_REQUEST = 1 << 1;
    }
}

pub struct SecdataFirmware {
    version: u32,
    flags: FirmwareFlags,
}

impl SecdataFirmware {
    pub fn init(raw: SecdataFirmwareRaw) -> VbResult<Self> {
        let bytes = bytemuck::bytes_of(&raw);
        if crc8(&bytes[..bytes.len() - 1]) != raw.crc {
            return Err(VbError::SecdataCrc);
        }
        // A newer-than-known struct_version is accepted as long as the
        // fields this engine knows about are still intact (spec.md §4.3);
        // only a version that predates the fields we read is rejected.
        if raw.struct_version < SECDATA_FIRMWARE_VERSION {
            return Err(VbError::SecdataVersion);
        }
        Ok(SecdataFirmware {
            version: u32::from_le_bytes(raw.fw_versions),
            flags: FirmwareFlags::from_bits_truncate(raw.flags),
        })
    }

    pub fn version(&self) -> u32 { self.version }

    pub fn flags(&self) -> FirmwareFlags { self.flags }

    pub fn set_flags(&mut self, flags: FirmwareFlags) { self.flags = flags; }

    /// Rejects a write that would move the counter backward (spec.md §8
    /// property 3: "a set with a smaller value is rejected").
    pub fn set_version(&mut self, new_version: u32) -> VbResult<()> {
        if new_version < self.version {
            return Err(VbError::SecdataRange);
        }
        self.version = new_version;
        Ok(())
    }

    pub fn to_raw(&self) -> SecdataFirmwareRaw {
        let mut raw = SecdataFirmwareRaw {
            struct_version: SECDATA_FIRMWARE_VERSION,
            flags: self.flags.bits(),
            fw_versions: self.version.to_le_bytes(),
            reserved: [0u8; 4],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crc8(&bytes[..bytes.len() - 1]);
        raw
    }
}

pub struct SecdataKernel {
    version: u32,
    uid: u8,
}

impl SecdataKernel {
    pub fn init(raw: SecdataKernelRaw) -> VbResult<Self> {
        let bytes = bytemuck::bytes_of(&raw);
        if crc8(&bytes[..bytes.len() - 1]) != raw.crc {
            return Err(VbError::SecdataCrc);
        }
        if raw.struct_version < SECDATA_KERNEL_VERSION {
            return Err(VbError::SecdataVersion);
        }
        Ok(SecdataKernel { version: u32::from_le_bytes(raw.kernel_versions), uid: raw.uid })
    }

    pub fn version(&self) -> u32 { self.version }

    pub fn uid(&self) -> u8 { self.uid }

    pub fn set_version(&mut self, new_version: u32) -> VbResult<()> {
        if new_version < self.version {
            return Err(VbError::SecdataRange);
        }
        self.version = new_version;
        Ok(())
    }

    pub fn to_raw(&self) -> SecdataKernelRaw {
        let mut raw = SecdataKernelRaw {
            struct_version: SECDATA_KERNEL_VERSION,
            uid: self.uid,
            kernel_versions: self.version.to_le_bytes(),
            reserved: [0u8; 6],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crc8(&bytes[..bytes.len() - 1]);
        raw
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct FwmpFlags: u32 {
        const DEV_DISABLE_BOOT        = 1 << 0;
        const DEV_DISABLE_RECOVERY    = 1 << 1;
        const DEV_DISABLE_CCD_UNLOCK  = 1 << 2;
        const DEV_ENABLE_USB          = 1 << 3;
        const DEV_ENABLE_LEGACY       = 1 << 4;
    }
}

pub struct SecdataFwmp {
    flags: FwmpFlags,
    dev_key_hash: [u8; 32],
}

impl SecdataFwmp {
    pub fn init(raw: SecdataFwmpRaw) -> VbResult<Self> {
        let bytes = bytemuck::bytes_of(&raw);
        if crc8(&bytes[1..]) != raw.crc {
            return Err(VbError::SecdataCrc);
        }
        if raw.struct_version < SECDATA_FWMP_VERSION {
            return Err(VbError::SecdataVersion);
        }
        Ok(SecdataFwmp { flags: FwmpFlags::from_bits_truncate(raw.flags), dev_key_hash: raw.dev_key_hash })
    }

    pub fn get_flag(&self, flag: FwmpFlags) -> bool { self.flags.contains(flag) }

    pub fn dev_key_hash(&self) -> &[u8; 32] { &self.dev_key_hash }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fw_raw(version: u32) -> SecdataFirmwareRaw {
        let mut raw = SecdataFirmwareRaw {
            struct_version: SECDATA_FIRMWARE_VERSION,
            flags: 0,
            fw_versions: version.to_le_bytes(),
            reserved: [0; 4],
            crc: 0,
        };
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crc8(&bytes[..bytes.len() - 1]);
        raw
    }

    #[test]
    fn init_rejects_bad_crc() {
        let mut raw = valid_fw_raw(5);
        raw.crc ^= 0xff;
        assert_eq!(SecdataFirmware::init(raw).unwrap_err(), VbError::SecdataCrc);
    }

    #[test]
    fn init_rejects_stale_struct_version() {
        let mut raw = valid_fw_raw(5);
        raw.struct_version = SECDATA_FIRMWARE_VERSION - 1;
        let bytes = bytemuck::bytes_of(&raw);
        raw.crc = crc8(&bytes[..bytes.len() - 1]);
        assert_eq!(SecdataFirmware::init(raw).unwrap_err(), VbError::SecdataVersion);
    }

    #[test]
    fn set_version_rejects_rollback() {
        let mut fw = SecdataFirmware::init(valid_fw_raw(5)).unwrap();
        assert_eq!(fw.set_version(4), Err(VbError::SecdataRange));
        assert!(fw.set_version(6).is_ok());
        assert_eq!(fw.version(), 6);
    }

    #[test]
    fn round_trip_through_raw() {
        let fw = SecdataFirmware::init(valid_fw_raw(0x20002)).unwrap();
        let raw = fw.to_raw();
        let fw2 = SecdataFirmware::init(raw).unwrap();
        assert_eq!(fw2.version(), 0x20002);
    }
}
