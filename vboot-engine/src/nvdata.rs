//! NV flags: a small typed key/value space with CRC, read-modify-write
//! through the engine, flushed via the commit hook (spec.md §4.2).
//!
//! Field packing mirrors the teacher's bitfield style (`bitfield = "0.13.2"`
//! used throughout `bao1x-hal` register definitions) but hand-rolled here
//! since the field table is data, not a fixed hardware register map.

use crate::crc8::crc8;
use crate::error::{VbError, VbResult};
use crate::structs::NvRaw;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NvField {
    RecoveryRequest,
    RecoverySubcode,
    TryCount,
    TryNext,
    FwTried,
    FwResult,
    FwPrevTried,
    FwPrevResult,
    DevBootUsb,
    DevBootLegacy,
    DevBootSignedOnly,
    DevDefaultBoot,
    DiagRequest,
    DisplayRequest,
    DisableDevRequest,
    ClearTpmOwnerRequest,
    ClearTpmOwnerDone,
    BatteryCutoffRequest,
    TryRoSync,
    KernelMaxRollforward,
}

/// `(bit_offset, bit_width)` within the 14-byte body, LSB-first within each
/// byte, bytes in ascending address order — i.e. field `n` occupies bits
/// `[offset, offset+width)` of the little-endian bit string formed by the body.
const fn layout(field: NvField) -> (usize, u32) {
    use NvField::*;
    match field {
        RecoveryRequest => (0, 8),
        RecoverySubcode => (8, 8),
        TryCount => (16, 4),
        TryNext => (20, 1),
        FwTried => (21, 1),
        FwResult => (22, 2),
        FwPrevTried => (24, 1),
        FwPrevResult => (25, 2),
        DevBootUsb => (27, 1),
        DevBootLegacy => (28, 1),
        DevBootSignedOnly => (29, 1),
        DevDefaultBoot => (30, 1),
        DiagRequest => (31, 1),
        DisplayRequest => (32, 1),
        DisableDevRequest => (33, 1),
        ClearTpmOwnerRequest => (34, 1),
        ClearTpmOwnerDone => (35, 1),
        BatteryCutoffRequest => (36, 1),
        TryRoSync => (37, 1),
        KernelMaxRollforward => (40, 32), // byte-aligned tail field
    }
}

fn read_bits(body: &[u8; 14], offset: usize, width: u32) -> u32 {
    let mut value = 0u32;
    for i in 0..width {
        let bit = offset + i as usize;
        let byte = bit / 8;
        let shift = bit % 8;
        if byte >= body.len() {
            break;
        }
        if (body[byte] >> shift) & 1 != 0 {
            value |= 1 << i;
        }
    }
    value
}

fn write_bits(body: &mut [u8; 14], offset: usize, width: u32, value: u32) {
    for i in 0..width {
        let bit = offset + i as usize;
        let byte = bit / 8;
        let shift = bit % 8;
        if byte >= body.len() {
            break;
        }
        if (value >> i) & 1 != 0 {
            body[byte] |= 1 << shift;
        } else {
            body[byte] &= !(1 << shift);
        }
    }
}

pub const NV_DEFAULT: NvRaw = NvRaw { header: 0x70, body: [0u8; 14], crc: 0 };

pub struct NvContext {
    raw: NvRaw,
    changed: bool,
}

impl NvContext {
    /// Validates CRC and header; on mismatch, resets to defaults and marks
    /// `changed` so the caller's next `commit` persists the reset state.
    pub fn init(raw: NvRaw) -> Self {
        let computed = crc8(&bytemuck::bytes_of(&raw)[..15]);
        if computed != raw.crc || raw.header & 0x0f != 0x00 {
            let mut fresh = NV_DEFAULT;
            fresh.crc = crc8(&bytemuck::bytes_of(&fresh)[..15]);
            NvContext { raw: fresh, changed: true }
        } else {
            NvContext { raw, changed: false }
        }
    }

    pub fn raw(&self) -> NvRaw {
        let mut out = self.raw;
        out.crc = crc8(&bytemuck::bytes_of(&out)[..15]);
        out
    }

    pub fn header(&self) -> u8 { self.raw.header }

    pub fn changed(&self) -> bool { self.changed }

    pub fn clear_changed(&mut self) { self.changed = false; }

    pub fn get(&self, field: NvField) -> u32 {
        let (offset, width) = layout(field);
        read_bits(&self.raw.body, offset, width)
    }

    /// Writes only when the value differs, then sets `changed`. Unknown
    /// fields are rejected by the type system (`NvField` is exhaustive), but
    /// a value out of a field's declared bit range is a `ParameterError`.
    pub fn set(&mut self, field: NvField, value: u32) -> VbResult<()> {
        let (offset, width) = layout(field);
        if width < 32 && value >= (1u32 << width) {
            return Err(VbError::ParameterError);
        }
        if read_bits(&self.raw.body, offset, width) != value {
            write_bits(&mut self.raw.body, offset, width, value);
            self.changed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_resets_on_bad_crc() {
        let bad = NvRaw { header: 0x70, body: [0xaau8; 14], crc: 0xff };
        let ctx = NvContext::init(bad);
        assert!(ctx.changed());
        assert_eq!(ctx.get(NvField::RecoveryRequest), 0);
    }

    #[test]
    fn round_trip_every_field() {
        let mut ctx = NvContext::init(NV_DEFAULT);
        ctx.clear_changed();
        for (field, max) in [
            (NvField::RecoveryRequest, 255u32),
            (NvField::RecoverySubcode, 255),
            (NvField::TryCount, 15),
            (NvField::TryNext, 1),
            (NvField::FwResult, 3),
            (NvField::KernelMaxRollforward, 0xffff_ffff),
        ] {
            ctx.set(field, max).unwrap();
            assert_eq!(ctx.get(field), max);
        }
    }

    #[test]
    fn set_rejects_out_of_range_value() {
        let mut ctx = NvContext::init(NV_DEFAULT);
        assert_eq!(ctx.set(NvField::TryNext, 2), Err(VbError::ParameterError));
    }

    #[test]
    fn set_only_marks_changed_when_value_differs() {
        let mut ctx = NvContext::init(NV_DEFAULT);
        ctx.clear_changed();
        ctx.set(NvField::TryNext, 0).unwrap(); // already 0
        assert!(!ctx.changed());
        ctx.set(NvField::TryNext, 1).unwrap();
        assert!(ctx.changed());
    }

    #[quickcheck_macros::quickcheck]
    fn try_count_round_trips_within_range(v: u8) -> bool {
        let mut ctx = NvContext::init(NV_DEFAULT);
        let v = (v % 16) as u32;
        ctx.set(NvField::TryCount, v).unwrap();
        ctx.get(NvField::TryCount) == v
    }
}
