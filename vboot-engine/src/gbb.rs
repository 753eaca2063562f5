//! GBB (Google Binary Block) reader (spec.md §4.6).

use crate::error::{VbError, VbResult};
use crate::hal::{ResourceIndex, ResourceReader};
use crate::shared_state::SharedState;
use crate::structs::{GbbHeader, GBB_MINOR_MIN};
use crate::workbuf::WorkBuffer;

/// Reads exactly `size_of::<GbbHeader>()` bytes from resource `Gbb` at
/// offset 0 into `dst` and validates it. `dst` must be exactly the header
/// size; callers that need the full GBB (for rootkey/recovery-key bytes)
/// read those separately once the header's offsets are known.
pub fn read_gbb_header<R: ResourceReader>(host: &R, dst: &mut GbbHeader) -> VbResult<()> {
    let buf = bytemuck::bytes_of_mut(dst);
    host.read_resource(ResourceIndex::Gbb, 0, buf)?;
    dst.validate(GBB_MINOR_MIN)
}

/// Allocates the header in the arena, reads and validates it, records its
/// offset in `SharedState`, narrows the arena region to the header's exact
/// size (spec.md §4.6: "then narrows its length in the arena to the precise
/// size" — the initial allocation is sized generously via `realloc_last`
/// down to `size_of::<GbbHeader>()`, which for a single top-of-arena
/// allocation a `realloc_last` shrink handles the same as a grow).
pub fn fw_init_gbb<R: ResourceReader>(
    host: &R,
    wb: &mut WorkBuffer<'_>,
    state: &mut SharedState,
) -> VbResult<()> {
    let header_size = core::mem::size_of::<GbbHeader>();
    let span = wb.alloc(header_size).map_err(|_| VbError::WorkbufExhausted)?;

    let header: GbbHeader = {
        let buf = wb.bytes_mut(span);
        host.read_resource(ResourceIndex::Gbb, 0, buf)?;
        *bytemuck::from_bytes(buf)
    };
    header.validate(GBB_MINOR_MIN)?;

    let span = wb.realloc_last(span, header_size)?;
    state.gbb = span;
    Ok(())
}

impl GbbHeader {
    fn zeroed_for_read() -> Self {
        use bytemuck::Zeroable;
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{GBB_MAGIC, GbbFlags};

    struct FakeHost {
        gbb: Vec<u8>,
    }

    impl ResourceReader for FakeHost {
        fn read_resource(&self, index: ResourceIndex, offset: usize, buf: &mut [u8]) -> VbResult<()> {
            let src = match index {
                ResourceIndex::Gbb => &self.gbb,
                ResourceIndex::FwVblock => return Err(VbError::ResourceRead),
            };
            let end = offset + buf.len();
            if end > src.len() {
                return Err(VbError::ResourceRead);
            }
            buf.copy_from_slice(&src[offset..end]);
            Ok(())
        }
    }

    fn valid_header() -> GbbHeader {
        GbbHeader {
            magic: GBB_MAGIC,
            major_version: 1,
            minor_version: 1,
            header_size: core::mem::size_of::<GbbHeader>() as u32,
            flags: GbbFlags::empty().bits(),
            hwid_offset: 0,
            hwid_size: 0,
            rootkey_offset: 0,
            rootkey_size: 0,
            bmpfv_offset: 0,
            bmpfv_size: 0,
            recovery_key_offset: 0,
            recovery_key_size: 0,
        }
    }

    #[test]
    fn read_gbb_header_accepts_well_formed_header() {
        let header = valid_header();
        let host = FakeHost { gbb: bytemuck::bytes_of(&header).to_vec() };
        let mut dst = GbbHeader::zeroed_for_read();
        assert!(read_gbb_header(&host, &mut dst).is_ok());
        assert_eq!(dst, header);
    }

    #[test]
    fn read_gbb_header_rejects_flipped_magic_bit() {
        let mut header = valid_header();
        header.magic[0] ^= 0x01;
        let host = FakeHost { gbb: bytemuck::bytes_of(&header).to_vec() };
        let mut dst = GbbHeader::zeroed_for_read();
        assert_eq!(read_gbb_header(&host, &mut dst), Err(VbError::GbbMagic));
    }

    #[test]
    fn read_gbb_header_rejects_minor_below_minimum() {
        let mut header = valid_header();
        header.minor_version = 0;
        let host = FakeHost { gbb: bytemuck::bytes_of(&header).to_vec() };
        let mut dst = GbbHeader::zeroed_for_read();
        assert_eq!(read_gbb_header(&host, &mut dst), Err(VbError::GbbTooOld));
    }

    #[test]
    fn fw_init_gbb_records_offset_and_narrows_arena() {
        let header = valid_header();
        let host = FakeHost { gbb: bytemuck::bytes_of(&header).to_vec() };
        let mut buf = [0u8; 256];
        let mut wb = WorkBuffer::init(&mut buf);
        let mut state = SharedState::new();
        fw_init_gbb(&host, &mut wb, &mut state).unwrap();
        assert_eq!(state.gbb.len, core::mem::size_of::<GbbHeader>());
        let read_back: GbbHeader = *bytemuck::from_bytes(wb.bytes(state.gbb));
        assert_eq!(read_back, header);
    }
}
