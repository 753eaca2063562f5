//! End-to-end pipeline scenarios (spec.md §8 "Concrete scenarios").
//! Exercises `Context` the way a boot loader would: phase 1 → keyblock →
//! preamble, using the crate's own test fixtures/fakes in place of real
//! cryptographic primitives and flash resources.

use vboot_engine::context::Context;
use vboot_engine::keys;
use vboot_engine::nvdata::{NvContext, NvField, NV_DEFAULT};
use vboot_engine::secdata::SECDATA_FIRMWARE_VERSION;
use vboot_engine::shared_state::BootResult;
use vboot_engine::structs::{GbbHeader, GbbFlags, KeyblockHeader, PreambleHeader, SecdataFirmwareRaw, GBB_MAGIC, KEYBLOCK_MAGIC};
use vboot_engine::test_support::{packed_key_bytes, sign_with_xor, FakeHost, IdentityRsa, NoopTpm, XorBackend};
use vboot_engine::workbuf::WorkBuffer;

fn valid_secdata_fw_raw(version: u32) -> SecdataFirmwareRaw {
    let mut raw = SecdataFirmwareRaw {
        struct_version: SECDATA_FIRMWARE_VERSION,
        flags: 0,
        fw_versions: version.to_le_bytes(),
        reserved: [0; 4],
        crc: 0,
    };
    let bytes = bytemuck::bytes_of(&raw);
    raw.crc = vboot_engine::crc8::crc8(&bytes[..bytes.len() - 1]);
    raw
}

fn valid_gbb(flags: GbbFlags) -> GbbHeader {
    GbbHeader {
        magic: GBB_MAGIC,
        major_version: 1,
        minor_version: 1,
        header_size: core::mem::size_of::<GbbHeader>() as u32,
        flags: flags.bits(),
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

/// Builds a signed keyblock wrapping `data_key_bytes`, signed (via the
/// XOR/identity fixtures) by a root key whose algorithm matches
/// `rootkey_algorithm`. Returns `(rootkey_bytes, keyblock_bytes)`.
fn build_keyblock(rootkey_algorithm: u32, rootkey_arrsize: u32, data_key_bytes: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let rootkey_bytes = packed_key_bytes(rootkey_algorithm, 0, rootkey_arrsize);
    let rootkey = keys::unpack_key(&rootkey_bytes).unwrap();
    let word_bytes = rootkey_arrsize as usize * 4;

    let header_len = core::mem::size_of::<KeyblockHeader>();
    let data_key_offset = header_len as u32;
    let data_key_size = data_key_bytes.len() as u32;
    let sig_offset = data_key_offset + data_key_size;
    let sig_size = word_bytes as u32;
    let total = sig_offset + sig_size;

    let header = KeyblockHeader {
        magic: KEYBLOCK_MAGIC,
        size: total,
        data_key_algorithm: 0,
        data_key_version: 0,
        data_key_offset,
        data_key_size,
        hash_offset: 0,
        hash_size: 0,
        sig_offset,
        sig_size,
    };

    let mut buf = bytemuck::bytes_of(&header).to_vec();
    buf.extend_from_slice(data_key_bytes);
    let covered = buf.clone();
    let sig = sign_with_xor(&covered, rootkey.hash_alg, word_bytes);
    buf.extend_from_slice(&sig);
    (rootkey_bytes, buf)
}

/// Builds a signed preamble carrying `version`, signed by `data_key`.
fn build_preamble(data_key: &keys::PublicKey<'_>, version: u32) -> Vec<u8> {
    let word_bytes = data_key.n.len();
    let header_len = core::mem::size_of::<PreambleHeader>();
    let sig_offset = header_len as u32;
    let sig_size = word_bytes as u32;
    let total = sig_offset + sig_size;

    let header = PreambleHeader {
        size: total,
        header_version: 1,
        version,
        kernel_subkey_offset: 0,
        kernel_subkey_size: 0,
        body_digest_offset: 0,
        body_digest_size: 0,
        body_sig_offset: 0,
        body_sig_size: 0,
        body_data_size: 0,
        flags: 0,
        sig_offset,
        sig_size,
    };

    let mut buf = bytemuck::bytes_of(&header).to_vec();
    let covered = buf.clone();
    let sig = sign_with_xor(&covered, data_key.hash_alg, word_bytes);
    buf.extend_from_slice(&sig);
    buf
}

/// S1 — clean normal boot: all phases succeed, `fw_version` composes to
/// `0x20002`, and since that equals the existing secdata value, no write.
#[test]
fn s1_clean_normal_boot() {
    let gbb = valid_gbb(GbbFlags::empty());
    let host = FakeHost { gbb: bytemuck::bytes_of(&gbb).to_vec(), vblock: Vec::new() };
    let mut tpm = NoopTpm;
    let mut arena = [0u8; 256];
    let mut wb = WorkBuffer::init(&mut arena);

    let mut ctx = Context::init(NV_DEFAULT, valid_secdata_fw_raw(0x20002)).unwrap();
    ctx.run_firmware_phase1(&host, &mut tpm, &mut wb, false, false).unwrap();

    let data_key_bytes = packed_key_bytes(1, 2, 32); // RSA1024-SHA256, key_version=2
    let (rootkey_bytes, keyblock_bytes) = build_keyblock(1, 32, &data_key_bytes);
    let mut scratch = [0u8; 512];

    let (key_version, _kb_size) = ctx
        .load_fw_keyblock::<XorBackend, IdentityRsa>(&IdentityRsa, &rootkey_bytes, &keyblock_bytes, false, &mut scratch)
        .unwrap();
    assert_eq!(key_version, 2);

    let data_key = keys::unpack_key(&data_key_bytes).unwrap();
    let preamble_bytes = build_preamble(&data_key, 2);
    ctx.load_fw_preamble::<XorBackend, IdentityRsa>(
        &IdentityRsa,
        &data_key,
        &preamble_bytes,
        key_version,
        false,
        &mut scratch,
    )
    .unwrap();

    assert_eq!(ctx.state.fw_version, 0x20002);
    assert!(!ctx.maybe_roll_forward_firmware().unwrap());
    assert!(!ctx.secdata_changed);
}

/// S4 — roll-forward: preamble carries a newer version, and the previous
/// boot on the same slot succeeded, so secdata advances.
#[test]
fn s4_roll_forward_on_newer_preamble_version() {
    let gbb = valid_gbb(GbbFlags::empty());
    let host = FakeHost { gbb: bytemuck::bytes_of(&gbb).to_vec(), vblock: Vec::new() };
    let mut tpm = NoopTpm;
    let mut arena = [0u8; 256];
    let mut wb = WorkBuffer::init(&mut arena);

    let mut nv = NV_DEFAULT;
    nv.body[0] = 0; // try_next = 0 (slot 0), matches last_boot_slot below
    let nv = {
        // fw_tried/fw_result fields must reflect "previous boot on slot 0 succeeded"
        // before phase1's select_fw_slot runs and copies them into fw_prev_*.
        let mut ctx = NvContext::init(nv);
        ctx.set(NvField::FwTried, 0).unwrap();
        ctx.set(NvField::FwResult, BootResult::Success.to_nv()).unwrap();
        ctx.raw()
    };

    let mut ctx = Context::init(nv, valid_secdata_fw_raw(0x20002)).unwrap();
    ctx.run_firmware_phase1(&host, &mut tpm, &mut wb, false, false).unwrap();
    assert_eq!(ctx.state.last_boot_slot, 0);
    assert_eq!(ctx.state.fw_slot, 0);

    let data_key_bytes = packed_key_bytes(1, 2, 32);
    let (rootkey_bytes, keyblock_bytes) = build_keyblock(1, 32, &data_key_bytes);
    let mut scratch = [0u8; 512];
    let (key_version, _) = ctx
        .load_fw_keyblock::<XorBackend, IdentityRsa>(&IdentityRsa, &rootkey_bytes, &keyblock_bytes, false, &mut scratch)
        .unwrap();

    let data_key = keys::unpack_key(&data_key_bytes).unwrap();
    let preamble_bytes = build_preamble(&data_key, 3); // firmware_version = 3, newer than secdata's 2
    ctx.load_fw_preamble::<XorBackend, IdentityRsa>(
        &IdentityRsa,
        &data_key,
        &preamble_bytes,
        key_version,
        false,
        &mut scratch,
    )
    .unwrap();

    assert_eq!(ctx.state.fw_version, 0x20003);
    assert!(ctx.maybe_roll_forward_firmware().unwrap());
    assert_eq!(ctx.secdata_fw.version(), 0x20003);
    assert!(ctx.secdata_changed);
}

/// S5 — try-count exhaustion flips to the other slot.
#[test]
fn s5_try_count_exhaustion_flips_slot() {
    let mut nv = NvContext::init(NV_DEFAULT);
    nv.set(NvField::TryNext, 0).unwrap();
    nv.set(NvField::FwTried, 0).unwrap();
    nv.set(NvField::FwResult, BootResult::Trying.to_nv()).unwrap();
    nv.set(NvField::TryCount, 0).unwrap();

    let mut state = vboot_engine::shared_state::SharedState::new();
    vboot_engine::firmware::select_fw_slot(&mut nv, &mut state).unwrap();

    assert_eq!(nv.get(NvField::TryNext), 1);
    assert_eq!(state.fw_slot, 1);
}

/// S6 — secdata CRC failure during init is reported *and* persisted: NV
/// gains `recovery_request = secdata-firmware-init`, `recovery_subcode =
/// low8(error)` (spec.md §8 scenario S6).
#[test]
fn s6_secdata_init_failure_is_reported() {
    let mut raw = valid_secdata_fw_raw(5);
    raw.crc ^= 0xff;
    let failure = Context::init(NV_DEFAULT, raw).unwrap_err();
    assert_eq!(failure.error, vboot_engine::error::VbError::SecdataCrc);
    assert_eq!(
        failure.nv.get(NvField::RecoveryRequest),
        vboot_engine::firmware::RECOVERY_SECDATA_FIRMWARE_INIT as u32
    );
    assert_eq!(
        failure.nv.get(NvField::RecoverySubcode),
        vboot_engine::error::VbError::SecdataCrc.subcode() as u32
    );
    assert_eq!(failure.state.recovery_reason, vboot_engine::firmware::RECOVERY_SECDATA_FIRMWARE_INIT);
}

/// Keyblock rollback detection: an older key version is rejected unless the
/// GBB's rollback-check-disable flag is set (spec.md §8 property 6).
#[test]
fn keyblock_rollback_rejected_unless_bypassed() {
    let gbb = valid_gbb(GbbFlags::empty());
    let host = FakeHost { gbb: bytemuck::bytes_of(&gbb).to_vec(), vblock: Vec::new() };
    let mut tpm = NoopTpm;
    let mut arena = [0u8; 256];
    let mut wb = WorkBuffer::init(&mut arena);

    let mut ctx = Context::init(NV_DEFAULT, valid_secdata_fw_raw(2 << 16)).unwrap();
    ctx.run_firmware_phase1(&host, &mut tpm, &mut wb, false, false).unwrap();

    let data_key_bytes = packed_key_bytes(1, 1, 32); // key_version = 1, older than secdata's 2
    let (rootkey_bytes, keyblock_bytes) = build_keyblock(1, 32, &data_key_bytes);
    let mut scratch = [0u8; 512];

    assert!(ctx
        .load_fw_keyblock::<XorBackend, IdentityRsa>(&IdentityRsa, &rootkey_bytes, &keyblock_bytes, false, &mut scratch)
        .is_err());
}

#[test]
fn keyblock_rollback_bypassed_when_gbb_flag_set() {
    let gbb = valid_gbb(GbbFlags::DISABLE_FW_ROLLBACK_CHECK);
    let host = FakeHost { gbb: bytemuck::bytes_of(&gbb).to_vec(), vblock: Vec::new() };
    let mut tpm = NoopTpm;
    let mut arena = [0u8; 256];
    let mut wb = WorkBuffer::init(&mut arena);

    let mut ctx = Context::init(NV_DEFAULT, valid_secdata_fw_raw(2 << 16)).unwrap();
    ctx.run_firmware_phase1(&host, &mut tpm, &mut wb, false, false).unwrap();

    let data_key_bytes = packed_key_bytes(1, 1, 32);
    let (rootkey_bytes, keyblock_bytes) = build_keyblock(1, 32, &data_key_bytes);
    let mut scratch = [0u8; 512];

    // NOTE: `load_fw_keyblock` takes `bypass_rollback` explicitly rather than
    // re-deriving it from the GBB header (the caller — normally `firmware::firmware_phase1`'s
    // caller — already has `gbb.flags` in hand from phase 1); this test passes it directly.
    assert!(ctx
        .load_fw_keyblock::<XorBackend, IdentityRsa>(&IdentityRsa, &rootkey_bytes, &keyblock_bytes, true, &mut scratch)
        .is_ok());
}
