#![cfg(feature = "capstone-backend")]

use clip_rename_core::host::HostError;
use clip_rename_core::services::backends::{detect_arch, BinaryImage};

/// mov rax, 0x1234 ; lea rax, [rip + 0x10] ; ret
fn x86_64_code() -> Vec<u8> {
    let mut code = vec![0x48, 0xB8];
    code.extend_from_slice(&0x1234u64.to_le_bytes());
    code.extend_from_slice(&[0x48, 0x8D, 0x05, 0x10, 0x00, 0x00, 0x00]);
    code.push(0xC3);
    code
}

#[test]
fn raw_blob_maps_at_zero_and_defaults_to_x86_64() {
    let image = BinaryImage::from_bytes(x86_64_code(), None).expect("image");
    assert_eq!(image.arch(), "x86_64");
    assert_eq!(detect_arch(&x86_64_code()), None);
}

#[test]
fn immediate_operand_is_its_value() {
    let image = BinaryImage::from_bytes(x86_64_code(), None).expect("image");
    assert_eq!(image.operand_value(0, 1).expect("decode"), Some(0x1234));
}

#[test]
fn register_and_missing_operands_have_no_address() {
    let image = BinaryImage::from_bytes(x86_64_code(), None).expect("image");
    assert_eq!(image.operand_value(0, 0).expect("decode"), None);
    assert_eq!(image.operand_value(0, 5).expect("decode"), None);
    assert_eq!(image.operand_value(17, 0).expect("decode ret"), None);
}

#[test]
fn rip_relative_memory_resolves_against_next_instruction() {
    let image = BinaryImage::from_bytes(x86_64_code(), None).expect("image");
    // lea at 10 is 7 bytes long: 17 + 0x10.
    assert_eq!(image.operand_value(10, 1).expect("decode"), Some(0x21));
}

#[test]
fn arm_literal_load_resolves_against_pc_plus_eight() {
    // ldr r1, [pc, #8] ; bx lr
    let image = BinaryImage::from_bytes(
        vec![0x08, 0x10, 0x9F, 0xE5, 0x1E, 0xFF, 0x2F, 0xE1],
        Some("arm"),
    )
    .expect("image");
    assert_eq!(image.operand_value(0, 1).expect("decode"), Some(0x10));
    assert_eq!(image.operand_value(0, 0).expect("decode"), None);
}

#[test]
fn thumb_literal_load_uses_word_aligned_pc() {
    // nop ; ldr r1, [pc, #4]
    let image =
        BinaryImage::from_bytes(vec![0x00, 0xBF, 0x01, 0x49], Some("thumb")).expect("image");
    // (2 + 4) & !3 = 4, plus 4.
    assert_eq!(image.operand_value(2, 1).expect("decode"), Some(0x8));
}

#[test]
fn mips_immediates_decode_big_endian() {
    // lui $a0, 0x4a ; addiu $a0, $a0, 0x1234
    let image = BinaryImage::from_bytes(
        vec![0x3C, 0x04, 0x00, 0x4A, 0x24, 0x84, 0x12, 0x34],
        Some("mips"),
    )
    .expect("image");
    assert_eq!(image.operand_value(0, 1).expect("decode"), Some(0x4A));
    assert_eq!(image.operand_value(4, 2).expect("decode"), Some(0x1234));
}

#[test]
fn absolute_memory_operand_uses_displacement() {
    // mov eax, dword ptr [0x5000]
    let image =
        BinaryImage::from_bytes(vec![0xA1, 0x00, 0x50, 0x00, 0x00], Some("x86")).expect("image");
    assert_eq!(image.arch(), "x86");
    assert_eq!(image.operand_value(0, 1).expect("decode"), Some(0x5000));
}

#[test]
fn unmapped_addresses_and_unknown_arches_are_errors() {
    let image = BinaryImage::from_bytes(x86_64_code(), None).expect("image");
    assert!(matches!(image.operand_value(0x1000, 1), Err(HostError::Decode(_))));

    let image = BinaryImage::from_bytes(x86_64_code(), Some("sparc")).expect("image");
    assert!(matches!(image.operand_value(0, 1), Err(HostError::Unsupported(_))));
}

/// Minimal PE32+ with one `.text` section holding `mov rax, 0x1234; ...`.
fn pe64_image(image_base: u64, virtual_address: u32) -> Vec<u8> {
    let mut pe = vec![0u8; 0x200];
    pe[0..2].copy_from_slice(b"MZ");
    pe[0x3C..0x40].copy_from_slice(&0x40u32.to_le_bytes());
    pe[0x40..0x44].copy_from_slice(b"PE\0\0");

    // COFF header.
    pe[0x44..0x46].copy_from_slice(&0x8664u16.to_le_bytes());
    pe[0x46..0x48].copy_from_slice(&1u16.to_le_bytes());
    pe[0x54..0x56].copy_from_slice(&112u16.to_le_bytes());
    pe[0x56..0x58].copy_from_slice(&0x22u16.to_le_bytes());

    // Optional header (PE32+, no data directories).
    let opt = 0x58;
    pe[opt..opt + 2].copy_from_slice(&0x20Bu16.to_le_bytes());
    pe[opt + 24..opt + 32].copy_from_slice(&image_base.to_le_bytes());
    pe[opt + 32..opt + 36].copy_from_slice(&0x1000u32.to_le_bytes());
    pe[opt + 36..opt + 40].copy_from_slice(&0x200u32.to_le_bytes());
    pe[opt + 56..opt + 60].copy_from_slice(&(virtual_address + 0x1000).to_le_bytes());
    pe[opt + 60..opt + 64].copy_from_slice(&0x200u32.to_le_bytes());

    // Section header.
    let sh = opt + 112;
    pe[sh..sh + 5].copy_from_slice(b".text");
    pe[sh + 8..sh + 12].copy_from_slice(&0x20u32.to_le_bytes());
    pe[sh + 12..sh + 16].copy_from_slice(&virtual_address.to_le_bytes());
    pe[sh + 16..sh + 20].copy_from_slice(&0x200u32.to_le_bytes());
    pe[sh + 20..sh + 24].copy_from_slice(&0x200u32.to_le_bytes());
    pe[sh + 36..sh + 40].copy_from_slice(&0x6000_0020u32.to_le_bytes());

    let mut code = x86_64_code();
    code.resize(0x200, 0xCC);
    pe.extend_from_slice(&code);
    pe
}

#[test]
fn pe_sections_map_at_image_base() {
    let image = BinaryImage::from_bytes(pe64_image(0x1_4000_0000, 0x1000), None).expect("image");
    assert_eq!(image.arch(), "x86_64");
    assert_eq!(image.operand_value(0x1_4000_1000, 1).expect("decode"), Some(0x1234));
}

#[test]
fn pe_sections_past_the_address_space_are_skipped() {
    let image =
        BinaryImage::from_bytes(pe64_image(0xFFFF_FFFF_FFFF_F000, 0x2000), None).expect("image");
    assert_eq!(image.arch(), "x86_64");
    // Nothing maps, not even the file itself at address zero.
    assert!(matches!(image.operand_value(0x1000, 1), Err(HostError::Decode(_))));
    assert!(matches!(image.operand_value(0, 1), Err(HostError::Decode(_))));
}

#[test]
fn load_reports_missing_files() {
    let temp = tempfile::tempdir().unwrap();
    let err = BinaryImage::load(&temp.path().join("missing.bin"), None).unwrap_err();
    assert!(matches!(err, HostError::Storage(_)));
}
