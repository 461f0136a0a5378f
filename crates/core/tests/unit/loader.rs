//! Image-loading tests: Intel HEX validation, binary copy, format
//! dispatch.

use std::io::Cursor;
use std::io::Write as _;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rvstep_core::mem::ihex::{Record, RecordError, RecordKind};
use rvstep_core::mem::{ImageFormat, LoadError, Memory};
use rvstep_core::{Config, Cpu, OobPolicy, isa};

use crate::common;

fn memory() -> Memory {
    Memory::new(0x1000, OobPolicy::Clamp, &mut SmallRng::seed_from_u64(3))
}

fn load(mem: &mut Memory, text: &str) -> Result<(), LoadError> {
    mem.load_image(Cursor::new(text.to_owned()), ImageFormat::IntelHex, 0)
}

#[test]
fn parses_a_data_record() {
    let line = common::ihex_data(0x0010, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let record = Record::parse(&line).unwrap();
    assert_eq!(record.kind, RecordKind::Data);
    assert_eq!(record.address, 0x10);
    assert_eq!(record.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn accepts_trailing_carriage_returns() {
    let line = common::ihex_eof() + "\r";
    assert_eq!(Record::parse(&line).unwrap().kind, RecordKind::EndOfFile);
}

#[test]
fn rejects_short_lines_and_missing_prefixes() {
    assert_eq!(Record::parse(":00"), Err(RecordError::TooShort));
    assert_eq!(
        Record::parse("00000001FF00"),
        Err(RecordError::MissingPrefix)
    );
}

#[test]
fn rejects_odd_nibble_counts() {
    assert_eq!(
        Record::parse(":00000001FF0"),
        Err(RecordError::OddNibbleCount)
    );
}

#[test]
fn rejects_non_hex_digits() {
    assert_eq!(
        Record::parse(":0000000G00FF"),
        Err(RecordError::BadHexDigit('G'))
    );
}

#[test]
fn rejects_bad_record_types() {
    let line = common::ihex_record(0, 0x09, &[]);
    assert_eq!(Record::parse(&line), Err(RecordError::BadRecordType(0x09)));
}

#[test]
fn rejects_checksum_mismatches() {
    let mut line = common::ihex_data(0, &[0x01, 0x02]);
    // Corrupt the checksum byte.
    line.replace_range(line.len() - 2.., "00");
    match Record::parse(&line) {
        Err(RecordError::ChecksumMismatch { found: 0x00, .. }) => {}
        other => panic!("expected a checksum mismatch, got {other:?}"),
    }
}

#[test]
fn rejects_byte_count_type_mismatches() {
    // End-of-file records must carry zero bytes.
    let line = common::ihex_record(0, 0x01, &[0xAA]);
    assert_eq!(
        Record::parse(&line),
        Err(RecordError::ByteCountMismatch {
            kind: RecordKind::EndOfFile,
            expected: 0,
            found: 1,
        })
    );
    // Start-address records must carry four bytes.
    let line = common::ihex_record(0, 0x05, &[0x01, 0x02]);
    assert_eq!(
        Record::parse(&line),
        Err(RecordError::ByteCountMismatch {
            kind: RecordKind::StartLinearAddress,
            expected: 4,
            found: 2,
        })
    );
    // Extended-address records must carry two bytes.
    let line = common::ihex_record(0, 0x04, &[0x01]);
    assert_eq!(
        Record::parse(&line),
        Err(RecordError::ByteCountMismatch {
            kind: RecordKind::ExtendedLinearAddress,
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn loads_data_records_into_memory() {
    let mut mem = memory();
    let text = [
        common::ihex_data(0x0000, &[0x13, 0x00, 0x00, 0x00]),
        common::ihex_data(0x0020, &[0xAA, 0xBB]),
        common::ihex_eof(),
    ]
    .join("\n");
    load(&mut mem, &text).unwrap();
    assert_eq!(mem.read::<u32>(0).unwrap(), 0x0000_0013);
    assert_eq!(mem.read::<u16>(0x20).unwrap(), 0xBBAA);
}

#[test]
fn extended_segment_addresses_scale_by_sixteen() {
    let mut mem = memory();
    let text = [
        common::ihex_record(0, 0x02, &[0x00, 0x10]),
        common::ihex_data(0x0004, &[0x7F]),
        common::ihex_eof(),
    ]
    .join("\n");
    load(&mut mem, &text).unwrap();
    // Segment value 0x0010, scaled by 16, plus the record address.
    assert_eq!(mem.read::<u8>(0x10 * 16 + 4).unwrap(), 0x7F);
}

#[test]
fn extended_linear_addresses_shift_by_sixteen() {
    // The upper half-word lands beyond this memory; a clamped write just
    // disappears, so use a zero upper word to stay observable.
    let mut mem = memory();
    let text = [
        common::ihex_record(0, 0x04, &[0x00, 0x00]),
        common::ihex_data(0x0008, &[0x55]),
        common::ihex_eof(),
    ]
    .join("\n");
    load(&mut mem, &text).unwrap();
    assert_eq!(mem.read::<u8>(8).unwrap(), 0x55);
}

#[test]
fn records_after_end_of_file_are_ignored() {
    let mut mem = memory();
    let text = [
        common::ihex_data(0, &[0x01]),
        common::ihex_data(4, &[0x00]),
        common::ihex_eof(),
        common::ihex_data(4, &[0x99]),
    ]
    .join("\n");
    load(&mut mem, &text).unwrap();
    assert_eq!(mem.read::<u8>(0).unwrap(), 0x01);
    // The post-EOF record never lands.
    assert_eq!(mem.read::<u8>(4).unwrap(), 0x00);
}

#[test]
fn loading_aborts_at_the_first_malformed_record() {
    let mut mem = memory();
    let text = [
        common::ihex_data(0, &[0x01]),
        ":0BAD".to_owned(),
        common::ihex_data(4, &[0x02]),
    ]
    .join("\n");
    let err = load(&mut mem, &text).unwrap_err();
    match err {
        LoadError::Record { line, source } => {
            assert_eq!(line, 2);
            assert_eq!(source, RecordError::TooShort);
        }
        other => panic!("expected a record error, got {other}"),
    }
    // The first record landed before the abort: the load is partial.
    assert_eq!(mem.read::<u8>(0).unwrap(), 0x01);
}

#[test]
fn binary_images_copy_to_the_offset() {
    let mut mem = memory();
    mem.load_image(Cursor::new(vec![1u8, 2, 3, 4]), ImageFormat::Binary, 0x40)
        .unwrap();
    assert_eq!(mem.read::<u32>(0x40).unwrap(), 0x0403_0201);
}

#[test]
fn elf_is_a_recognised_but_unsupported_format() {
    let mut mem = memory();
    let err = mem
        .load_image(Cursor::new(Vec::new()), ImageFormat::Elf, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::UnsupportedFormat(ImageFormat::Elf)
    ));
}

#[test]
fn cpu_load_path_resets_then_populates() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let text = [
        common::ihex_data(0, &common::addi(1, 0, 42).to_le_bytes()),
        common::ihex_eof(),
    ]
    .join("\n");
    file.write_all(text.as_bytes()).unwrap();

    let isa = Arc::new(isa::rv64imc_zicsr_zifencei());
    let mut cpu = Cpu::new(isa, &Config::default().with_seed(5));
    cpu.load_path(file.path(), ImageFormat::IntelHex, 0).unwrap();
    assert_eq!(cpu.program_counter(), 0);
    cpu.step().unwrap();
    assert_eq!(cpu.read_register(1), 42);
}
