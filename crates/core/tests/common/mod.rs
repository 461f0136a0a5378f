//! Shared test infrastructure.
//!
//! Hand-rolled instruction encoders (independent of the crate's own
//! compressed-expansion encoders, so the two cross-check each other),
//! Intel HEX record construction with valid checksums, and tracing setup
//! for debugging failing runs.

#![allow(dead_code)]

use std::io::Cursor;

use rvstep_core::arith::Xlen;
use rvstep_core::{Config, Cpu, ImageFormat, InstructionSet};
use std::sync::Arc;

/// Initialises a test-writer tracing subscriber; safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── instruction encoders ──────────────────────────────────

/// Encodes an R-type instruction.
pub fn r_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, rs2: u32, funct7: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

/// Encodes an I-type instruction.
pub fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32) & 0xFFF) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

/// Encodes an S-type store.
pub fn s_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = (imm as u32) & 0xFFF;
    (imm >> 5) << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | (imm & 0x1F) << 7 | 0b010_0011
}

/// Encodes a B-type branch with a byte offset.
pub fn b_type(funct3: u32, rs1: u32, rs2: u32, offset: i32) -> u32 {
    let v = offset as u32;
    ((v >> 12) & 1) << 31
        | ((v >> 5) & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | funct3 << 12
        | ((v >> 1) & 0xF) << 8
        | ((v >> 11) & 1) << 7
        | 0b110_0011
}

/// Encodes a U-type instruction from the 20-bit upper immediate.
pub fn u_type(opcode: u32, rd: u32, imm20: u32) -> u32 {
    (imm20 & 0xF_FFFF) << 12 | rd << 7 | opcode
}

/// Encodes a J-type jump with a byte offset.
pub fn j_type(rd: u32, offset: i32) -> u32 {
    let v = offset as u32;
    ((v >> 20) & 1) << 31
        | ((v >> 1) & 0x3FF) << 21
        | ((v >> 11) & 1) << 20
        | ((v >> 12) & 0xFF) << 12
        | rd << 7
        | 0b110_1111
}

/// `addi rd, rs1, imm`.
pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b001_0011, rd, 0b000, rs1, imm)
}

/// `add rd, rs1, rs2`.
pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0b011_0011, rd, 0b000, rs1, rs2, 0)
}

/// `mul rd, rs1, rs2`.
pub fn mul(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0b011_0011, rd, 0b000, rs1, rs2, 1)
}

/// `lui rd, imm20`.
pub fn lui(rd: u32, imm20: u32) -> u32 {
    u_type(0b011_0111, rd, imm20)
}

/// `jal rd, offset`.
pub fn jal(rd: u32, offset: i32) -> u32 {
    j_type(rd, offset)
}

/// `jalr rd, rs1, imm`.
pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b110_0111, rd, 0b000, rs1, imm)
}

/// `beq rs1, rs2, offset`.
pub fn beq(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b000, rs1, rs2, offset)
}

/// `bge rs1, rs2, offset`.
pub fn bge(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b101, rs1, rs2, offset)
}

/// `lw rd, imm(rs1)`.
pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b010, rs1, imm)
}

/// `sw rs2, imm(rs1)`.
pub fn sw(rs1: u32, rs2: u32, imm: i32) -> u32 {
    s_type(0b010, rs1, rs2, imm)
}

/// `ld rd, imm(rs1)`.
pub fn ld(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b011, rs1, imm)
}

/// `sd rs2, imm(rs1)`.
pub fn sd(rs1: u32, rs2: u32, imm: i32) -> u32 {
    s_type(0b011, rs1, rs2, imm)
}

/// An AMO-opcode instruction from its funct5/width selectors.
pub fn amo(funct5: u32, width: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0b010_1111, rd, width, rs1, rs2, funct5 << 2)
}

/// `ecall`.
pub const ECALL: u32 = 0x0000_0073;

// ── images and processors ─────────────────────────────────

/// Flattens 32-bit words into a little-endian byte image.
pub fn image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Builds a processor with a pinned seed and loads `program` at zero.
pub fn cpu_with_program<X: Xlen>(isa: Arc<InstructionSet<X>>, program: &[u32]) -> Cpu<X> {
    let mut cpu = Cpu::new(isa, &Config::default().with_seed(0xBEEF));
    cpu.load_reader(Cursor::new(image(program)), ImageFormat::Binary, 0)
        .unwrap();
    cpu
}

/// Steps until the pc stops moving, with an iteration guard.
///
/// Returns the number of steps executed before the stall.
pub fn run_to_stall<X: Xlen>(cpu: &mut Cpu<X>, max_steps: usize) -> usize {
    for step in 0..max_steps {
        let before = cpu.program_counter();
        cpu.step().unwrap();
        if cpu.program_counter() == before {
            return step;
        }
    }
    panic!("program did not stall within {max_steps} steps");
}

// ── Intel HEX builders ────────────────────────────────────

/// Builds one record line with a correct checksum.
pub fn ihex_record(address: u16, record_type: u8, payload: &[u8]) -> String {
    let mut sum = (payload.len() as u8)
        .wrapping_add((address >> 8) as u8)
        .wrapping_add(address as u8)
        .wrapping_add(record_type);
    let mut line = format!(":{:02X}{address:04X}{record_type:02X}", payload.len());
    for &byte in payload {
        sum = sum.wrapping_add(byte);
        line.push_str(&format!("{byte:02X}"));
    }
    line.push_str(&format!("{:02X}", sum.wrapping_neg()));
    line
}

/// A data record.
pub fn ihex_data(address: u16, payload: &[u8]) -> String {
    ihex_record(address, 0x00, payload)
}

/// The end-of-file record.
pub fn ihex_eof() -> String {
    ihex_record(0, 0x01, &[])
}
