//! Atomic instruction tests.
//!
//! Exercises the reservation protocol and the AMO read-modify-write family
//! through actual instruction execution, mirroring the lr/sc usage pattern
//! of bare-metal exclusive-access firmware.

use std::sync::Arc;

use rvstep_core::isa::{InstructionSet, rv64i, rva};

use crate::common::{self, amo, cpu_with_program, run_to_stall};

/// RV64IA, enough to run lr/sc/amo sequences.
fn rv64ia() -> Arc<InstructionSet<u64>> {
    Arc::new(InstructionSet::from_groups([
        rv64i::instructions(),
        rva::rv64a(),
    ]))
}

mod f5 {
    pub const LR: u32 = 0b00010;
    pub const SC: u32 = 0b00011;
    pub const AMOSWAP: u32 = 0b00001;
    pub const AMOADD: u32 = 0b00000;
    pub const AMOMIN: u32 = 0b10000;
    pub const AMOMINU: u32 = 0b11000;
}

const WORD: u32 = 0b010;
const DOUBLE: u32 = 0b011;

#[test]
fn lr_sc_succeeds_exactly_once() {
    let program = [
        common::addi(5, 0, 64),         // x5 = addr
        common::addi(6, 0, 1),          // x6 = 1
        common::sd(5, 6, 0),            // mem[64] = 1
        amo(f5::LR, DOUBLE, 7, 5, 0),   // lr.d x7, (x5)
        common::addi(8, 7, 41),         // x8 = x7 + 41
        amo(f5::SC, DOUBLE, 28, 5, 8),  // sc.d x28, x8, (x5): succeeds
        amo(f5::SC, DOUBLE, 29, 5, 8),  // sc.d x29, x8, (x5): fails
        0,
    ];
    let mut cpu = cpu_with_program(rv64ia(), &program);
    let _ = run_to_stall(&mut cpu, 20);

    assert_eq!(cpu.read_register(7), 1);
    assert_eq!(cpu.read_register(28), 0, "first sc must succeed");
    assert_eq!(cpu.read_register(29), 1, "second sc must fail");
    assert_eq!(cpu.memory().read::<u64>(64).unwrap(), 42);
}

#[test]
fn sc_without_any_reservation_fails() {
    let program = [
        common::addi(5, 0, 64),
        common::addi(6, 0, 9),
        amo(f5::SC, WORD, 28, 5, 6), // sc.w with no reservation
        0,
    ];
    let mut cpu = cpu_with_program(rv64ia(), &program);
    cpu.memory_mut().write::<u32>(64, 7).unwrap();
    let _ = run_to_stall(&mut cpu, 10);
    assert_eq!(cpu.read_register(28), 1);
    assert_eq!(cpu.memory().read::<u32>(64).unwrap(), 7);
}

#[test]
fn amoadd_returns_the_old_value() {
    let program = [
        common::addi(5, 0, 128),          // x5 = addr
        common::addi(6, 0, 5),            // x6 = 5
        common::sw(5, 6, 0),              // mem[128] = 5
        common::addi(7, 0, 3),            // x7 = 3
        amo(f5::AMOADD, WORD, 28, 5, 7),  // amoadd.w x28, x7, (x5)
        0,
    ];
    let mut cpu = cpu_with_program(rv64ia(), &program);
    let _ = run_to_stall(&mut cpu, 10);
    assert_eq!(cpu.read_register(28), 5);
    assert_eq!(cpu.memory().read::<u32>(128).unwrap(), 8);
}

#[test]
fn amoswap_word_results_sign_extend() {
    let program = [
        common::addi(5, 0, 128),
        common::addi(6, 0, -1),            // x6 = -1
        common::sw(5, 6, 0),               // mem[128] = 0xFFFF_FFFF
        common::addi(7, 0, 2),
        amo(f5::AMOSWAP, WORD, 28, 5, 7),  // old value -1 into x28
        0,
    ];
    let mut cpu = cpu_with_program(rv64ia(), &program);
    let _ = run_to_stall(&mut cpu, 10);
    assert_eq!(cpu.read_register(28), u64::MAX);
    assert_eq!(cpu.memory().read::<u32>(128).unwrap(), 2);
}

#[test]
fn signed_and_unsigned_minimum_disagree_on_negative_values() {
    let program = [
        common::addi(5, 0, 128),
        common::addi(6, 0, -1),            // x6 = -1
        common::sw(5, 6, 0),               // mem[128] = 0xFFFF_FFFF
        common::addi(7, 0, 3),
        amo(f5::AMOMIN, WORD, 28, 5, 7),   // signed: min(-1, 3) = -1
        amo(f5::AMOMINU, WORD, 29, 5, 7),  // unsigned: min(0xFFFF_FFFF, 3) = 3
        0,
    ];
    let mut cpu = cpu_with_program(rv64ia(), &program);
    let _ = run_to_stall(&mut cpu, 10);
    assert_eq!(cpu.read_register(28), u64::MAX);
    assert_eq!(cpu.memory().read::<u32>(128).unwrap(), 3);
}

#[test]
fn amo_disassembly() {
    let set = rv64ia();
    assert_eq!(
        set.format(amo(f5::LR, DOUBLE, 7, 5, 0), false),
        "lr.d x7, (x5)"
    );
    assert_eq!(
        set.format(amo(f5::SC, WORD, 28, 5, 8), false),
        "sc.w x28, x8, (x5)"
    );
    assert_eq!(
        set.format(amo(f5::AMOADD, WORD, 1, 2, 3), false),
        "amoadd.w x1, x3, (x2)"
    );
}
