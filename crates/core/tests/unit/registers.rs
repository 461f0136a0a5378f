//! Register bank tests.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rvstep_core::reg::{DataHazard, RegisterFile};

fn bank(seed: u64) -> RegisterFile<u64> {
    RegisterFile::new(&mut SmallRng::seed_from_u64(seed))
}

#[test]
fn x0_always_reads_zero() {
    let mut regs = bank(1);
    assert_eq!(regs.read(0), 0);
    regs.write(0, 0xDEAD_BEEF);
    assert_eq!(regs.read(0), 0);
}

#[test]
fn x0_reads_zero_after_any_sequence_of_writes() {
    let mut regs = bank(2);
    for value in [1u64, u64::MAX, 0x8000_0000_0000_0000, 0] {
        regs.write(0, value);
        assert_eq!(regs.read(0), 0);
    }
}

#[test]
fn other_registers_hold_their_values() {
    let mut regs = bank(3);
    for idx in 1..32 {
        let value = (idx as u64) << 32 | 0xA5;
        regs.write(idx, value);
        assert_eq!(regs.read(idx), value);
    }
}

#[test]
fn registers_are_randomized_not_zeroed() {
    let regs = bank(4);
    // With a 64-bit random fill, 31 zeros would mean a broken generator.
    assert!((1..32).any(|idx| regs.read(idx) != 0));
}

#[test]
fn random_fill_is_deterministic_for_a_fixed_seed() {
    let a = bank(42);
    let b = bank(42);
    for idx in 0..32 {
        assert_eq!(a.read(idx), b.read(idx));
        assert_eq!(a.read_float(idx), b.read_float(idx));
    }
}

#[test]
fn float_registers_are_independent_of_integer_registers() {
    let mut regs = bank(5);
    regs.write_float(3, 0x3FF0_0000_0000_0000);
    let x3 = regs.read(3);
    assert_eq!(regs.read_float(3), 0x3FF0_0000_0000_0000);
    assert_eq!(regs.read(3), x3);
}

#[test]
fn write_then_read_returns_the_sources() {
    let mut regs = bank(6);
    regs.write(2, 20);
    regs.write(3, 30);
    let (a, b) = regs.write_then_read(1, 10, 2, 3).unwrap();
    assert_eq!((a, b), (20, 30));
    assert_eq!(regs.read(1), 10);
}

#[test]
fn write_then_read_rejects_aliasing() {
    let mut regs = bank(7);
    let before = regs.read(5);
    let err = regs.write_then_read(5, 99, 5, 6).unwrap_err();
    assert_eq!(err, DataHazard { dst: 5, src: 5 });
    // The failed write must not land.
    assert_eq!(regs.read(5), before);
}

#[test]
fn write_then_read_exempts_x0() {
    let mut regs = bank(8);
    // Writes to x0 are discarded, so aliasing x0 is harmless.
    let (a, _) = regs.write_then_read(0, 99, 0, 1).unwrap();
    assert_eq!(a, 0);
}
