//! Memory model tests: typed access, bounds policy, reservations.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rstest::rstest;
use rvstep_core::mem::Memory;
use rvstep_core::{Config, OobPolicy};

fn memory(policy: OobPolicy) -> Memory {
    Memory::new(
        Config::default().memory_size,
        policy,
        &mut SmallRng::seed_from_u64(99),
    )
}

#[rstest]
#[case::byte(0xA5u8 as u64, 1)]
#[case::halfword(0xBEEF, 2)]
#[case::word(0xDEAD_BEEF, 4)]
#[case::doubleword(0x0123_4567_89AB_CDEF, 8)]
fn typed_round_trips(#[case] value: u64, #[case] width: usize) {
    let mut mem = memory(OobPolicy::Clamp);
    for addr in [0u64, 1, 17, 4096] {
        match width {
            1 => {
                mem.write::<u8>(addr, value as u8).unwrap();
                assert_eq!(mem.read::<u8>(addr).unwrap(), value as u8);
            }
            2 => {
                mem.write::<u16>(addr, value as u16).unwrap();
                assert_eq!(mem.read::<u16>(addr).unwrap(), value as u16);
            }
            4 => {
                mem.write::<u32>(addr, value as u32).unwrap();
                assert_eq!(mem.read::<u32>(addr).unwrap(), value as u32);
            }
            _ => {
                mem.write::<u64>(addr, value).unwrap();
                assert_eq!(mem.read::<u64>(addr).unwrap(), value);
            }
        }
    }
}

#[test]
fn values_are_stored_little_endian() {
    let mut mem = memory(OobPolicy::Clamp);
    mem.write::<u32>(8, 0x1122_3344).unwrap();
    assert_eq!(mem.data()[8..12], [0x44, 0x33, 0x22, 0x11]);
    assert_eq!(mem.read::<u16>(8).unwrap(), 0x3344);
}

#[test]
fn clamped_writes_drop_the_overhanging_tail() {
    let mut mem = memory(OobPolicy::Clamp);
    let end = mem.len() as u64;
    mem.write::<u8>(end - 2, 0).unwrap();
    mem.write::<u8>(end - 1, 0).unwrap();
    mem.write::<u32>(end - 2, 0xAABB_CCDD).unwrap();
    assert_eq!(mem.data()[mem.len() - 2..], [0xDD, 0xCC]);
}

#[test]
fn clamped_reads_zero_fill_the_missing_tail() {
    let mut mem = memory(OobPolicy::Clamp);
    let end = mem.len() as u64;
    mem.write::<u8>(end - 2, 0x11).unwrap();
    mem.write::<u8>(end - 1, 0x22).unwrap();
    assert_eq!(mem.read::<u32>(end - 2).unwrap(), 0x0000_2211);
    // Entirely out of range: all bytes missing.
    assert_eq!(mem.read::<u64>(end + 8).unwrap(), 0);
}

#[test]
fn fault_policy_rejects_overhanging_accesses() {
    let mut mem = memory(OobPolicy::Fault);
    let end = mem.len() as u64;
    let fault = mem.read::<u32>(end - 2).unwrap_err();
    assert_eq!(fault.addr, end - 2);
    assert_eq!(fault.len, 4);
    assert!(mem.write::<u64>(end, 1).is_err());
    // In-bounds accesses are unaffected.
    mem.write::<u32>(end - 4, 7).unwrap();
    assert_eq!(mem.read::<u32>(end - 4).unwrap(), 7);
}

#[test]
fn reservation_protocol() {
    let mut mem = memory(OobPolicy::Clamp);
    mem.write::<u64>(64, 1).unwrap();

    let observed = mem.load_reserved::<u64>(64).unwrap();
    assert_eq!(observed, 1);
    assert_eq!(mem.reservation(), Some(64));

    // First conditional store succeeds and consumes the reservation.
    assert!(mem.store_conditional::<u64>(64, 2).unwrap());
    assert_eq!(mem.read::<u64>(64).unwrap(), 2);
    assert_eq!(mem.reservation(), None);

    // Second attempt fails without side effects.
    assert!(!mem.store_conditional::<u64>(64, 3).unwrap());
    assert_eq!(mem.read::<u64>(64).unwrap(), 2);
}

#[test]
fn conditional_store_to_the_wrong_address_keeps_the_reservation() {
    let mut mem = memory(OobPolicy::Clamp);
    let _ = mem.load_reserved::<u32>(128).unwrap();
    assert!(!mem.store_conditional::<u32>(132, 9).unwrap());
    assert_eq!(mem.reservation(), Some(128));
    assert!(mem.store_conditional::<u32>(128, 9).unwrap());
}

#[test]
fn a_second_load_reserved_replaces_the_slot() {
    let mut mem = memory(OobPolicy::Clamp);
    let _ = mem.load_reserved::<u32>(16).unwrap();
    let _ = mem.load_reserved::<u32>(32).unwrap();
    assert_eq!(mem.reservation(), Some(32));
    assert!(!mem.store_conditional::<u32>(16, 1).unwrap());
    assert!(mem.store_conditional::<u32>(32, 1).unwrap());
}

#[test]
fn plain_stores_leave_the_reservation_alone() {
    let mut mem = memory(OobPolicy::Clamp);
    let _ = mem.load_reserved::<u32>(16).unwrap();
    mem.write::<u32>(16, 5).unwrap();
    assert_eq!(mem.reservation(), Some(16));
}

#[test]
fn randomize_is_deterministic_and_clears_the_reservation() {
    let mut a = memory(OobPolicy::Clamp);
    let b = memory(OobPolicy::Clamp);
    assert_eq!(a.data(), b.data());

    let _ = a.load_reserved::<u8>(0).unwrap();
    a.randomize(&mut SmallRng::seed_from_u64(99));
    assert_eq!(a.reservation(), None);
}
