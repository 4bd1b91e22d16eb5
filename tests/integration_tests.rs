//! End-to-end scenarios exercising the assembler, pipeline controller, and
//! execute unit together through the public crate API only.

use pipeline_sim::arch::status::Flag;
use pipeline_sim::asm::assemble_program;
use pipeline_sim::core::Machine;

fn run(source: &str) -> Machine {
    let words = assemble_program(source).expect("program should assemble");
    let mut machine = Machine::load_default(words).expect("program should fit memory");
    machine.run(|_| {});
    machine
}

#[test]
fn arithmetic_program_leaves_clear_flags() {
    let m = run("MOVI R1, 5\nMOVI R2, 3\nADD R1, R2\n");
    assert_eq!(m.regs().read(1), 8);
    assert_eq!(m.regs().read(2), 3);
    assert_eq!(m.status().bits(), 0);
}

#[test]
fn signed_overflow_sets_overflow_and_negative_but_not_sign() {
    let m = run("MOVI R1, 120\nMOVI R2, 20\nADD R1, R2\n");
    assert_eq!(m.regs().read(1), -116);
    assert!(m.status().get(Flag::Overflow));
    assert!(m.status().get(Flag::Negative));
    assert!(!m.status().get(Flag::Sign));
}

#[test]
fn unsigned_carry_without_signed_overflow() {
    let m = run("MOVI R1, -1\nMOVI R2, 1\nADD R1, R2\n");
    assert_eq!(m.regs().read(1), 0);
    assert!(m.status().get(Flag::Carry));
    assert!(m.status().get(Flag::Zero));
    assert!(!m.status().get(Flag::Overflow));
}

#[test]
fn taken_branch_skips_exactly_one_instruction_and_flushes() {
    let m = run("MOVI R1, 0\nBEQZ R1, 2\nMOVI R2, 9\nMOVI R3, 7\n");
    assert_eq!(m.regs().read(2), 0, "skipped instruction must not execute");
    assert_eq!(m.regs().read(3), 7);
    assert_eq!(m.stats().flushes, 1);
}

#[test]
fn untaken_branch_does_not_flush_or_skip() {
    let m = run("MOVI R1, 1\nBEQZ R1, 2\nMOVI R2, 9\nMOVI R3, 7\n");
    assert_eq!(m.regs().read(2), 9);
    assert_eq!(m.regs().read(3), 7);
    assert_eq!(m.stats().flushes, 0);
}

#[test]
fn store_then_load_round_trips_through_data_memory() {
    let m = run("MOVI R1, 42\nSTR R1, 10\nLDR R2, 10\n");
    assert_eq!(m.data_mem()[10], 42);
    assert_eq!(m.regs().read(2), 42);
}

#[test]
fn shift_left_then_arithmetic_shift_right() {
    let m = run("MOVI R1, 1\nSAL R1, 3\nSAR R1, 1\n");
    assert_eq!(m.regs().read(1), 4);
    assert!(!m.status().get(Flag::Negative));
    assert!(!m.status().get(Flag::Zero));
}

#[test]
fn br_jumps_to_concatenated_register_address() {
    // R1 holds 0, R2 holds 4: BR targets word 4, which is MOVI R3, 99.
    let m = run("MOVI R1, 0\nMOVI R2, 4\nBR R1, R2\nMOVI R3, 1\nMOVI R3, 99\n");
    assert_eq!(m.regs().read(3), 99);
    assert_eq!(m.stats().flushes, 1);
}

#[test]
fn only_the_opcodes_that_write_registers_change_the_register_file() {
    let m = run("MOVI R1, 5\nSTR R1, 0\nLDR R2, 0\n");
    for idx in 3..64 {
        assert_eq!(m.regs().read(idx), 0);
    }
}

#[test]
fn loading_the_same_assembled_program_twice_yields_identical_final_state() {
    let words = assemble_program("MOVI R1, 7\nADD R1, R1\n").unwrap();
    let mut a = Machine::load_default(words.clone()).unwrap();
    let mut b = Machine::load_default(words).unwrap();
    a.run(|_| {});
    b.run(|_| {});
    assert_eq!(a.regs().read(1), b.regs().read(1));
    assert_eq!(a.cycle(), b.cycle());
}
