use crate::arch::{RegisterFile, StatusRegister, DATA_MEM_BYTES, INSTR_MEM_WORDS};
use crate::asm::LoadError;
use crate::isa::decode;
use crate::stats::SimStats;

use super::execute::execute;
use super::pipeline::{DecodeSlot, FetchSlot, Latches, Phase};

/// Owns all architectural and pipeline state and drives the simulation one
/// cycle at a time. This is the sole mutable-state owner in the crate; every
/// other function receives only the sub-borrows it needs for one stage.
pub struct Machine {
    regs: RegisterFile,
    sr: StatusRegister,
    pc: u16,
    instr_mem: Vec<u16>,
    n_instructions: usize,
    data_mem: Vec<i8>,
    phase: Phase,
    latches: Latches,
    cycle: u64,
    branch_seen: bool,
    fetch_counter: u32,
    last_fetched: u32,
    last_decoded: u32,
    last_executed: u32,
    last_summary: Option<String>,
    last_flags_changed: bool,
    stats: SimStats,
}

impl Machine {
    /// Loads an assembled program into a fresh machine with the given
    /// memory/register capacities (taken from [`crate::config::Config`]).
    pub fn load(
        program: Vec<u16>,
        instr_mem_words: usize,
        data_mem_bytes: usize,
    ) -> Result<Self, LoadError> {
        if program.len() > instr_mem_words {
            return Err(LoadError::ProgramTooLarge {
                words: program.len(),
                capacity: instr_mem_words,
            });
        }
        // LDR/STR address their operand with a 6-bit zero-extended immediate
        // (0..=63), so data memory must cover the full field regardless of
        // what any particular program happens to use.
        const MIN_DATA_MEM_BYTES: usize = 64;
        if data_mem_bytes < MIN_DATA_MEM_BYTES {
            return Err(LoadError::DataMemoryTooSmall {
                bytes: data_mem_bytes,
                minimum: MIN_DATA_MEM_BYTES,
            });
        }
        let n_instructions = program.len();
        let mut instr_mem = program;
        instr_mem.resize(instr_mem_words, 0);
        Ok(Self {
            regs: RegisterFile::new(),
            sr: StatusRegister::new(),
            pc: 0,
            instr_mem,
            n_instructions,
            data_mem: vec![0i8; data_mem_bytes],
            phase: Phase::Fill1,
            latches: Latches::default(),
            cycle: 0,
            branch_seen: false,
            fetch_counter: 0,
            last_fetched: 0,
            last_decoded: 0,
            last_executed: 0,
            last_summary: None,
            last_flags_changed: false,
            stats: SimStats::new(),
        })
    }

    /// Loads a program with the architecturally fixed default capacities.
    pub fn load_default(program: Vec<u16>) -> Result<Self, LoadError> {
        Self::load(program, INSTR_MEM_WORDS, DATA_MEM_BYTES)
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn status(&self) -> &StatusRegister {
        &self.sr
    }

    pub fn data_mem(&self) -> &[i8] {
        &self.data_mem
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// 1-based program positions currently occupied in each stage this
    /// cycle, or 0 if that stage is idle.
    pub fn stage_indices(&self) -> (u32, u32, u32) {
        (self.last_fetched, self.last_decoded, self.last_executed)
    }

    /// Human-readable description of the instruction that retired this
    /// cycle, if any, for the trace emitter.
    pub fn last_summary(&self) -> Option<&str> {
        self.last_summary.as_deref()
    }

    /// Whether the status register's bits differ from before this cycle's
    /// execute step, for the trace emitter's "only print SR when it moved"
    /// rule.
    pub fn last_flags_changed(&self) -> bool {
        self.last_flags_changed
    }

    fn is_done(&self) -> bool {
        self.pc as usize >= self.n_instructions
            && self.latches.if_id.is_none()
            && self.latches.id_ex.is_none()
    }

    fn next_fetch_index(&mut self) -> u32 {
        self.fetch_counter += 1;
        self.fetch_counter
    }

    fn try_fetch(&mut self) -> u32 {
        if (self.pc as usize) < self.n_instructions {
            let index = self.next_fetch_index();
            let word = self.instr_mem[self.pc as usize];
            let slot = FetchSlot {
                index,
                pc: self.pc,
                word,
            };
            self.latches.if_id = Some(slot);
            self.pc = self.pc.wrapping_add(1);
            index
        } else {
            0
        }
    }

    /// Runs exactly one clock cycle, returning `true` if the pipeline still
    /// has work and should be ticked again, `false` once the program has
    /// fully drained.
    pub fn tick(&mut self) -> bool {
        if self.is_done() {
            return false;
        }
        self.cycle += 1;

        let (mut fetched, mut decoded, mut executed) = (0u32, 0u32, 0u32);
        let mut summary = None;
        let mut flags_changed = false;

        match self.phase {
            Phase::Fill1 => {
                fetched = self.try_fetch();
                self.phase = Phase::Fill2;
            }
            Phase::Fill2 => {
                if let Some(slot) = self.latches.if_id.take() {
                    decoded = slot.index;
                    self.latches.id_ex = Some(DecodeSlot {
                        index: slot.index,
                        pc: slot.pc,
                        decoded: decode(slot.word),
                    });
                }
                fetched = self.try_fetch();
                self.phase = Phase::Steady;
            }
            Phase::Steady => {
                // Execute observes last cycle's decode, and decode observes
                // last cycle's fetch: both latches are drained before either
                // is refilled this cycle.
                let prior_id_ex = self.latches.id_ex.take();
                let prior_if_id = self.latches.if_id.take();

                let mut flush = None;
                if let Some(slot) = prior_id_ex {
                    executed = slot.index;
                    let sr_before = self.sr.bits();
                    let outcome = execute(
                        &slot.decoded,
                        slot.pc,
                        &mut self.regs,
                        &mut self.sr,
                        &mut self.data_mem,
                    );
                    flags_changed = self.sr.bits() != sr_before;
                    summary = Some(outcome.summary);
                    flush = outcome.flush;
                    self.stats.record_retired(slot.decoded.opcode);
                }

                if let Some(req) = flush {
                    self.latches.clear();
                    self.pc = req.new_pc;
                    self.branch_seen = true;
                    self.phase = Phase::Fill1;
                    self.stats.record_flush();
                } else {
                    if let Some(slot) = prior_if_id {
                        decoded = slot.index;
                        self.latches.id_ex = Some(DecodeSlot {
                            index: slot.index,
                            pc: slot.pc,
                            decoded: decode(slot.word),
                        });
                    }
                    fetched = self.try_fetch();
                }
            }
        }

        self.last_fetched = fetched;
        self.last_decoded = decoded;
        self.last_executed = executed;
        self.last_summary = summary;
        self.last_flags_changed = flags_changed;
        self.stats.record_cycle();
        true
    }

    /// Runs the machine to completion, invoking `on_cycle` after every tick.
    pub fn run(&mut self, mut on_cycle: impl FnMut(&Machine)) {
        while self.tick() {
            on_cycle(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble_program;

    fn run_program(src: &str) -> Machine {
        let words = assemble_program(src).expect("test program should assemble");
        let mut machine = Machine::load_default(words).expect("program should fit");
        machine.run(|_| {});
        machine
    }

    #[test]
    fn e1_arithmetic_and_flags() {
        let m = run_program("MOVI R1, 5\nMOVI R2, 3\nADD R1, R2\n");
        assert_eq!(m.regs().read(1), 8);
        assert_eq!(m.regs().read(2), 3);
        assert_eq!(m.status().bits(), 0);
    }

    #[test]
    fn e3_carry_and_zero() {
        let m = run_program("MOVI R1, -1\nMOVI R2, 1\nADD R1, R2\n");
        assert_eq!(m.regs().read(1), 0);
        assert!(m.status().get(crate::arch::status::Flag::Carry));
        assert!(m.status().get(crate::arch::status::Flag::Zero));
    }

    #[test]
    fn e4_branch_taken_skips_one_instruction() {
        let m = run_program("MOVI R1, 0\nBEQZ R1, 2\nMOVI R2, 9\nMOVI R3, 7\n");
        assert_eq!(m.regs().read(2), 0);
        assert_eq!(m.regs().read(3), 7);
        assert!(m.stats().flushes >= 1);
    }

    #[test]
    fn e5_store_load_round_trip() {
        let m = run_program("MOVI R1, 42\nSTR R1, 10\nLDR R2, 10\n");
        assert_eq!(m.data_mem()[10], 42);
        assert_eq!(m.regs().read(2), 42);
    }

    #[test]
    fn e6_shift_left_then_right() {
        let m = run_program("MOVI R1, 1\nSAL R1, 3\nSAR R1, 1\n");
        assert_eq!(m.regs().read(1), 4);
    }

    #[test]
    fn loading_the_same_program_twice_is_idempotent() {
        use pretty_assertions::assert_eq;

        let words = assemble_program("MOVI R1, 1\nMOVI R2, 2\n").unwrap();
        let a = Machine::load_default(words.clone()).unwrap();
        let b = Machine::load_default(words).unwrap();
        assert_eq!(a.instr_mem, b.instr_mem);
    }

    #[test]
    fn flags_changed_is_reported_only_on_the_cycle_sr_actually_moves() {
        let words = assemble_program("MOVI R1, 120\nMOVI R2, 20\nADD R1, R2\n").unwrap();
        let mut m = Machine::load_default(words).unwrap();
        let mut saw_change = false;
        while m.tick() {
            if m.last_flags_changed() {
                saw_change = true;
                assert!(m.last_summary().unwrap().starts_with("ADD"));
            }
        }
        assert!(saw_change, "ADD should have changed the status register");
    }

    #[test]
    fn program_larger_than_capacity_is_a_load_error() {
        let words = vec![0u16; 4];
        let result = Machine::load(words, 2, 16);
        assert!(matches!(result, Err(LoadError::ProgramTooLarge { .. })));
    }

    #[test]
    fn data_memory_smaller_than_the_six_bit_address_space_is_a_load_error() {
        let words = assemble_program("MOVI R1, 5\n").unwrap();
        let result = Machine::load(words, 1024, 16);
        assert!(matches!(result, Err(LoadError::DataMemoryTooSmall { .. })));
    }

    #[test]
    fn a_store_to_the_top_of_the_six_bit_address_space_does_not_panic() {
        let words = assemble_program("MOVI R1, 9\nSTR R1, 63\n").unwrap();
        let mut m = Machine::load(words, 1024, 64).unwrap();
        m.run(|_| {});
        assert_eq!(m.data_mem()[63], 9);
    }
}
