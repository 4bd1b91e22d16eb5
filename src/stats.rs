//! Cycle and retirement counters collected during a run, reported at
//! termination alongside the architectural final-state dump.

use std::time::Instant;

use crate::isa::Opcode;

/// Running counters for a single simulation: cycle count, retirements by
/// opcode class, and flush count.
pub struct SimStats {
    start_time: Instant,
    pub cycles: u64,
    pub instructions_retired: u64,
    pub inst_alu: u64,
    pub inst_branch: u64,
    pub inst_memory: u64,
    pub inst_move: u64,
    pub flushes: u64,
}

impl SimStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_retired: 0,
            inst_alu: 0,
            inst_branch: 0,
            inst_memory: 0,
            inst_move: 0,
            flushes: 0,
        }
    }

    pub fn record_cycle(&mut self) {
        self.cycles += 1;
    }

    pub fn record_retired(&mut self, opcode: Opcode) {
        self.instructions_retired += 1;
        match opcode {
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Andi | Opcode::Eor
            | Opcode::Sal | Opcode::Sar => self.inst_alu += 1,
            Opcode::Beqz | Opcode::Br => self.inst_branch += 1,
            Opcode::Ldr | Opcode::Str => self.inst_memory += 1,
            Opcode::Movi => self.inst_move += 1,
            Opcode::Undefined(_) => {}
        }
    }

    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Renders the summary the trace emitter prints at termination.
    pub fn report(&self) -> String {
        format!(
            "cycles={} instructions_retired={} alu={} branch={} memory={} move={} flushes={} wall_time={:.6}s",
            self.cycles,
            self.instructions_retired,
            self.inst_alu,
            self.inst_branch,
            self.inst_memory,
            self.inst_move,
            self.flushes,
            self.elapsed_secs(),
        )
    }
}

impl Default for SimStats {
    fn default() -> Self {
        Self::new()
    }
}
