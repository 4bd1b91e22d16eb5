//! Per-cycle and final-state trace output, routed through structured
//! `tracing` calls rather than raw `println!`.

use crate::core::Machine;

/// Emits the stage-occupancy and cycle-separator lines for the cycle that
/// was just ticked. Call this from the `on_cycle` hook passed to
/// [`crate::core::Machine::run`].
pub fn trace_cycle(machine: &Machine) {
    let (fetched, decoded, executed) = machine.stage_indices();
    tracing::info!("-------------------------------------------------------");
    tracing::info!("clock cycle: {}", machine.cycle());
    tracing::debug!("Instruction fetched: {}", fetched);
    tracing::debug!("Instruction decoded: {}", decoded);
    tracing::debug!("Instruction executed: {}", executed);
    if let Some(summary) = machine.last_summary() {
        tracing::debug!("{}", summary);
    }
    if machine.last_flags_changed() {
        tracing::debug!(
            "status register: {}",
            machine.status().to_binary_string()
        );
    }
}

/// Emits the final data memory, register file, and run statistics, matching
/// the original's end-of-run dump (adapted to this crate's register/memory
/// widths and routed through `tracing` rather than raw `println!`).
pub fn report_final_state(machine: &Machine) {
    tracing::info!("-- data memory --");
    for (addr, value) in machine.data_mem().iter().enumerate() {
        tracing::info!("mem[{addr}] = {value}");
    }
    tracing::info!("-- registers --");
    for (idx, value) in machine.regs().iter() {
        tracing::info!("R{idx} : {value}");
    }
    tracing::info!("-- stats --");
    tracing::info!("{}", machine.stats().report());
}
