use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use pipeline_sim::asm::{assemble_program, LoadError};
use pipeline_sim::config::Config;
use pipeline_sim::core::Machine;
use pipeline_sim::trace::{report_final_state, trace_cycle};

/// Cycle-accurate simulator for a three-stage in-order pipeline.
#[derive(Parser, Debug)]
#[command(author, version, about = "Three-stage pipeline simulator")]
struct Args {
    /// Path to the assembly program to load.
    #[arg(default_value = "instructions.txt")]
    program: PathBuf,

    /// Optional TOML configuration file; built-in defaults apply if absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configuration's trace flag.
    #[arg(long)]
    trace: Option<bool>,
}

/// Reads the program file and assembles it, surfacing file I/O failures as
/// a [`LoadError::Io`] alongside the assembler's own load-time errors.
fn load_program(path: &PathBuf) -> Result<Vec<u16>, LoadError> {
    let source = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    assemble_program(&source)
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match fs::read_to_string(path) {
        Ok(text) => Config::from_toml(&text).unwrap_or_else(|e| {
            tracing::warn!("failed to parse config {:?}: {e}, using defaults", path);
            Config::default()
        }),
        Err(e) => {
            tracing::warn!("failed to read config {:?}: {e}, using defaults", path);
            Config::default()
        }
    }
}

fn main() {
    let args = Args::parse();
    let mut config = load_config(args.config.as_ref());
    if let Some(trace) = args.trace {
        config.general.trace = trace;
    }

    let filter = if config.general.trace { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .without_time()
        .init();

    let program_path = args.program;
    tracing::info!("loading program from {:?}", program_path);
    println!("[*] Three-stage pipeline simulator");
    println!("[*] program         : {:?}", program_path);
    println!(
        "[*] instr_mem_words : {}",
        config.memory.instr_mem_words
    );
    println!("[*] data_mem_bytes  : {}", config.memory.data_mem_bytes);
    println!("[*] trace           : {}", config.general.trace);

    let words = match load_program(&program_path) {
        Ok(words) => words,
        Err(e) => {
            tracing::error!("FATAL LOAD ERROR: {e}");
            process::exit(1);
        }
    };

    let mut machine = match Machine::load(
        words,
        config.memory.instr_mem_words,
        config.memory.data_mem_bytes,
    ) {
        Ok(machine) => machine,
        Err(e) => {
            tracing::error!("FATAL LOAD ERROR: {e}");
            process::exit(1);
        }
    };

    machine.run(|m| {
        if config.general.trace {
            trace_cycle(m);
        }
    });

    report_final_state(&machine);
    println!(
        "[*] finished after {} cycles ({} instructions retired, {} flushes)",
        machine.cycle(),
        machine.stats().instructions_retired,
        machine.stats().flushes
    );
}
