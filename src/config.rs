//! TOML-backed runtime configuration. Every field defaults to the
//! architecturally fixed sizes, so a config file is entirely optional; the
//! CLI's `--trace` flag and positional program path work with none present.

use serde::Deserialize;

use crate::arch::{DATA_MEM_BYTES, INSTR_MEM_WORDS};

fn default_program_path() -> String {
    "instructions.txt".to_string()
}

fn default_trace() -> bool {
    false
}

fn default_instr_mem_words() -> usize {
    INSTR_MEM_WORDS
}

fn default_data_mem_bytes() -> usize {
    DATA_MEM_BYTES
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(default = "default_program_path")]
    pub program_path: String,
    #[serde(default = "default_trace")]
    pub trace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            program_path: default_program_path(),
            trace: default_trace(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    #[serde(default = "default_instr_mem_words")]
    pub instr_mem_words: usize,
    #[serde(default = "default_data_mem_bytes")]
    pub data_mem_bytes: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            instr_mem_words: default_instr_mem_words(),
            data_mem_bytes: default_data_mem_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_architectural_sizes() {
        let config = Config::default();
        assert_eq!(config.memory.instr_mem_words, INSTR_MEM_WORDS);
        assert_eq!(config.memory.data_mem_bytes, DATA_MEM_BYTES);
        assert!(!config.general.trace);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = Config::from_toml("[general]\ntrace = true\n").unwrap();
        assert!(config.general.trace);
        assert_eq!(config.memory.instr_mem_words, INSTR_MEM_WORDS);
    }
}
