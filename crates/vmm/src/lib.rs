pub mod config;
pub mod disk;
mod error;
pub mod frame;
pub mod instruction;
pub mod memory;
pub mod page_table;
pub mod process;
pub mod replacer;
mod simulator;
mod swap;
pub mod translate;

pub use {
    config::Config,
    error::{Error, Result},
    frame::FrameState,
    instruction::{Instruction, Op},
    replacer::{LruReplacer, Replacer, RoundRobinReplacer},
    simulator::{Outcome, Simulator, Stats},
    translate::Translation,
};

pub type Pid = usize;
pub type FrameId = usize;
pub type VirtualPage = usize;
pub type SlotId = usize;
pub type Value = i32;

/// Byte every unused location of physical memory holds.
pub const FREE_MARKER: u8 = b'*';
