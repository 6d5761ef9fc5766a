//! Record/replay of generation calls for deterministic, offline testing.

pub mod format;
pub mod recorder;
pub mod replayer;
