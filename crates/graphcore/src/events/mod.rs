mod base;

pub use base::{LogBus, LogEmitter, LogLevel, LogLine, RunEvent, RunOutcome};
