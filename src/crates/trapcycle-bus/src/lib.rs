//! State exposure for running trapcycle patterns
//!
//! This crate wraps a scheduled pattern into an observable chain:
//! - [`PatternChain`] ticks a pattern, resolves pitches and publishes a state record
//! - [`BusRegistry`] groups chains under a name with a bounded release history
//! - [`Trigger`] is the sink resolved notes are handed to
//! - [`Control`] reads a parameter that may change between ticks

pub mod bus;
pub mod chain;
pub mod control;
pub mod trigger;

pub use bus::{BusRegistry, VoiceId, DEFAULT_HISTORY_LIMIT};
pub use chain::{ChainState, PatternChain};
pub use control::Control;
pub use trigger::{NoteOn, ParentVoice, RecordingTrigger, Trigger};

/// Re-export common types from trapcycle-core
pub use trapcycle_core::{Pattern, PitchResolver, Scale};

/// Bus access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("Bus index {index} out of range for {len} voices")]
    IndexOutOfRange { index: isize, len: usize },
}

pub type Result<T> = std::result::Result<T, BusError>;
