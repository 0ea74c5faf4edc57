//! Core types for the trapcycle pattern engine
//!
//! Exact rational time, the event model, the pattern algebra, a
//! cycle-latched tick scheduler and scale-based pitch resolution.
//!
//! # Examples
//!
//! ```
//! use trapcycle_core::{pure, sequence, Fraction, TimeSpan, Value};
//!
//! let pattern = sequence(vec![
//!     pure(Value::Number(0.0)),
//!     pure(Value::Number(3.0)),
//! ]);
//! let haps = pattern.query(TimeSpan::from_ints(0, 1));
//! assert_eq!(haps[1].part.begin, Fraction::new(1, 2));
//! ```
//!
//! # Main Components
//!
//! - **Fraction / TimeSpan**: exact time and half-open query arcs
//! - **Hap**: a value with its whole and part spans
//! - **Pattern**: a pure query function over time, plus combinators
//! - **Scheduler**: turns external steps into query arcs
//! - **Scale / PitchResolver**: degree and note resolution

pub mod combinators;
pub mod error;
pub mod fraction;
pub mod hap;
pub mod note;
pub mod pattern;
pub mod registry;
pub mod scale;
pub mod scheduler;
pub mod state;
pub mod timespan;
pub mod value;

pub use combinators::{fastcat, pure, sequence, silence, slowcat, stack, weighted_sequence};
pub use error::{NoteError, ScaleError, TimeError};
pub use fraction::Fraction;
pub use hap::{Event, Hap};
pub use note::{note_to_midi, DEFAULT_OCTAVE};
pub use pattern::Pattern;
pub use registry::Registry;
pub use scale::{scales, PitchResolver, Scale};
pub use scheduler::Scheduler;
pub use state::PlaybackState;
pub use timespan::TimeSpan;
pub use value::{AbsoluteNote, Value};
