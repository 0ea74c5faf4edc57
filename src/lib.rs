//! trapcycle: step-driven pattern sequencing
//!
//! The root crate ties the workspace together: an [`Engine`] owns every
//! running chain and bus for one driver loop, [`EngineConfig`] holds its
//! settings, and the bridge modules expose patterns to tools and the CLI.
//!
//! ```
//! use trapcycle::{ChainOptions, Engine, EngineConfig};
//! use trapcycle_bus::RecordingTrigger;
//!
//! let config = EngineConfig { units_per_beat: 4.0, ..EngineConfig::default() };
//! let mut engine = Engine::new(config, RecordingTrigger::new());
//! engine.note("0 3 5 7", ChainOptions::new().cycle(1.0)).unwrap();
//!
//! for _ in 0..4 {
//!     engine.update();
//! }
//! assert_eq!(engine.trigger().pitches(), vec![60, 63, 65, 67]);
//! ```

pub mod config;
pub mod engine;
pub mod eventbridge;
pub mod loggerbridge;

pub use config::{ConfigError, EngineConfig};
pub use engine::{ChainHandle, ChainId, ChainOptions, Engine, EngineError, Voice};
pub use loggerbridge::Logger;
