pub mod config;
pub mod error;
pub mod game;

pub use config::{LogLevel, TimelineConfig};
pub use error::ConfigError;
pub use game::beat::{Beat, TICKS_PER_BEAT, Tempo, TempoChange, Time};
pub use game::tempo_map::SortedTempoMap;
pub use game::timing::{BeatRounding, TempoTimelineIndex};
