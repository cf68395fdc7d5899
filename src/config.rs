use crate::error::ConfigError;
use crate::game::beat::{FALLBACK_TEMPO_BPM, Tempo};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

const SECTION: &str = "Timeline";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content);
        Ok(())
    }

    pub fn load_str(&mut self, content: &str) {
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let section = line[1..line.len() - 1].trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }

    pub const fn as_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Tempo of the tick-0 change synthesized for maps that do not start at zero.
    pub fallback_tempo_bpm: f64,
    pub log_level: LogLevel,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            fallback_tempo_bpm: FALLBACK_TEMPO_BPM,
            log_level: LogLevel::Warn,
        }
    }
}

impl TimelineConfig {
    #[inline(always)]
    pub const fn fallback_tempo(&self) -> Tempo {
        Tempo::new(self.fallback_tempo_bpm)
    }

    pub fn to_ini_string(&self) -> String {
        let mut content = String::new();
        content.push_str(&format!("[{SECTION}]\n"));
        content.push_str(&format!("FallbackTempo={}\n", self.fallback_tempo_bpm));
        content.push_str(&format!("LogLevel={}\n", self.log_level.as_str()));
        content
    }

    fn from_ini(conf: &SimpleIni) -> Result<Self, ConfigError> {
        let default = Self::default();

        let fallback_tempo_bpm = match conf.get(SECTION, "FallbackTempo") {
            Some(raw) => match raw.parse::<f64>() {
                Ok(bpm) if bpm.is_finite() && bpm != 0.0 => bpm,
                _ => return Err(ConfigError::InvalidTempo { value: raw }),
            },
            None => default.fallback_tempo_bpm,
        };

        let log_level = match conf.get(SECTION, "LogLevel") {
            Some(raw) => LogLevel::from_str(&raw).unwrap_or_else(|()| {
                warn!("Unknown LogLevel '{raw}', using {}.", default.log_level.as_str());
                default.log_level
            }),
            None => default.log_level,
        };

        Ok(Self { fallback_tempo_bpm, log_level })
    }
}

/// Parses configuration from INI text. Missing keys take their defaults.
pub fn parse(content: &str) -> Result<TimelineConfig, ConfigError> {
    let mut conf = SimpleIni::new();
    conf.load_str(content);
    TimelineConfig::from_ini(&conf)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<TimelineConfig, ConfigError> {
    let path = path.as_ref();
    let mut conf = SimpleIni::new();
    conf.load(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = TimelineConfig::from_ini(&conf)?;
    info!(
        "Loaded timeline config from '{}' (fallback tempo {} BPM).",
        path.display(),
        config.fallback_tempo_bpm
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{LogLevel, TimelineConfig, load, parse};
    use crate::error::ConfigError;

    #[test]
    fn missing_keys_use_defaults() {
        let cfg = parse("; nothing here\n[Other]\nFallbackTempo=90\n").unwrap();
        assert_eq!(cfg, TimelineConfig::default());
        assert_eq!(cfg.fallback_tempo_bpm, 160.0);
    }

    #[test]
    fn reads_timeline_section() {
        let cfg = parse("[Timeline]\nFallbackTempo = 120.5\nLogLevel=debug\n").unwrap();
        assert_eq!(cfg.fallback_tempo_bpm, 120.5);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_level.as_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn unknown_log_level_falls_back() {
        let cfg = parse("[Timeline]\nLogLevel=loud\n").unwrap();
        assert_eq!(cfg.log_level, LogLevel::Warn);
    }

    #[test]
    fn rejects_zero_and_non_finite_tempo() {
        for bad in ["0", "inf", "NaN", "fast"] {
            let err = parse(&format!("[Timeline]\nFallbackTempo={bad}\n")).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTempo { .. }), "{bad}: {err}");
        }
    }

    #[test]
    fn ini_string_round_trips() {
        let cfg = TimelineConfig { fallback_tempo_bpm: 75.25, log_level: LogLevel::Trace };
        assert_eq!(parse(&cfg.to_ini_string()).unwrap(), cfg);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = TimelineConfig { fallback_tempo_bpm: 133.0, log_level: LogLevel::Info };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"log_level\":\"Info\""), "{json}");
        assert_eq!(serde_json::from_str::<TimelineConfig>(&json).unwrap(), cfg);
        assert_eq!(serde_json::from_str::<LogLevel>("\"Trace\"").unwrap(), LogLevel::Trace);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load("definitely/not/a/real/timeline.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("timeline.ini"));
    }
}
