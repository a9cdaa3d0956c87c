use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{RelayError, Result};

static RELAY_LOGGER: Lazy<RelayLogger> = Lazy::new(RelayLogger::new);

pub fn init() -> Result<()> {
    init_with_config(LoggerConfig::from_env())
}

pub fn init_with_config(config: LoggerConfig) -> Result<()> {
    let level = config.min_level;
    RELAY_LOGGER.update_config(config)?;

    log::set_logger(&*RELAY_LOGGER)
        .map_err(|e| RelayError::ConfigError(format!("Failed to set logger: {:?}", e)))?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(RelayError::ConfigError(format!("unknown log level: {}", other))),
        }
    }
}

/// One emitted line, serialized as-is when JSON output is on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub target: String,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: LogLevel::from_log_level(record.level()),
            target: record.target().to_string(),
            message: record.args().to_string(),
            file: record.file().map(String::from),
            line: record.line(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_file_location: bool,
    pub output_json: bool,
    pub log_file_path: Option<String>,
    pub timestamp_format: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_file_location: false,
            output_json: false,
            log_file_path: None,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `LOG_LEVEL`, `LOG_JSON`, `LOG_FILE` and `NO_COLOR`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_level: env::var("LOG_LEVEL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_level),
            show_colors: env::var("NO_COLOR").is_err(),
            output_json: env::var("LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_file_path: env::var("LOG_FILE").ok().filter(|p| !p.is_empty()),
            ..defaults
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn production() -> Self {
        Self {
            show_colors: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }
}

pub struct RelayLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl RelayLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) -> Result<()> {
        let file = match &new_config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        RelayError::ConfigError(format!("cannot open log file {}: {}", path, e))
                    })?,
            ),
            None => None,
        };

        if let Ok(mut slot) = self.log_file.lock() {
            *slot = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
        Ok(())
    }

    fn format_line(entry: &LogEntry, config: &LoggerConfig) -> String {
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        let level = format!("{:<5}", entry.level.as_str());
        let location = match (config.show_file_location, &entry.file, entry.line) {
            (true, Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        };

        if config.show_colors {
            format!(
                "{} [{}] {}: {}{}",
                timestamp.bright_black(),
                level.color(entry.level.color()).bold(),
                entry.target.bright_blue(),
                entry.message,
                location.bright_black()
            )
        } else {
            format!(
                "{} [{}] {}: {}{}",
                timestamp, level, entry.target, entry.message, location
            )
        }
    }
}

impl log::Log for RelayLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => LogLevel::from_log_level(metadata.level()) >= config.min_level,
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);

        let Ok(config) = self.config.lock() else {
            return;
        };
        let line = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            Self::format_line(&entry, &config)
        };
        println!("{}", line);

        if let Ok(mut slot) = self.log_file.lock() {
            if let Some(file) = slot.as_mut() {
                let plain = if config.output_json {
                    line
                } else {
                    Self::format_line(&entry, &LoggerConfig { show_colors: false, ..config.clone() })
                };
                let _ = writeln!(file, "{}", plain);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut slot) = self.log_file.lock() {
            if let Some(file) = slot.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long the enclosing scope took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("{} completed in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

/// Short id tying together the log lines of one inbound request.
pub fn request_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub fn log_startup_info(app_name: &str, version: &str, host: &str, port: u16) {
    log::info!("Starting {} v{}", app_name, version);
    log::info!("Listening on http://{}:{}", host, port);
}

pub fn log_config_info(config: &Config) {
    log::info!("Configuration loaded:");
    log::info!("   Backend: {}", config.backend.as_str());
    if let Some(workers) = &config.workers_ai {
        log::info!("   Chat model: {}", workers.chat_model);
        log::info!("   Image model: {}", workers.image_model);
    }
    if let Some(bedrock) = &config.bedrock {
        log::info!(
            "   Region: {}",
            bedrock.region.as_deref().unwrap_or("us-east-1")
        );
        log::info!("   Chat model: {}", bedrock.chat_model);
        log::info!("   Image model: {}", bedrock.image_model);
    }
    log::info!(
        "   Max tokens: analyze={} enrich={}",
        config.orchestrator.analyze_max_tokens,
        config.orchestrator.enrich_max_tokens
    );
    log::info!("   Default steps: {}", config.orchestrator.default_steps);
}
