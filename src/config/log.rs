use std::path::PathBuf;

use serde::Deserialize;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

fn default_stdout() -> bool {
    true
}

/// Where and how log lines are written.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Log line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Whether to write to stdout.
    #[serde(default = "default_stdout")]
    pub stdout: bool,

    /// Optional file that log lines are appended to.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Send console lines to stderr instead of stdout. Only takes effect when
    /// `stdout` is enabled.
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: LogFormat::default(), stdout: default_stdout(), file: None, stderr: false }
    }
}

impl LogConfig {
    /// Same sinks, with console lines moved to stderr so stdout carries only
    /// command output.
    pub fn console_to_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use config::Config;

    use super::*;

    #[test]
    fn test_empty_log_config_uses_defaults() {
        let config: LogConfig = Config::builder()
            .add_source(config::File::from_str("", config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config, LogConfig::default());
        assert!(config.stdout);
    }

    #[test]
    fn test_json_file_log_config() {
        let yaml = r#"
          format: json
          stdout: false
          file: "/var/log/exporter.log"
        "#;
        let config: LogConfig = Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.stdout);
        assert_eq!(config.file, Some(PathBuf::from("/var/log/exporter.log")));
    }

    #[test]
    fn test_console_to_stderr_keeps_other_sinks() {
        let config = LogConfig {
            format: LogFormat::Json,
            file: Some(PathBuf::from("/tmp/exporter.log")),
            ..Default::default()
        }
        .console_to_stderr();

        assert!(config.stderr);
        assert!(config.stdout);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/exporter.log")));
    }
}
