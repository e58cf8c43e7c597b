use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::errors::HstatError;
use crate::types::{Config, OutputFormat, SummarySelection};

/// Keys accepted in `config.toml`. All optional; CLI flags win.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSettings {
    pub iterations: Option<u32>,
    pub pause: Option<u64>,
    pub arguments: Option<String>,
    pub tool: Option<String>,
    pub average: Option<bool>,
    pub median: Option<bool>,
    pub min: Option<bool>,
    pub max: Option<bool>,
}

/// What the user asked for on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub url: String,
    pub iterations: Option<u32>,
    pub pause: Option<u64>,
    pub arguments: Option<String>,
    pub tool: Option<String>,
    pub average: bool,
    pub median: bool,
    pub min: bool,
    pub max: bool,
    pub hide_iterations: bool,
    pub hide_total: bool,
    pub format: OutputFormat,
}

pub const DEFAULT_TOOL: &str = "curl";

/// `<config dir>/hstat/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hstat").join("config.toml"))
}

/// Load settings from `explicit`, or from the default location when it exists.
/// Only an explicitly named file is required to exist.
pub fn load(explicit: Option<&Path>) -> Result<FileSettings, HstatError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_path() {
            Some(p) if p.is_file() => p,
            _ => return Ok(FileSettings::default()),
        },
    };

    debug!("reading settings from {}", path.display());
    let text = std::fs::read_to_string(&path).map_err(|source| HstatError::SettingsRead {
        path: path.clone(),
        source,
    })?;
    parse_settings(&text, &path)
}

pub fn parse_settings(text: &str, path: &Path) -> Result<FileSettings, HstatError> {
    toml::from_str(text).map_err(|e| HstatError::SettingsParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Merge CLI, settings file and defaults into the run configuration.
pub fn resolve(cli: CliOverrides, file: FileSettings) -> Result<Config, HstatError> {
    let url = cli.url.trim().to_string();
    if url.is_empty() {
        return Err(HstatError::InvalidConfig {
            detail: "url must not be empty".to_string(),
        });
    }

    let iterations = cli.iterations.or(file.iterations).unwrap_or(1);
    if iterations == 0 {
        return Err(HstatError::InvalidConfig {
            detail: "iterations must be at least 1".to_string(),
        });
    }

    let tool = cli
        .tool
        .or(file.tool)
        .unwrap_or_else(|| DEFAULT_TOOL.to_string());
    if tool.trim().is_empty() {
        return Err(HstatError::InvalidConfig {
            detail: "tool must not be empty".to_string(),
        });
    }

    Ok(Config {
        url,
        iterations,
        pause: Duration::from_millis(cli.pause.or(file.pause).unwrap_or(0)),
        extra_args: cli.arguments.or(file.arguments).unwrap_or_default(),
        tool,
        summaries: SummarySelection {
            average: cli.average || file.average.unwrap_or(false),
            median: cli.median || file.median.unwrap_or(false),
            min: cli.min || file.min.unwrap_or(false),
            max: cli.max || file.max.unwrap_or(false),
        },
        hide_iterations: cli.hide_iterations,
        show_total: !cli.hide_total,
        format: cli.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(url: &str) -> CliOverrides {
        CliOverrides {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let config = resolve(cli("https://example.com"), FileSettings::default()).unwrap();
        assert_eq!(config.iterations, 1);
        assert_eq!(config.pause, Duration::ZERO);
        assert_eq!(config.extra_args, "");
        assert_eq!(config.tool, "curl");
        assert!(!config.summaries.any());
        assert!(config.show_total);
        assert!(!config.hide_iterations);
    }

    #[test]
    fn parses_settings_file() {
        let text = r#"
iterations = 10
pause = 250
arguments = "--http2"
median = true
"#;
        let file = parse_settings(text, Path::new("config.toml")).unwrap();
        assert_eq!(file.iterations, Some(10));
        assert_eq!(file.pause, Some(250));
        assert_eq!(file.arguments.as_deref(), Some("--http2"));
        assert_eq!(file.median, Some(true));
        assert_eq!(file.average, None);
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = parse_settings("iteration = 3", Path::new("bad.toml")).unwrap_err();
        match err {
            HstatError::SettingsParse { path, .. } => assert_eq!(path, Path::new("bad.toml")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_wins_over_file() {
        let file = FileSettings {
            iterations: Some(10),
            pause: Some(100),
            arguments: Some("--http2".to_string()),
            tool: Some("/usr/local/bin/curl".to_string()),
            average: Some(true),
            ..Default::default()
        };
        let overrides = CliOverrides {
            iterations: Some(3),
            arguments: Some("--http1.1".to_string()),
            median: true,
            ..cli("https://example.com")
        };
        let config = resolve(overrides, file).unwrap();
        assert_eq!(config.iterations, 3);
        assert_eq!(config.pause, Duration::from_millis(100));
        assert_eq!(config.extra_args, "--http1.1");
        assert_eq!(config.tool, "/usr/local/bin/curl");
        assert!(config.summaries.average);
        assert!(config.summaries.median);
        assert!(!config.summaries.min);
    }

    #[test]
    fn rejects_zero_iterations() {
        let overrides = CliOverrides {
            iterations: Some(0),
            ..cli("https://example.com")
        };
        assert!(matches!(
            resolve(overrides, FileSettings::default()),
            Err(HstatError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_empty_url_and_tool() {
        assert!(resolve(cli("  "), FileSettings::default()).is_err());
        let overrides = CliOverrides {
            tool: Some(String::new()),
            ..cli("https://example.com")
        };
        assert!(resolve(overrides, FileSettings::default()).is_err());
    }

    #[test]
    fn hide_total_drops_column() {
        let overrides = CliOverrides {
            hide_total: true,
            ..cli("https://example.com")
        };
        let config = resolve(overrides, FileSettings::default()).unwrap();
        assert_eq!(config.columns().len(), 5);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            load(Some(&missing)),
            Err(HstatError::SettingsRead { .. })
        ));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let tmp = assert_fs::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "iterations = 4\nmax = true\n").unwrap();
        let file = load(Some(&path)).unwrap();
        assert_eq!(file.iterations, Some(4));
        assert_eq!(file.max, Some(true));
    }
}
