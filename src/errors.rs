use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum HstatError {
    #[error("{tool} command is missing")]
    ToolNotFound { tool: String },

    #[error("Failed to launch `{command}`: {source}")]
    ProcessLaunch {
        command: String,
        source: std::io::Error,
    },

    #[error("transfer exited with code {code}: {stderr}")]
    SubprocessExit { code: i32, stderr: String },

    #[error("json decode error: {detail}")]
    Parse { detail: String, raw: String },

    #[error("No successful samples to aggregate")]
    EmptySeries,

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Failed to read settings file {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {detail}")]
    SettingsParse { path: PathBuf, detail: String },

    #[error("Failed to create temporary output file: {source}")]
    TempFile { source: std::io::Error },
}

impl HstatError {
    /// Fatal errors abort the run; the rest only cost one iteration or one
    /// summary row.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            HstatError::SubprocessExit { .. } | HstatError::Parse { .. } | HstatError::EmptySeries
        )
    }
}
