use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::HstatError;
use crate::types::Metric;

/// How arguments are quoted for the host shell. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `sh -c`, arguments wrapped in single quotes.
    Posix,
    /// `cmd /C`, arguments wrapped in double quotes.
    Windows,
}

impl QuoteStyle {
    pub fn host() -> Self {
        if cfg!(windows) {
            QuoteStyle::Windows
        } else {
            QuoteStyle::Posix
        }
    }

    /// Quote a single argument so the shell passes it through as one word.
    pub fn quote(self, s: &str) -> String {
        match self {
            QuoteStyle::Posix => shell_escape_single_quote(s),
            QuoteStyle::Windows => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for c in s.chars() {
                    if c == '"' {
                        out.push_str("\\\"");
                    } else {
                        out.push(c);
                    }
                }
                out.push('"');
                out
            }
        }
    }

    /// Shell program and the flag that makes it run one command string.
    pub fn shell(self) -> (&'static str, &'static str) {
        match self {
            QuoteStyle::Posix => ("sh", "-c"),
            QuoteStyle::Windows => ("cmd", "/C"),
        }
    }
}

/// Wraps a string in single quotes, escaping internal single quotes as `'\''`.
pub fn shell_escape_single_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// The write-out template asking for the raw timing fields as one flat JSON
/// object, e.g. `{"time_namelookup": %{time_namelookup},...}`.
pub fn write_out_format() -> String {
    let fields: Vec<String> = Metric::RAW
        .iter()
        .map(|m| format!("\"{key}\": %{{{key}}}", key = m.key()))
        .collect();
    format!("{{{}}}", fields.join(","))
}

/// A fully built command string plus the scratch file the response body is
/// written to. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct CommandLine {
    line: String,
    style: QuoteStyle,
    body: NamedTempFile,
}

impl CommandLine {
    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn style(&self) -> QuoteStyle {
        self.style
    }

    pub fn body_path(&self) -> &Path {
        self.body.path()
    }

    /// Drop whatever the last transfer wrote so disk usage stays flat.
    pub fn reset_body(&self) -> std::io::Result<()> {
        self.body.as_file().set_len(0)
    }
}

#[cfg(test)]
impl CommandLine {
    /// A command string taken as-is, for driving the runner in tests.
    pub(crate) fn raw(line: &str, style: QuoteStyle) -> Self {
        Self {
            line: line.to_string(),
            style,
            body: NamedTempFile::new().unwrap(),
        }
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    tool: String,
    style: QuoteStyle,
}

impl CommandBuilder {
    pub fn new(tool: impl Into<String>, style: QuoteStyle) -> Self {
        Self {
            tool: tool.into(),
            style,
        }
    }

    /// Build the transfer command for `url`.
    ///
    /// `extra_args` is inserted verbatim, unquoted, after the built-in flags.
    /// The URL always follows `--` so one starting with a dash is never read
    /// as a flag.
    pub fn build(&self, url: &str, extra_args: &str) -> Result<CommandLine, HstatError> {
        let body = tempfile::Builder::new()
            .prefix("hstat")
            .tempfile()
            .map_err(|source| HstatError::TempFile { source })?;

        let q = |s: &str| self.style.quote(s);
        let tool = if needs_quoting(&self.tool) {
            q(&self.tool)
        } else {
            self.tool.clone()
        };

        let mut parts = vec![
            tool,
            "--silent".to_string(),
            "--show-error".to_string(),
            "--output".to_string(),
            q(&body.path().to_string_lossy()),
            "--write-out".to_string(),
            q(&write_out_format()),
        ];

        let extra = extra_args.trim();
        if !extra.is_empty() {
            parts.push(extra.to_string());
        }

        parts.push("--".to_string());
        parts.push(q(url));

        Ok(CommandLine {
            line: parts.join(" "),
            style: self.style,
            body,
        })
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '\\' | ':'))
}

/// Find the transfer tool on `PATH`, or check it directly when given as a path.
pub fn locate_tool(tool: &str) -> Result<PathBuf, HstatError> {
    let not_found = || HstatError::ToolNotFound {
        tool: tool.to_string(),
    };

    if tool.is_empty() {
        return Err(not_found());
    }

    let direct = Path::new(tool);
    if direct.is_absolute() || direct.components().count() > 1 {
        return if is_executable(direct) {
            Ok(direct.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let path_var = std::env::var_os("PATH").ok_or_else(not_found)?;
    for dir in std::env::split_paths(&path_var) {
        for name in executable_names(tool) {
            let candidate = dir.join(&name);
            if is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }

    Err(not_found())
}

#[cfg(windows)]
fn executable_names(tool: &str) -> Vec<String> {
    if Path::new(tool).extension().is_some() {
        return vec![tool.to_string()];
    }
    let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.BAT;.CMD;.COM".to_string());
    exts.split(';')
        .filter(|e| !e.is_empty())
        .map(|e| format!("{}{}", tool, e))
        .collect()
}

#[cfg(not(windows))]
fn executable_names(tool: &str) -> Vec<String> {
    vec![tool.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
