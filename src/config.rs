use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::error::{ArchiveError, Result};

pub const DEFAULT_EXTENSION: &str = "md";

#[derive(Deserialize)]
pub struct Paths {
    pub content_dir: PathBuf,
    pub flat_snapshot: Option<PathBuf>,
    pub ymd_snapshot: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
pub struct Defaults {
    pub extensions: Option<Vec<String>>,
    pub utc_offset_secs: Option<i32>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone, Debug, PartialEq)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub paths: Paths,
    #[serde(default)]
    pub defaults: Defaults,
    pub log: Option<Log>,
}

/// Everything an archive is bound to. Passed at construction and owned by the
/// archive; there is no process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub content_dir: PathBuf,
    pub flat_snapshot: Option<PathBuf>,
    pub ymd_snapshot: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub utc_offset: FixedOffset,
}

impl ArchiveConfig {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        ArchiveConfig {
            content_dir: content_dir.into(),
            flat_snapshot: None,
            ymd_snapshot: None,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            utc_offset: utc(),
        }
    }

    pub fn with_snapshots(mut self, flat_snapshot: impl Into<PathBuf>, ymd_snapshot: impl Into<PathBuf>) -> Self {
        self.flat_snapshot = Some(flat_snapshot.into());
        self.ymd_snapshot = Some(ymd_snapshot.into());
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }
}

impl Config {
    pub fn archive_config(&self, cfg_path: &Path) -> Result<ArchiveConfig> {
        let offset_secs = self.defaults.utc_offset_secs.unwrap_or(0);
        let utc_offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| ArchiveError::InvalidConfig {
            path: cfg_path.to_path_buf(),
            reason: format!("utc_offset_secs out of range: {}", offset_secs),
        })?;

        let extensions = match self.defaults.extensions {
            Some(ref extensions) if extensions.is_empty() => return Err(ArchiveError::InvalidConfig {
                path: cfg_path.to_path_buf(),
                reason: "extensions must not be empty".to_string(),
            }),
            Some(ref extensions) => extensions.iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            None => vec![DEFAULT_EXTENSION.to_string()],
        };

        Ok(ArchiveConfig {
            content_dir: self.paths.content_dir.clone(),
            flat_snapshot: self.paths.flat_snapshot.clone(),
            ymd_snapshot: self.paths.ymd_snapshot.clone(),
            extensions,
            utc_offset,
        })
    }
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()));
    match (exe_dir, path.to_str()) {
        (Some(exe_dir), Some(str_path)) => PathBuf::from(str_path.replace("${exe_dir}", &exe_dir.to_string_lossy())),
        _ => path,
    }
}

pub fn read_config(cfg_path: &Path) -> Result<Config> {
    let cfg_content = fs::read_to_string(cfg_path).map_err(|e| ArchiveError::from_io(cfg_path, e))?;
    parse_config(cfg_path, &cfg_content)
}

fn parse_config(cfg_path: &Path, cfg_content: &str) -> Result<Config> {
    let mut cfg: Config = toml::from_str::<Config>(cfg_content).map_err(|e| ArchiveError::InvalidConfig {
        path: cfg_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    cfg.paths = Paths {
        content_dir: parse_path(cfg.paths.content_dir),
        flat_snapshot: cfg.paths.flat_snapshot.map(parse_path),
        ymd_snapshot: cfg.paths.ymd_snapshot.map(parse_path),
    };

    if let Some(ref mut log) = cfg.log {
        log.location = log.location.take().map(parse_path);
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::error::ErrorKind;

    use super::*;

    const CONFIG: &str = r##"
[paths]
content_dir = "published"
flat_snapshot = "flat_archive.json"
ymd_snapshot = "ymd_archive.json"

[defaults]
extensions = [".md", "markdown"]
utc_offset_secs = -25200

[log]
level = "Debug"
log_to_console = true
location = "logs/archive.log"
"##;

    #[test]
    fn test_parse_config() -> Result<()> {
        let path = Path::new("archive.toml");
        let cfg = parse_config(path, CONFIG)?;
        assert_eq!(cfg.paths.content_dir, PathBuf::from("published"));
        assert_eq!(cfg.log.as_ref().unwrap().level, LogLevel::Debug);

        let archive_cfg = cfg.archive_config(path)?;
        assert_eq!(archive_cfg.extensions, ["md", "markdown"]);
        assert_eq!(archive_cfg.utc_offset, FixedOffset::west_opt(25200).unwrap());
        assert_eq!(archive_cfg.flat_snapshot, Some(PathBuf::from("flat_archive.json")));
        Ok(())
    }

    #[test]
    fn test_minimal_config() -> Result<()> {
        let path = Path::new("archive.toml");
        let cfg = parse_config(path, "[paths]\ncontent_dir = \"published\"\n")?;
        assert!(cfg.log.is_none());

        let archive_cfg = cfg.archive_config(path)?;
        assert_eq!(archive_cfg, ArchiveConfig::new("published"));
        Ok(())
    }

    #[test]
    fn test_exe_dir_expansion() -> Result<()> {
        let path = Path::new("archive.toml");
        let cfg = parse_config(path, "[paths]\ncontent_dir = \"${exe_dir}/published\"\n")?;
        assert!(!cfg.paths.content_dir.starts_with("${exe_dir}"));
        assert!(cfg.paths.content_dir.ends_with("published"));
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let path = Path::new("archive.toml");
        let err = parse_config(path, "[paths]\n").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let cfg = parse_config(path, "[paths]\ncontent_dir = \"p\"\n[defaults]\nutc_offset_secs = 90000\n").unwrap();
        assert!(matches!(cfg.archive_config(path), Err(ArchiveError::InvalidConfig { .. })));

        let cfg = parse_config(path, "[paths]\ncontent_dir = \"p\"\n[defaults]\nextensions = []\n").unwrap();
        assert!(matches!(cfg.archive_config(path), Err(ArchiveError::InvalidConfig { .. })));
    }

    #[test]
    fn test_read_missing_config() {
        let dir = tempdir().unwrap();
        let err = read_config(&dir.path().join("archive.toml")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
