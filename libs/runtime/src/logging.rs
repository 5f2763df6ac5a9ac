//! Tracing subscriber setup driven by [`LoggingConfig`].
//!
//! Every key other than `"default"` names a crate (tracing target prefix such as
//! `songdap_http` or `albums`) with its own console/file levels. Records that no
//! explicit section claims fall through to the `"default"` section. Console output
//! is human readable, file output is JSON written through size-rotated files
//! resolved against the home directory.

use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

fn parse_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

type FallbackFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync + 'static>>;

/// Accepts records up to `max_level` whose target is not claimed by an explicit section.
fn fallback_filter(claimed: &[String], max_level: Level) -> FallbackFilter {
    let claimed = claimed.to_vec();
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        let target = meta.target();
        !claimed.iter().any(|c| matches_crate_prefix(target, c)) && meta.level() <= &max_level
    }))
}

// -------- rotating file writers --------

#[derive(Clone)]
struct RotatingFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.lock() {
            Ok(mut f) => f.write(buf),
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.lock() {
            Ok(mut f) => f.flush(),
            Err(_) => Ok(()),
        }
    }
}

/// Writer that may have no destination; writes are then dropped.
struct MaybeFile(Option<RotatingFile>);

impl Write for MaybeFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the section owning its target.
#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<RotatingFile>,
    by_crate: HashMap<String, RotatingFile>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> Option<RotatingFile> {
        self.by_crate
            .iter()
            .find(|(name, _)| matches_crate_prefix(target, name))
            .map(|(_, w)| w.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_crate.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = MaybeFile;

    fn make_writer(&'a self) -> Self::Writer {
        MaybeFile(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        MaybeFile(self.resolve(meta.target()))
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating_file(
    log_path: &Path,
    max_bytes: usize,
    max_files: Option<usize>,
) -> std::io::Result<RotatingFile> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let limit = match max_files {
        Some(n) => FileLimit::MaxFiles(n),
        None => FileLimit::Age(chrono::Duration::days(1)),
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotatingFile(Arc::new(Mutex::new(rot))))
}

fn file_for_section(name: &str, section: &Section, base_dir: &Path) -> Option<RotatingFile> {
    if section.file.trim().is_empty() {
        return None;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match open_rotating_file(&log_path, max_bytes as usize, section.max_backups) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to open log file for '{}': {} ({})",
                name,
                log_path.display(),
                e
            );
            None
        }
    }
}

// -------- plan --------

/// Console/file level plan extracted from the configuration.
struct LogPlan<'a> {
    fallback: Option<&'a Section>,
    sections: Vec<(&'a str, &'a Section)>,
}

impl<'a> LogPlan<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut sections: Vec<(&str, &Section)> = cfg
            .iter()
            .filter(|(k, _)| k.as_str() != DEFAULT_SECTION)
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        sections.sort_by(|a, b| a.0.cmp(b.0));

        Self {
            fallback: cfg.get(DEFAULT_SECTION),
            sections,
        }
    }

    fn claimed(&self) -> Vec<String> {
        self.sections.iter().map(|(n, _)| n.to_string()).collect()
    }

    fn console_targets(&self) -> Targets {
        self.targets_by(|s| &s.console_level, |_| true)
    }

    fn file_targets(&self) -> Targets {
        self.targets_by(|s| &s.file_level, |s| !s.file.trim().is_empty())
    }

    fn targets_by(
        &self,
        level_of: impl Fn(&Section) -> &String,
        include: impl Fn(&Section) -> bool,
    ) -> Targets {
        self.sections
            .iter()
            .filter(|(_, s)| include(s))
            .filter_map(|(name, s)| {
                parse_level(level_of(s)).map(|l| (name.to_string(), LevelFilter::from_level(l)))
            })
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, level)| {
                t.with_target(name, level)
            })
    }

    fn file_router(&self, base_dir: &Path) -> FileRouter {
        FileRouter {
            fallback: self
                .fallback
                .and_then(|s| file_for_section(DEFAULT_SECTION, s, base_dir)),
            by_crate: self
                .sections
                .iter()
                .filter_map(|(name, s)| {
                    file_for_section(name, s, base_dir).map(|w| (name.to_string(), w))
                })
                .collect(),
        }
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: base directory used to resolve relative log file paths (usually home_dir)
///
/// Calling this more than once is harmless; only the first subscriber is installed.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Layer, Registry};

    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let plan = LogPlan::from_config(cfg);
    let claimed = plan.claimed();
    let router = plan.file_router(base_dir);
    let ansi = atty::is(atty::Stream::Stderr);

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    layers.push(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(plan.console_targets())
            .boxed(),
    );

    if !router.is_empty() {
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router.clone())
                .with_filter(plan.file_targets())
                .boxed(),
        );
    }

    if let Some(fallback) = plan.fallback {
        if let Some(level) = parse_level(&fallback.console_level) {
            layers.push(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(ansi)
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_filter(fallback_filter(&claimed, level))
                    .boxed(),
            );
        }

        if router.fallback.is_some() {
            if let Some(level) = parse_level(&fallback.file_level) {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_writer(router)
                        .with_filter(fallback_filter(&claimed, level))
                        .boxed(),
                );
            }
        }
    }

    let _ = Registry::default().with(layers).try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> Section {
        Section {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_age_days: None,
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(parse_level("trace"), Some(Level::TRACE));
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("Info"), Some(Level::INFO));
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level("ERROR"), Some(Level::ERROR));
        assert_eq!(parse_level("off"), None);
        assert_eq!(parse_level("none"), None);
        assert_eq!(parse_level("bogus"), Some(Level::INFO));
    }

    #[test]
    fn test_crate_prefix_matching() {
        assert!(matches_crate_prefix("albums", "albums"));
        assert!(matches_crate_prefix("albums::domain::service", "albums"));
        assert!(!matches_crate_prefix("albums_extra", "albums"));
        assert!(!matches_crate_prefix("paging", "albums"));
    }

    #[test]
    fn test_plan_separates_default_from_crates() {
        let mut cfg = default_logging_config();
        cfg.insert("songdap_http".into(), section("debug", "", "off"));
        cfg.insert("albums".into(), section("info", "logs/albums.log", "debug"));

        let plan = LogPlan::from_config(&cfg);
        assert!(plan.fallback.is_some());
        assert_eq!(plan.claimed(), vec!["albums".to_string(), "songdap_http".to_string()]);
    }

    #[test]
    fn test_file_router_routes_by_prefix() {
        let tmp = tempdir().unwrap();
        let mut cfg = LoggingConfig::new();
        cfg.insert(DEFAULT_SECTION.into(), section("info", "logs/all.log", "debug"));
        cfg.insert("albums".into(), section("info", "logs/albums.log", "debug"));
        cfg.insert("paging".into(), section("info", "", "debug"));

        let router = LogPlan::from_config(&cfg).file_router(tmp.path());

        assert!(router.fallback.is_some());
        assert_eq!(router.by_crate.len(), 1);
        assert!(router.resolve("albums::infra").is_some());
        // paging has no file of its own, so it lands in the default file
        assert!(router.resolve("paging::controller").is_some());
        assert!(tmp.path().join("logs").exists());
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(abs.to_str().unwrap(), Path::new("/elsewhere")), abs);
    }

    #[test]
    fn test_open_rotating_file_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        let res = open_rotating_file(&p, 128 * 1024, None);
        assert!(res.is_ok(), "writer should be created");
        assert!(p.parent().unwrap().exists(), "parent dir must be created");
    }
}
