use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;

/// Environment variable consulted when no base directory is given explicitly.
pub const BASE_DIR_ENV: &str = "PIPELINER_BASE_DIR";

/// Fixed file layout below a base working directory:
///
/// ```text
/// <base>/input/id.xlsx
/// <base>/input/sample.csv
/// <base>/model/info.csv
/// <base>/model/sample.csv
/// <base>/model/sample/*_sample.csv
/// <base>/model/id_id_relation.csv
/// <base>/output/id_info_value.csv
/// <base>/output/id_value.csv
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn input_dir(&self) -> PathBuf {
        self.base_dir.join("input")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.base_dir.join("model")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join("output")
    }

    pub fn id(&self) -> PathBuf {
        self.input_dir().join("id.xlsx")
    }

    pub fn info(&self) -> PathBuf {
        self.model_dir().join("info.csv")
    }

    pub fn sample(&self) -> PathBuf {
        self.model_dir().join("sample.csv")
    }

    pub fn samples_dir(&self) -> PathBuf {
        self.model_dir().join("sample")
    }

    pub fn samples_pattern(&self) -> PathBuf {
        self.samples_dir().join("*_sample.csv")
    }

    /// Per-period sample files, sorted by path.
    pub fn samples(&self) -> Result<Vec<PathBuf>> {
        // Glob metacharacters in the base directory are literal.
        let dir = glob::Pattern::escape(&self.samples_dir().to_string_lossy());
        let pattern = Path::new(&dir).join("*_sample.csv");

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "skipping unreadable sample path"),
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn id_id_relation(&self) -> PathBuf {
        self.model_dir().join("id_id_relation.csv")
    }

    /// Input of the aggregate-only pipeline.
    pub fn aggregate_sample(&self) -> PathBuf {
        self.input_dir().join("sample.csv")
    }

    pub fn id_info_value(&self) -> PathBuf {
        self.output_dir().join("id_info_value.csv")
    }

    pub fn id_value(&self) -> PathBuf {
        self.output_dir().join("id_value.csv")
    }

    pub fn ensure_output_dir(&self) -> Result<PathBuf> {
        let dir = self.output_dir();
        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            debug!(path = %dir.display(), "created output directory");
        }
        Ok(dir)
    }
}

/// Picks the base directory: an explicit path, then `PIPELINER_BASE_DIR`, then
/// the parent of the executable's directory when `relative_to_exe` is set,
/// then the current working directory.
pub fn resolve_base_dir(explicit: Option<PathBuf>, relative_to_exe: bool) -> Result<PathBuf> {
    resolve_from(explicit, env::var_os(BASE_DIR_ENV), relative_to_exe)
}

fn resolve_from(
    explicit: Option<PathBuf>,
    from_env: Option<OsString>,
    relative_to_exe: bool,
) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = from_env.filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if relative_to_exe {
        let exe = env::current_exe()?;
        let exe_dir = exe.parent().unwrap_or(Path::new("."));
        return Ok(exe_dir.join(".."));
    }
    Ok(env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base_dir() {
        let paths = Paths::new("/work");

        assert_eq!(paths.id(), PathBuf::from("/work/input/id.xlsx"));
        assert_eq!(paths.info(), PathBuf::from("/work/model/info.csv"));
        assert_eq!(paths.sample(), PathBuf::from("/work/model/sample.csv"));
        assert_eq!(
            paths.id_id_relation(),
            PathBuf::from("/work/model/id_id_relation.csv")
        );
        assert_eq!(paths.aggregate_sample(), PathBuf::from("/work/input/sample.csv"));
        assert_eq!(
            paths.id_info_value(),
            PathBuf::from("/work/output/id_info_value.csv")
        );
        assert_eq!(paths.id_value(), PathBuf::from("/work/output/id_value.csv"));
    }

    #[test]
    fn samples_are_matched_by_suffix_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let sample_dir = dir.path().join("model").join("sample");
        fs::create_dir_all(&sample_dir).unwrap();
        for name in ["20240102_sample.csv", "20240101_sample.csv", "notes.csv"] {
            fs::write(sample_dir.join(name), "ID\n").unwrap();
        }

        let found = Paths::new(dir.path()).samples().unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["20240101_sample.csv", "20240102_sample.csv"]);
    }

    #[test]
    fn samples_are_found_under_base_dir_with_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("run [2024] *");
        let sample_dir = base.join("model").join("sample");
        fs::create_dir_all(&sample_dir).unwrap();
        fs::write(sample_dir.join("a_sample.csv"), "ID\n").unwrap();

        let found = Paths::new(&base).samples().unwrap();
        assert_eq!(found, vec![sample_dir.join("a_sample.csv")]);
    }

    #[test]
    fn missing_sample_dir_yields_no_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Paths::new(dir.path()).samples().unwrap().is_empty());
    }

    #[test]
    fn ensure_output_dir_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());

        let created = paths.ensure_output_dir().unwrap();
        assert!(created.is_dir());
        assert!(paths.ensure_output_dir().is_ok());
    }

    #[test]
    fn explicit_dir_wins_over_environment() {
        let resolved = resolve_from(
            Some(PathBuf::from("/explicit")),
            Some(OsString::from("/from-env")),
            true,
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/explicit"));

        let resolved = resolve_from(None, Some(OsString::from("/from-env")), true).unwrap();
        assert_eq!(resolved, PathBuf::from("/from-env"));
    }

    #[test]
    fn empty_environment_value_is_ignored() {
        let resolved = resolve_from(None, Some(OsString::new()), false).unwrap();
        assert_eq!(resolved, env::current_dir().unwrap());
    }

    #[test]
    fn exe_relative_dir_is_parent_of_exe_dir() {
        let resolved = resolve_from(None, None, true).unwrap();
        let exe = env::current_exe().unwrap();
        assert_eq!(resolved, exe.parent().unwrap().join(".."));
    }
}
