use std::fs;
use std::path::Path;

use pipeliner_io::{ExcelOptions, DEFAULT_ENCODING, DEFAULT_SHEET, DEFAULT_SKIP_ROWS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Column names and file-format settings shared by every stage.
///
/// Loaded from `pipeliner.toml` in the base directory when present. Every key
/// is optional:
///
/// ```toml
/// id_column = "ID"
/// value_columns = ["VALUE1", "VALUE2"]
/// csv_encoding = "cp932"
/// excel_sheet = "sample"
/// excel_skip_rows = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub id_column: String,
    pub value_columns: Vec<String>,
    pub csv_encoding: String,
    pub excel_sheet: String,
    pub excel_skip_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_column: "ID".to_string(),
            value_columns: vec!["VALUE1".to_string(), "VALUE2".to_string()],
            csv_encoding: DEFAULT_ENCODING.to_string(),
            excel_sheet: DEFAULT_SHEET.to_string(),
            excel_skip_rows: DEFAULT_SKIP_ROWS,
        }
    }
}

impl PipelineConfig {
    pub const FILE_NAME: &'static str = "pipeliner.toml";

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| PipelineError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|err| PipelineError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate().map_err(|err| PipelineError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        debug!(path = %path.display(), ?config, "loaded pipeline config");
        Ok(config)
    }

    /// Loads `<base_dir>/pipeliner.toml`, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(Self::FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id_column.trim().is_empty() {
            return Err(PipelineError::Validation(
                "id_column must not be empty".to_string(),
            ));
        }
        if self.value_columns.is_empty() {
            return Err(PipelineError::Validation(
                "value_columns must name at least one column".to_string(),
            ));
        }
        for (idx, column) in self.value_columns.iter().enumerate() {
            if column == &self.id_column {
                return Err(PipelineError::Validation(format!(
                    "value column '{column}' is also the id column"
                )));
            }
            if self.value_columns[..idx].contains(column) {
                return Err(PipelineError::Validation(format!(
                    "value column '{column}' is listed twice"
                )));
            }
        }
        pipeliner_io::resolve_encoding(&self.csv_encoding)?;
        Ok(())
    }

    pub fn excel_options(&self) -> ExcelOptions {
        ExcelOptions {
            sheet: self.excel_sheet.clone(),
            skip_rows: self.excel_skip_rows,
        }
    }
}
