use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::info;

use crate::data::Data;
use crate::error::Result;
use crate::paths::Paths;

/// Output stage. Every file is BOM-prefixed UTF-8 CSV.
pub struct Writer;

impl Writer {
    pub fn write_data(data: &Data, paths: &Paths) -> Result<PathBuf> {
        paths.ensure_output_dir()?;
        let path = paths.id_info_value();
        Self::write_csv(&data.id_info_value, &path)?;
        Ok(path)
    }

    pub fn write_aggregate(data: &Data, paths: &Paths) -> Result<PathBuf> {
        paths.ensure_output_dir()?;
        let path = paths.id_value();
        Self::write_csv(&data.id_value, &path)?;
        Ok(path)
    }

    pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
        pipeliner_io::write_csv(df, path)?;
        info!(path = %path.display(), rows = df.height(), "wrote output");
        Ok(())
    }
}
