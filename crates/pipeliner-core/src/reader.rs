use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::data::Data;
use crate::error::Result;
use crate::paths::Paths;
use crate::processor::{left_join_args, require_columns};

/// Load stage: turns the files named by [`Paths`] into [`Data`] tables.
pub struct Reader;

impl Reader {
    pub fn read_data(paths: &Paths, config: &PipelineConfig) -> Result<Data> {
        let mut data = Data::default();

        data.id = Self::read_excel(&paths.id(), config)?;
        log_table("id", &data.id);
        data.source_files.push(paths.id());
        data.info = Self::read_csv(&paths.info(), config)?;
        log_table("info", &data.info);
        data.source_files.push(paths.info());
        data.sample = Self::read_csv(&paths.sample(), config)?;
        log_table("sample", &data.sample);
        data.source_files.push(paths.sample());

        let sample_files = paths.samples()?;
        data.samples = Self::read_csvs(&sample_files, &data.id, config)?;
        log_table("samples", &data.samples);
        data.source_files.extend(sample_files);

        data.id_id_relation = Self::read_csv(&paths.id_id_relation(), config)?;
        log_table("id_id_relation", &data.id_id_relation);
        data.source_files.push(paths.id_id_relation());

        Ok(data)
    }

    /// Input of the aggregate-only pipeline: `input/sample.csv` alone.
    pub fn read_aggregate_input(paths: &Paths, config: &PipelineConfig) -> Result<Data> {
        let path = paths.aggregate_sample();
        let sample = Self::read_csv(&path, config)?;
        log_table("sample", &sample);
        Ok(Data {
            sample,
            source_files: vec![path],
            ..Data::default()
        })
    }

    pub fn read_csv(path: &Path, config: &PipelineConfig) -> Result<DataFrame> {
        Ok(pipeliner_io::read_csv(path, &config.csv_encoding)?)
    }

    pub fn read_excel(path: &Path, config: &PipelineConfig) -> Result<DataFrame> {
        Ok(pipeliner_io::read_excel(path, &config.excel_options())?)
    }

    /// Reads every file, restricts each one to the identifiers present in
    /// `id` and stacks the results in file order.
    ///
    /// Each file is left-joined onto the distinct identifiers, so an
    /// identifier without rows in a file still contributes one row of nulls,
    /// and rows for unknown identifiers are dropped.
    pub fn read_csvs(
        csv_paths: &[PathBuf],
        id: &DataFrame,
        config: &PipelineConfig,
    ) -> Result<DataFrame> {
        let mut combined = DataFrame::default();
        if csv_paths.is_empty() {
            return Ok(combined);
        }

        let id_column = config.id_column.as_str();
        require_columns(id, "id", [id_column])?;
        let known_ids = id
            .clone()
            .lazy()
            .select([col(id_column)])
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        for path in csv_paths {
            let frame = Self::read_csv(path, config)?;
            require_columns(&frame, &path.display().to_string(), [id_column])?;

            let restricted = known_ids
                .clone()
                .lazy()
                .join(
                    frame.lazy(),
                    [col(id_column)],
                    [col(id_column)],
                    left_join_args(),
                )
                .collect()?;
            debug!(
                path = %path.display(),
                rows = restricted.height(),
                "restricted sample file to known ids"
            );
            combined.vstack_mut(&restricted)?;
        }
        combined.align_chunks();

        Ok(combined)
    }
}

fn log_table(name: &str, df: &DataFrame) {
    info!(table = name, rows = df.height(), columns = df.width(), "loaded table");
    debug!(table = name, head = %df.head(Some(5)), "table head");
}
