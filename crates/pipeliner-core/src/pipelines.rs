use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::data::{Data, TableSummary};
use crate::error::Result;
use crate::paths::Paths;
use crate::processor::Processor;
use crate::reader::Reader;
use crate::writer::Writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Register + reference info + per-id means, written to `id_info_value.csv`.
    Join,
    /// Per-id means of `input/sample.csv`, written to `id_value.csv`.
    Aggregate,
}

impl PipelineKind {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineKind::Join => "join",
            PipelineKind::Aggregate => "aggregate",
        }
    }

    pub fn run(&self, paths: &Paths, config: &PipelineConfig) -> Result<PipelineSummary> {
        match self {
            PipelineKind::Join => run_join_pipeline(paths, config),
            PipelineKind::Aggregate => run_aggregate_pipeline(paths, config),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// What a finished run read and wrote.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub pipeline: PipelineKind,
    pub generated_at: String,
    pub base_dir: PathBuf,
    pub files_read: usize,
    pub tables: Vec<TableSummary>,
    pub output_path: PathBuf,
}

impl PipelineSummary {
    fn new(
        pipeline: PipelineKind,
        paths: &Paths,
        files_read: usize,
        data: &Data,
        output_path: PathBuf,
    ) -> Self {
        Self {
            pipeline,
            generated_at: Utc::now().to_rfc3339(),
            base_dir: paths.base_dir().to_path_buf(),
            files_read,
            tables: data.summary(),
            output_path,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn run_join_pipeline(paths: &Paths, config: &PipelineConfig) -> Result<PipelineSummary> {
    info!(base_dir = %paths.base_dir().display(), "starting join pipeline");

    let data = Reader::read_data(paths, config)?;
    let files_read = data.source_files.len();

    let data = Processor::process_data(data, config)?;
    let output_path = Writer::write_data(&data, paths)?;

    let summary = PipelineSummary::new(PipelineKind::Join, paths, files_read, &data, output_path);
    info!(
        output = %summary.output_path.display(),
        files_read = summary.files_read,
        "join pipeline finished"
    );
    Ok(summary)
}

pub fn run_aggregate_pipeline(paths: &Paths, config: &PipelineConfig) -> Result<PipelineSummary> {
    info!(base_dir = %paths.base_dir().display(), "starting aggregate pipeline");

    let data = Reader::read_aggregate_input(paths, config)?;
    let files_read = data.source_files.len();
    let data = Processor::process_aggregate(data, config)?;
    let output_path = Writer::write_aggregate(&data, paths)?;

    let summary =
        PipelineSummary::new(PipelineKind::Aggregate, paths, files_read, &data, output_path);
    info!(output = %summary.output_path.display(), "aggregate pipeline finished");
    Ok(summary)
}
