use std::path::PathBuf;

use polars::prelude::DataFrame;
use serde::Serialize;

/// Tables handed from one stage to the next. Every table starts empty.
#[derive(Debug, Clone, Default)]
pub struct Data {
    // inputs
    pub id: DataFrame,
    pub info: DataFrame,
    pub sample: DataFrame,
    pub samples: DataFrame,
    pub id_id_relation: DataFrame,

    // intermediate
    pub id_value: DataFrame,

    // outputs
    pub id_info_value: DataFrame,

    /// Every file the Reader loaded, in read order.
    pub source_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: &'static str,
    pub rows: usize,
    pub columns: usize,
}

impl Data {
    pub fn tables(&self) -> [(&'static str, &DataFrame); 7] {
        [
            ("id", &self.id),
            ("info", &self.info),
            ("sample", &self.sample),
            ("samples", &self.samples),
            ("id_id_relation", &self.id_id_relation),
            ("id_value", &self.id_value),
            ("id_info_value", &self.id_info_value),
        ]
    }

    /// Shape of every non-empty table.
    pub fn summary(&self) -> Vec<TableSummary> {
        self.tables()
            .into_iter()
            .filter(|(_, df)| df.width() > 0)
            .map(|(name, df)| TableSummary {
                name,
                rows: df.height(),
                columns: df.width(),
            })
            .collect()
    }
}
