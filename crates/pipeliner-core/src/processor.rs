use polars::prelude::*;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::data::Data;
use crate::error::{PipelineError, Result};

/// Group-by and join stage.
pub struct Processor;

impl Processor {
    /// Builds `id_value` from `sample` and joins it, together with the
    /// deduplicated `info` table, onto the identifier register.
    pub fn process_data(mut data: Data, config: &PipelineConfig) -> Result<Data> {
        data.id_value = Self::group_by_id(&data.sample, &config.id_column, &config.value_columns)?;
        debug!(head = %data.id_value.head(Some(5)), "id_value");

        data.id_info_value =
            Self::join_reference(&data.id, &data.info, &data.id_value, &config.id_column)?;
        info!(
            rows = data.id_info_value.height(),
            columns = data.id_info_value.width(),
            "joined id, info and per-id values"
        );
        debug!(head = %data.id_info_value.head(Some(5)), "id_info_value");

        Ok(data)
    }

    /// Aggregate-only variant: per-id means of `sample`, nothing joined.
    pub fn process_aggregate(mut data: Data, config: &PipelineConfig) -> Result<Data> {
        data.id_value = Self::group_by_id(&data.sample, &config.id_column, &config.value_columns)?;
        info!(groups = data.id_value.height(), "aggregated sample by id");
        debug!(head = %data.id_value.head(Some(5)), "id_value");
        Ok(data)
    }

    /// Casts the value columns to `Float64`, averages them per identifier and
    /// sorts by identifier. A value that is present but not numeric is an
    /// error; nulls are left out of the mean.
    pub fn group_by_id(
        sample: &DataFrame,
        id_column: &str,
        value_columns: &[String],
    ) -> Result<DataFrame> {
        require_columns(
            sample,
            "sample",
            std::iter::once(id_column).chain(value_columns.iter().map(String::as_str)),
        )?;

        let casts: Vec<Expr> = value_columns
            .iter()
            .map(|name| col(name.as_str()).strict_cast(DataType::Float64))
            .collect();
        let means: Vec<Expr> = value_columns
            .iter()
            .map(|name| col(name.as_str()).mean())
            .collect();

        let id_value = sample
            .clone()
            .lazy()
            .with_columns(casts)
            .group_by([col(id_column)])
            .agg(means)
            .sort([id_column], SortMultipleOptions::default())
            .collect()?;

        Ok(id_value)
    }

    /// `id ⟕ unique(info) ⟕ id_value` on the identifier, keeping the row order
    /// of `id`. The first `info` row wins for a repeated identifier.
    pub fn join_reference(
        id: &DataFrame,
        info: &DataFrame,
        id_value: &DataFrame,
        id_column: &str,
    ) -> Result<DataFrame> {
        require_columns(id, "id", [id_column])?;
        require_columns(info, "info", [id_column])?;
        require_columns(id_value, "id_value", [id_column])?;

        let info_unique = info
            .clone()
            .lazy()
            .unique_stable(Some(vec![id_column.into()]), UniqueKeepStrategy::First);

        let joined = id
            .clone()
            .lazy()
            .join(
                info_unique,
                [col(id_column)],
                [col(id_column)],
                left_join_args(),
            )
            .join(
                id_value.clone().lazy(),
                [col(id_column)],
                [col(id_column)],
                left_join_args(),
            )
            .collect()?;

        Ok(joined)
    }
}

/// Left join that keeps the left table's row order.
pub(crate) fn left_join_args() -> JoinArgs {
    let mut args = JoinArgs::new(JoinType::Left);
    args.maintain_order = MaintainOrderJoin::Left;
    args
}

pub(crate) fn require_columns<'a>(
    df: &DataFrame,
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(PipelineError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}
