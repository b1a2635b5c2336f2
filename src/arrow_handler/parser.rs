use arrow::array::{Array, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Schema};
use arrow::ipc::reader::StreamReader;
use arrow::record_batch::RecordBatch;
use std::io::Cursor;

use crate::anomaly_core::ObservationMatrix;
use crate::utils::AnalysisError;

/// Name of the optional leading identifier column
pub const ID_COLUMN: &str = "order_id";

/// Parsed data from Arrow IPC format
#[derive(Debug)]
pub struct ParsedData {
    /// Row identifiers, when the stream leads with an `order_id` column
    pub order_ids: Option<Vec<i64>>,
    /// Names of the value columns
    pub columns: Vec<String>,
    /// Rows as observations; null cells are missing
    pub observations: ObservationMatrix,
}

/// Value columns start after the id column, if there is one
fn has_id_column(schema: &Schema) -> bool {
    schema
        .fields()
        .first()
        .is_some_and(|f| f.name() == ID_COLUMN && matches!(f.data_type(), DataType::Int64))
}

/// Parse Arrow IPC Stream format data
///
/// # Arguments
/// * `data` - Raw bytes in Arrow IPC Stream format
///
/// # Returns
/// * `Ok(ParsedData)` with optional ids and the observation matrix
/// * `Err(AnalysisError)` if parsing fails or schema validation fails
pub fn parse_arrow_ipc(data: &[u8]) -> Result<ParsedData, AnalysisError> {
    if data.is_empty() {
        return Err(AnalysisError::Arrow("empty input data".to_string()));
    }

    let cursor = Cursor::new(data);
    let reader = StreamReader::try_new(cursor, None)
        .map_err(|e| AnalysisError::Arrow(format!("failed to create StreamReader: {}", e)))?;

    let schema = reader.schema();
    let with_ids = has_id_column(&schema);
    let offset = usize::from(with_ids);
    validate_schema(&schema, offset)?;

    let columns: Vec<String> = schema
        .fields()
        .iter()
        .skip(offset)
        .map(|f| f.name().to_string())
        .collect();

    let mut order_ids: Vec<i64> = Vec::new();
    let mut rows: Vec<Vec<Option<f64>>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| AnalysisError::Arrow(format!("failed to read batch: {}", e)))?;

        if with_ids {
            let ids = downcast::<Int64Array>(&batch, 0)?;
            order_ids.extend((0..batch.num_rows()).map(|i| ids.value(i)));
        }

        let value_columns = (offset..batch.num_columns())
            .map(|c| downcast::<Float64Array>(&batch, c))
            .collect::<Result<Vec<_>, _>>()?;

        for row_idx in 0..batch.num_rows() {
            rows.push(
                value_columns
                    .iter()
                    .map(|col| (!col.is_null(row_idx)).then(|| col.value(row_idx)))
                    .collect(),
            );
        }
    }

    if rows.is_empty() {
        return Err(AnalysisError::shape("no data rows found"));
    }

    Ok(ParsedData {
        order_ids: with_ids.then_some(order_ids),
        columns,
        observations: ObservationMatrix::from_rows(&rows)?,
    })
}

/// Every value column must be Float64
fn validate_schema(schema: &Schema, offset: usize) -> Result<(), AnalysisError> {
    if schema.fields().len() <= offset {
        return Err(AnalysisError::Arrow("schema has no value columns".to_string()));
    }

    for (idx, field) in schema.fields().iter().enumerate().skip(offset) {
        if !matches!(field.data_type(), DataType::Float64) {
            return Err(AnalysisError::Arrow(format!(
                "value column '{}' at index {} must be Float64, got {:?}",
                field.name(),
                idx,
                field.data_type()
            )));
        }
    }

    Ok(())
}

fn downcast<T: 'static>(batch: &RecordBatch, col: usize) -> Result<&T, AnalysisError> {
    batch
        .column(col)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| AnalysisError::Arrow(format!("column {} has an unexpected array type", col)))
}
