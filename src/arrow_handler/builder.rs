use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::anomaly_core::{AnomalyMask, DiscordCandidate};
use crate::utils::AnalysisError;

/// Build Arrow IPC result for anomaly detection
///
/// # Arguments
/// * `order_ids` - Original row ids; a positional `index` column is written when absent
/// * `mask` - Anomaly flags, one per observation
/// * `scores` - Optional outlyingness scores; `None` entries become nulls
///
/// # Returns
/// * `Ok(Vec<u8>)` - Arrow IPC Stream format bytes
/// * `Err(AnalysisError)` - If lengths disagree or writing fails
pub fn build_anomaly_result(
    order_ids: Option<&[i64]>,
    mask: &AnomalyMask,
    scores: Option<&[Option<f64>]>,
) -> Result<Vec<u8>, AnalysisError> {
    let n = mask.len();
    if order_ids.is_some_and(|ids| ids.len() != n) || scores.is_some_and(|s| s.len() != n) {
        return Err(AnalysisError::shape(
            "order_ids, scores, and mask must have same length",
        ));
    }

    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    match order_ids {
        Some(ids) => {
            fields.push(Field::new("order_id", DataType::Int64, false));
            columns.push(Arc::new(Int64Array::from(ids.to_vec())));
        }
        None => {
            fields.push(Field::new("index", DataType::UInt64, false));
            columns.push(Arc::new(UInt64Array::from_iter_values(0..n as u64)));
        }
    }

    if let Some(scores) = scores {
        fields.push(Field::new("score", DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(scores.to_vec())));
    }

    fields.push(Field::new("is_anomaly", DataType::Boolean, false));
    columns.push(Arc::new(BooleanArray::from(mask.as_slice().to_vec())));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)
        .map_err(|e| AnalysisError::Arrow(format!("failed to create RecordBatch: {}", e)))?;

    serialize_to_ipc(schema, batch)
}

/// Build Arrow IPC table of the per-length discords
pub fn build_discord_result(discords: &[DiscordCandidate]) -> Result<Vec<u8>, AnalysisError> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("start", DataType::UInt64, false),
        Field::new("length", DataType::UInt64, false),
        Field::new("distance", DataType::Float64, false),
    ]));

    let starts = UInt64Array::from_iter_values(discords.iter().map(|d| d.start as u64));
    let lengths = UInt64Array::from_iter_values(discords.iter().map(|d| d.length as u64));
    let distances = Float64Array::from_iter_values(discords.iter().map(|d| d.distance));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(starts) as ArrayRef, Arc::new(lengths), Arc::new(distances)],
    )
    .map_err(|e| AnalysisError::Arrow(format!("failed to create RecordBatch: {}", e)))?;

    serialize_to_ipc(schema, batch)
}

/// Serialize RecordBatch to Arrow IPC Stream format
fn serialize_to_ipc(schema: Arc<Schema>, batch: RecordBatch) -> Result<Vec<u8>, AnalysisError> {
    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, &schema)
            .map_err(|e| AnalysisError::Arrow(format!("failed to create StreamWriter: {}", e)))?;
        writer
            .write(&batch)
            .map_err(|e| AnalysisError::Arrow(format!("failed to write batch: {}", e)))?;
        writer
            .finish()
            .map_err(|e| AnalysisError::Arrow(format!("failed to finish writer: {}", e)))?;
    }
    Ok(buffer)
}
