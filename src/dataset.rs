use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::anomaly_core::ObservationMatrix;
use crate::utils::AnalysisError;

/// Cell spellings read as a missing value
const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "null", "none"];

/// Parse a single text cell; missing tokens give `None`
pub fn parse_cell(raw: &str) -> Result<Option<f64>, AnalysisError> {
    let cell = raw.trim();
    if MISSING_TOKENS.contains(&cell.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| AnalysisError::Data(format!("cannot parse '{}' as a number", cell)))
}

/// A named table of numeric columns, any cell of which may be missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl Dataset {
    /// Create a new empty dataset with the given columns
    pub fn new(name: String, columns: Vec<String>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    /// Dataset view of an observation matrix, e.g. one parsed from Arrow IPC
    pub fn from_observations(
        name: String,
        columns: Vec<String>,
        matrix: &ObservationMatrix,
    ) -> Result<Self, AnalysisError> {
        if columns.len() != matrix.ncols() {
            return Err(AnalysisError::shape(format!(
                "{} column names for {} columns",
                columns.len(),
                matrix.ncols()
            )));
        }
        let rows = (0..matrix.nrows())
            .map(|i| (0..matrix.ncols()).map(|j| matrix.get(i, j)).collect())
            .collect();
        Ok(Self { name, columns, rows })
    }

    /// Append a row; it must have one cell per column
    pub fn add_row(&mut self, row: Vec<Option<f64>>) -> Result<(), AnalysisError> {
        if row.len() != self.columns.len() {
            return Err(AnalysisError::shape(format!(
                "row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Copy restricted to the named columns, in the order given
    pub fn select(&self, names: &[String]) -> crate::Result<Dataset> {
        let indices = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| AnalysisError::Data(format!("unknown column '{}'", n)))
            })
            .collect::<Result<Vec<usize>, AnalysisError>>()?;

        Ok(Dataset {
            name: self.name.clone(),
            columns: names.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|r| indices.iter().map(|&i| r[i]).collect())
                .collect(),
        })
    }

    /// Rows as observations, columns as coordinates
    pub fn to_observations(&self) -> crate::Result<ObservationMatrix> {
        if self.columns.is_empty() {
            return Err(AnalysisError::shape("dataset has no columns").into());
        }
        Ok(ObservationMatrix::from_rows(&self.rows)?)
    }

    /// One fully observed column as an ordered series
    pub fn series(&self, name: &str) -> crate::Result<Vec<f64>> {
        let cells = self
            .column(name)
            .ok_or_else(|| AnalysisError::Data(format!("unknown column '{}'", name)))?;

        let series = cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                c.ok_or_else(|| AnalysisError::Data(format!("column '{}' is missing a value at row {}", name, i)))
            })
            .collect::<Result<Vec<f64>, AnalysisError>>()?;
        Ok(series)
    }

    /// Load dataset from CSV with a header row
    pub fn from_csv(name: String, csv_data: &str) -> crate::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut dataset = Dataset::new(name, headers);

        for result in reader.records() {
            let record = result?;
            let row = record
                .iter()
                .map(parse_cell)
                .collect::<Result<Vec<_>, AnalysisError>>()?;
            dataset.add_row(row)?;
        }

        Ok(dataset)
    }

    /// Load dataset from a JSON array of objects or of arrays
    ///
    /// Object keys become columns in sorted order; array rows get columns
    /// named `x0`, `x1`, ...
    pub fn from_json(name: String, json_data: &str) -> crate::Result<Self> {
        let items: Vec<serde_json::Value> = serde_json::from_str(json_data)?;

        let Some(first) = items.first() else {
            return Ok(Dataset::new(name, Vec::new()));
        };

        if first.is_array() {
            let width = first.as_array().map_or(0, |a| a.len());
            let mut dataset = Dataset::new(name, (0..width).map(|i| format!("x{}", i)).collect());
            for item in &items {
                let cells = item
                    .as_array()
                    .ok_or_else(|| AnalysisError::Data("mixed array and object rows".to_string()))?;
                let row = cells.iter().map(json_cell).collect::<Result<Vec<_>, _>>()?;
                dataset.add_row(row)?;
            }
            return Ok(dataset);
        }

        let mut keys = BTreeSet::new();
        for item in &items {
            let obj = item
                .as_object()
                .ok_or_else(|| AnalysisError::Data("mixed array and object rows".to_string()))?;
            keys.extend(obj.keys().cloned());
        }

        let columns: Vec<String> = keys.into_iter().collect();
        let mut dataset = Dataset::new(name, columns.clone());
        for item in &items {
            let row = columns
                .iter()
                .map(|c| item.get(c).map_or(Ok(None), json_cell))
                .collect::<Result<Vec<_>, _>>()?;
            dataset.add_row(row)?;
        }

        Ok(dataset)
    }
}

fn json_cell(value: &serde_json::Value) -> Result<Option<f64>, AnalysisError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => Ok(n.as_f64()),
        serde_json::Value::String(s) => parse_cell(s),
        other => Err(AnalysisError::Data(format!("unsupported cell value {}", other))),
    }
}
