//! Dense named-column tables.
//!
//! `SampleTable` is the in-process data contract between the excluded loader collaborators and
//! the numerical components of this crate: rows are samples (genes, conditions), columns are
//! named numeric variables. Row order carries identity and is preserved by every consumer;
//! columns are addressed by name and an unknown name is a hard error.

use ndarray::{Array2, ArrayView1};
use single_utilities::traits::FloatOps;

/// A table of real-valued observations with named columns.
#[derive(Debug, Clone)]
pub struct SampleTable<T> {
    names: Vec<String>,
    data: Array2<T>,
}

impl<T> SampleTable<T>
where
    T: FloatOps,
{
    /// Create a table from a column-major matrix and one name per column.
    pub fn new(names: Vec<String>, data: Array2<T>) -> anyhow::Result<Self> {
        if names.len() != data.ncols() {
            return Err(anyhow::anyhow!(
                "Expected {} column names, got {}",
                data.ncols(),
                names.len()
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(anyhow::anyhow!("Duplicate column name: {}", name));
            }
        }
        Ok(SampleTable { names, data })
    }

    /// Create a table from `(name, values)` pairs. All columns must have the same length.
    pub fn from_columns(columns: Vec<(&str, Vec<T>)>) -> anyhow::Result<Self> {
        if columns.is_empty() {
            return Err(anyhow::anyhow!("Table must have at least one column"));
        }
        let n_rows = columns[0].1.len();
        for (name, values) in &columns {
            if values.len() != n_rows {
                return Err(anyhow::anyhow!(
                    "Column {} has {} rows, expected {}",
                    name,
                    values.len(),
                    n_rows
                ));
            }
        }

        let names: Vec<String> = columns.iter().map(|(name, _)| (*name).to_string()).collect();
        let mut data = Array2::from_elem((n_rows, columns.len()), T::zero());
        for (j, (_, values)) in columns.iter().enumerate() {
            for (i, &value) in values.iter().enumerate() {
                data[[i, j]] = value;
            }
        }

        SampleTable::new(names, data)
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    fn column_index(&self, name: &str) -> anyhow::Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| anyhow::anyhow!("Unknown column: {}", name))
    }

    /// View of a single column, in row order.
    pub fn column(&self, name: &str) -> anyhow::Result<ArrayView1<'_, T>> {
        let idx = self.column_index(name)?;
        Ok(self.data.column(idx))
    }

    /// A single column converted to `f64`, in row order.
    pub fn column_f64(&self, name: &str) -> anyhow::Result<Vec<f64>> {
        let column = self.column(name)?;
        Ok(column.iter().map(|v| v.to_f64().unwrap()).collect())
    }

    /// The selected columns as a dense `f64` matrix, rows aligned with the table.
    pub fn select_f64(&self, columns: &[&str]) -> anyhow::Result<Array2<f64>> {
        if columns.is_empty() {
            return Err(anyhow::anyhow!("Column selection cannot be empty"));
        }
        let mut selected = Array2::zeros((self.n_rows(), columns.len()));
        for (j, name) in columns.iter().enumerate() {
            let idx = self.column_index(name)?;
            for (i, value) in self.data.column(idx).iter().enumerate() {
                selected[[i, j]] = value.to_f64().unwrap();
            }
        }
        Ok(selected)
    }
}
