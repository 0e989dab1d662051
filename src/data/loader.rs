//! CSV loading into dense feature matrices and diagnosis vectors

use crate::error::{PimaError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Diagnosis value that marks a positive case
pub const POSITIVE_DIAGNOSIS: &str = "Yes";

/// Read a headed CSV file into a DataFrame. Blank lines are skipped.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| PimaError::DataError(format!("{}: {}", path.display(), e)))?
        .finish()
        .map_err(|e| PimaError::DataError(format!("{}: {}", path.display(), e)))?;
    drop_blank_rows(df)
}

/// Remove rows in which every field is null, which is how the CSV reader
/// surfaces empty lines.
pub fn drop_blank_rows(df: DataFrame) -> Result<DataFrame> {
    let mut keep = BooleanChunked::full("keep".into(), false, df.height());
    for column in df.get_columns() {
        keep = &keep | &column.as_materialized_series().is_not_null();
    }

    let blank = keep.into_iter().filter(|v| *v != Some(true)).count();
    if blank == 0 {
        return Ok(df);
    }
    debug!(rows = blank, "Skipping blank rows");
    Ok(df.filter(&keep)?)
}

/// Column names of a CSV file, read from its header.
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let df = read_csv(path)?;
    Ok(df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect())
}

/// Split a header into feature columns and the trailing diagnosis column.
pub fn split_columns(columns: &[String]) -> Result<(Vec<String>, String)> {
    match columns.split_last() {
        Some((target, features)) if !features.is_empty() => {
            Ok((features.to_vec(), target.clone()))
        }
        _ => Err(PimaError::DataError(format!(
            "expected at least 2 columns, found {}",
            columns.len()
        ))),
    }
}

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| PimaError::FeatureNotFound(col_name.clone()))?;
            let series_f64 = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| PimaError::DataError(e.to_string()))?;
            series_f64
                .f64()
                .map_err(|e| PimaError::DataError(e.to_string()))?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| {
                        PimaError::DataError(format!(
                            "column '{}' row {} is missing or not numeric",
                            col_name, row
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Map the diagnosis column to 0/1 labels.
pub fn column_to_diagnoses(df: &DataFrame, column: &str) -> Result<Array1<usize>> {
    let series = df
        .column(column)
        .map_err(|_| PimaError::FeatureNotFound(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| PimaError::DataError(e.to_string()))?;

    let labels = series
        .str()
        .map_err(|e| PimaError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| usize::from(v.map(str::trim) == Some(POSITIVE_DIAGNOSIS)))
        .collect();
    Ok(labels)
}

/// Feature matrix of a CSV file restricted to `features`.
pub fn load_features(path: &Path, features: &[String]) -> Result<Array2<f64>> {
    let df = read_csv(path)?;
    columns_to_array2(&df, features)
}

/// 0/1 diagnoses of a CSV file, from column `target`.
pub fn load_diagnoses(path: &Path, target: &str) -> Result<Array1<usize>> {
    let df = read_csv(path)?;
    column_to_diagnoses(&df, target)
}

/// One split of the dataset
#[derive(Debug, Clone)]
pub struct Split {
    pub features: Array2<f64>,
    pub diagnoses: Array1<usize>,
}

impl Split {
    fn from_frame(df: &DataFrame, features: &[String], target: &str) -> Result<Self> {
        if df.height() == 0 {
            return Err(PimaError::DataError("dataset has no rows".to_string()));
        }
        Ok(Self {
            features: columns_to_array2(df, features)?,
            diagnoses: column_to_diagnoses(df, target)?,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_positive(&self) -> usize {
        self.diagnoses.iter().filter(|&&d| d == 1).count()
    }
}

/// Training and test splits sharing one column layout
#[derive(Debug, Clone)]
pub struct DatasetPair {
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub training: Split,
    pub test: Split,
}

impl DatasetPair {
    /// Load both CSV files. The column layout is taken from the training
    /// header and must be present in the test file.
    pub fn load(training: &Path, test: &Path) -> Result<Self> {
        let train_df = read_csv(training)?;
        let columns: Vec<String> = train_df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (feature_names, target_name) = split_columns(&columns)?;

        let test_df = read_csv(test)?;
        let test_columns: Vec<String> = test_df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        if test_columns != columns {
            return Err(PimaError::DataError(format!(
                "header mismatch: training has {:?}, test has {:?}",
                columns, test_columns
            )));
        }

        let pair = Self {
            training: Split::from_frame(&train_df, &feature_names, &target_name)?,
            test: Split::from_frame(&test_df, &feature_names, &target_name)?,
            feature_names,
            target_name,
        };

        info!(
            training_rows = pair.training.n_samples(),
            test_rows = pair.test.n_samples(),
            features = pair.feature_names.len(),
            "Datasets loaded"
        );
        debug!(columns = ?pair.feature_names, target = %pair.target_name, "Column layout");
        Ok(pair)
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Summary of a CSV file for the `info` command
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
    pub n_rows: usize,
    pub columns: Vec<String>,
}

impl FileInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let df = read_csv(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file_size: metadata.len(),
            n_rows: df.height(),
            columns: df.get_column_names().iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(body: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file.flush().unwrap();
        file
    }

    const SAMPLE: &str = "npreg,glu,bp,type\n5,86,68,No\n7,195,70,Yes\n1,117,88,No\n";

    #[test]
    fn test_split_columns() {
        let cols: Vec<String> = ["a", "b", "type"].iter().map(|s| s.to_string()).collect();
        let (features, target) = split_columns(&cols).unwrap();
        assert_eq!(features, vec!["a", "b"]);
        assert_eq!(target, "type");
    }

    #[test]
    fn test_split_columns_too_few() {
        let cols = vec!["type".to_string()];
        assert!(split_columns(&cols).is_err());
    }

    #[test]
    fn test_load_features_and_diagnoses() {
        let file = create_test_csv(SAMPLE);
        let header = read_header(file.path()).unwrap();
        let (features, target) = split_columns(&header).unwrap();

        let x = load_features(file.path(), &features).unwrap();
        assert_eq!(x.dim(), (3, 3));
        assert_eq!(x[[1, 1]], 195.0);

        let y = load_diagnoses(file.path(), &target).unwrap();
        assert_eq!(y.to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let file = create_test_csv("a,b,type\n1,x,No\n2,3,Yes\n");
        let err = load_features(file.path(), &["a".to_string(), "b".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn test_dataset_pair_header_mismatch() {
        let train = create_test_csv(SAMPLE);
        let test = create_test_csv("npreg,glu,type\n1,2,No\n");
        assert!(DatasetPair::load(train.path(), test.path()).is_err());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let file = create_test_csv("a,b,type\n1,2,Yes\n\n\n3,4,No\n\n");
        let df = read_csv(file.path()).unwrap();
        assert_eq!(df.height(), 2);

        let x = load_features(file.path(), &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(x, ndarray::array![[1.0, 2.0], [3.0, 4.0]]);
        let y = load_diagnoses(file.path(), "type").unwrap();
        assert_eq!(y.to_vec(), vec![1, 0]);
    }

    #[test]
    fn test_diagnoses_only_exact_yes_is_positive() {
        let file = create_test_csv("a,type\n1,yes\n2,Yes \n3,Maybe\n4,Yes\n5,No\n");
        let y = load_diagnoses(file.path(), "type").unwrap();
        assert_eq!(y.to_vec(), vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_dataset_pair_zero_rows() {
        let train = create_test_csv("npreg,glu,bp,type\n");
        let test = create_test_csv(SAMPLE);
        let err = DatasetPair::load(train.path(), test.path()).unwrap_err();
        assert!(err.to_string().contains("no rows"), "{}", err);
    }

    #[test]
    fn test_dataset_pair_single_column() {
        let train = create_test_csv("type\nYes\nNo\n");
        let test = create_test_csv("type\nNo\n");
        let err = DatasetPair::load(train.path(), test.path()).unwrap_err();
        assert!(err.to_string().contains("at least 2 columns"), "{}", err);
    }

    #[test]
    fn test_dataset_pair_load() {
        let train = create_test_csv(SAMPLE);
        let test = create_test_csv("npreg,glu,bp,type\n2,100,60,Yes\n");
        let pair = DatasetPair::load(train.path(), test.path()).unwrap();
        assert_eq!(pair.n_features(), 3);
        assert_eq!(pair.target_name, "type");
        assert_eq!(pair.training.n_samples(), 3);
        assert_eq!(pair.test.n_positive(), 1);
    }
}
