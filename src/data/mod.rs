//! Dataset preparation: raw file normalization and CSV loading.

pub mod loader;
pub mod normalize;

pub use loader::{
    column_to_diagnoses, columns_to_array2, load_diagnoses, load_features, read_csv,
    read_header, split_columns, DatasetPair, FileInfo, Split, POSITIVE_DIAGNOSIS,
};
pub use normalize::{normalize_line, FilePair, Normalizer};
