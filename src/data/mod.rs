//! Dataset loading for libsvm and CSV formats

pub mod csv;
pub mod libsvm;

pub use csv::CsvDataset;
pub use libsvm::LibSVMDataset;
