//! `cau-recon` — reconciles back-office transaction exports into one
//! canonical table and drops transactions made only by opted-in,
//! currently-eligible accredited investors.
//!
//! Pure engine crate: tables arrive through [`TableLoader`], results are
//! returned in memory. No CLI and no persistence.

pub mod classify;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod model;
pub mod normalize;
pub mod party;
pub mod resolver;
pub mod source;

pub use config::ReconConfig;
pub use dataset::MergedDataset;
pub use engine::run;
pub use error::ReconError;
pub use model::{CanonicalTransaction, ReconResult, Resolution, Table};
pub use resolver::AiResolver;
pub use source::{CsvDirLoader, InMemoryLoader, TableLoader};
