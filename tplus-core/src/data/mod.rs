//! Bar sources and the tradable universe

pub mod csv_source;
pub mod provider;
pub mod universe;

pub use csv_source::{parse_bars, CsvBarSource};
pub use provider::{BarSource, DataError};
pub use universe::{SymbolMeta, Universe, UniverseError};
