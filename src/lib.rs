//! Heuristic bank-statement parser: recovers text from PDF, spreadsheet or
//! plain-text statements and turns it into ledger-ready transaction records.

pub mod dates;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod logging;
pub mod models;
pub mod names;
pub mod recovery;
pub mod rows;
pub mod scan;
pub mod settings;
pub mod sheet;
pub mod sink;
pub mod structure;

pub use dates::DateNormalizer;
pub use error::{Error, Result};
pub use importer::{import_file, parse_statement, ImportResult, ImporterKind, StatementParse};
pub use models::{ColumnStructure, Provenance, RecordKind, TransactionRecord};
pub use names::extract_name;
pub use recovery::{recover_text, RecoveredText, RecoveryLimits, RecoveryMethod};
pub use rows::{parse_records, parse_row, ParseOptions};
pub use scan::scan_lines;
pub use settings::Settings;
pub use sheet::parse_grid;
pub use sink::{CsvSink, JsonSink, RecordSink};
pub use structure::detect_structure;
