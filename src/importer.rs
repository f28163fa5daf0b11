use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::dates::DateNormalizer;
use crate::error::{Error, Result};
use crate::models::{ColumnStructure, TransactionRecord};
use crate::recovery::{is_pdf, recover_text, RecoveryMethod};
use crate::rows::{parse_records, ParseOptions};
use crate::scan::{scan_lines, scan_windows};
use crate::settings::Settings;
use crate::sheet::{load_csv, parse_grid};
use crate::sink::RecordSink;
use crate::structure::{detect_structure_with, ScanDepth};

// ---------------------------------------------------------------------------
// Text pipeline
// ---------------------------------------------------------------------------

/// Everything one text document produced.
#[derive(Debug, Clone)]
pub struct StatementParse {
    pub structure: ColumnStructure,
    pub records: Vec<TransactionRecord>,
    /// Every record is a placeholder.
    pub sample: bool,
    pub method: RecoveryMethod,
    pub truncated: bool,
}

/// Recover, detect, parse; fall back to the keyword line scan, then the
/// token-window scan, when the column parse produced nothing real.
pub fn parse_statement(bytes: &[u8], settings: &Settings, dates: &DateNormalizer) -> StatementParse {
    let recovered = recover_text(bytes, &settings.recovery_limits());
    let structure = detect_structure_with(
        &recovered.text,
        ScanDepth {
            header_lines: settings.header_scan_lines,
            inference_lines: settings.inference_scan_lines,
        },
    );
    let options = ParseOptions::from_settings(settings, *dates);
    let mut records = parse_records(&recovered.text, &structure, &options);

    if settings.keyword_scan && records.iter().all(TransactionRecord::is_sample) {
        let mut scanned = scan_lines(&recovered.text, dates);
        if scanned.is_empty() {
            scanned = scan_windows(&recovered.text, dates);
        }
        if !scanned.is_empty() {
            info!(count = scanned.len(), "keyword scan replaced column parse");
            records = scanned;
        }
    }

    let sample = !records.is_empty() && records.iter().all(TransactionRecord::is_sample);
    if sample {
        warn!("no transactions recognized; output is sample data");
    }
    StatementParse {
        structure,
        records,
        sample,
        method: recovered.method,
        truncated: recovered.truncated,
    }
}

// ---------------------------------------------------------------------------
// Importer kinds
// ---------------------------------------------------------------------------

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    Pdf,
    Spreadsheet,
    Text,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Spreadsheet => "spreadsheet",
            Self::Text => "text",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF statement",
            Self::Spreadsheet => "Spreadsheet statement",
            Self::Text => "Plain-text statement",
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        match self {
            Self::Pdf => has_extension(file_path, &["pdf"]) || sniff_pdf(file_path),
            Self::Spreadsheet => has_extension(file_path, SPREADSHEET_EXTENSIONS),
            Self::Text => true,
        }
    }

    pub fn parse(&self, file_path: &Path, settings: &Settings, dates: &DateNormalizer) -> Result<ParsedFile> {
        match self {
            Self::Pdf | Self::Text => {
                let bytes = std::fs::read(file_path).map_err(|source| Error::TextRecoveryFailed {
                    path: file_path.to_path_buf(),
                    source,
                })?;
                Ok(ParsedFile::Text(parse_statement(&bytes, settings, dates)))
            }
            Self::Spreadsheet => {
                let grid = load_grid(file_path)?;
                Ok(ParsedFile::Grid(parse_grid(&grid, dates)))
            }
        }
    }
}

const ALL_IMPORTERS: &[ImporterKind] = &[
    ImporterKind::Pdf,
    ImporterKind::Spreadsheet,
    ImporterKind::Text,
];

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> ImporterKind {
    ALL_IMPORTERS
        .iter()
        .find(|i| i.detect(file_path))
        .copied()
        .unwrap_or(ImporterKind::Text)
}

fn has_extension(file_path: &Path, extensions: &[&str]) -> bool {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn sniff_pdf(file_path: &Path) -> bool {
    let Ok(file) = std::fs::File::open(file_path) else {
        return false;
    };
    let mut head = Vec::with_capacity(1024);
    if file.take(1024).read_to_end(&mut head).is_err() {
        return false;
    }
    is_pdf(&head)
}

pub fn load_grid(file_path: &Path) -> Result<Vec<Vec<String>>> {
    if has_extension(file_path, &["csv"]) {
        return load_csv(file_path);
    }
    #[cfg(feature = "xlsx")]
    {
        crate::sheet::load_workbook(file_path)
    }
    #[cfg(not(feature = "xlsx"))]
    {
        Err(Error::Spreadsheet(format!(
            "{} needs the xlsx feature",
            file_path.display()
        )))
    }
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ParsedFile {
    Text(StatementParse),
    Grid(Vec<TransactionRecord>),
}

impl ParsedFile {
    pub fn records(&self) -> &[TransactionRecord] {
        match self {
            Self::Text(parse) => &parse.records,
            Self::Grid(records) => records,
        }
    }
}

#[derive(Debug)]
pub struct ImportResult {
    pub kind: ImporterKind,
    /// Column layout of a text document; spreadsheets have none.
    pub structure: Option<ColumnStructure>,
    pub method: Option<RecoveryMethod>,
    pub records: usize,
    pub sample: bool,
}

pub fn import_file(
    file_path: &Path,
    format_key: Option<&str>,
    settings: &Settings,
    sink: &mut dyn RecordSink,
) -> Result<ImportResult> {
    import_file_with(file_path, format_key, settings, &DateNormalizer::new(), sink)
}

pub fn import_file_with(
    file_path: &Path,
    format_key: Option<&str>,
    settings: &Settings,
    dates: &DateNormalizer,
    sink: &mut dyn RecordSink,
) -> Result<ImportResult> {
    let importer = match format_key {
        Some(key) => get_by_key(key).ok_or_else(|| Error::UnknownFormat(key.to_string()))?,
        None => get_for_file(file_path),
    };
    info!(file = %file_path.display(), importer = importer.key(), "importing");

    let parsed = importer.parse(file_path, settings, dates)?;
    sink.ingest(parsed.records())?;

    let records = parsed.records().len();
    Ok(match parsed {
        ParsedFile::Text(parse) => ImportResult {
            kind: importer,
            sample: parse.sample,
            method: Some(parse.method),
            structure: Some(parse.structure),
            records,
        },
        ParsedFile::Grid(_) => ImportResult {
            kind: importer,
            structure: None,
            method: None,
            records,
            sample: false,
        },
    })
}
