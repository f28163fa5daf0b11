use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{RecordKind, TransactionRecord};

/// Consumer of parsed record batches. `ingest` runs once per document.
pub trait RecordSink {
    fn ingest(&mut self, records: &[TransactionRecord]) -> Result<()>;

    /// Flush anything buffered. Called once after the last batch.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<TransactionRecord> {
    fn ingest(&mut self, records: &[TransactionRecord]) -> Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: u64,
    date: NaiveDate,
    particulars: &'a str,
    depositor: &'a str,
    withdrawals: f64,
    deposits: f64,
    balance: Option<f64>,
    #[serde(rename = "type")]
    kind: RecordKind,
}

/// Ledger rows as CSV. Ids run on from 1 across every batch.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    next_id: u64,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            next_id: 1,
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn ingest(&mut self, records: &[TransactionRecord]) -> Result<()> {
        for r in records {
            self.writer.serialize(CsvRow {
                id: self.next_id,
                date: r.date,
                particulars: &r.particulars,
                depositor: &r.depositor,
                withdrawals: r.withdrawals,
                deposits: r.deposits,
                balance: r.balance,
                kind: r.kind,
            })?;
            self.next_id += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Collects every batch and writes one pretty JSON array on `finish`.
pub struct JsonSink<W: Write> {
    out: W,
    records: Vec<TransactionRecord>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn ingest(&mut self, records: &[TransactionRecord]) -> Result<()> {
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &self.records)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
