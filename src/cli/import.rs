use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use passbook::error::Result;
use passbook::fmt::{rupees, rupees_or_blank};
use passbook::importer::{import_file, ImportResult};
use passbook::models::{Provenance, TransactionRecord};
use passbook::settings::load_settings;
use passbook::sink::{CsvSink, JsonSink, RecordSink};

use super::OutputFormat;

pub fn run(
    file: &Path,
    format: OutputFormat,
    output: Option<&Path>,
    importer: Option<&str>,
    no_sample: bool,
) -> Result<()> {
    let mut settings = load_settings();
    if no_sample {
        settings.sample_fallback = false;
    }

    match format {
        OutputFormat::Table => {
            let mut records: Vec<TransactionRecord> = Vec::new();
            let result = import_file(file, importer, &settings, &mut records)?;
            let table = render_table(&records);
            match output {
                Some(path) => std::fs::write(path, format!("{table}\n"))?,
                None => println!("{table}"),
            }
            println!("{}", summary(&result, &records));
        }
        OutputFormat::Csv => {
            let mut sink = CsvSink::new(open_output(output)?);
            let mut records: Vec<TransactionRecord> = Vec::new();
            let result = import_into(file, importer, &settings, &mut sink, &mut records)?;
            eprintln!("{}", summary(&result, &records));
        }
        OutputFormat::Json => {
            let mut sink = JsonSink::new(open_output(output)?);
            let mut records: Vec<TransactionRecord> = Vec::new();
            let result = import_into(file, importer, &settings, &mut sink, &mut records)?;
            eprintln!("{}", summary(&result, &records));
        }
    }
    Ok(())
}

// Feeds the writer sink and keeps a copy for the summary line.
fn import_into(
    file: &Path,
    importer: Option<&str>,
    settings: &passbook::Settings,
    sink: &mut dyn RecordSink,
    records: &mut Vec<TransactionRecord>,
) -> Result<ImportResult> {
    let result = import_file(file, importer, settings, records)?;
    sink.ingest(records)?;
    sink.finish()?;
    Ok(result)
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    })
}

fn render_table(records: &[TransactionRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "#",
        "Date",
        "Particulars",
        "Depositor",
        "Withdrawals",
        "Deposits",
        "Balance",
        "Type",
    ]);
    for (i, r) in records.iter().enumerate() {
        let date = match r.provenance {
            Provenance::DateDefaulted => format!("{}*", r.date),
            _ => r.date.to_string(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(date),
            Cell::new(&r.particulars),
            Cell::new(&r.depositor),
            Cell::new(rupees_or_blank(r.withdrawals)),
            Cell::new(rupees_or_blank(r.deposits)),
            Cell::new(r.balance.map(rupees).unwrap_or_default()),
            Cell::new(r.kind.as_str()),
        ]);
    }
    table
}

fn summary(result: &ImportResult, records: &[TransactionRecord]) -> String {
    let deposits: f64 = records.iter().map(|r| r.deposits).sum();
    let withdrawals: f64 = records.iter().map(|r| r.withdrawals).sum();
    let defaulted = records
        .iter()
        .filter(|r| r.provenance == Provenance::DateDefaulted)
        .count();

    let mut lines = vec![format!(
        "{} records via {} ({} in, {} out)",
        result.records,
        result.kind.name(),
        rupees(deposits).as_str().green(),
        rupees(withdrawals).as_str().red()
    )];
    if defaulted > 0 {
        let note = format!("{defaulted} dates could not be read and were set to today (*)");
        lines.push(note.as_str().yellow().to_string());
    }
    if result.sample {
        lines.push(
            "No transactions recognized: these are SAMPLE rows, not statement data."
                .yellow()
                .bold()
                .to_string(),
        );
    }
    lines.join("\n")
}
