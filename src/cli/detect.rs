use std::path::Path;

use comfy_table::{Cell, Table};

use passbook::error::Result;
use passbook::importer::{get_for_file, load_grid, ImporterKind};
use passbook::recovery::recover_file;
use passbook::settings::load_settings;
use passbook::sheet::{find_header_row, ColumnMap};
use passbook::structure::{detect_structure_with, ScanDepth};

pub fn run(file: &Path) -> Result<()> {
    let settings = load_settings();
    let kind = get_for_file(file);
    println!("Importer: {}", kind.name());

    if kind == ImporterKind::Spreadsheet {
        let grid = load_grid(file)?;
        let Some(row) = find_header_row(&grid) else {
            println!("No header row in the first 5 rows; columns are unnamed.");
            return Ok(());
        };
        println!("Header row: {}", row + 1);
        let map = ColumnMap::from_headers(&grid[row]);
        let mut table = Table::new();
        table.set_header(vec!["Field", "Column"]);
        for (field, col) in [
            ("date", map.date),
            ("particulars", map.particulars),
            ("depositor", map.depositor),
            ("amount", map.amount),
            ("deposits", map.deposits),
            ("withdrawals", map.withdrawals),
            ("balance", map.balance),
            ("type", map.kind),
        ] {
            let label = col
                .and_then(|i| grid[row].get(i))
                .map(|h| h.trim().to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![Cell::new(field), Cell::new(label)]);
        }
        println!("{table}");
        return Ok(());
    }

    let recovered = recover_file(file, &settings.recovery_limits())?;
    let structure = detect_structure_with(
        &recovered.text,
        ScanDepth {
            header_lines: settings.header_scan_lines,
            inference_lines: settings.inference_scan_lines,
        },
    );
    println!("Text recovery: {:?}", recovered.method);
    if recovered.truncated {
        println!("Only the first {} bytes were scanned.", settings.max_scan_bytes);
    }
    println!("Structure: {:?}", structure.source);
    match structure.header_line {
        Some(line) => println!("Header line: {}", line + 1),
        None => println!("Header line: none"),
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Column"]);
    for (i, h) in structure.headers.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(h)]);
    }
    println!("{table}");
    Ok(())
}
