use colored::Colorize;

use passbook::dates::DateNormalizer;
use passbook::error::Result;

pub fn run(raw: &str) -> Result<()> {
    let date = DateNormalizer::new().normalize(raw);
    if date.defaulted {
        println!("{} {}", date.iso(), "(unreadable, defaulted to today)".yellow());
    } else {
        println!("{}", date.iso());
    }
    Ok(())
}
