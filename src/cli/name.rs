use passbook::error::Result;
use passbook::names::extract_name;

pub fn run(particulars: &str) -> Result<()> {
    println!("{}", extract_name(particulars));
    Ok(())
}
