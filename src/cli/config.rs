use passbook::error::{Error, Result};
use passbook::settings::{load_settings, save_settings, settings_path};

pub fn run(init: bool) -> Result<()> {
    let path = settings_path();
    if init && !path.exists() {
        save_settings(&load_settings())?;
        println!("Wrote default settings to {}", path.display());
    }
    let settings = load_settings();
    let json = serde_json::to_string_pretty(&settings).map_err(|e| Error::Settings(e.to_string()))?;
    println!("# {}", path.display());
    println!("{json}");
    Ok(())
}
