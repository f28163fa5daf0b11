mod cli;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    passbook::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Import {
            file,
            format,
            output,
            importer,
            no_sample,
        } => cli::import::run(&file, format, output.as_deref(), importer.as_deref(), no_sample),
        Commands::Detect { file } => cli::detect::run(&file),
        Commands::Name { particulars } => cli::name::run(&particulars),
        Commands::Date { raw } => cli::date::run(&raw),
        Commands::Config { init } => cli::config::run(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
