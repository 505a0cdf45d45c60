use clap::Parser;
use passvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => passvault::cli::commands::init::execute(&cli),
        Commands::Add {
            ref label,
            ref secret,
            generate,
            ref generator,
        } => passvault::cli::commands::add::execute(
            &cli,
            label,
            secret.as_deref(),
            generate,
            generator,
        ),
        Commands::Get { ref label } => passvault::cli::commands::get::execute(&cli, label),
        Commands::List {
            latest,
            skip_corrupt,
        } => passvault::cli::commands::list::execute(&cli, latest, skip_corrupt),
        Commands::Generate { ref generator } => {
            passvault::cli::commands::generate::execute(&cli, generator)
        }
        Commands::ChangePassphrase => passvault::cli::commands::change_passphrase::execute(&cli),
        Commands::Status => passvault::cli::commands::status::execute(&cli),
    };

    if let Err(e) = result {
        passvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr so they never mix with printed secrets.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "error",
        1 => "warn",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
