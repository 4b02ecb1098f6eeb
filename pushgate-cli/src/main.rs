//! pushgate CLI - run the backup job reporter or the timing service.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::backup::BackupOverrides;
use commands::serve::ServeOverrides;

#[derive(Parser)]
#[command(name = "pushgate")]
#[command(author, version, long_about = None)]
#[command(about = "Push job and request metrics to a Prometheus Pushgateway")]
struct Cli {
    /// Environment file to load instead of the nearest `.env`
    #[arg(long, global = true, env = "PUSHGATE_ENV_FILE")]
    env_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Display version information
    Version,
    /// Run the simulated backup once and push its metrics
    Backup {
        /// Job name and metric prefix
        #[arg(long)]
        job: Option<String>,
        /// Records the simulated backup reports
        #[arg(long)]
        records: Option<u64>,
        /// Upper bound of the simulated work delay
        #[arg(long)]
        max_delay_ms: Option<u64>,
        /// Probability in [0, 1] that the simulated backup fails
        #[arg(long)]
        failure_rate: Option<f64>,
    },
    /// Serve POST /users behind the request timing middleware
    Serve {
        /// Address to bind, e.g. 127.0.0.1:3000
        #[arg(short, long)]
        listen: Option<String>,
        /// Job name for the startup push
        #[arg(long)]
        job: Option<String>,
        /// Skip the push performed before the first request
        #[arg(long)]
        no_startup_push: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            print_version();
            Ok(())
        }
        Some(Commands::Backup {
            job,
            records,
            max_delay_ms,
            failure_rate,
        }) => match commands::bootstrap(cli.env_file.as_deref()) {
            Ok(()) => {
                commands::backup::execute(BackupOverrides {
                    job,
                    records,
                    max_delay_ms,
                    failure_rate,
                })
                .await
            }
            Err(e) => Err(e),
        },
        Some(Commands::Serve {
            listen,
            job,
            no_startup_push,
        }) => match commands::bootstrap(cli.env_file.as_deref()) {
            Ok(()) => {
                commands::serve::execute(ServeOverrides {
                    listen,
                    job,
                    no_startup_push,
                })
                .await
            }
            Err(e) => Err(e),
        },
        None => {
            print_version();
            println!();
            println!("Run {} for usage information.", "pushgate --help".cyan());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn print_version() {
    println!("pushgate {}", env!("CARGO_PKG_VERSION"));
}
