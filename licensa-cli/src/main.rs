mod handlers;
mod server;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use licensa_core::client::DEFAULT_BASE_URL;
use licensa_core::pool::LicensePool;
use licensa_core::{ClientConfig, LeaseError, LeasingClient, LicenseStatus};

use crate::handlers::{parse_tool_spec, ToolSpec};

#[derive(Parser)]
#[command(
    name = "licensa",
    about = "Licensa: borrow, return and pool shared tool licenses",
    version
)]
struct Cli {
    /// Base URL of the license pool server
    #[arg(long, global = true, env = "LICENSA_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Per-request timeout in milliseconds
    #[arg(long, global = true, env = "LICENSA_TIMEOUT_MS", default_value = "10000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the license pool HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Tool to provision: NAME=TOTAL, NAME=TOTAL:COMMIT:MAX_OVERAGE, or
        /// NAME=TOTAL:COMMIT:MAX_OVERAGE:COMMIT_PRICE:OVERAGE_PRICE
        #[arg(
            long = "tool",
            env = "LICENSA_TOOLS",
            value_delimiter = ',',
            required = true,
            value_parser = parse_tool_spec
        )]
        tools: Vec<ToolSpec>,

        /// Maximum number of requests served at once
        #[arg(long, default_value = "256")]
        max_concurrent: usize,
    },

    /// Borrow a license. Prints the lease id unless --hold is given.
    Borrow {
        #[arg(long)]
        tool: String,

        #[arg(long, env = "LICENSA_USER", default_value = "demo-client")]
        user: String,

        /// Hold the license for this many seconds, then return it
        #[arg(long)]
        hold: Option<u64>,
    },

    /// Return a license by lease id
    Return {
        #[arg(long)]
        id: String,

        #[arg(long, default_value = "")]
        tool: String,

        #[arg(long, env = "LICENSA_USER", default_value = "demo-client")]
        user: String,
    },

    /// Show pool status for one tool or for all tools
    Status { tool: Option<String> },

    /// List outstanding leases
    Borrows {
        #[arg(long)]
        user: Option<String>,
    },

    /// List overage charges recorded by the pool
    Charges,

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.url).with_timeout(Duration::from_millis(cli.timeout_ms));

    match cli.command {
        Commands::Serve {
            port,
            host,
            tools,
            max_concurrent,
        } => {
            let mut pool = LicensePool::new();
            for spec in &tools {
                tracing::info!(
                    tool = %spec.name,
                    total = spec.allocation.total,
                    commit = spec.allocation.commit,
                    max_overage = spec.allocation.max_overage,
                    commit_price = spec.allocation.commit_price,
                    overage_price = spec.allocation.overage_price,
                    "Provisioned tool"
                );
                pool.provision(&spec.name, spec.allocation);
            }

            match server::run(&host, port, pool, max_concurrent).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        command => {
            // The client blocks on each exchange; keep it off the async workers
            let outcome = tokio::task::spawn_blocking(move || run_client(command, &config)).await;
            match outcome {
                Ok(Ok(())) => ExitCode::SUCCESS,
                Ok(Err(e)) => {
                    eprintln!("error: {}", e);
                    match e {
                        LeaseError::NoLicensesAvailable(_) => ExitCode::from(2),
                        _ => ExitCode::FAILURE,
                    }
                }
                Err(e) => {
                    eprintln!("error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn run_client(command: Commands, config: &ClientConfig) -> Result<(), LeaseError> {
    let client = LeasingClient::connect(config)?;

    match command {
        Commands::Borrow { tool, user, hold } => {
            if hold.is_some() {
                println!("{}", describe(&client.get_status(&tool)?));
            }

            let mut handle = client.borrow(&tool, &user)?;
            match hold {
                Some(secs) => {
                    println!("Borrowed {} (id {}), holding for {}s", tool, handle.id(), secs);
                    std::thread::sleep(Duration::from_secs(secs));
                    client.return_license(&mut handle)?;
                    println!("Returned {}", handle.id());
                    println!("{}", describe(&client.get_status(&tool)?));
                }
                None => println!("{}", handle.detach()),
            }
        }
        Commands::Return { id, tool, user } => {
            let mut handle = client.adopt(&id, &tool, &user)?;
            client.return_license(&mut handle)?;
            println!("Returned {}", id);
        }
        Commands::Status { tool: Some(tool) } => {
            println!("{}", describe(&client.get_status(&tool)?));
        }
        Commands::Status { tool: None } => {
            for status in client.get_all_statuses()? {
                println!("{}", describe(&status));
            }
        }
        Commands::Borrows { user } => {
            let borrows = client.list_borrows(user.as_deref())?;
            if borrows.is_empty() {
                println!("No outstanding leases");
            }
            for b in borrows {
                let band = if b.is_overage { "overage" } else { "commit" };
                println!("{}  {}  {}  {}", b.id, b.tool, b.user, band);
            }
        }
        Commands::Charges => {
            let charges = client.overage_charges()?;
            if charges.is_empty() {
                println!("No overage charges");
            }
            let mut total = 0.0;
            for c in &charges {
                total += c.amount;
                println!("{}  {}  {}  {}  {:.2}", c.charged_at, c.tool, c.user, c.borrow_id, c.amount);
            }
            if !charges.is_empty() {
                println!("total {:.2}", total);
            }
        }
        Commands::Version => {
            println!("licensa {}", env!("CARGO_PKG_VERSION"));
            match client.server_version() {
                Ok(v) => println!("server {} at {}", v, config.base_url),
                Err(e) => println!("server unreachable at {}: {}", config.base_url, e),
            }
        }
        Commands::Serve { .. } => {
            return Err(LeaseError::InvalidArgument(
                "serve is not a client command".to_string(),
            ))
        }
    }
    Ok(())
}

fn describe(status: &LicenseStatus) -> String {
    let mut line = format!(
        "{}: {}/{} available, {} borrowed",
        status.tool, status.available, status.total, status.borrowed
    );
    if status.has_overage_terms() {
        let band = if status.in_commit { "within commit" } else { "in overage" };
        line.push_str(&format!(
            " (commit {}, overage {}/{}, {})",
            status.commit, status.overage, status.max_overage, band
        ));
    }
    if status.total_cost > 0.0 {
        line.push_str(&format!(
            " [cost {:.2} = commit {:.2} + overage {:.2}]",
            status.total_cost, status.commit_price, status.current_overage_cost
        ));
    }
    line
}
