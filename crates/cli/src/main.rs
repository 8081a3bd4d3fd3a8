use clap::{Args, Parser, Subcommand};
use dclocate_application::use_cases::LocateRequest;
use dclocate_domain::CliOverrides;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod output;

#[derive(Parser)]
#[command(name = "dclocate")]
#[command(version)]
#[command(about = "Locate an Active Directory domain controller via DNS SRV and CLDAP ping")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Find a responding domain controller for DOMAIN
    Locate {
        domain: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the SRV candidates for DOMAIN in probe order
    Srv {
        domain: String,

        /// Print the candidates as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// SRV service prefix (default _ldap._tcp.dc._msdcs)
    #[arg(short = 's', long, global = true)]
    service: Option<String>,

    /// Nameserver to query, `ip` or `ip:port`; may be repeated
    #[arg(short = 'n', long = "nameserver", global = true)]
    nameservers: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Per-candidate ping timeout in milliseconds
    #[arg(short = 't', long, global = true)]
    timeout_ms: Option<u64>,

    /// Client host name sent in the Host= filter term
    #[arg(long, global = true)]
    host: Option<String>,

    /// Log the candidate list and every probe
    #[arg(long, global = true)]
    dump_candidates: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dclocate: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cli_overrides = CliOverrides {
        service_prefix: cli.common.service.clone(),
        ping_timeout_ms: cli.common.timeout_ms,
        host_filter: cli.common.host.clone(),
        nameservers: cli.common.nameservers.clone(),
        log_level: cli.common.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.common.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);

    info!("dclocate v{}", env!("CARGO_PKG_VERSION"));

    let locator = di::build_locator(&config, cli.common.dump_candidates).await?;

    let result = match &cli.command {
        Command::Locate { domain, json } => {
            let mut request = LocateRequest::new(domain.as_str());
            if let Some(host) = &config.locator.host_filter {
                request = request.with_host(host.as_str());
            }

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            locator
                .execute_with_cancel(&request, cancel)
                .await
                .map(|info| output::print_dc_info(&info, *json))
        }
        Command::Srv { domain, json } => locator
            .resolve_candidates(domain)
            .await
            .map(|candidates| output::print_candidates(&candidates, *json)),
    };

    match result {
        Ok(printed) => {
            printed?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Lookup failed");
            eprintln!("dclocate: {}", e);
            Ok(if e.is_not_found() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            })
        }
    }
}
