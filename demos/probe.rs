//! Connect once and report what was reached.
//!
//! ```text
//! cargo run --example probe              # backend from environment
//! cargo run --example probe -- arq 192.168.4.11
//! cargo run --example probe -- sim 127.0.0.1 50051
//! ```
//!
//! The log level follows `RUST_LOG`, falling back to `QUIGGELDY_LOGLEVEL`.

use futures::FutureExt;
use hxcomm_context::env::{level_filter, QUIGGELDY_LOGLEVEL_VAR};
use hxcomm_context::{ConnectionContext, Environment, Strategy, TargetRestriction};
use tracing_subscriber::EnvFilter;

fn init_logging(env: &Environment) {
    let default = env
        .loglevel(QUIGGELDY_LOGLEVEL_VAR)
        .map(level_filter)
        .unwrap_or(tracing::level_filters::LevelFilter::INFO);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn parse_strategy(args: &[String]) -> Result<Strategy, String> {
    match args.first().map(String::as_str) {
        None | Some("auto") => Ok(Strategy::Auto),
        Some("arq") => Ok(Strategy::Arq {
            ip_address: args.get(1).cloned(),
        }),
        Some("sim") => {
            let port = args
                .get(2)
                .map(|port| port.parse::<u16>())
                .transpose()
                .map_err(|e| format!("invalid port: {}", e))?;
            Ok(Strategy::Sim {
                ip_address: args.get(1).cloned(),
                port,
            })
        }
        Some(other) => Err(format!(
            "unknown strategy '{}', expected auto, arq or sim",
            other
        )),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&Environment::from_process());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let strategy = parse_strategy(&args)?;
    tracing::info!(%strategy, "probing");

    let mut context =
        ConnectionContext::with_connector(strategy, hxcomm_context::NetworkConnector::new());

    let report = context
        .run(|connection| {
            async move {
                let targets = TargetRestriction::ALL
                    .iter()
                    .filter(|restriction| connection.supports(**restriction))
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                Ok(format!(
                    "{} at {} (targets: {})\n{}",
                    connection.name(),
                    connection.peer(),
                    targets.join(", "),
                    connection.time_info()
                ))
            }
            .boxed()
        })
        .await?;

    println!("{}", report);
    Ok(())
}
