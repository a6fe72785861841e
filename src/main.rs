use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cf_mysql::cf::{ApiClientImpl, CfCliConnection, CfConnection, CfServiceImpl, HttpWrapper};
use cf_mysql::mysql::{MysqlRunnerImpl, OsExecWrapper};
use cf_mysql::plugin::MysqlPlugin;
use cf_mysql::tunnel::{CfSshRunner, FreePortFinder, RandomRelayPicker, TcpPortWaiter};
use cf_mysql::{cli, config};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cfg = config::load()?;

    let default_filter = if cfg.trace_requests {
        "cf_mysql=warn,cf_mysql::http=trace"
    } else {
        "cf_mysql=warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::Cli::parse();

    let http = Arc::new(HttpWrapper::new(&cfg).context("failed to build HTTP client")?);
    let api = Arc::new(ApiClientImpl::new(http));
    let cf_service = CfServiceImpl::new(
        api,
        Arc::new(CfSshRunner),
        Arc::new(TcpPortWaiter::new(cfg.port_poll_interval)),
        Arc::new(RandomRelayPicker),
        // stdout carries client output, e.g. a mysqldump redirected to a file.
        Box::new(std::io::stderr()),
    )
    .with_service_key_name(cfg.service_key_name.clone())
    .with_tunnel_timeout(cfg.tunnel_timeout);

    let mut plugin = MysqlPlugin::new(
        Box::new(std::io::stdout()),
        Box::new(std::io::stderr()),
        Arc::new(cf_service),
        Arc::new(MysqlRunnerImpl::new(Arc::new(OsExecWrapper))),
        Arc::new(FreePortFinder),
    );

    let conn: Arc<dyn CfConnection> = Arc::new(CfCliConnection::new(&cfg));
    let code = plugin.run(conn, args.command).await;

    // Returning drops the runtime, which kills the cf ssh child.
    Ok(ExitCode::from(code as u8))
}
