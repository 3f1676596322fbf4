use anyhow::Context;
use clap::Parser;
use dashboard_fetch::config::cli::{Command, GetArgs};
use dashboard_fetch::config::toml_config::TomlConfig;
use dashboard_fetch::core::RequestContext;
use dashboard_fetch::utils::{logger, validation::Validate};
use dashboard_fetch::{
    CliConfig, DashboardApi, FailureKind, FetchOutcome, ServerSideFetcher,
};
use serde_json::Value;

const EXIT_CONFIG: i32 = 1;

fn exit_code(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::Transport | FailureKind::Status => 2, // may succeed on retry
        FailureKind::BaseUrlUnresolved | FailureKind::InvalidRequest => 3,
        FailureKind::Decode => 4,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let file_config = cli.config.as_ref().map(TomlConfig::from_file).transpose();

    // Logging settings may come from the config file, so read it before init.
    let logging = file_config
        .as_ref()
        .ok()
        .and_then(|c| c.as_ref())
        .and_then(|c| c.logging.clone())
        .unwrap_or_default();
    if cli.log_json || logging.json.unwrap_or(false) {
        logger::init_json_logger(cli.verbose, logging.level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, logging.level.as_deref());
    }

    tracing::debug!("CLI config: {:?}", cli);

    let file_config = file_config.context("failed to load config file")?;
    if let Some(file_config) = &file_config {
        if let Err(e) = file_config.validate() {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }

    let config = cli.fetch_config(file_config);
    if let Err(e) = cli.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    let inbound = cli.inbound_request();
    let ctx = inbound.as_ref().map(|r| r as &dyn RequestContext);
    let fetcher = ServerSideFetcher::new(config);

    let output = match &cli.command {
        Command::Get(args) => run_get(&fetcher, ctx, args).await,
        Command::List(args) => {
            let api = DashboardApi::from_config(fetcher.clone(), fetcher.config())?;
            let page = api.list(ctx, args.resource, &args.query()).await;
            serde_json::json!({ "data": page.items, "meta": page.meta })
        }
        Command::Show(args) => {
            let api = DashboardApi::from_config(fetcher.clone(), fetcher.config())?;
            api.get(ctx, args.resource, &args.id)
                .await
                .unwrap_or(Value::Null)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_get(
    fetcher: &ServerSideFetcher,
    ctx: Option<&dyn RequestContext>,
    args: &GetArgs,
) -> Value {
    let request = args.api_request();

    if args.strict {
        return match fetcher.fetch_outcome(ctx, &request).await {
            FetchOutcome::Success(fetched) if args.with_meta => {
                serde_json::json!({ "data": fetched.data, "meta": fetched.meta })
            }
            FetchOutcome::Success(fetched) => fetched.data,
            FetchOutcome::Failure { kind, detail } => {
                eprintln!("❌ {} ({})", detail, kind);
                std::process::exit(exit_code(kind));
            }
        };
    }

    if args.with_meta {
        let fetched = fetcher.fetch_with_meta(ctx, &request).await;
        serde_json::json!({ "data": fetched.data, "meta": fetched.meta })
    } else {
        fetcher.fetch(ctx, &request).await
    }
}
