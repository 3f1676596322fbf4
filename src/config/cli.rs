use crate::config::toml_config::TomlConfig;
use crate::config::FetchConfig;
use crate::core::api::{ListQuery, Resource};
use crate::core::context::{InboundRequest, FORWARDED_HOST, FORWARDED_PROTO};
use crate::domain::model::{ApiRequest, EnvelopeMode};
use crate::utils::error::Result;
use crate::utils::validation::{validate_api_path, validate_url, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dashboard-fetch")]
#[command(about = "Fetch JSON from the school dashboard's own API the way server-rendered pages do")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, help = "TOML config file (defaults to DASHBOARD_* environment variables)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Fallback base URL, overrides the config")]
    pub base_url: Option<String>,

    #[arg(long, global = true, help = "Simulate an inbound x-forwarded-host header")]
    pub forwarded_host: Option<String>,

    #[arg(long, global = true, help = "Simulate an inbound x-forwarded-proto header")]
    pub forwarded_proto: Option<String>,

    #[arg(long = "header", short = 'H', global = true, value_parser = parse_key_val::<':'>,
          help = "Extra inbound request header, NAME:VALUE")]
    pub headers: Vec<(String, String)>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// GET an arbitrary path under /api
    Get(GetArgs),
    /// List one page of a dashboard resource
    List(ListArgs),
    /// Show a single dashboard record by id
    Show(ShowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GetArgs {
    /// Path after the /api prefix, e.g. /v1/student
    pub path: String,

    #[arg(long = "param", short = 'p', value_parser = parse_key_val::<'='>, help = "Query parameter, KEY=VALUE")]
    pub params: Vec<(String, String)>,

    #[arg(long, help = "Attach the internal API credential")]
    pub internal_auth: bool,

    #[arg(long, value_enum, default_value = "auto")]
    pub envelope: EnvelopeMode,

    #[arg(long, help = "Print { data, meta } instead of just the payload")]
    pub with_meta: bool,

    #[arg(long, help = "Exit non-zero instead of printing an empty result on failure")]
    pub strict: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    pub resource: Resource,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ShowArgs {
    pub resource: Resource,
    pub id: String,
}

fn parse_key_val<const SEP: char>(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once(SEP)
        .ok_or_else(|| format!("expected KEY{}VALUE, got '{}'", SEP, s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

impl CliConfig {
    /// File config (or environment), then command-line overrides.
    pub fn fetch_config(&self, file_config: Option<TomlConfig>) -> FetchConfig {
        let config = match file_config {
            Some(file_config) => file_config.into_fetch_config(),
            None => FetchConfig::from_env(),
        };

        match &self.base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        }
    }

    /// The simulated inbound request, if any header was given.
    pub fn inbound_request(&self) -> Option<InboundRequest> {
        let mut request = InboundRequest::new();
        for (name, value) in &self.headers {
            request.insert(name, value.clone());
        }
        if let Some(host) = &self.forwarded_host {
            request.insert(FORWARDED_HOST, host.clone());
        }
        if let Some(proto) = &self.forwarded_proto {
            request.insert(FORWARDED_PROTO, proto.clone());
        }

        if request.is_empty() {
            None
        } else {
            Some(request)
        }
    }
}

impl GetArgs {
    pub fn api_request(&self) -> ApiRequest {
        ApiRequest::new(self.path.clone())
            .params(self.params.iter().cloned())
            .internal_auth(self.internal_auth)
            .envelope(self.envelope)
    }
}

impl ListArgs {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            search: self.search.clone(),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_url("base_url", base_url)?;
        }
        if let Command::Get(args) = &self.command {
            validate_api_path("path", &args.path)?;
        }
        Ok(())
    }
}
