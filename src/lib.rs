pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::{FetchConfig, ResourceOptions};
pub use core::{
    api::{DashboardApi, ListQuery, Page, PageMeta, Resource},
    context::InboundRequest,
    fetcher::ServerSideFetcher,
};
pub use domain::model::{
    ApiRequest, EmptyDefault, EnvelopeMode, FailureKind, FetchOutcome, Fetched, ParamValue,
};
pub use domain::ports::{JsonSource, RequestContext};
pub use utils::error::{FetchError, Result};
