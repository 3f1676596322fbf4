pub mod api;
pub mod context;
pub mod endpoint;
pub mod fetcher;

pub use crate::domain::model::{
    ApiRequest, EmptyDefault, EnvelopeMode, FailureKind, FetchOutcome, Fetched, ParamValue,
};
pub use crate::domain::ports::{JsonSource, RequestContext};
pub use crate::utils::error::Result;
