use crate::config::FetchConfig;
use crate::core::endpoint::{build_api_url, resolve_base_url};
use crate::core::{
    ApiRequest, EnvelopeMode, FetchOutcome, Fetched, JsonSource, RequestContext,
};
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Fetches JSON from this deployment's own `/api` routes during server-side rendering.
///
/// Every call is a single best-effort GET: no caching, no retry and no
/// timeout. The plain `fetch*` methods never fail; they log and hand back an
/// empty default. Use [`ServerSideFetcher::fetch_outcome`] or
/// [`ServerSideFetcher::try_fetch`] to see why a call produced nothing.
#[derive(Debug, Clone)]
pub struct ServerSideFetcher {
    client: Client,
    config: FetchConfig,
}

impl ServerSideFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Resolves the absolute URL a request would be sent to.
    pub fn request_url(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> Result<url::Url> {
        let base = resolve_base_url(ctx, self.config.fallback_base_url())?;
        build_api_url(&base, &request.path, &request.params)
    }

    pub async fn try_fetch(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> Result<Fetched> {
        let url = self.request_url(ctx, request)?;
        tracing::info!("Fetching {}", url);

        let mut builder = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json");

        if request.requires_internal_auth {
            match self.config.internal_api_key() {
                Some(key) => {
                    builder = builder.header(self.config.internal_auth_header.as_str(), key);
                }
                None => tracing::warn!(
                    "{} requires internal auth but no API key is configured; sending without it",
                    request.path
                ),
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::StatusError {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| FetchError::DecodeError {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        unwrap_envelope(body, request.envelope).map_err(|message| FetchError::DecodeError {
            url: url.to_string(),
            message,
        })
    }

    /// Tagged result: never panics, never returns `Err`.
    pub async fn fetch_outcome(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> FetchOutcome {
        match self.try_fetch(ctx, request).await {
            Ok(fetched) => FetchOutcome::Success(fetched),
            Err(e) => {
                let kind = e.failure_kind();
                tracing::warn!(kind = %kind, "Fetch of {} failed: {}", request.path, e);
                FetchOutcome::Failure {
                    kind,
                    detail: e.to_string(),
                }
            }
        }
    }

    /// The unwrapped payload, or the request's empty default on any failure.
    pub async fn fetch(&self, ctx: Option<&dyn RequestContext>, request: &ApiRequest) -> Value {
        self.fetch_with_meta(ctx, request).await.data
    }

    pub async fn fetch_with_meta(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> Fetched {
        self.fetch_outcome(ctx, request)
            .await
            .into_fetched(request.empty)
    }

    /// The payload as a sequence; empty on failure or when it is not an array.
    pub async fn fetch_list(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> Vec<Value> {
        match self.fetch_outcome(ctx, request).await {
            FetchOutcome::Success(Fetched {
                data: Value::Array(items),
                ..
            }) => items,
            FetchOutcome::Success(Fetched { data: Value::Null, .. }) => Vec::new(),
            FetchOutcome::Success(_) => {
                tracing::warn!("{} returned a non-array payload", request.path);
                Vec::new()
            }
            FetchOutcome::Failure { .. } => Vec::new(),
        }
    }

    /// The payload deserialized into `T`, or `T::default()` on any failure.
    pub async fn fetch_as<T>(&self, ctx: Option<&dyn RequestContext>, request: &ApiRequest) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.fetch_outcome(ctx, request).await {
            FetchOutcome::Success(fetched) => {
                serde_json::from_value(fetched.data).unwrap_or_else(|e| {
                    tracing::warn!("{} payload did not match the expected shape: {}", request.path, e);
                    T::default()
                })
            }
            FetchOutcome::Failure { .. } => T::default(),
        }
    }
}

#[async_trait]
impl JsonSource for ServerSideFetcher {
    async fn fetch_outcome(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> FetchOutcome {
        ServerSideFetcher::fetch_outcome(self, ctx, request).await
    }
}

/// Peels one `{ data, meta? }` level off a response body.
pub fn unwrap_envelope(body: Value, mode: EnvelopeMode) -> std::result::Result<Fetched, String> {
    if mode == EnvelopeMode::Bare {
        return Ok(Fetched {
            data: body,
            meta: None,
        });
    }

    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => Ok(Fetched {
                data,
                meta: map.remove("meta").filter(|m| !m.is_null()),
            }),
            None if mode == EnvelopeMode::Envelope => {
                Err("expected an envelope with a `data` field".to_string())
            }
            None => Ok(Fetched {
                data: Value::Object(map),
                meta: None,
            }),
        },
        other if mode == EnvelopeMode::Envelope => Err(format!(
            "expected an envelope object, got {}",
            json_type_name(&other)
        )),
        other => Ok(Fetched {
            data: other,
            meta: None,
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
