use crate::core::context::base_from_request;
use crate::core::{ParamValue, RequestContext};
use crate::utils::error::{FetchError, Result};
use url::Url;

pub const API_PREFIX: &str = "/api";

/// Resolves the deployment's own base URL.
///
/// The inbound request wins when it carries a usable host signal; otherwise
/// the configured fallback is used. A request-derived value that does not
/// parse is skipped in favour of the fallback.
pub fn resolve_base_url(ctx: Option<&dyn RequestContext>, fallback: Option<&str>) -> Result<Url> {
    if let Some(raw) = ctx.and_then(base_from_request) {
        match parse_base(&raw) {
            Ok(url) => return Ok(url),
            Err(e) => tracing::warn!("Ignoring base URL from inbound request: {}", e),
        }
    }

    match fallback {
        Some(raw) => parse_base(raw),
        None => Err(FetchError::BaseUrlUnresolved),
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidRequest {
        message: format!("base URL '{}' is not a valid URL: {}", raw, e),
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => {}
        scheme => {
            return Err(FetchError::InvalidRequest {
                message: format!("base URL '{}' has unsupported scheme '{}'", raw, scheme),
            })
        }
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(FetchError::InvalidRequest {
            message: format!("base URL '{}' cannot carry a query or fragment", raw),
        });
    }

    Ok(url)
}

/// Builds `{base}/api{path}{?query}`. No `?` is emitted when `params` is empty.
pub fn build_api_url(base: &Url, path: &str, params: &[(String, ParamValue)]) -> Result<Url> {
    if !path.starts_with('/') {
        return Err(FetchError::InvalidRequest {
            message: format!("API path '{}' must start with '/'", path),
        });
    }

    let mut origin = base.clone();
    origin.set_query(None);
    origin.set_fragment(None);
    let raw = format!(
        "{}{}{}",
        origin.as_str().trim_end_matches('/'),
        API_PREFIX,
        path
    );
    let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidRequest {
        message: format!("'{}' is not a valid URL: {}", raw, e),
    })?;

    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, &value.to_string());
        }
    }

    Ok(url)
}
