use crate::core::RequestContext;
use std::collections::HashMap;

pub const FORWARDED_HOST: &str = "x-forwarded-host";
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const ORIGIN: &str = "origin";
pub const HOST: &str = "host";

/// Owned snapshot of an inbound request's headers.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    headers: HashMap<String, String>,
}

impl InboundRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl RequestContext for InboundRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Base URL the inbound request says this deployment is reachable at.
///
/// Checked in order: `x-forwarded-host` (scheme from `x-forwarded-proto`),
/// `origin`, then `host`. Proxies may send comma-separated lists; the first
/// entry is the client-facing one.
pub fn base_from_request(ctx: &dyn RequestContext) -> Option<String> {
    if let Some(host) = first_value(ctx.header(FORWARDED_HOST)) {
        let scheme = first_value(ctx.header(FORWARDED_PROTO))
            .map(str::to_string)
            .unwrap_or_else(|| default_scheme(host).to_string());
        return Some(format!("{}://{}", scheme, host));
    }

    if let Some(origin) = first_value(ctx.header(ORIGIN)) {
        // Browsers send the literal "null" for opaque origins.
        if origin != "null" {
            return Some(origin.to_string());
        }
    }

    first_value(ctx.header(HOST)).map(|host| format!("{}://{}", default_scheme(host), host))
}

fn first_value(raw: Option<&str>) -> Option<&str> {
    raw.and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn default_scheme(host: &str) -> &'static str {
    match hostname_of(host) {
        "localhost" | "127.0.0.1" | "[::1]" | "0.0.0.0" => "http",
        _ => "https",
    }
}

/// Strips a `:port` suffix; bracketed IPv6 literals keep their inner colons.
fn hostname_of(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.split_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}
