use crate::config::{FetchConfig, ResourceOptions};
use crate::core::{
    ApiRequest, EmptyDefault, FetchOutcome, Fetched, JsonSource, ParamValue, RequestContext,
};
use crate::utils::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The dashboard's REST resources under `/api/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Student,
    Teacher,
    Class,
    Subject,
    Assessment,
    Invite,
    Report,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Student,
        Resource::Teacher,
        Resource::Class,
        Resource::Subject,
        Resource::Assessment,
        Resource::Invite,
        Resource::Report,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Student => "student",
            Resource::Teacher => "teacher",
            Resource::Class => "class",
            Resource::Subject => "subject",
            Resource::Assessment => "assessment",
            Resource::Invite => "invite",
            Resource::Report => "report",
        }
    }

    pub fn path(self) -> String {
        format!("/v1/{}", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        let resource = match s.trim().to_ascii_lowercase().as_str() {
            "student" | "students" => Resource::Student,
            "teacher" | "teachers" => Resource::Teacher,
            "class" | "classes" => Resource::Class,
            "subject" | "subjects" => Resource::Subject,
            "assessment" | "assessments" | "exam" | "exams" => Resource::Assessment,
            "invite" | "invites" => Resource::Invite,
            "report" | "reports" => Resource::Report,
            other => {
                return Err(FetchError::InvalidRequest {
                    message: format!("unknown resource '{}'", other),
                })
            }
        };
        Ok(resource)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    fn to_params(&self) -> Vec<(String, ParamValue)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), ParamValue::from(page)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), ParamValue::from(limit)));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search".to_string(), ParamValue::from(search)));
        }
        params
    }
}

/// Pagination totals carried in a list envelope's `meta`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
    pub total: u64,
    pub total_pages: u64,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageMeta {
    fn from_meta(meta: Option<Value>, item_count: usize) -> Self {
        let parsed = meta.and_then(|m| match serde_json::from_value::<PageMeta>(m) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::debug!("Ignoring unreadable list meta: {}", e);
                None
            }
        });

        parsed.unwrap_or_else(|| PageMeta {
            total: item_count as u64,
            total_pages: u64::from(item_count > 0),
            page: None,
            limit: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub meta: PageMeta,
}

/// Typed access to the dashboard resources on top of a [`JsonSource`].
///
/// Which resources send the internal credential is decided by
/// configuration; unconfigured resources use the public profile.
pub struct DashboardApi<S: JsonSource> {
    source: S,
    options: HashMap<Resource, ResourceOptions>,
}

impl<S: JsonSource> DashboardApi<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: HashMap::new(),
        }
    }

    pub fn from_config(source: S, config: &FetchConfig) -> Result<Self> {
        let mut api = Self::new(source);
        for (name, options) in &config.resources {
            let resource = name
                .parse::<Resource>()
                .map_err(|_| FetchError::InvalidConfigValueError {
                    field: "resources".to_string(),
                    value: name.clone(),
                    reason: "not a dashboard resource".to_string(),
                })?;
            api.options.insert(resource, options.clone());
        }
        Ok(api)
    }

    pub fn with_resource_options(mut self, resource: Resource, options: ResourceOptions) -> Self {
        self.options.insert(resource, options);
        self
    }

    pub fn options(&self, resource: Resource) -> ResourceOptions {
        self.options.get(&resource).cloned().unwrap_or_default()
    }

    fn request_for(&self, resource: Resource, path: String) -> ApiRequest {
        let options = self.options(resource);
        ApiRequest::new(path)
            .internal_auth(options.requires_internal_auth)
            .envelope(options.envelope)
    }

    /// One page of a resource; an empty page when the fetch fails.
    pub async fn list(
        &self,
        ctx: Option<&dyn RequestContext>,
        resource: Resource,
        query: &ListQuery,
    ) -> Page {
        let request = self
            .request_for(resource, resource.path())
            .params(query.to_params())
            .empty_default(EmptyDefault::EmptySequence);

        match self.source.fetch_outcome(ctx, &request).await {
            FetchOutcome::Success(Fetched {
                data: Value::Array(items),
                meta,
            }) => {
                let meta = PageMeta::from_meta(meta, items.len());
                tracing::debug!("Listed {} {} records", items.len(), resource);
                Page { items, meta }
            }
            FetchOutcome::Success(_) => {
                tracing::warn!("{} list returned a non-array payload", resource);
                Page::default()
            }
            FetchOutcome::Failure { kind, .. } => {
                tracing::debug!("{} list degraded to empty ({})", resource, kind);
                Page::default()
            }
        }
    }

    /// A single record by id, or `None` when it is missing or the fetch fails.
    pub async fn get(
        &self,
        ctx: Option<&dyn RequestContext>,
        resource: Resource,
        id: &str,
    ) -> Option<Value> {
        if !is_valid_id(id) {
            tracing::warn!("Refusing to fetch {} with malformed id '{}'", resource, id);
            return None;
        }

        let request = self.request_for(resource, format!("{}/{}", resource.path(), id));
        match self.source.fetch_outcome(ctx, &request).await {
            FetchOutcome::Success(Fetched {
                data: Value::Null, ..
            }) => None,
            FetchOutcome::Success(fetched) => Some(fetched.data),
            FetchOutcome::Failure { .. } => None,
        }
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
        && id != "."
        && id != ".."
}
