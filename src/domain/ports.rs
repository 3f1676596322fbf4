use crate::domain::model::{ApiRequest, FetchOutcome};
use async_trait::async_trait;

/// Read access to the headers of the request currently being rendered.
pub trait RequestContext: Send + Sync {
    /// Header lookup; `name` is matched case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;
}

impl RequestContext for reqwest::header::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Anything that can answer an `ApiRequest` with a tagged outcome.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn fetch_outcome(
        &self,
        ctx: Option<&dyn RequestContext>,
        request: &ApiRequest,
    ) -> FetchOutcome;
}
