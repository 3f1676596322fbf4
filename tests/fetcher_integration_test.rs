use anyhow::Result;
use dashboard_fetch::{
    ApiRequest, DashboardApi, EmptyDefault, EnvelopeMode, FailureKind, FetchConfig, FetchOutcome,
    InboundRequest, ListQuery, Resource, ResourceOptions, ServerSideFetcher,
};
use httpmock::prelude::*;
use serde_json::{json, Value};

fn fetcher_for(server: &MockServer) -> ServerSideFetcher {
    ServerSideFetcher::new(FetchConfig::default().with_base_url(server.base_url()))
}

/// Paged student list: the envelope's array comes back, meta is reachable separately.
#[tokio::test]
async fn test_paged_student_list_end_to_end() -> Result<()> {
    let server = MockServer::start();
    let students = json!([
        {"_id": "s1", "name": "Ana", "class": "7A"},
        {"_id": "s2", "name": "Ben", "class": "7B"}
    ]);

    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/student")
            .query_param("page", "2")
            .query_param("limit", "20");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "data": students.clone(),
                "meta": {"total": 40, "totalPages": 2}
            }));
    });

    let fetcher = fetcher_for(&server);
    let request = ApiRequest::new("/v1/student")
        .param("page", 2)
        .param("limit", 20);

    let data = fetcher.fetch(None, &request).await;
    assert_eq!(data, students);

    let fetched = fetcher.fetch_with_meta(None, &request).await;
    assert_eq!(fetched.data, students);
    assert_eq!(fetched.meta, Some(json!({"total": 40, "totalPages": 2})));

    api_mock.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn test_body_without_data_returned_unchanged() -> Result<()> {
    let server = MockServer::start();
    let body = json!({"totalStudents": 40, "totalTeachers": 6});

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/report/overview");
        then.status(200).json_body(body.clone());
    });

    let value = fetcher_for(&server)
        .fetch(None, &ApiRequest::new("/v1/report/overview"))
        .await;
    assert_eq!(value, body);
    Ok(())
}

#[tokio::test]
async fn test_bare_mode_keeps_data_field() -> Result<()> {
    let server = MockServer::start();
    let body = json!({"data": "raw cell", "row": 3});

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/upload/preview");
        then.status(200).json_body(body.clone());
    });

    let request = ApiRequest::new("/v1/upload/preview").envelope(EnvelopeMode::Bare);
    let value = fetcher_for(&server).fetch(None, &request).await;
    assert_eq!(value, body);
    Ok(())
}

#[tokio::test]
async fn test_internal_credential_only_on_internal_calls() -> Result<()> {
    let server = MockServer::start();

    let internal_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/invite")
            .header("x-api-key", "s3cret");
        then.status(200).json_body(json!({"data": [{"email": "t@school.test"}]}));
    });

    let keyed_class_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/class")
            .header_exists("x-api-key");
        then.status(200).json_body(json!({"data": [{"name": "7A"}]}));
    });

    let fetcher = ServerSideFetcher::new(
        FetchConfig::default()
            .with_base_url(server.base_url())
            .with_internal_api_key("s3cret"),
    );

    let invites = fetcher
        .fetch_list(None, &ApiRequest::new("/v1/invite").internal_auth(true))
        .await;
    assert_eq!(invites.len(), 1);
    internal_mock.assert();

    // A public call must not carry the key, so only the unmocked 404 path is hit.
    let classes = fetcher.fetch_list(None, &ApiRequest::new("/v1/class")).await;
    assert!(classes.is_empty());
    keyed_class_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_custom_credential_header_name() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/report")
            .header("x-internal-key", "k1");
        then.status(200).json_body(json!([]));
    });

    let fetcher = ServerSideFetcher::new(
        FetchConfig::default()
            .with_base_url(server.base_url())
            .with_internal_api_key("k1")
            .with_internal_auth_header("x-internal-key"),
    );

    let outcome = fetcher
        .fetch_outcome(None, &ApiRequest::new("/v1/report").internal_auth(true))
        .await;
    assert!(outcome.is_success());
    api_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_internal_call_without_key_still_sent() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/invite");
        then.status(401).json_body(json!({"error": "unauthorized"}));
    });

    let fetcher = fetcher_for(&server);
    let request = ApiRequest::new("/v1/invite")
        .internal_auth(true)
        .empty_default(EmptyDefault::EmptySequence);

    assert_eq!(fetcher.fetch(None, &request).await, json!([]));
    api_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_degrades() -> Result<()> {
    // Nothing listens on port 1.
    let fetcher =
        ServerSideFetcher::new(FetchConfig::default().with_base_url("http://127.0.0.1:1"));
    let request = ApiRequest::new("/v1/student").empty_default(EmptyDefault::EmptySequence);

    assert_eq!(fetcher.fetch(None, &request).await, json!([]));
    assert!(fetcher.fetch_list(None, &request).await.is_empty());

    match fetcher.fetch_outcome(None, &request).await {
        FetchOutcome::Failure { kind, .. } => assert_eq!(kind, FailureKind::Transport),
        other => panic!("expected transport failure, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_base_sends_nothing() -> Result<()> {
    let fetcher = ServerSideFetcher::new(FetchConfig::default());
    let request = ApiRequest::new("/v1/student");

    assert_eq!(fetcher.fetch(None, &request).await, Value::Null);
    assert!(fetcher.request_url(None, &request).is_err());

    match fetcher.fetch_outcome(None, &request).await {
        FetchOutcome::Failure { kind, .. } => assert_eq!(kind, FailureKind::BaseUrlUnresolved),
        other => panic!("expected unresolved base, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_request_host_header_used_without_fallback() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/subject");
        then.status(200).json_body(json!({"data": [{"name": "Biology"}]}));
    });

    let fetcher = ServerSideFetcher::new(FetchConfig::default());
    let ctx = InboundRequest::new().with_header("Host", server.address().to_string());

    let subjects = fetcher
        .fetch_list(Some(&ctx), &ApiRequest::new("/v1/subject"))
        .await;
    assert_eq!(subjects, vec![json!({"name": "Biology"})]);
    api_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_concurrent_fetches_are_independent() -> Result<()> {
    let server = MockServer::start();
    let teachers_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/teacher");
        then.status(200).json_body(json!({"data": [{"name": "Ms. Ito"}]}));
    });
    let reports_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/report");
        then.status(503);
    });

    let fetcher = fetcher_for(&server);
    let teachers_request = ApiRequest::new("/v1/teacher");
    let reports_request = ApiRequest::new("/v1/report");
    let (teachers, reports) = tokio::join!(
        fetcher.fetch_list(None, &teachers_request),
        fetcher.fetch_list(None, &reports_request),
    );

    assert_eq!(teachers.len(), 1);
    assert!(reports.is_empty());
    teachers_mock.assert();
    reports_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_dashboard_api_over_http() -> Result<()> {
    let server = MockServer::start();
    let list_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/assessment")
            .query_param("page", "1")
            .query_param("limit", "10")
            .header("x-api-key", "s3cret");
        then.status(200).json_body(json!({
            "data": [{"title": "Midterm"}],
            "meta": {"total": 1, "totalPages": 1, "page": 1, "limit": 10}
        }));
    });
    let show_mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/student/s1");
        then.status(200).json_body(json!({"data": {"_id": "s1", "name": "Ana"}}));
    });

    let fetcher = ServerSideFetcher::new(
        FetchConfig::default()
            .with_base_url(server.base_url())
            .with_internal_api_key("s3cret"),
    );
    let api = DashboardApi::new(fetcher).with_resource_options(
        Resource::Assessment,
        ResourceOptions {
            requires_internal_auth: true,
            envelope: EnvelopeMode::Envelope,
        },
    );

    let page = api
        .list(None, Resource::Assessment, &ListQuery::page(1, 10))
        .await;
    assert_eq!(page.items, vec![json!({"title": "Midterm"})]);
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.meta.limit, Some(10));
    list_mock.assert();

    let student = api.get(None, Resource::Student, "s1").await;
    assert_eq!(student, Some(json!({"_id": "s1", "name": "Ana"})));
    show_mock.assert();

    let missing = api.get(None, Resource::Student, "s404").await;
    assert_eq!(missing, None);
    Ok(())
}
