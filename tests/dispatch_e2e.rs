//! End-to-end dispatch: user request → command → data API → response.

#![cfg(unix)]

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::json;

mod common;

use common::{route, start_server, test_config, wait_for_file};

#[tokio::test]
async fn test_exit_status_decides_outcome() {
    let mut config = test_config();
    config.routes.push(route("GET", "/ok", "true"));
    config.routes.push(route("GET", "/fail", "exit 3"));
    config
        .routes
        .push(route("GET", "/env", r#"test -n "$CMDROUTER_HANDLER_ID" && test -n "$CMDROUTER_DATA_URL""#));
    let server = start_server(config).await;

    let res = server.client.get(server.user_url("/ok")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "");

    let res = server.client.get(server.user_url("/env")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.user_url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = server.client.get(server.user_url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Method is part of the match
    let res = server.client.post(server.user_url("/ok")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_route_edits_apply_to_next_request() {
    let server = start_server(test_config()).await;

    let res = server.client.get(server.user_url("/late")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .post(server.control_url("/routes"))
        .json(&json!({ "method": "GET", "url_pattern": "/late", "command": "true" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = server.client.get(server.user_url("/late")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server
        .client
        .delete(server.control_url(&format!("/routes/{}", id)))
        .send()
        .await
        .unwrap();

    let res = server.client.get(server.user_url("/late")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_command_builds_response_through_data_api() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path().display().to_string();
    let command = format!(
        r#"echo "$CMDROUTER_HANDLER_ID" > {dir}/id.tmp && mv {dir}/id.tmp {dir}/id
        while [ ! -f {dir}/done ]; do sleep 0.05; done"#,
        dir = dir
    );

    let mut config = test_config();
    config.routes.push(route("POST", "/greet/{name}", &command));
    let server = start_server(config).await;

    let client = server.client.clone();
    let url = server.user_url("/greet/ana?lang=pt");
    let pending = tokio::spawn(async move {
        client
            .post(url)
            .header("Cookie", "session=abc")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("greeting=ola")
            .send()
            .await
    });

    let id = wait_for_file(&scratch.path().join("id")).await;
    let resource = |path: &str| server.data_url(&format!("/handlers/{}/{}", id, path));

    for (path, expected) in [
        ("request/method", "POST"),
        ("request/path", "/greet/ana"),
        ("request/params/name", "ana"),
        ("request/query/lang", "pt"),
        ("request/cookies/session", "abc"),
        ("request/form/greeting", "ola"),
        ("request/body", "greeting=ola"),
        ("response/status", "200"),
    ] {
        let res = server.client.get(resource(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{}", path);
        assert_eq!(res.text().await.unwrap(), expected, "{}", path);
    }

    // Same resources through the control listener
    let res = server
        .client
        .get(server.control_url(&format!("/handlers/{}/request/params/name", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ana");

    let res = server.client.get(resource("request/params/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Resource Item Not Found");

    let res = server.client.get(resource("request/bogus")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(resource("response/status"))
        .body("abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    for (path, value) in [
        ("response/status", "201\n"),
        ("response/headers/X-Greeting", "hello"),
        ("response/body", "ola "),
        ("response/body", "ana"),
    ] {
        let res = server.client.put(resource(path)).body(value).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{}", path);
    }

    std::fs::write(scratch.path().join("done"), "").unwrap();

    let res = pending.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers()["x-greeting"], "hello");
    assert_eq!(res.text().await.unwrap(), "ola ana");

    // The handler is gone once its command exits
    let res = server.client.get(resource("request/method")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Handler ID Not Found");

    server.stop().await;
}

#[tokio::test]
async fn test_timeout_kills_command() {
    let mut config = test_config();
    config.execution.timeout_secs = 1;
    config.routes.push(route("GET", "/slow", "sleep 30"));
    let server = start_server(config).await;

    let start = Instant::now();
    let res = server.client.get(server.user_url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(start.elapsed() < Duration::from_secs(10));

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = test_config();
    config.execution.max_body_size = 16;
    config.routes.push(route("POST", "/upload", "true"));
    let server = start_server(config).await;

    let res = server
        .client
        .post(server.user_url("/upload"))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    server.stop().await;
}
