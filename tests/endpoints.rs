//! End-to-end tests against a running server.

use std::time::{Duration, Instant};

use obs_lab::observability::metrics::{
    sample_sum, ERRORS_TOTAL, LOGIN_ERRORS_TOTAL, REQUESTS_TOTAL,
};
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_healthz_always_ok() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "OK" }));
}

#[tokio::test]
async fn test_readiness_toggle_cycle() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/readyz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap()["status"], "READY");

    let res = app.client.post(app.url("/toggle-ready")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap()["status"], "NOT_READY");

    let res = app.client.get(app.url("/readyz")).send().await.unwrap();
    assert_eq!(res.status(), 503);
    assert_eq!(res.json::<Value>().await.unwrap()["status"], "NOT_READY");

    let res = app.client.post(app.url("/toggle-ready")).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["status"], "READY");

    let res = app.client.get(app.url("/readyz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_login() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "admin", "password": "1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "token": "fake-token" }));
    assert_eq!(sample_sum(&app.metrics_text().await, LOGIN_ERRORS_TOTAL), 0.0);

    for body in [
        json!({ "username": "admin", "password": "wrong" }),
        json!({ "username": "root", "password": "1234" }),
        json!({}),
    ] {
        let before = sample_sum(&app.metrics_text().await, LOGIN_ERRORS_TOTAL);
        let res = app
            .client
            .post(app.url("/api/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Invalid credentials" })
        );
        let after = sample_sum(&app.metrics_text().await, LOGIN_ERRORS_TOTAL);
        assert_eq!(after - before, 1.0);
    }
}

#[tokio::test]
async fn test_login_malformed_body_is_bad_request() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/api/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert!(res.json::<Value>().await.unwrap()["error"].is_string());
    assert_eq!(sample_sum(&app.metrics_text().await, LOGIN_ERRORS_TOTAL), 0.0);
}

#[tokio::test]
async fn test_login_without_json_body_is_a_failed_login() {
    let app = common::spawn_app().await;

    let requests = [
        app.client.post(app.url("/api/login")),
        app.client
            .post(app.url("/api/login"))
            .header("content-type", "application/json"),
        app.client
            .post(app.url("/api/login"))
            .header("content-type", "text/plain")
            .body("username=admin&password=1234"),
    ];
    for (i, request) in requests.into_iter().enumerate() {
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Invalid credentials" })
        );
        let failures = sample_sum(&app.metrics_text().await, LOGIN_ERRORS_TOTAL);
        assert_eq!(failures, (i + 1) as f64);
    }
}

#[tokio::test]
async fn test_hello_echoes_correlation_id() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/api/hello")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let header = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Hello World");
    assert_eq!(body["cid"], header.as_str());
    assert!(uuid::Uuid::parse_str(&header).is_ok());
}

#[tokio::test]
async fn test_upstream_correlation_id_is_adopted() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .get(app.url("/api/hello"))
        .header("x-request-id", "upstream-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "upstream-42");
    assert_eq!(res.json::<Value>().await.unwrap()["cid"], "upstream-42");
}

#[tokio::test]
async fn test_blank_correlation_id_is_replaced() {
    let app = common::spawn_app().await;

    let mut seen = Vec::new();
    for _ in 0..2 {
        let res = app
            .client
            .get(app.url("/api/hello"))
            .header("x-request-id", "")
            .send()
            .await
            .unwrap();
        let header = res.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&header).is_ok(), "got {:?}", header);
        assert_eq!(res.json::<Value>().await.unwrap()["cid"], header.as_str());
        seen.push(header);
    }
    assert_ne!(seen[0], seen[1]);
}

#[tokio::test]
async fn test_calc() {
    let app = common::spawn_app().await;

    let cases = [("2", "3", json!(5)), ("1.5", "2.25", json!(3.75)), ("-4", "4", json!(0))];
    for (a, b, expected) in cases {
        let res = app
            .client
            .get(app.url(&format!("/api/calc?a={}&b={}&op=mul", a, b)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.json::<Value>().await.unwrap()["result"], expected);
    }

    for query in ["?a=1", "?b=1", "", "?a=&b=2"] {
        let res = app
            .client
            .get(app.url(&format!("/api/calc{}", query)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "query {:?}", query);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Missing params" })
        );
    }

    let res = app
        .client
        .get(app.url("/api/calc?a=one&b=2"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Invalid params");
}

#[tokio::test]
async fn test_error_endpoint_keeps_server_alive() {
    let app = common::spawn_app().await;

    for _ in 0..3 {
        let res = app.client.get(app.url("/api/error")).send().await.unwrap();
        assert_eq!(res.status(), 500);
        assert_eq!(
            res.json::<Value>().await.unwrap(),
            json!({ "error": "Simulated Backend Failure" })
        );
    }

    let res = app.client.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_slow_endpoint_does_not_block_others() {
    let app = common::spawn_app().await;

    let slow = {
        let client = app.client.clone();
        let url = app.url("/api/slow");
        tokio::spawn(async move {
            let start = Instant::now();
            let res = client.get(url).send().await.unwrap();
            let elapsed = start.elapsed();
            (res.status(), res.json::<Value>().await.unwrap(), elapsed)
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let start = Instant::now();
    let res = app.client.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(start.elapsed() < Duration::from_millis(500));

    let (status, body, elapsed) = slow.await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Slow response after 700ms");
    assert!(elapsed >= Duration::from_millis(700));
}

#[tokio::test]
async fn test_client_logs_acknowledged() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/client-logs"))
        .json(&json!({
            "level": "error",
            "message": "TypeError: x is undefined",
            "stack": "at render (app.js:10:5)",
            "meta": { "page": "/checkout" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Log received");
}

#[tokio::test]
async fn test_client_logs_without_json_body_acknowledged() {
    let app = common::spawn_app().await;

    let res = app.client.post(app.url("/client-logs")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Log received");

    let res = app
        .client
        .post(app.url("/client-logs"))
        .header("content-type", "text/plain")
        .body("something broke")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Log received");
}

#[tokio::test]
async fn test_client_logs_malformed_json_is_bad_request() {
    let app = common::spawn_app().await;

    let res = app
        .client
        .post(app.url("/client-logs"))
        .header("content-type", "application/json")
        .body("{\"level\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert!(res.json::<Value>().await.unwrap()["error"].is_string());
}

#[tokio::test]
async fn test_request_counts_match_completed_requests() {
    let app = common::spawn_app().await;

    let paths = ["/healthz", "/api/hello", "/api/calc?a=1&b=2", "/api/calc", "/api/error", "/nope"];
    for path in paths {
        app.client.get(app.url(path)).send().await.unwrap();
    }

    // The scrape itself completes after rendering, so it is not yet counted.
    let text = app.metrics_text().await;
    let n = paths.len() as f64;
    assert_eq!(sample_sum(&text, REQUESTS_TOTAL), n);
    assert_eq!(sample_sum(&text, "http_request_duration_seconds_count"), n);
    // 400 from calc, 500 from error, 404 from the unmatched path.
    assert_eq!(sample_sum(&text, ERRORS_TOTAL), 3.0);
    assert!(text.contains("route=\"/api/calc\""));
    assert!(text.contains("route=\"/nope\""));
    assert!(text.contains("code=\"404\""));

    let text = app.metrics_text().await;
    assert_eq!(sample_sum(&text, REQUESTS_TOTAL), n + 1.0);
}

#[tokio::test]
async fn test_metrics_exposition_format() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain; version=0.0.4"));

    let text = res.text().await.unwrap();
    assert!(text.contains("# TYPE http_login_errors_total counter"));
    assert!(text.contains("process_start_time_seconds"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = common::spawn_app().await;

    let res = app.client.get(app.url("/healthz")).send().await.unwrap();
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
}
