mod common;

use axum::http::StatusCode;
use common::{TestApp, body_json};
use serde_json::json;

#[tokio::test]
async fn incident_lifecycle() {
    let app = TestApp::spawn("crud-incidents").await;
    let cookie = app.login_as("alice").await;

    let resp = app.send("GET", "/incidents", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .send(
            "POST",
            "/incidents",
            Some(&cookie),
            Some(json!({"incident_type": "Phishing", "severity": "critical", "description": "  "})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send(
            "POST",
            "/incidents",
            Some(&cookie),
            Some(json!({
                "incident_type": "Phishing",
                "severity": "critical",
                "description": "Credential harvesting email"
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    assert_eq!(created["status"], "Open");
    let id = created["id"].as_i64().expect("id");

    let resp = app
        .send(
            "PATCH",
            &format!("/incidents/{id}"),
            Some(&cookie),
            Some(json!({"status": "Resolved"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "Resolved");

    let resp = app
        .send("PATCH", &format!("/incidents/{id}"), Some(&cookie), Some(json!({})))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "NO_FIELDS");

    let resp = app.send("GET", "/incidents", Some(&cookie), None).await;
    let listing = body_json(resp).await;
    assert_eq!(listing["summary"]["total"], 1);
    assert_eq!(listing["summary"]["critical"], 1);
    assert_eq!(listing["summary"]["resolved"], 1);

    let resp = app.send("GET", "/incidents/analysis", Some(&cookie), None).await;
    let analysis = body_json(resp).await;
    assert_eq!(analysis["by_type"][0]["label"], "Phishing");

    let resp = app
        .send("DELETE", &format!("/incidents/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app
        .send("GET", &format!("/incidents/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ticket_filters_and_mutators() {
    let app = TestApp::spawn("crud-tickets").await;
    let cookie = app.login_as("bob").await;

    for (title, priority) in [("VPN down", "high"), ("New laptop", "low"), ("DB outage", "critical")] {
        let resp = app
            .send(
                "POST",
                "/tickets",
                Some(&cookie),
                Some(json!({"title": title, "priority": priority})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.send("POST", "/tickets/2/close", Some(&cookie), None).await;
    assert_eq!(body_json(resp).await["status"], "Closed");

    let resp = app
        .send(
            "POST",
            "/tickets/1/assign",
            Some(&cookie),
            Some(json!({"assigned_to": "Network Team"})),
        )
        .await;
    assert_eq!(body_json(resp).await["assigned_to"], "Network Team");

    let resp = app.send("POST", "/tickets/1/reopen", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send("GET", "/tickets?status=Open&priority=high,critical", Some(&cookie), None)
        .await;
    let listing = body_json(resp).await;
    assert_eq!(listing["summary"]["total"], 2);
    assert_eq!(listing["tickets"][0]["title"], "DB outage");

    let resp = app
        .send("GET", "/tickets?status=Pending", Some(&cookie), None)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.send("POST", "/tickets/2/reopen", Some(&cookie), None).await;
    assert_eq!(body_json(resp).await["status"], "Open");

    let resp = app
        .send(
            "POST",
            "/tickets/3/updates",
            Some(&cookie),
            Some(json!({"comment": "failover in progress"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["author"], "bob");

    let resp = app.send("GET", "/tickets/3/updates", Some(&cookie), None).await;
    assert_eq!(body_json(resp).await.as_array().map(Vec::len), Some(1));

    let resp = app.send("GET", "/tickets/analysis", Some(&cookie), None).await;
    let analysis = body_json(resp).await;
    assert_eq!(analysis["by_status"][0]["label"], "Open");
    assert_eq!(analysis["by_status"][0]["count"], 3);

    let resp = app.send("DELETE", "/tickets/99", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dataset_registration_and_summary() {
    let app = TestApp::spawn("crud-datasets").await;
    let cookie = app.login_as("alice").await;

    let resp = app
        .send(
            "POST",
            "/datasets",
            Some(&cookie),
            Some(json!({"name": "tiny", "source": "CSV Files", "size_mb": 0.01, "rows": 5})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for (name, size_mb, rows) in [("Customer Data", 5120.0, 1_000_000), ("Audit Trails", 1024.0, 250_000)] {
        let resp = app
            .send(
                "POST",
                "/datasets",
                Some(&cookie),
                Some(json!({"name": name, "source": "MySQL Database", "size_mb": size_mb, "rows": rows})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.send("GET", "/datasets", Some(&cookie), None).await;
    let listing = body_json(resp).await;
    assert_eq!(listing["summary"]["total"], 2);
    assert_eq!(listing["summary"]["total_rows"], 1_250_000);
    assert_eq!(listing["summary"]["avg_rows"], 625_000);
    assert_eq!(listing["summary"]["total_mb"], 6144.0);

    let resp = app
        .send("PATCH", "/datasets/2", Some(&cookie), Some(json!({"rows": 0})))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .send("PATCH", "/datasets/2", Some(&cookie), Some(json!({"source": "Data Lake"})))
        .await;
    assert_eq!(body_json(resp).await["source"], "Data Lake");

    let resp = app.send("GET", "/datasets/analysis", Some(&cookie), None).await;
    assert_eq!(body_json(resp).await["by_source"].as_array().map(Vec::len), Some(2));

    let resp = app.send("DELETE", "/datasets/1", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage.platform_counts().await.unwrap().datasets, 1);
}

#[tokio::test]
async fn dataset_bounds_keep_summary_healthy() {
    let app = TestApp::spawn("crud-dataset-bounds").await;
    let cookie = app.login_as("alice").await;

    for body in [
        json!({"name": "big", "source": "Data Lake", "size_mb": 8.0e12, "rows": 10}),
        json!({"name": "big", "source": "Data Lake", "size_mb": 1.0, "rows": i64::MAX}),
    ] {
        let resp = app.send("POST", "/datasets", Some(&cookie), Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let resp = app
        .send(
            "POST",
            "/datasets",
            Some(&cookie),
            Some(json!({"name": "logs", "source": "Kafka Stream", "size_mb": 1.0, "rows": 10})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for patch in [json!({"name": "  "}), json!({"source": ""}), json!({"rows": i64::MAX})] {
        let resp = app.send("PATCH", "/datasets/1", Some(&cookie), Some(patch)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["code"], "VALIDATION_ERROR");
    }

    let resp = app.send("GET", "/datasets", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let listing = body_json(resp).await;
    assert_eq!(listing["summary"]["total"], 1);
    assert_eq!(listing["datasets"][0]["name"], "logs");

    let resp = app
        .send("POST", "/assistant/data_science", Some(&cookie), Some(json!({"message": "sizes?"})))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_input_uses_error_envelope() {
    let app = TestApp::spawn("crud-malformed").await;
    let cookie = app.login_as("alice").await;

    let resp = app
        .send(
            "POST",
            "/incidents",
            Some(&cookie),
            Some(json!({"incident_type": "Malware", "severity": "High", "description": "Trojan on HR laptop"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["severity"], "high");

    let resp = app
        .send(
            "POST",
            "/incidents",
            Some(&cookie),
            Some(json!({"incident_type": "Malware", "severity": "urgent", "description": "x"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_REQUEST");

    let resp = app.send("GET", "/incidents/abc", Some(&cookie), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "INVALID_REQUEST");

    let resp = app
        .send(
            "POST",
            "/tickets",
            Some(&cookie),
            Some(json!({"title": "VPN down", "priority": "CRITICAL"})),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["priority"], "critical");

    let resp = app
        .send("GET", "/tickets?priority=Critical", Some(&cookie), None)
        .await;
    assert_eq!(body_json(resp).await["summary"]["total"], 1);
}
