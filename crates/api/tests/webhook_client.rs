//! Webhook client tests against a wiremock server.
//!
//! These cover the four router endpoints, header handling, and the error
//! message priority (`detail`, then `message`, then the generic fallback).

use hookflow_api::{AuthenticatedBackend, WebhookApiError, WebhookClient, WorkflowBackend};
use hookflow_types::{BearerToken, FileAttachment, SubmissionMode, SubmitRequest};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for_server(server: &MockServer) -> WebhookClient {
    WebhookClient::new(&format!("{}/api/v1", server.uri())).expect("client creation should succeed")
}

fn token() -> BearerToken {
    BearerToken::new("sk-test")
}

fn form_data(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs.iter().map(|(key, value)| (key.to_string(), Value::String(value.to_string()))).collect()
}

#[tokio::test]
async fn config_is_fetched_with_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/config/billing"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "enabled": true,
            "workflow_only": true,
            "slash_command": "/report",
            "form_fields": [
                { "name": "month", "label": "Month", "type": "select", "required": true, "options": ["Jan", "Feb"] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = client_for_server(&server).get_webhook_config(&token(), "billing").await.unwrap();
    assert!(config.enabled);
    assert!(config.workflow_only);
    assert_eq!(config.form_fields[0].options, ["Jan", "Feb"]);
}

#[tokio::test]
async fn disabled_config_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/config/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "enabled": false })))
        .mount(&server)
        .await;

    let config = client_for_server(&server).get_webhook_config(&token(), "plain").await.unwrap();
    assert!(!config.enabled);
}

#[tokio::test]
async fn config_failure_carries_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/config/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Model not found" })))
        .mount(&server)
        .await;

    let error = client_for_server(&server).get_webhook_config(&token(), "missing").await.unwrap_err();
    assert_eq!(
        error,
        WebhookApiError::ConfigFetch {
            status: Some(404),
            message: "Model not found".into()
        }
    );
}

#[tokio::test]
async fn config_failure_without_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/config/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let error = client_for_server(&server).get_webhook_config(&token(), "broken").await.unwrap_err();
    assert_eq!(error.to_string(), "Failed to fetch webhook config");
    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn json_invoke_sends_model_form_and_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "model_id": "billing",
            "form_data": { "month": "Feb", "amount": "12" },
            "chat_id": "chat-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Report ready",
            "data": [{ "a": 1 }],
            "file_url": "/files/report.pdf",
            "file_name": "report.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for_server(&server)
        .invoke_webhook(&token(), "billing", form_data(&[("month", "Feb"), ("amount", "12")]), Some("chat-1"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.message.as_deref(), Some("Report ready"));
    assert_eq!(response.file_name.as_deref(), Some("report.pdf"));
}

#[tokio::test]
async fn json_invoke_sends_null_chat_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .and(body_json(json!({ "model_id": "m", "form_data": {}, "chat_id": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for_server(&server).invoke_webhook(&token(), "m", Map::new(), None).await.unwrap();
    assert!(response.success);
    assert!(!response.has_content());
}

#[tokio::test]
async fn invoke_error_prefers_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "bad input" })))
        .mount(&server)
        .await;

    let error = client_for_server(&server)
        .invoke_webhook(&token(), "m", form_data(&[("x", "1")]), None)
        .await
        .unwrap_err();
    assert_eq!(
        error,
        WebhookApiError::Invocation {
            status: Some(400),
            message: "bad input".into()
        }
    );
}

#[tokio::test]
async fn gateway_failure_uses_proxy_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({
            "success": false,
            "message": "Webhook returned error: 500",
            "data": null
        })))
        .mount(&server)
        .await;

    let error = client_for_server(&server).invoke_webhook(&token(), "m", Map::new(), None).await.unwrap_err();
    assert_eq!(error.to_string(), "Webhook returned error: 500");
}

#[tokio::test]
async fn invoke_error_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let error = client_for_server(&server).invoke_webhook(&token(), "m", Map::new(), None).await.unwrap_err();
    assert_eq!(error.to_string(), "Failed to invoke webhook");
}

#[tokio::test]
async fn multipart_invoke_sends_parts_and_files() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke-with-files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "OCR done" })))
        .expect(1)
        .mount(&server)
        .await;

    let files = vec![
        FileAttachment::new("scan.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
        FileAttachment::new("photo.png", "image/png", vec![0x89, 0x50]),
    ];
    let response = client_for_server(&server)
        .invoke_webhook_with_files(&token(), "ocr", form_data(&[("lang", "en")]), files, Some("chat-9"))
        .await
        .unwrap();
    assert_eq!(response.message.as_deref(), Some("OCR done"));

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains("name=\"model_id\"\r\n\r\nocr"));
    assert!(body.contains("name=\"form_data_json\"\r\n\r\n{\"lang\":\"en\"}"));
    assert!(body.contains("name=\"chat_id\"\r\n\r\nchat-9"));
    assert_eq!(body.matches("name=\"files\"").count(), 2);
    assert!(body.contains("filename=\"scan.pdf\""));
    assert!(body.contains("Content-Type: application/pdf"));
    assert!(body.contains("%PDF-1.7"));
}

#[tokio::test]
async fn malformed_attachment_content_type_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;

    let files = vec![FileAttachment::new("scan.pdf", "not a mime type", b"%PDF".to_vec())];
    let error = client_for_server(&server)
        .invoke_webhook_with_files(&token(), "ocr", Map::new(), files, None)
        .await
        .unwrap_err();
    assert!(matches!(error, WebhookApiError::Invocation { status: None, .. }));
    assert!(error.to_string().contains("scan.pdf"));
}

#[tokio::test]
async fn multipart_invoke_without_files_omits_chat_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke-with-files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    client_for_server(&server)
        .invoke_webhook_with_files(&token(), "ocr", Map::new(), Vec::new(), None)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"form_data_json\"\r\n\r\n{}"));
    assert!(!body.contains("name=\"chat_id\""));
    assert!(!body.contains("name=\"files\""));
}

#[tokio::test]
async fn models_are_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "billing", "name": "Billing", "slash_command": "/report", "form_title": "Report" },
            { "id": "ocr", "name": "OCR" }
        ])))
        .mount(&server)
        .await;

    let models = client_for_server(&server).get_webhook_enabled_models(&token()).await;
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].slash_command.as_deref(), Some("/report"));
    assert_eq!(models[1].slash_command, None);
}

#[tokio::test]
async fn model_listing_failure_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/webhooks/models"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .mount(&server)
        .await;

    let models = client_for_server(&server).get_webhook_enabled_models(&token()).await;
    assert!(models.is_empty());
}

#[tokio::test]
async fn model_listing_with_unreachable_server_yields_empty_list() {
    let server = MockServer::start().await;
    let client = client_for_server(&server);
    drop(server);

    assert!(client.get_webhook_enabled_models(&token()).await.is_empty());
}

#[tokio::test]
async fn relative_file_urls_download_with_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client_for_server(&server).download_file(&token(), "/files/report.pdf").await.unwrap();
    assert_eq!(bytes, b"%PDF");
}

#[tokio::test]
async fn token_is_not_sent_to_another_port_on_the_same_host() {
    let api = MockServer::start().await;
    let files = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exports/report.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b".to_vec()))
        .expect(1)
        .mount(&files)
        .await;

    let url = format!("{}/exports/report.csv", files.uri());
    let bytes = client_for_server(&api).download_file(&token(), &url).await.unwrap();
    assert_eq!(bytes, b"a,b");

    let requests = files.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn download_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/gone.pdf"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "File not found" })))
        .mount(&server)
        .await;

    let error = client_for_server(&server).download_file(&token(), "/files/gone.pdf").await.unwrap_err();
    assert!(matches!(error, WebhookApiError::Download { status: Some(404), .. }));
    assert_eq!(error.to_string(), "File not found");
}

#[tokio::test]
async fn backend_submit_picks_transport_from_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke-with-files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "multipart" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/webhooks/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true, "message": "json" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = AuthenticatedBackend::new(client_for_server(&server), token());
    let mut request = SubmitRequest {
        session: 1,
        model_id: "m".into(),
        title: "M".into(),
        mode: SubmissionMode::Multipart,
        form_data: Map::new(),
        files: Vec::new(),
        chat_id: None,
    };
    let response = backend.submit(request.clone()).await.unwrap();
    assert_eq!(response.message.as_deref(), Some("multipart"));

    request.mode = SubmissionMode::Json;
    let response = backend.submit(request).await.unwrap();
    assert_eq!(response.message.as_deref(), Some("json"));
}

#[test]
fn remote_plain_http_requires_opt_in() {
    let error = WebhookClient::new("http://chat.example.com/api/v1").unwrap_err();
    assert!(matches!(error, WebhookApiError::InvalidBaseUrl { .. }));

    let options = hookflow_api::ClientOptions { allow_insecure: true };
    assert!(WebhookClient::with_options("http://chat.example.com/api/v1", options).is_ok());
}
