use anyhow::Result;
use httpmock::prelude::*;
use mealprobe::config::suite_config::RequestConfig;
use mealprobe::core::api::ApiClient;
use mealprobe::core::suite::ProbeContext;

fn get_request(endpoint: &str) -> RequestConfig {
    RequestConfig {
        endpoint: endpoint.to_string(),
        ..Default::default()
    }
}

/// 每個請求都必須帶租戶標頭
#[tokio::test]
async fn test_tenant_header_attached_to_every_request() -> Result<()> {
    let server = MockServer::start();

    let health_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/health")
            .header("x-tenant-id", "kantine-sued");
        then.status(200).json_body(serde_json::json!({"status": "ok"}));
    });

    let client = ApiClient::new(&server.base_url(), "kantine-sued", 5)?;
    let context = ProbeContext::new("test".to_string());

    let response = client.execute(&get_request("/api/health"), &context).await?;

    health_mock.assert();
    assert!(response.is_success());
    assert_eq!(response.body["status"], "ok");
    Ok(())
}

/// 5xx 會重試到次數用完，並把每次嘗試都打到伺服器
#[tokio::test]
async fn test_retries_on_server_error() -> Result<()> {
    let server = MockServer::start();

    let flaky_mock = server.mock(|when, then| {
        when.method(GET).path("/api/products");
        then.status(503).json_body(serde_json::json!({"error": "warming up"}));
    });

    let client = ApiClient::new(&server.base_url(), "demo", 5)?;
    let context = ProbeContext::new("test".to_string());

    let request = RequestConfig {
        endpoint: "/api/products".to_string(),
        retry_attempts: Some(2),
        retry_delay_seconds: Some(1),
        ..Default::default()
    };

    let response = client.execute(&request, &context).await?;

    // 初次呼叫 + 兩次重試
    flaky_mock.assert_hits(3);
    assert!(response.is_server_error());
    Ok(())
}

/// 4xx 是明確結果，不觸發重試
#[tokio::test]
async fn test_no_retry_on_client_error() -> Result<()> {
    let server = MockServer::start();

    let not_found_mock = server.mock(|when, then| {
        when.method(GET).path("/api/products");
        then.status(404).json_body(serde_json::json!({"error": "not found"}));
    });

    let client = ApiClient::new(&server.base_url(), "demo", 5)?;
    let context = ProbeContext::new("test".to_string());

    let request = RequestConfig {
        endpoint: "/api/products".to_string(),
        retry_attempts: Some(3),
        retry_delay_seconds: Some(1),
        ..Default::default()
    };

    let response = client.execute(&request, &context).await?;

    not_found_mock.assert_hits(1);
    assert_eq!(response.status.as_u16(), 404);
    Ok(())
}

/// 標頭模板的佔位符從上下文解析；缺 key 是硬錯誤
#[tokio::test]
async fn test_header_template_resolution() -> Result<()> {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/orders")
            .header("authorization", "Bearer tok_abc");
        then.status(200).json_body(serde_json::json!({"items": []}));
    });

    let client = ApiClient::new(&server.base_url(), "demo", 5)?;

    let mut request = get_request("/api/orders");
    request.headers = Some(
        [("Authorization".to_string(), "Bearer {token}".to_string())]
            .into_iter()
            .collect(),
    );

    // 沒有 token：模板解析失敗
    let empty_context = ProbeContext::new("test".to_string());
    let err = client.execute(&request, &empty_context).await.unwrap_err();
    assert!(err.to_string().contains("Unresolved placeholder"));

    // 有 token：正常送出
    let mut context = ProbeContext::new("test".to_string());
    context.add_shared_data("token".to_string(), serde_json::json!("tok_abc"));
    let response = client.execute(&request, &context).await?;

    mock.assert();
    assert!(response.is_success());
    Ok(())
}

/// requires_auth 但上下文沒有 token：回傳授權錯誤而不是送出請求
#[tokio::test]
async fn test_requires_auth_without_token_fails() -> Result<()> {
    let server = MockServer::start();

    let client = ApiClient::new(&server.base_url(), "demo", 5)?;
    let context = ProbeContext::new("test".to_string());

    let request = RequestConfig {
        endpoint: "/api/inventory".to_string(),
        requires_auth: Some(true),
        ..Default::default()
    };

    let err = client.execute(&request, &context).await.unwrap_err();
    assert!(err.to_string().contains("requires auth"));
    Ok(())
}

/// 非 JSON body 保留為字串，空 body 變成 null
#[tokio::test]
async fn test_lenient_body_parsing() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/textual");
        then.status(500).body("Internal Server Error");
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/empty");
        then.status(204);
    });

    let client = ApiClient::new(&server.base_url(), "demo", 5)?;
    let context = ProbeContext::new("test".to_string());

    let text_response = client.execute(&get_request("/api/textual"), &context).await?;
    assert_eq!(
        text_response.body,
        serde_json::json!("Internal Server Error")
    );

    let empty_response = client.execute(&get_request("/api/empty"), &context).await?;
    assert!(empty_response.body.is_null());
    Ok(())
}
