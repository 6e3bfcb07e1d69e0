// # Reqwest Transport
//
// Executes dispatched requests over a shared `reqwest::Client`.
//
// ## Error mapping
//
// reqwest failures collapse into the transport error classes the dispatcher
// keys its retry decision on:
// - timeout → `TransportError::Timeout`
// - connect/DNS failure → `TransportError::Connect`
// - everything else → `TransportError::Other`
//
// HTTP error statuses are NOT transport errors; the response is returned
// as-is and classified by the dispatcher.

use async_trait::async_trait;

use carelink_core::traits::{
    HttpTransport, Method, TransportError, TransportRequest, TransportResponse,
};

/// `HttpTransport` backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client
    ///
    /// Timeouts are per-request, carried on each [`TransportRequest`].
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder().build().unwrap_or_default(),
        }
    }

    /// Create a transport over an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?.to_vec();

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use httpmock::MockServer;
    use httpmock::prelude::*;

    fn request(method: Method, url: String) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn successful_response_carries_status_and_body() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/hospitals/");
            then.status(200).body(r#"{"items": []}"#);
        });

        let transport = ReqwestTransport::new();
        let response = transport
            .execute(request(
                Method::Get,
                format!("{}/api/hospitals/", server.base_url()),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), r#"{"items": []}"#);
    }

    #[tokio::test]
    async fn http_error_statuses_are_responses_not_transport_errors() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/hospitals/");
            then.status(503).body("upstream down");
        });

        let transport = ReqwestTransport::new();
        let response = transport
            .execute(request(
                Method::Get,
                format!("{}/api/hospitals/", server.base_url()),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn headers_and_body_are_forwarded() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/bookings/")
                .header("Authorization", "Bearer token-123")
                .json_body(serde_json::json!({"hospital_id": 7}));
            then.status(201).body("{}");
        });

        let transport = ReqwestTransport::new();
        let mut req = request(Method::Post, format!("{}/api/bookings/", server.base_url()));
        req.headers
            .push(("Authorization".to_string(), "Bearer token-123".to_string()));
        req.body = Some(serde_json::json!({"hospital_id": 7}));

        let response = transport.execute(req).await.unwrap();
        assert_eq!(response.status, 201);
        mock.assert();
    }

    #[tokio::test]
    async fn refused_connection_maps_to_connect() {
        let transport = ReqwestTransport::new();
        // Port 1 is never listening.
        let err = transport
            .execute(request(
                Method::Get,
                "http://127.0.0.1:1/api/hospitals/".to_string(),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Connect(_)));
        assert!(err.is_network_class());
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/slow/");
            then.status(200).delay(Duration::from_millis(500)).body("{}");
        });

        let transport = ReqwestTransport::new();
        let mut req = request(Method::Get, format!("{}/api/slow/", server.base_url()));
        req.timeout = Duration::from_millis(50);

        let err = transport.execute(req).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert!(err.is_network_class());
    }
}
