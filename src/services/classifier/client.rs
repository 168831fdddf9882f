use crate::config::ClientConfig;
use crate::error::{AppError, ClassifyError};
use crate::models::classify_types::{ClassifyRequest, PredictionResult};
use crate::models::prediction_wire::HealthResponse;
use crate::services::classifier::normalize;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

/// HTTP boundary to the inference service.
///
/// Implementations never retry and never impose their own timeout.
#[allow(async_fn_in_trait)]
pub trait PredictionClient {
    async fn classify(&self, request: ClassifyRequest) -> Result<Vec<PredictionResult>, ClassifyError>;

    /// Status string reported by the service's health route.
    async fn health(&self) -> Result<String, ClassifyError>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpPredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pest-classifier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn file_part(request: &ClassifyRequest) -> Part {
        let part = || Part::bytes(request.raw_bytes.to_vec()).file_name(request.file_name.clone());
        part().mime_str(&request.media_type).unwrap_or_else(|e| {
            warn!(media_type = %request.media_type, "sending file part without content type: {}", e);
            part()
        })
    }
}

impl PredictionClient for HttpPredictionClient {
    async fn classify(&self, request: ClassifyRequest) -> Result<Vec<PredictionResult>, ClassifyError> {
        let url = self.config.predict_url();
        let form = Form::new().part("file", Self::file_part(&request));

        debug!(image = %request.image_id, %url, bytes = request.raw_bytes.len(), "posting image");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::network(e.to_string()))?;

        let status = response.status();
        debug!(image = %request.image_id, status = status.as_u16(), "inference service answered");

        if !status.is_success() {
            let body = error_body(response).await;
            return Err(ClassifyError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClassifyError::network(e.to_string()))?;

        normalize::normalize_body(&body)
    }

    async fn health(&self) -> Result<String, ClassifyError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| ClassifyError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(ClassifyError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClassifyError::network(e.to_string()))?;
        let health: HealthResponse = serde_json::from_slice(&body)
            .map_err(|e| ClassifyError::parse(format!("invalid health response: {}", e)))?;
        Ok(health.status)
    }
}

/// Body of a non-2xx response, kept for diagnostics only.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status().as_u16();
    response.text().await.unwrap_or_else(|e| {
        debug!(status, "could not read error body: {}", e);
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classify_types::ImageId;
    use std::sync::Arc;
    use std::thread::JoinHandle;
    use std::time::Duration;

    struct Captured {
        method: String,
        url: String,
        content_type: String,
        body: Vec<u8>,
        extra_requests: usize,
    }

    /// Answers the first request with `status`/`body`, then counts any further
    /// requests that arrive within a short grace period.
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Captured>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let handle = std::thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut received = Vec::new();
            request.as_reader().read_to_end(&mut received).unwrap();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            let method = request.method().to_string();
            let url = request.url().to_string();

            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
            request
                .respond(
                    tiny_http::Response::from_string(body)
                        .with_status_code(status)
                        .with_header(header),
                )
                .unwrap();

            let mut extra_requests = 0;
            while let Ok(Some(extra)) = server.recv_timeout(Duration::from_millis(200)) {
                extra_requests += 1;
                let _ = extra.respond(tiny_http::Response::empty(500));
            }

            Captured {
                method,
                url,
                content_type,
                body: received,
                extra_requests,
            }
        });

        (format!("http://{}", addr), handle)
    }

    fn request(bytes: &[u8]) -> ClassifyRequest {
        ClassifyRequest {
            image_id: ImageId(1),
            file_name: "leaf.png".to_string(),
            media_type: "image/png".to_string(),
            raw_bytes: Arc::from(bytes),
        }
    }

    fn client(endpoint: &str) -> HttpPredictionClient {
        HttpPredictionClient::new(ClientConfig::new(endpoint)).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[tokio::test]
    async fn posts_raw_bytes_as_single_file_part() {
        let (endpoint, server) = serve_once(
            200,
            r#"{"predictions":[{"className":"Aphid","probability":0.9},{"className":"Rust","probability":0.3}]}"#,
        );
        let raw = b"\x89PNG\r\n\x1a\nnot-really-a-png";

        let results = client(&format!("{}/", endpoint))
            .classify(request(raw))
            .await
            .unwrap();

        let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Aphid", "Rust"]);

        let captured = server.join().unwrap();
        assert_eq!(captured.method, "POST");
        assert_eq!(captured.url, "/predict");
        assert!(captured.content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&captured.body);
        assert_eq!(body.matches("Content-Disposition").count(), 1);
        assert!(body.contains(r#"name="file""#));
        assert!(body.contains(r#"filename="leaf.png""#));
        assert!(body.contains("image/png"));
        assert!(contains(&captured.body, raw));
        assert!(!body.contains("base64"));
    }

    #[tokio::test]
    async fn single_prediction_backend_is_normalized() {
        let (endpoint, server) = serve_once(200, r#"{"prediction":"Jute Aphid","confidence":0.87}"#);

        let results = client(&endpoint).classify(request(b"img")).await.unwrap();

        assert_eq!(
            results,
            vec![PredictionResult {
                label: "Jute Aphid".to_string(),
                confidence: 0.87
            }]
        );
        server.join().unwrap();
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body_and_is_not_retried() {
        let (endpoint, server) = serve_once(500, "internal error");

        let err = client(&endpoint).classify(request(b"img")).await.unwrap_err();

        assert_eq!(
            err,
            ClassifyError::ServerError {
                status: 500,
                body: "internal error".to_string()
            }
        );
        assert_eq!(server.join().unwrap().extra_requests, 0);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parse_failure() {
        let (endpoint, server) = serve_once(200, r#"{"prediction":"Cutworm","confidence":3.5}"#);

        let err = client(&endpoint).classify(request(b"img")).await.unwrap_err();

        assert_eq!(err.kind(), "parse_failure");
        server.join().unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .classify(request(b"img"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "network_failure");
    }

    #[tokio::test]
    async fn truncated_error_body_still_reports_server_error() {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            // Promises more body than it sends, then hangs up.
            let mut stream = stream;
            stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 64\r\n\r\npartial")
                .unwrap();
        });

        let err = client(&format!("http://{}", addr)).health().await.unwrap_err();

        assert_eq!(
            err,
            ClassifyError::ServerError {
                status: 503,
                body: String::new()
            }
        );
        server.join().unwrap();
    }

    #[tokio::test]
    async fn health_reports_service_status() {
        let (endpoint, server) = serve_once(200, r#"{"status":"running"}"#);

        let status = client(&endpoint).health().await.unwrap();

        assert_eq!(status, "running");
        let captured = server.join().unwrap();
        assert_eq!(captured.method, "GET");
        assert_eq!(captured.url, "/health");
    }
}
