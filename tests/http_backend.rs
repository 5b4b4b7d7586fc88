//! `HttpBackend` against a minimal local HTTP responder.
//!
//! The responder accepts one connection per canned reply, records the raw
//! request, and answers with `Connection: close`.

use doc2chart::pipeline::extract::interpret_reply;
use doc2chart::{
    ClientConfig, DiagramBackend, DocumentUpload, HttpBackend, RenderOutcome, Session,
    TransportError,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().unwrap())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    buf
}

/// Serve `replies` in order, one connection each. Resolves to the raw
/// requests received.
async fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            requests.push(String::from_utf8_lossy(&request).into_owned());
            let response = format!(
                "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
        requests
    });

    (base_url, handle)
}

fn config(base_url: &str) -> ClientConfig {
    ClientConfig::builder()
        .base_url(base_url)
        .request_timeout_secs(10)
        .build()
        .unwrap()
}

// ── Requests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_is_posted_as_json() {
    let (url, server) = serve(vec![(200, r#"{"mermaid_code":"graph TD; A-->B;"}"#)]).await;
    let cfg = config(&url);
    let backend = HttpBackend::new(&cfg).unwrap();

    let reply = backend.process_text("A meets B").await.unwrap();
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, json!({ "mermaid_code": "graph TD; A-->B;" }));
    assert_eq!(interpret_reply(&reply, &cfg).unwrap(), "graph TD; A-->B;");

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /api/process-text HTTP/1.1\r\n"), "got: {request}");
    assert!(request.to_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"text":"A meets B"}"#), "got: {request}");
}

#[tokio::test]
async fn document_is_posted_as_multipart_file() {
    let (url, server) = serve(vec![(200, r#"{"raw_mermaid":"graph LR; P-->Q"}"#)]).await;
    let backend = HttpBackend::new(&config(&url)).unwrap();
    let doc = DocumentUpload::new("report.pdf", b"%PDF-1.4 tiny".to_vec());

    let reply = backend.process_document(&doc).await.unwrap();
    assert!(reply.is_success());

    let request = server.await.unwrap().remove(0);
    let lower = request.to_lowercase();
    assert!(request.starts_with("POST /api/process-pdf HTTP/1.1\r\n"));
    assert!(lower.contains("content-type: multipart/form-data; boundary="));
    assert!(request.contains("name=\"file\""));
    assert!(request.contains("filename=\"report.pdf\""));
    assert!(lower.contains("content-type: application/pdf"));
    assert!(request.contains("%PDF-1.4 tiny"));
}

#[tokio::test]
async fn error_status_is_reported_not_raised() {
    let (url, _server) = serve(vec![(500, r#"{"error":"summarization failed"}"#)]).await;
    let cfg = config(&url);
    let backend = HttpBackend::new(&cfg).unwrap();

    let reply = backend.process_text("x").await.unwrap();
    assert_eq!(reply.status, 500);
    let err = interpret_reply(&reply, &cfg).unwrap_err();
    assert_eq!(err.user_message(), "summarization failed");
}

#[tokio::test]
async fn non_json_body_is_invalid() {
    let (url, _server) = serve(vec![(200, "<html>proxy error</html>")]).await;
    let backend = HttpBackend::new(&config(&url)).unwrap();

    let err = backend.process_text("x").await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidBody { .. }), "got: {err:?}");
    assert!(err.user_message().starts_with("Error: invalid response body"));
}

#[tokio::test]
async fn health_returns_body() {
    let (url, server) = serve(vec![(200, r#"{"status":"ok"}"#)]).await;
    let backend = HttpBackend::new(&config(&url)).unwrap();

    let body = backend.health().await.unwrap();
    assert_eq!(body, r#"{"status":"ok"}"#);
    let request = server.await.unwrap().remove(0);
    assert!(request.starts_with("GET /health HTTP/1.1\r\n"));
}

#[tokio::test]
async fn unhealthy_status_is_an_error() {
    let (url, _server) = serve(vec![(503, r#"{"status":"down"}"#)]).await;
    let backend = HttpBackend::new(&config(&url)).unwrap();

    let err = backend.health().await.unwrap_err();
    assert!(err.to_string().contains("503"), "got: {err}");
}

// ── Full session ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_over_http_renders_artifact() {
    let (url, _server) = serve(vec![(200, r#"{"mermaid_code":"graph TD; A-->B; B-->C;"}"#)]).await;
    let session = Session::connect(config(&url)).unwrap();

    assert!(session.submit_text("A meets B, B meets C").await.is_completed());
    match session.settled().await {
        RenderOutcome::Artifact { id, svg } => {
            assert!(svg.starts_with(&format!("<svg id=\"{id}\"")));
        }
        other => panic!("expected artifact, got {other:?}"),
    }
}
