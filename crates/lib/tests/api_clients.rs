//! Integration tests: point the HTTP clients at a local stub server via
//! their API-base overrides and assert the requests they put on the wire.
//! Does not require Telegram or Notion.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Accept connections and answer every request with the given JSON body.
/// Captures each raw request (head + body) for assertions.
async fn spawn_stub(response_body: &'static str) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    let requests: Arc<Mutex<Vec<String>>> = Arc::default();
    let captured = requests.clone();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let captured = captured.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut stream).await {
                    captured.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        response_body.len(),
                        response_body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });
        }
    });
    StubServer {
        base_url: format!("http://127.0.0.1:{}", addr.port()),
        requests,
    }
}

/// Read one HTTP/1.1 request: headers, then content-length bytes of body.
async fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(i) = find(&buf, b"\r\n\r\n") {
            break i + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(String::from_utf8_lossy(&buf).to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[tokio::test]
async fn notion_client_uses_api_base_and_auth_headers() {
    let stub = spawn_stub(
        r#"{ "id": "p1", "properties": { "Client name": { "type": "title", "title": [ { "plain_text": "Acme" } ] } } }"#,
    )
    .await;
    let client =
        lib::notion::NotionClient::new("secret-token".to_string(), Some(stub.base_url.clone()));

    let page = client.retrieve_page("p1").await.expect("retrieve page");
    assert_eq!(page.id, "p1");
    assert_eq!(page.property_plain_text("Client name"), "Acme");

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = requests[0].to_lowercase();
    assert!(request.starts_with("get /v1/pages/p1 "), "{}", request);
    assert!(request.contains("authorization: bearer secret-token"));
    assert!(request.contains("notion-version: 2022-06-28"));
}

#[tokio::test]
async fn notion_comment_carries_full_text() {
    let stub = spawn_stub("{}").await;
    let client = lib::notion::NotionClient::new("tok".to_string(), Some(stub.base_url.clone()));

    client
        .create_comment("p9", "12/01/2025 Discussed renewal terms.")
        .await
        .expect("create comment");

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].to_lowercase().starts_with("post /v1/comments "));
    assert!(requests[0].contains("Discussed renewal terms."));
    assert!(requests[0].contains("p9"));
}

#[tokio::test]
async fn telegram_invite_export_hits_bot_endpoint() {
    let stub = spawn_stub(r#"{ "ok": true, "result": "https://t.me/+stub" }"#).await;
    let channel = lib::channels::TelegramChannel::with_api_base(
        "TEST-TOKEN".to_string(),
        stub.base_url.clone(),
    );

    let link = channel
        .export_chat_invite_link(-100123)
        .await
        .expect("export invite link");
    assert_eq!(link, "https://t.me/+stub");

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = requests[0].to_lowercase();
    assert!(
        request.starts_with("post /bottest-token/exportchatinvitelink "),
        "{}",
        request
    );
    assert!(requests[0].contains("-100123"));
}
