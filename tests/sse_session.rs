//! End-to-end tests: a real listener, a real event stream, posted frames.

use std::net::SocketAddr;
use std::time::Duration;

use angel_mcp_server::core::config::{Config, ToolsConfig};
use angel_mcp_server::core::{McpServer, transport};
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type ByteStream = std::pin::Pin<Box<dyn Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>;

struct TestServer {
    addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start(tools: ToolsConfig) -> Self {
        let config = Config {
            tools,
            ..Config::default()
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = McpServer::new(config.clone()).unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            transport::serve(listener, &config.transport, server, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            stop: Some(stop),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .unwrap();
    }
}

/// Minimal SSE reader: yields `(event, data)` pairs, skipping comments.
struct EventReader {
    stream: ByteStream,
    buffer: Vec<u8>,
}

impl EventReader {
    async fn open(server: &TestServer) -> Self {
        let response = reqwest::get(server.url("/sse")).await.unwrap();
        assert_eq!(response.status(), 200);
        Self {
            stream: Box::pin(response.bytes_stream()),
            buffer: Vec::new(),
        }
    }

    async fn next_event(&mut self) -> Option<(String, String)> {
        loop {
            // Split on raw bytes; only whole events are decoded.
            if let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
                let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
                let block = String::from_utf8(raw).expect("event is not UTF-8");
                let mut event = String::from("message");
                let mut data = Vec::new();
                for line in block.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        event = value.trim().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push(value.trim_start().to_string());
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return Some((event, data.join("\n")));
            }

            let chunk = tokio::time::timeout(Duration::from_secs(10), self.stream.next())
                .await
                .expect("timed out waiting for an event")?
                .ok()?;
            self.buffer.extend_from_slice(&chunk);
        }
    }

    async fn next_message(&mut self) -> Value {
        let (event, data) = self.next_event().await.expect("stream ended");
        assert_eq!(event, "message");
        serde_json::from_str(&data).unwrap()
    }
}

struct Client {
    reader: EventReader,
    endpoint: String,
    http: reqwest::Client,
}

impl Client {
    async fn connect(server: &TestServer) -> Self {
        let mut reader = EventReader::open(server).await;
        let (event, path) = reader.next_event().await.unwrap();
        assert_eq!(event, "endpoint");
        assert!(path.starts_with("/messages/?session_id="));
        Self {
            reader,
            endpoint: server.url(&path),
            http: reqwest::Client::new(),
        }
    }

    async fn post(&self, frame: Value) -> reqwest::StatusCode {
        self.http
            .post(&self.endpoint)
            .json(&frame)
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn handshake(&mut self) {
        let status = self
            .post(json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "capabilities": {}}
            }))
            .await;
        assert_eq!(status, 202);
        let response = self.reader.next_message().await;
        assert_eq!(response["id"], 0);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");

        let status = self
            .post(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert_eq!(status, 202);
    }

    async fn call(&self, id: Value, tool: &str, arguments: Value) {
        let status = self
            .post(json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": {"name": tool, "arguments": arguments}
            }))
            .await;
        assert_eq!(status, 202);
    }
}

fn text_of(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn test_full_session_over_sse() {
    let server = TestServer::start(ToolsConfig::instant()).await;
    let mut client = Client::connect(&server).await;
    client.handshake().await;

    client
        .post(json!({"jsonrpc": "2.0", "id": "list", "method": "tools/list"}))
        .await;
    let listed = client.reader.next_message().await;
    assert_eq!(listed["id"], "list");
    assert_eq!(listed["result"]["tools"].as_array().unwrap().len(), 2);

    client.call(json!(1), "query_angel_existence", json!({})).await;
    let existence = client.reader.next_message().await;
    assert_eq!(existence["id"], 1);
    assert_eq!(existence["result"]["isError"], false);
    assert!(text_of(&existence).contains("这个世界存在天使"));

    client
        .call(json!(2), "get_angel_details", json!({"category": "messenger"}))
        .await;
    let details = client.reader.next_message().await;
    assert_eq!(details["id"], 2);
    assert!(text_of(&details).starts_with("信使天使"));

    server.stop().await;
}

#[tokio::test]
async fn test_failures_are_results_not_dropped_sessions() {
    let server = TestServer::start(ToolsConfig::instant()).await;
    let mut client = Client::connect(&server).await;
    client.handshake().await;

    client.call(json!(1), "summon_angel", json!({})).await;
    let unknown = client.reader.next_message().await;
    assert_eq!(unknown["result"]["isError"], true);
    assert!(text_of(&unknown).contains("Unknown tool: summon_angel"));

    client
        .call(json!(2), "get_angel_details", json!({"category": "warrior"}))
        .await;
    let bad_category = client.reader.next_message().await;
    assert_eq!(bad_category["result"]["isError"], true);
    assert!(text_of(&bad_category).contains("未知的天使类别"));

    // The session keeps working afterwards.
    client.call(json!(3), "get_angel_details", json!({})).await;
    let ok = client.reader.next_message().await;
    assert_eq!(ok["id"], 3);
    assert!(text_of(&ok).starts_with("守护天使"));

    server.stop().await;
}

#[tokio::test]
async fn test_slow_call_does_not_block_fast_call() {
    let server = TestServer::start(ToolsConfig {
        existence_latency_ms: 50,
        details_latency_ms: 400,
    })
    .await;
    let mut client = Client::connect(&server).await;
    client.handshake().await;

    client.call(json!("slow"), "get_angel_details", json!({})).await;
    client.call(json!("fast"), "query_angel_existence", json!({})).await;

    let first = client.reader.next_message().await;
    let second = client.reader.next_message().await;
    assert_eq!(first["id"], "fast");
    assert_eq!(second["id"], "slow");

    server.stop().await;
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let server = TestServer::start(ToolsConfig::instant()).await;
    let mut a = Client::connect(&server).await;
    let mut b = Client::connect(&server).await;
    assert_ne!(a.endpoint, b.endpoint);

    a.handshake().await;

    // b has not finished its handshake, so tool calls are refused for b only.
    let status = b
        .post(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    assert_eq!(status, 202);
    let refused = b.reader.next_message().await;
    assert_eq!(refused["error"]["code"], -32600);

    a.post(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    let listed = a.reader.next_message().await;
    assert!(listed["result"]["tools"].is_array());

    // Closing a's stream leaves b usable.
    drop(a);
    b.handshake().await;
    b.call(json!(9), "query_angel_existence", json!({})).await;
    assert_eq!(b.reader.next_message().await["id"], 9);

    server.stop().await;
}

#[tokio::test]
async fn test_posting_to_unknown_session_is_rejected() {
    let server = TestServer::start(ToolsConfig::instant()).await;
    let status = reqwest::Client::new()
        .post(server.url("/messages/?session_id=00000000000000000000000000000000"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, 404);

    let health: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    server.stop().await;
}

#[tokio::test]
async fn test_events_split_across_chunks_decode_intact() {
    let text = "event: message\ndata: {\"text\":\"这个世界存在天使\"}\n\n";
    let bytes = text.as_bytes();
    // Cut inside the first multi-byte character.
    let cut = text.find('这').unwrap() + 1;
    let chunks: Vec<reqwest::Result<bytes::Bytes>> = vec![
        Ok(bytes::Bytes::copy_from_slice(&bytes[..cut])),
        Ok(bytes::Bytes::copy_from_slice(&bytes[cut..])),
    ];
    let mut reader = EventReader {
        stream: Box::pin(futures::stream::iter(chunks)),
        buffer: Vec::new(),
    };

    let message = reader.next_message().await;
    assert_eq!(message["text"], "这个世界存在天使");
}
