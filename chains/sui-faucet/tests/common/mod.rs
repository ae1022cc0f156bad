#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use core_logic::{NetworkError, Proxy, SecretRecorder};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use sui_faucet::{AccountIdentity, ChainClient, FaucetReply, FaucetTransport, MoveCall};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// In-process HTTP proxy stub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StubResponse {
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub at: std::time::Instant,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Answers every request it receives as if it were the upstream server,
/// which is what an HTTP proxy looks like to the client.
pub struct ProxyStub {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ProxyStub {
    pub async fn spawn(script: Vec<StubResponse>, fallback: StubResponse) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(script)));

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let recorded = recorded.clone();
                let script = script.clone();
                let fallback = fallback.clone();

                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let Some(request) = read_request(&mut reader).await else {
                        return;
                    };
                    recorded.lock().unwrap().push(request);

                    let response = script.lock().unwrap().pop_front().unwrap_or(fallback);
                    let mut raw = format!(
                        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                        response.status,
                        response.body.len()
                    );
                    for (name, value) in &response.headers {
                        raw.push_str(&format!("{}: {}\r\n", name, value));
                    }
                    raw.push_str("\r\n");
                    raw.push_str(&response.body);

                    let stream = reader.get_mut();
                    let _ = stream.write_all(raw.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    /// Proxy list line pointing at this stub
    pub fn proxy_line(&self) -> String {
        format!("{}:{}@stubuser:stubpass", self.addr.ip(), self.addr.port())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(reader: &mut BufReader<tokio::net::TcpStream>) -> Option<RecordedRequest> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.ok()?;

    let mut headers = Vec::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name.to_string(), value));
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    Some(RecordedRequest {
        request_line: request_line.trim_end().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
        at: std::time::Instant::now(),
    })
}

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TransportCall {
    pub proxy_host: String,
    pub at: Instant,
    pub proxy_limited: bool,
}

/// Faucet transport returning scripted replies, then a fallback.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<FaucetReply, NetworkError>>>,
    fallback: Box<dyn Fn(&Proxy) -> Result<FaucetReply, NetworkError> + Send + Sync>,
    pub calls: Mutex<Vec<TransportCall>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<FaucetReply, NetworkError>>) -> Self {
        Self::with_fallback(script, |_| Ok(reply(200, None, r#"{"id":"abc"}"#)))
    }

    pub fn with_fallback(
        script: Vec<Result<FaucetReply, NetworkError>>,
        fallback: impl Fn(&Proxy) -> Result<FaucetReply, NetworkError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(script)),
            fallback: Box::new(fallback),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaucetTransport for ScriptedTransport {
    async fn post(&self, proxy: &Proxy, _payload: &Value) -> Result<FaucetReply, NetworkError> {
        self.calls.lock().unwrap().push(TransportCall {
            proxy_host: proxy.display_host().to_string(),
            at: Instant::now(),
            proxy_limited: proxy.is_limited(),
        });

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| (self.fallback)(proxy))
    }
}

pub fn reply(status: u16, retry_after: Option<u64>, body: &str) -> FaucetReply {
    FaucetReply {
        status,
        retry_after,
        body: body.to_string(),
    }
}

/// Chain client that accepts every call and remembers it.
#[derive(Default)]
pub struct RecordingChain {
    pub calls: Mutex<Vec<(String, MoveCall)>>,
}

impl RecordingChain {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn execute_move_call(&self, signer: &AccountIdentity, call: &MoveCall) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((signer.address().to_string(), call.clone()));
        Ok(format!("digest{}", calls.len()))
    }
}

#[derive(Default)]
pub struct MemoryRecorder {
    pub lines: Mutex<Vec<String>>,
}

#[async_trait]
impl SecretRecorder for MemoryRecorder {
    async fn append(&self, secret: &str) -> Result<()> {
        self.lines.lock().unwrap().push(secret.to_string());
        Ok(())
    }
}
