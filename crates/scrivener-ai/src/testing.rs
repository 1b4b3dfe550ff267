//! Test doubles shared by the gateway and service tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scrivener_core::GatewayConfig;
use tokio::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

use crate::gateway::{ChatRequest, GatewayError, RawResponse, Transport};

/// Replays a fixed script of outcomes, one per request, and records when
/// each request arrived and what it carried.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, GatewayError>>>,
    seen: Mutex<Vec<(Instant, ChatRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Transport whose only response is a completion carrying `content`.
    pub fn replying(content: &str) -> Self {
        Self::new(vec![Ok(RawResponse {
            status: 200,
            body: completion_body(content),
        })])
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.seen.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, request: &ChatRequest) -> Result<RawResponse, GatewayError> {
        self.seen
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GatewayError::Transport {
                    message: "script exhausted".into(),
                })
            })
    }
}

/// Success envelope with `content` as the first choice.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

pub fn config_with_backoff(backoff: Duration) -> GatewayConfig {
    GatewayConfig::new("test-key")
        .with_base_url("http://ai.invalid/v1")
        .with_model("gpt-test")
        .with_backoff_base(backoff)
}

/// In-memory log sink for asserting on formatted `tracing` output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
