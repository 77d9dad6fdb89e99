//! Line-delimited stream transport for the MCP server.
//!
//! - Messages are UTF-8 encoded JSON-RPC, one per line
//! - Responses are written as a single line and flushed immediately
//! - EOF on the input ends the session cleanly
//! - stderr is left to logging
//!
//! Requests are handled strictly one at a time: the next line is not read
//! until the previous response has been written.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::error::Result;
use crate::mcp::server::McpServer;
use crate::mcp::types::{JsonRpcError, JsonRpcResponse};

/// A line-oriented MCP transport over any async reader/writer pair.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

impl StreamTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Creates a transport over the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads the next message line as raw bytes, surrounding whitespace trimmed.
    ///
    /// Returns `None` on EOF. Invalid UTF-8 is left for the JSON decoder to reject.
    pub async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_ascii().to_vec()))
    }

    /// Writes a response as one newline-terminated JSON line.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Serves requests until EOF.
    ///
    /// Malformed JSON is answered with a parse error and the loop continues;
    /// I/O failures end the loop with an error.
    pub async fn serve(&mut self, server: &McpServer) -> Result<()> {
        while let Some(line) = self.read_line().await? {
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_slice::<Value>(&line) {
                Ok(request) => server.handle_request(request).await,
                Err(e) => {
                    warn!(error = %e, "received malformed JSON");
                    JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e))
                }
            };

            self.write_response(&response).await?;
        }

        debug!("input closed, stopping stream transport");
        Ok(())
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::registry::{ToolCatalog, ToolRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EmptyCatalog;

    #[async_trait]
    impl ToolCatalog for EmptyCatalog {
        async fn load(&self) -> Result<ToolRegistry> {
            Ok(ToolRegistry::new())
        }
    }

    async fn run(input: &str) -> Vec<Value> {
        let server = McpServer::new(Arc::new(EmptyCatalog));
        let mut transport = StreamTransport::new(input.as_bytes(), Vec::new());
        transport.serve(&server).await.unwrap();
        String::from_utf8(transport.into_writer())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_parse_error_then_continue() {
        let responses = run("{not json\n{\"id\":7,\"method\":\"tools/list\"}\n").await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 7);
        assert!(responses[1]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_a_parse_error() {
        let server = McpServer::new(Arc::new(EmptyCatalog));
        let input: &[u8] = b"\xff\xfe{\n{\"id\":2,\"method\":\"tools/list\"}\n";
        let mut transport = StreamTransport::new(input, Vec::new());
        transport.serve(&server).await.unwrap();

        let written = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 2);
        assert!(responses[1]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let responses = run("\n\r\n{\"id\":\"a\",\"method\":\"initialize\"}\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let responses = run("{\"id\":1,\"method\":\"ping\"}").await;
        assert_eq!(responses[0]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"id\":1,\"method\":\"tools/list\"}\n")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let server = McpServer::new(Arc::new(EmptyCatalog));
        let mut transport = StreamTransport::new(BufReader::new(reader), Vec::new());

        assert!(transport.serve(&server).await.is_err());
        let written = String::from_utf8(transport.into_writer()).unwrap();
        assert_eq!(written.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_responses_are_single_lines() {
        let responses = run("{\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"x\"}}\n").await;
        assert_eq!(responses.len(), 1);
        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains('\n'));
    }
}
