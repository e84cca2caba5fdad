//! Client sessions on newline-delimited JSON streams

use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        UnixStream,
        unix::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::core::{error::TransportResult, types::SessionId};

/// One connected client
///
/// Each message is a single line of JSON; blank lines are ignored.
#[derive(Debug)]
pub struct UnixSocketSession {
    id: SessionId,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl UnixSocketSession {
    pub fn new(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            id: SessionId::new(),
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Next non-blank line, `None` once the client hangs up
    pub async fn next_line(&mut self) -> TransportResult<Option<String>> {
        while let Some(line) = self.lines.next_line().await? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Write one message as a single line
    pub async fn send<T: Serialize>(&mut self, message: &T) -> TransportResult<()> {
        let mut frame = serde_json::to_vec(message)?;
        frame.push(b'\n');
        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{JsonRpcRequest, JsonRpcResponse, Request, RequestId, Response};

    #[tokio::test]
    async fn test_sessions_get_distinct_ids() {
        let (client, server) = UnixStream::pair().unwrap();
        let first = UnixSocketSession::new(server);
        let second = UnixSocketSession::new(client);

        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_next_line_skips_blank_lines_and_crlf() {
        let (mut client, server) = UnixStream::pair().unwrap();
        let mut session = UnixSocketSession::new(server);

        let request = serde_json::to_string(&JsonRpcRequest::new(
            Request::GetScanStandards,
            RequestId::Number(1),
        ))
        .unwrap();
        client
            .write_all(format!("\n  \r\n{}\r\n", request).as_bytes())
            .await
            .unwrap();

        let line = session.next_line().await.unwrap().unwrap();
        let received: JsonRpcRequest = serde_json::from_str(&line).unwrap();
        assert_eq!(received.request(), Some(Request::GetScanStandards));

        drop(client);
        assert_eq!(session.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_writes_one_line() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut session = UnixSocketSession::new(server);
        let mut peer = UnixSocketSession::new(client);

        let response =
            JsonRpcResponse::success(Response::ScanStandards(vec![]), RequestId::Number(9));
        session.send(&response).await.unwrap();

        assert_eq!(
            peer.next_line().await.unwrap().as_deref(),
            Some(r#"{"jsonrpc":"2.0","result":[],"id":9}"#)
        );
    }
}
