use async_trait::async_trait;
use log::warn;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use super::{Inbound, Transport};
use crate::errors::TransportResult;

/// Newline-delimited JSON over a reader/writer pair (stdin/stdout in production)
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl LineTransport<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }
}

#[async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "stdio"
    }

    async fn receive(&mut self) -> TransportResult<Inbound> {
        self.line.clear();
        match self.reader.read_line(&mut self.line).await {
            Ok(0) => Ok(Inbound::Closed), // EOF
            Ok(_) => {
                let trimmed = self.line.trim();
                if trimmed.is_empty() {
                    Ok(Inbound::Skip)
                } else {
                    Ok(Inbound::Message(trimmed.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!("Skipping unreadable input line: {}", e);
                Ok(Inbound::Skip)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn send(&mut self, text: &str) -> TransportResult<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servers::DemographicsServer;
    use crate::transport::{serve, ServeOutcome};
    use serde_json::{json, Value};
    use tokio::io::{AsyncReadExt, AsyncWriteExt as _};
    use tokio_util::sync::CancellationToken;
    use unhcr_core::{DemographicsArguments, DemographicsSource, FetchError};

    struct OneRowSource;

    #[async_trait]
    impl DemographicsSource for OneRowSource {
        async fn fetch(&self, args: &DemographicsArguments) -> Result<Value, FetchError> {
            Ok(json!({"data": [{"year": args.year}]}))
        }
    }

    #[tokio::test]
    async fn test_receive_classifies_lines() {
        let input: &[u8] = b"{\"id\":1}\n\n   \nlast";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(
            transport.receive().await.unwrap(),
            Inbound::Message("{\"id\":1}".to_string())
        );
        assert_eq!(transport.receive().await.unwrap(), Inbound::Skip);
        assert_eq!(transport.receive().await.unwrap(), Inbound::Skip);
        assert_eq!(
            transport.receive().await.unwrap(),
            Inbound::Message("last".to_string())
        );
        assert_eq!(transport.receive().await.unwrap(), Inbound::Closed);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let input: &[u8] = b"\xff\xfe\n{\"id\":2}\n";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.receive().await.unwrap(), Inbound::Skip);
        assert_eq!(
            transport.receive().await.unwrap(),
            Inbound::Message("{\"id\":2}".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_writes_one_line() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport.send(r#"{"id":1}"#).await.unwrap();
        transport.send(r#"{"id":2}"#).await.unwrap();
        assert_eq!(transport.writer, b"{\"id\":1}\n{\"id\":2}\n".to_vec());
    }

    #[tokio::test]
    async fn test_serve_over_pipes() {
        let (mut client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, mut client_out) = tokio::io::duplex(4096);

        client_in
            .write_all(
                concat!(
                    "not json at all\n",
                    "\n",
                    "{\"id\": 1, \"method\": \"listTools\"}\n",
                    "{\"id\": 2, \"method\": \"callTool\", \"params\": {\"name\": \"get_demographics\", \"arguments\": {\"year\": 2022}}}\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        drop(client_in);

        let server = DemographicsServer::new(OneRowSource, 100);
        let mut transport = LineTransport::new(BufReader::new(server_in), server_out);
        let outcome = serve(&mut transport, &server, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, ServeOutcome::Closed);
        drop(transport);

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            json!({"id": 0, "error": {"code": "InvalidArguments", "message": "Invalid JSON"}})
        );
        assert_eq!(lines[1]["id"], json!(1));
        assert_eq!(lines[1]["result"]["tools"][0]["name"], json!("get_demographics"));
        assert_eq!(lines[2]["id"], json!(2));
        let text = lines[2]["result"]["content"][0]["text"].as_str().unwrap();
        let rows: Value = serde_json::from_str(text).unwrap();
        assert_eq!(rows, json!([{"year": 2022}]));
    }
}
