use async_trait::async_trait;
use bytes::Bytes;
use rusoto_core::request::{DispatchSignedRequest, HttpClient};
use rusoto_core::signature::SignedRequest;
use thiserror::Error;

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request dispatch failed: {0}")]
    Dispatch(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends one signed request and resolves once the whole response body is in.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: SignedRequest) -> Result<Response, TransportError>;
}

/// Transport backed by rusoto's hyper client. No timeout is applied.
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new() -> crate::Result<Self> {
        let client = HttpClient::new().map_err(|err| crate::Error::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SignedRequest) -> Result<Response, TransportError> {
        let mut response = self
            .client
            .dispatch(request, None)
            .await
            .map_err(|err| TransportError::Dispatch(err.to_string()))?;

        // The body arrives as a stream of chunks; only resolve once it has ended.
        let buffered = response
            .buffer()
            .await
            .map_err(|err| TransportError::Body(err.to_string()))?;

        Ok(Response {
            status: buffered.status.as_u16(),
            body: buffered.body,
        })
    }
}


#[cfg(test)]
mod tests {
    use rusoto_core::credential::AwsCredentials;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::*;
    use crate::config::{Endpoint, TargetConfig};
    use crate::forwarder::request::OutboundRequest;

    /// Accepts one connection, captures the request and answers with a chunked body.
    async fn serve_once(listener: TcpListener, reply: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&received).to_ascii_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .map(|value| value.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if received.len() >= end + 4 + length {
                    break;
                }
            }
        }
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&received).into_owned()
    }

    #[tokio::test]
    async fn http_transport_buffers_chunked_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let request = serve_once(
                listener,
                "HTTP/1.1 201 Created\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n3\r\nabc\r\n3\r\ndef\r\n0\r\n\r\n",
            )
            .await;
            let _ = tx.send(request);
        });

        let endpoint = Endpoint::parse(&format!("http://{}", address)).unwrap();
        let config = TargetConfig::new("us-east-1", endpoint, "idx", "doc").unwrap();
        let credentials = AwsCredentials::new("AKIDEXAMPLE", "secret", None, None);
        let signed = OutboundRequest::build(&config, r#"{"id":1}"#.to_string()).sign(&credentials);

        let response = HttpTransport::new().unwrap().send(signed).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, Bytes::from_static(b"abcdef"));

        let request = rx.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("post /idx/doc http/1.1"));
        assert!(request.contains("presigned-expires: false"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.contains("authorization: aws4-hmac-sha256 credential=akidexample/"));
        assert!(request.ends_with(r#"{"id":1}"#));
    }

    #[tokio::test]
    async fn http_transport_rejects_on_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::parse(&format!("http://{}", address)).unwrap();
        let config = TargetConfig::new("us-east-1", endpoint, "idx", "doc").unwrap();
        let credentials = AwsCredentials::new("AKIDEXAMPLE", "secret", None, None);
        let signed = OutboundRequest::build(&config, "{}".to_string()).sign(&credentials);

        let err = HttpTransport::new().unwrap().send(signed).await.unwrap_err();
        assert!(matches!(err, TransportError::Dispatch(_)));
    }

    #[test]
    fn only_2xx_is_success() {
        let response = |status| Response {
            status,
            body: Bytes::new(),
        };
        assert!(response(200).is_success());
        assert!(response(201).is_success());
        assert!(!response(199).is_success());
        assert!(!response(400).is_success());
        assert!(!response(503).is_success());
    }
}
