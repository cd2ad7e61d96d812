use bytes::Bytes;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::util::net::send_udp_bytes;
use crate::MAX_DATAGRAM_LEN;

/// The nameserver which requests are forwarded to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Upstream {
    pub address: SocketAddr,

    /// How long to wait for a response before giving up.
    pub timeout: Duration,
}

/// Send a serialised request to the upstream nameserver, returning
/// its serialised response.
///
/// The request and response are passed through as they are: the
/// response is NOT parsed or validated, it may not even be a DNS
/// message.
///
/// # Errors
///
/// See `ForwardingError`.
pub async fn forward_to_upstream(
    upstream: &Upstream,
    serialised_request: &[u8],
) -> Result<Bytes, ForwardingError> {
    match timeout(
        upstream.timeout,
        forward_to_upstream_notimeout(upstream.address, serialised_request),
    )
    .await
    {
        Ok(res) => res.map_err(ForwardingError::UpstreamUnreachable),
        Err(_) => {
            tracing::debug!("timed out");
            Err(ForwardingError::UpstreamTimeout)
        }
    }
}

/// Timeout-less version of `forward_to_upstream`.
async fn forward_to_upstream_notimeout(
    address: SocketAddr,
    serialised_request: &[u8],
) -> Result<Bytes, io::Error> {
    let local_address = if address.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };

    let sock = UdpSocket::bind(local_address).await?;
    sock.connect(address).await?;
    send_udp_bytes(&sock, serialised_request).await?;

    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
    let size = sock.recv(&mut buf).await?;
    tracing::trace!(%size, "got response");

    Ok(Bytes::copy_from_slice(&buf[..size]))
}

/// An error that can occur when talking to the upstream nameserver.
#[derive(Debug)]
pub enum ForwardingError {
    /// No response arrived within the timeout.
    UpstreamTimeout,

    /// The socket could not be set up, or sending or receiving
    /// failed.
    UpstreamUnreachable(io::Error),
}

impl std::fmt::Display for ForwardingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ForwardingError::UpstreamTimeout => write!(f, "upstream nameserver timed out"),
            ForwardingError::UpstreamUnreachable(error) => {
                write!(f, "upstream nameserver unreachable: {error}")
            }
        }
    }
}

impl std::error::Error for ForwardingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForwardingError::UpstreamTimeout => None,
            ForwardingError::UpstreamUnreachable(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forward_returns_response_octets() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = Upstream {
            address: server.local_addr().unwrap(),
            timeout: Duration::from_secs(5),
        };

        let request = [7; 12];
        let handle = tokio::spawn(async move {
            let mut buf = [0; MAX_DATAGRAM_LEN];
            let (size, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(&[9; 20], peer).await.unwrap();
            buf[..size].to_vec()
        });

        let response = forward_to_upstream(&upstream, &request).await.unwrap();

        assert_eq!(Bytes::from_static(&[9; 20]), response);
        assert_eq!(request.to_vec(), handle.await.unwrap());
    }

    #[tokio::test]
    async fn forward_times_out() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = Upstream {
            address: server.local_addr().unwrap(),
            timeout: Duration::from_millis(50),
        };

        let result = forward_to_upstream(&upstream, &[0; 12]).await;

        assert!(matches!(result, Err(ForwardingError::UpstreamTimeout)));
    }
}
