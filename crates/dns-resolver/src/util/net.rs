use std::borrow::Cow;
use std::io;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

use dns_types::protocol::types::HEADER_MASK_TC;

use crate::MAX_DATAGRAM_LEN;

/// Write a serialised message to a connected UDP socket.  If the
/// message is too big it is truncated and the TC flag is set.
///
/// # Errors
///
/// If the message is too short to have a header, or sending fails.
pub async fn send_udp_bytes(sock: &UdpSocket, bytes: &[u8]) -> Result<(), io::Error> {
    let payload = udp_payload(bytes)?;
    sock.send(&payload).await?;
    Ok(())
}

/// Like `send_udp_bytes` but sends to the given address.
///
/// # Errors
///
/// If the message is too short to have a header, or sending fails.
pub async fn send_udp_bytes_to(
    sock: &UdpSocket,
    target: SocketAddr,
    bytes: &[u8],
) -> Result<(), io::Error> {
    let payload = udp_payload(bytes)?;
    sock.send_to(&payload, target).await?;
    Ok(())
}

/// The octets to put in a datagram.  A TC flag which is already set
/// is left alone, so upstream responses are relayed as they came.
fn udp_payload(bytes: &[u8]) -> Result<Cow<'_, [u8]>, io::Error> {
    if bytes.len() < 12 {
        tracing::error!(length = %bytes.len(), "message too short");
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "message too short to contain a header",
        ));
    }

    if bytes.len() > MAX_DATAGRAM_LEN {
        let mut truncated = bytes[..MAX_DATAGRAM_LEN].to_vec();
        truncated[2] |= HEADER_MASK_TC;
        Ok(Cow::Owned(truncated))
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_payload_rejects_short() {
        assert!(udp_payload(&[0; 11]).is_err());
    }

    #[test]
    fn udp_payload_passes_through() {
        let mut bytes = vec![0; MAX_DATAGRAM_LEN];
        bytes[2] = HEADER_MASK_TC;

        assert_eq!(Cow::Borrowed(&bytes[..]), udp_payload(&bytes).unwrap());
    }

    #[test]
    fn udp_payload_truncates() {
        let bytes = vec![0; MAX_DATAGRAM_LEN + 1];
        let payload = udp_payload(&bytes).unwrap();

        assert_eq!(MAX_DATAGRAM_LEN, payload.len());
        assert_eq!(HEADER_MASK_TC, payload[2]);
    }
}
