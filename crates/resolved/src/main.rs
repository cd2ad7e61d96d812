use bytes::Bytes;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::signal;
use tokio::sync::{mpsc, Semaphore};
use tracing::Instrument;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use dns_resolver::cache::SharedCache;
use dns_resolver::forwarding::Upstream;
use dns_resolver::util::net::send_udp_bytes_to;
use dns_resolver::{resolve, MAX_DATAGRAM_LEN};

async fn listen_udp(
    cache: SharedCache,
    upstream: Upstream,
    socket: UdpSocket,
    max_in_flight: usize,
) {
    let (tx, mut rx) = mpsc::channel::<(Bytes, SocketAddr)>(max_in_flight);
    let in_flight = Arc::new(Semaphore::new(max_in_flight));
    let mut buf = vec![0u8; MAX_DATAGRAM_LEN];

    loop {
        tokio::select! {
            Ok((size, peer)) = socket.recv_from(&mut buf) => {
                let Ok(permit) = in_flight.clone().try_acquire_owned() else {
                    tracing::warn!(%peer, "too many requests in flight, dropping request");
                    continue;
                };

                let bytes = Bytes::copy_from_slice(&buf[..size]);
                let reply = tx.clone();
                let cache = cache.clone();
                tokio::spawn(async move {
                    let (metrics, response) = resolve(&cache, &upstream, &bytes)
                        .instrument(tracing::error_span!("resolve", %peer))
                        .await;

                    tracing::info!(
                        %peer,
                        cache_hits = %metrics.cache_hits,
                        cache_misses = %metrics.cache_misses,
                        upstream_hits = %metrics.upstream_hits,
                        upstream_misses = %metrics.upstream_misses,
                        responded = %response.is_some(),
                        "handled request"
                    );

                    if let Some(response) = response {
                        if let Err(error) = reply.send((response, peer)).await {
                            tracing::debug!(%peer, ?error, "udp reply error");
                        }
                    }

                    drop(permit);
                });
            }

            Some((response, peer)) = rx.recv() => {
                if let Err(error) = send_udp_bytes_to(&socket, peer, &response).await {
                    tracing::debug!(%peer, ?error, "udp send error");
                }
            }
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

fn begin_logging(format: LogFormat) {
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy(),
    );

    match format {
        LogFormat::Plain => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

// the doc comments for this struct turn into the CLI help text
#[derive(Debug, Parser)]
/// A small caching DNS forwarder.
///
/// Queries are answered from an in-memory cache if every question in
/// them has an unexpired answer.  Otherwise the query is passed on to
/// the upstream nameserver, and its response is cached and passed
/// back.
///
/// Logging is controlled by the RUST_LOG environment variable.
struct Args {
    /// Interface to listen on
    #[clap(short, long, env = "RESOLVED_INTERFACE", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    interface: IpAddr,

    /// Port to listen on
    #[clap(short, long, env = "RESOLVED_PORT", default_value_t = 8053)]
    port: u16,

    /// Nameserver to forward queries to
    #[clap(short, long, env = "RESOLVED_UPSTREAM", default_value = "8.8.8.8:53")]
    upstream: SocketAddr,

    /// How long to wait for the upstream nameserver, in milliseconds
    #[clap(long, env = "RESOLVED_UPSTREAM_TIMEOUT_MS", default_value_t = 5000)]
    upstream_timeout: u64,

    /// How many requests can be handled at once; requests beyond this
    /// are dropped
    #[clap(long, env = "RESOLVED_MAX_IN_FLIGHT", default_value_t = 64)]
    max_in_flight: usize,

    /// Format of log output
    #[clap(long, env = "RESOLVED_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    begin_logging(args.log_format);

    if args.max_in_flight == 0 {
        tracing::error!("--max-in-flight must be at least 1");
        process::exit(1);
    }

    let upstream = Upstream {
        address: args.upstream,
        timeout: Duration::from_millis(args.upstream_timeout),
    };

    tracing::info!(
        interface = %args.interface,
        port = %args.port,
        upstream = %upstream.address,
        "binding DNS UDP socket"
    );
    let udp = match UdpSocket::bind((args.interface, args.port)).await {
        Ok(s) => s,
        Err(error) => {
            tracing::error!(?error, "could not bind DNS UDP socket");
            process::exit(1);
        }
    };

    let cache = SharedCache::new();

    tokio::select! {
        () = listen_udp(cache, upstream, udp, args.max_in_flight) => (),
        res = signal::ctrl_c() => match res {
            Ok(()) => tracing::info!("shutting down"),
            Err(error) => tracing::error!(?error, "could not listen for shutdown signal"),
        },
    }
}

#[cfg(test)]
mod tests {
    use dns_types::protocol::types::test_util::*;
    use dns_types::protocol::types::*;

    use super::*;

    async fn start_server(cache: SharedCache, upstream: Upstream) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let address = socket.local_addr().unwrap();
        tokio::spawn(listen_udp(cache, upstream, socket, 4));
        address
    }

    async fn exchange(server: SocketAddr, request: &Message) -> Message {
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client
            .send_to(&request.to_octets().unwrap(), server)
            .await
            .unwrap();

        let mut buf = [0; MAX_DATAGRAM_LEN];
        let size = tokio::time::timeout(Duration::from_secs(5), client.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        Message::from_octets(&buf[..size]).unwrap()
    }

    #[tokio::test]
    async fn listen_udp_answers_from_cache() {
        let cache = SharedCache::new();
        let q = question("www.example.com.", RecordType::A);
        let rr = a_record("www.example.com.", [1, 2, 3, 4]);
        cache.insert(q.clone(), rr.clone());

        let upstream = Upstream {
            address: "127.0.0.1:9".parse().unwrap(),
            timeout: Duration::from_millis(50),
        };
        let server = start_server(cache, upstream).await;

        let response = exchange(server, &Message::from_question(42, q)).await;

        assert_eq!(42, response.header.id);
        assert!(response.header.is_response);
        assert_eq!(vec![rr], response.answers);
    }

    #[tokio::test]
    async fn listen_udp_forwards_and_caches() {
        let upstream_socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream = Upstream {
            address: upstream_socket.local_addr().unwrap(),
            timeout: Duration::from_secs(5),
        };
        let rr = a_record("www.example.com.", [1, 2, 3, 4]);
        let upstream_rr = rr.clone();
        tokio::spawn(async move {
            let mut buf = [0; MAX_DATAGRAM_LEN];
            let (size, peer) = upstream_socket.recv_from(&mut buf).await.unwrap();
            let response = Message::from_octets(&buf[..size])
                .unwrap()
                .make_response_with_answers(vec![upstream_rr]);
            upstream_socket
                .send_to(&response.to_octets().unwrap(), peer)
                .await
                .unwrap();
        });

        let cache = SharedCache::new();
        let q = question("www.example.com.", RecordType::A);
        let server = start_server(cache.clone(), upstream).await;

        let response = exchange(server, &Message::from_question(42, q.clone())).await;

        assert_eq!(42, response.header.id);
        assert_eq!(vec![rr.clone()], response.answers);
        assert_eq!(Some(rr), cache.get(&q));
    }
}
