#![warn(clippy::pedantic)]
// Don't care enough to fix
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::wildcard_imports)]

pub mod cache;
pub mod forwarding;
pub mod metrics;
pub mod util;

use bytes::Bytes;
use tracing::Instrument;

use dns_types::protocol::types::*;

use self::cache::SharedCache;
use self::forwarding::{forward_to_upstream, Upstream};
use self::metrics::Metrics;

/// The biggest datagram sent or received.  Anything longer is
/// truncated.
pub const MAX_DATAGRAM_LEN: usize = 512;

/// Handle a single serialised request, returning the serialised
/// response to send back to the client.
///
/// If every question in the request has an answer in the cache, the
/// response is built from those answers.  Otherwise the whole request
/// is forwarded to the upstream nameserver, the answers in its
/// response are cached, and that response is returned unchanged.  If
/// the upstream nameserver cannot be used, the response is a
/// SERVFAIL.
///
/// Returns `None` if the request cannot be parsed: no response should
/// be sent.
pub async fn resolve(
    cache: &SharedCache,
    upstream: &Upstream,
    serialised_request: &[u8],
) -> (Metrics, Option<Bytes>) {
    let mut metrics = Metrics::new();

    let request = match Message::from_octets(serialised_request) {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(?error, id = ?error.id(), "could not parse request");
            return (metrics, None);
        }
    };

    if let Some(answers) = answer_from_cache(&mut metrics, cache, &request.questions) {
        tracing::trace!("cache HIT");
        let response = request.make_response_with_answers(answers);
        return (metrics, serialise_response(&response));
    }

    let address = upstream.address;
    match forward_to_upstream(upstream, serialised_request)
        .instrument(tracing::error_span!("forward_to_upstream", %address))
        .await
    {
        Ok(serialised_response) => match Message::from_octets(&serialised_response) {
            Ok(response) => {
                metrics.upstream_hit();
                tracing::trace!(rcode = %response.header.rcode, "upstream HIT");
                cache_upstream_answers(cache, response);
                (metrics, Some(serialised_response))
            }
            Err(error) => {
                metrics.upstream_miss();
                tracing::debug!(?error, "could not parse upstream response");
                (metrics, server_failure(&request))
            }
        },
        Err(error) => {
            metrics.upstream_miss();
            tracing::debug!(%error, "upstream MISS");
            (metrics, server_failure(&request))
        }
    }
}

/// Look up every question in the cache.  Returns the answers, in
/// question order, only if all of the questions are answered: one
/// miss means the cache is no use for this request.
///
/// A request with no questions has nothing to miss, so it is answered
/// (with no answers) without contacting the upstream nameserver.
pub fn answer_from_cache(
    metrics: &mut Metrics,
    cache: &SharedCache,
    questions: &[Question],
) -> Option<Vec<ResourceRecord>> {
    let mut answers = Vec::with_capacity(questions.len());
    let mut all_hit = true;
    for question in questions {
        if let Some(rr) = cache.get(question) {
            metrics.cache_hit();
            answers.push(rr);
        } else {
            metrics.cache_miss();
            all_hit = false;
        }
    }

    if all_hit {
        Some(answers)
    } else {
        None
    }
}

/// Cache the answers from an upstream response.  Answers are matched
/// to questions by position, so only as many are cached as there are
/// both questions and answers.
pub fn cache_upstream_answers(cache: &SharedCache, response: Message) {
    for (question, rr) in response.questions.into_iter().zip(response.answers) {
        tracing::trace!(%question, "caching");
        cache.insert(question, rr);
    }
}

fn server_failure(request: &Message) -> Option<Bytes> {
    serialise_response(&request.make_server_failure_response())
}

fn serialise_response(response: &Message) -> Option<Bytes> {
    match response.to_octets() {
        Ok(octets) => Some(octets.freeze()),
        Err(error) => {
            tracing::warn!(%error, "could not serialise response");
            None
        }
    }
}
