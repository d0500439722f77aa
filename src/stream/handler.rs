//! Stream handshake handling.
//!
//! Glues the pipeline together: method guard, topic authorization with
//! settle-all semantics, session creation, and the single finalize step that
//! merges interest/scope and registers the session on its channels.

use crate::core::config::StreamSettings;
use crate::core::time::Clock;
use crate::stream::authorize::{authorize_topics, AccessReview, AuthorizationOutcome, ProjectCache};
use crate::stream::channels::{ChannelHub, ChannelKey};
use crate::stream::error::StreamError;
use crate::stream::session::{open_session, Principal, Session, SessionTransport, Subscription};

/// The only verb admitted for the stream-open handshake.
pub const STREAM_METHOD: &str = "GET";

/// Reject any verb other than the stream-open one before authorization runs.
pub fn ensure_stream_method(method: &str) -> Result<(), StreamError> {
    if method == STREAM_METHOD {
        Ok(())
    } else {
        Err(StreamError::MethodNotAllowed {
            method: method.to_string(),
        })
    }
}

/// Collect raw topic strings from repeated `topic` query parameters.
pub fn topics_from_query(query: &[(String, String)]) -> Vec<String> {
    query
        .iter()
        .filter(|(key, _)| key == "topic")
        .map(|(_, value)| value.clone())
        .collect()
}

/// Interest set and channel assignments implied by the authorized outcomes.
///
/// Rejected outcomes contribute nothing; their absence withholds the
/// corresponding registrations without affecting the other topics.
pub fn derive_subscription(
    outcomes: &[AuthorizationOutcome],
) -> (Subscription, Vec<ChannelKey>) {
    let mut subscription = Subscription::default();
    let mut channels: Vec<ChannelKey> = Vec::new();
    let assign = |key: ChannelKey, channels: &mut Vec<ChannelKey>| {
        if !channels.contains(&key) {
            channels.push(key);
        }
    };
    for outcome in outcomes {
        let AuthorizationOutcome::Authorized(topic) = outcome else {
            continue;
        };
        match topic.key.as_str() {
            "shoots" => {
                if let Some(scope) = &topic.metadata {
                    subscription.scope.merge(scope.clone());
                }
                subscription.events.insert("shoots".to_string());
                subscription.events.insert("issues".to_string());
                assign(ChannelKey::Tickets, &mut channels);
                let shoots_channel = if topic.has_label("unhealthy") {
                    ChannelKey::UnhealthyShoots
                } else {
                    ChannelKey::Shoots
                };
                assign(shoots_channel, &mut channels);
            }
            _ => {}
        }
    }
    // Comment events only make sense for a single named shoot.
    if subscription.scope.name.is_some() {
        subscription.events.insert("comments".to_string());
    }
    (subscription, channels)
}

/// Handle one stream request end to end: authorize the requested topics, open
/// the session, and register it on the implied channels once the subscription
/// is finalized. A session with no authorized topics stays unregistered.
pub async fn handle_event_stream<A, P, C>(
    principal: Principal,
    raw_topics: &[String],
    transport: SessionTransport,
    hub: &ChannelHub,
    access: &A,
    cache: &P,
    settings: &StreamSettings,
    clock: C,
) -> Result<Session, StreamError>
where
    A: AccessReview,
    P: ProjectCache,
    C: Clock,
{
    let outcomes = authorize_topics(&principal, raw_topics, access, cache).await?;
    let session = open_session(principal, &outcomes, transport, settings, clock).await;
    let (subscription, channels) = derive_subscription(&outcomes);
    // A transport that died during the handshake leaves the session closed;
    // registering it would only park a dead entry in the channel sets.
    if !session.is_closed() && !channels.is_empty() {
        session.finalize(subscription);
        for key in &channels {
            hub.channel(*key).register(&session);
        }
    }
    Ok(session)
}
