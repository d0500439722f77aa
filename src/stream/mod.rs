//! Real-time event stream: topic admission, session lifecycle, and fan-out.

pub mod authorize;
pub mod channels;
pub mod error;
pub mod handler;
pub mod session;
pub mod topic;

pub use authorize::{AccessReview, AuthorizationOutcome, ProjectCache};
pub use channels::{Channel, ChannelHub, ChannelKey};
pub use error::{AccessError, StreamError};
pub use handler::handle_event_stream;
pub use session::{open_session, EventSink, Principal, Session, SessionTransport, Subscription};
pub use topic::{parse_topic, ProjectRef, ScopeMetadata, Topic};
