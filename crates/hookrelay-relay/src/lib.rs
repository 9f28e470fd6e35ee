//! Webhook relay engine.
//!
//! Accepts inbound webhooks addressed to a named service, looks up that
//! service's currently-registered callback endpoint, and forwards the payload.
//! If no endpoint is registered (or the forward fails at the transport level),
//! the most recent payload is buffered until the service re-registers: one
//! slot per service, merged on conflict.

pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod probe;
pub mod router;
pub mod table;

pub use config::RelayConfig;
pub use delivery::Delivery;
pub use dispatcher::{DeliveryDispatcher, DispatchOutcome};
pub use error::RelayError;
pub use probe::{HttpLivenessProbe, LivenessProbe};
pub use router::{relay_router, RelayState};
pub use table::{ServiceEndpoint, ServiceTable};
