//! Embeddable client for the hookrelay webhook relay.
//!
//! Opens a local inbound endpoint, registers it (and its port) with the
//! relay, and hands forwarded payloads to application-supplied listeners,
//! classifying the original sender from the request fingerprint.

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod handshake;
pub mod router;
pub mod sender;

pub use client::{RelayClient, RelayClientHandle};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{InboundEvent, WebhookBatchReceiveEvent, WebhookListener, WebhookReceiveEvent};
pub use sender::{classify, ClassifiedSender, RequestFingerprint, SenderIdentity};
