//! Sender classification: maps an inbound request fingerprint to a known
//! webhook sender identity.

use std::fmt;

/// Everything classification is allowed to look at.
#[derive(Debug, Clone)]
pub struct RequestFingerprint {
    /// Remote address the request arrived from.
    pub ip: String,
    /// User-agent header value, empty if absent.
    pub user_agent: String,
    /// All request headers as (name, value) pairs. Names are lowercase on
    /// the wire.
    pub headers: Vec<(String, String)>,
}

/// Known webhook senders. `Unknown` is the mandatory fallback:
/// classification never fails to produce an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderIdentity {
    GitHub,
    Sentry,
    Postman,
    Dbl,
    Unknown,
}

impl fmt::Display for SenderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SenderIdentity::GitHub => "Github",
            SenderIdentity::Sentry => "Sentry",
            SenderIdentity::Postman => "Postman",
            SenderIdentity::Dbl => "Dbl",
            SenderIdentity::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A classified sender, carrying the raw user-agent observed for later
/// inspection by the caller.
#[derive(Debug, Clone)]
pub struct ClassifiedSender {
    pub identity: SenderIdentity,
    pub user_agent: String,
}

type SenderPredicate = fn(&RequestFingerprint) -> bool;

/// Classification rules, evaluated in order; first match wins. The order is
/// load-bearing: predicates are not mutually exclusive (a signature header
/// beats any user-agent substring check), so keep this a list rather than
/// branching code.
const RULES: &[(SenderPredicate, SenderIdentity)] = &[
    (is_github, SenderIdentity::GitHub),
    (is_sentry, SenderIdentity::Sentry),
    (is_postman, SenderIdentity::Postman),
    (is_dbl, SenderIdentity::Dbl),
];

/// Classify a request fingerprint. Total: falls back to
/// [`SenderIdentity::Unknown`] with a diagnostic log of the IP, user-agent
/// and every header.
pub fn classify(fingerprint: &RequestFingerprint) -> ClassifiedSender {
    for (predicate, identity) in RULES {
        if predicate(fingerprint) {
            return ClassifiedSender {
                identity: *identity,
                user_agent: fingerprint.user_agent.clone(),
            };
        }
    }

    let headers = fingerprint
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    tracing::warn!(
        ip = %fingerprint.ip,
        user_agent = %fingerprint.user_agent,
        headers = %headers,
        "received webhook from unknown sender"
    );
    ClassifiedSender {
        identity: SenderIdentity::Unknown,
        user_agent: fingerprint.user_agent.clone(),
    }
}

fn is_github(fingerprint: &RequestFingerprint) -> bool {
    fingerprint
        .headers
        .iter()
        .any(|(name, _)| name.to_ascii_lowercase().starts_with("x-github"))
}

fn is_sentry(fingerprint: &RequestFingerprint) -> bool {
    fingerprint.user_agent.to_lowercase().starts_with("sentry")
}

fn is_postman(fingerprint: &RequestFingerprint) -> bool {
    fingerprint.user_agent.to_lowercase().contains("postman")
}

fn is_dbl(fingerprint: &RequestFingerprint) -> bool {
    fingerprint.user_agent == "DBL"
}
