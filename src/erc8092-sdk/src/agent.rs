//! Agent-account extraction from heterogeneous discovery profiles.
//!
//! Indexer payloads disagree on where the account address lives. Resolution
//! is an explicit ordered strategy list; the first strategy producing a
//! well-formed address wins.

use alloy_primitives::Address;
use serde_json::Value;

type Strategy = fn(&Value) -> Option<Address>;

/// Extraction strategies, in priority order.
const STRATEGIES: &[Strategy] = &[
    raw_json_agent_account,
    endpoint_last_segment,
    direct_agent_account,
    agent_owner,
];

/// Resolve the account address from an agent profile, or `None` if no
/// strategy yields a well-formed address.
pub fn pick_agent_account(profile: &Value) -> Option<Address> {
    STRATEGIES.iter().find_map(|strategy| strategy(profile))
}

fn parse_address(s: &str) -> Option<Address> {
    if !s.starts_with("0x") || s.len() != 42 {
        return None;
    }
    s.parse().ok()
}

/// `rawJson` is a stringified JSON blob whose `agentAccount` is the actual
/// account-abstraction address when present.
fn raw_json_agent_account(profile: &Value) -> Option<Address> {
    let raw = profile.get("rawJson")?.as_str()?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed: Value = serde_json::from_str(raw).ok()?;
    parse_address(parsed.get("agentAccount")?.as_str()?)
}

/// `agentAccountEndpoint` looks like `eip155:<chain>:0x<addr>`.
fn endpoint_last_segment(profile: &Value) -> Option<Address> {
    let endpoint = profile.get("agentAccountEndpoint")?.as_str()?;
    if !endpoint.contains(':') {
        return None;
    }
    parse_address(endpoint.rsplit(':').next()?)
}

fn direct_agent_account(profile: &Value) -> Option<Address> {
    parse_address(profile.get("agentAccount")?.as_str()?)
}

fn agent_owner(profile: &Value) -> Option<Address> {
    parse_address(profile.get("agentOwner")?.as_str()?)
}
