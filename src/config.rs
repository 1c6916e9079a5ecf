//! Network configuration
//!
//! Explicit table of supported networks and their transaction-service
//! hosts. Unknown chain/network combinations are rejected at
//! construction time, never at first use.

use crate::error::{SafeError, SafeResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Networks with a deployed transaction service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Bsc,
    Gnosis,
    Polygon,
}

impl Network {
    /// Every supported network, for exhaustive validation
    pub const ALL: [Network; 4] = [
        Network::Ethereum,
        Network::Bsc,
        Network::Gnosis,
        Network::Polygon,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Bsc => 56,
            Network::Gnosis => 100,
            Network::Polygon => 137,
        }
    }

    /// Base URL of the network's transaction service
    pub fn transaction_service_host(self) -> &'static str {
        match self {
            Network::Ethereum => "https://safe-transaction.gnosis.io/api/v1",
            Network::Bsc => "https://safe-transaction.bsc.gnosis.io/api/v1",
            Network::Gnosis => "https://safe-transaction.xdai.gnosis.io/api/v1",
            Network::Polygon => "https://safe-transaction.polygon.gnosis.io/api/v1",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> SafeResult<Self> {
        Network::ALL
            .iter()
            .copied()
            .find(|n| n.chain_id() == chain_id)
            .ok_or_else(|| {
                SafeError::configuration(format!("Unsupported chain id: {}", chain_id))
            })
    }
}

/// Contract versions with a known singleton deployment
const SUPPORTED_VERSIONS: [(u64, u64, u64); 5] =
    [(1, 0, 0), (1, 1, 1), (1, 2, 0), (1, 3, 0), (1, 4, 1)];

/// Parse and validate an account version string
pub fn validate_version(version: &str) -> SafeResult<semver::Version> {
    let parsed = semver::Version::parse(version)?;
    let triple = (parsed.major, parsed.minor, parsed.patch);
    if SUPPORTED_VERSIONS.contains(&triple) {
        Ok(parsed)
    } else {
        Err(SafeError::configuration("Wrong version or network")
            .with_details(format!("version {}", version)))
    }
}

/// Contract versions at or above 1.3.0 no longer need a safeTxGas
/// allowance for the internal execution guard.
pub fn is_legacy_version(version: &semver::Version) -> bool {
    *version < semver::Version::new(1, 3, 0)
}

/// Validate a custom transaction-service host
///
/// Accepts only absolute https URLs. Used when a host application points
/// the relay client at a self-hosted service.
pub fn validate_service_host(host: &str) -> SafeResult<String> {
    let url = Url::parse(host)
        .map_err(|e| SafeError::configuration(format!("Invalid service host: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(SafeError::configuration(format!(
            "Unsupported service host scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(SafeError::configuration("Service host has no hostname"));
    }

    Ok(host.trim_end_matches('/').to_string())
}
