use serde::{Deserialize, Serialize};

/// Network variants the wallet can run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Preprod,
    Preview,
}

impl Network {
    /// Network id carried in the low nibble of an address header.
    pub fn network_id(self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Preprod | Network::Preview => 0,
        }
    }

    pub fn is_mainnet(self) -> bool {
        matches!(self, Network::Mainnet)
    }

    pub fn default_l1_url(self) -> &'static str {
        match self {
            Network::Mainnet => "https://cardano-mainnet.blockfrost.io/api/v0",
            Network::Preprod => "https://cardano-preprod.blockfrost.io/api/v0",
            Network::Preview => "https://cardano-preview.blockfrost.io/api/v0",
        }
    }

    /// Human-readable prefix of payment addresses on this network.
    pub fn address_prefix(self) -> &'static str {
        if self.is_mainnet() { "addr" } else { "addr_test" }
    }

    /// Human-readable prefix of reward (stake) addresses on this network.
    pub fn stake_prefix(self) -> &'static str {
        if self.is_mainnet() { "stake" } else { "stake_test" }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Preprod => "preprod",
            Network::Preview => "preview",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "preprod" | "testnet" => Ok(Network::Preprod),
            "preview" => Ok(Network::Preview),
            _ => Err(format!("invalid network: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_roundtrip() {
        for network in [Network::Mainnet, Network::Preprod, Network::Preview] {
            assert_eq!(network.as_str().parse::<Network>().unwrap(), network);
        }
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Preprod);
        assert!("liquid".parse::<Network>().is_err());
    }

    #[test]
    fn network_ids() {
        assert_eq!(Network::Mainnet.network_id(), 1);
        assert_eq!(Network::Preview.network_id(), 0);
        assert_eq!(Network::Preprod.address_prefix(), "addr_test");
        assert_eq!(Network::Mainnet.stake_prefix(), "stake");
        assert_eq!(Network::Preview.stake_prefix(), "stake_test");
    }
}
