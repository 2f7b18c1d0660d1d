//! Metadata about who asked for a signature and what is being signed.
//!
//! The hash of the encoded originator is embedded in every signing message, so
//! a signature produced for one requester can never be replayed as another's.

use crate::common::hash::hash_bytes;
use crate::crypto::ecpoint::ECPoint;
use crate::tss::error::{Error, Result};
use crate::tss::params::Params;
use crate::tss::types::SigningId;

pub const DIRECT_ORIGINATOR_PREFIX: [u8; 4] = [0xb3, 0x9f, 0xa5, 0xd2];
pub const TUNNEL_ORIGINATOR_PREFIX: [u8; 4] = [0x72, 0xeb, 0xe8, 0x3d];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Originator {
    /// A request made straight to the chain by an account or module.
    Direct { source_chain_id: String, requester: String, memo: String },
    /// A request relayed through a tunnel towards a destination contract.
    Tunnel {
        source_chain_id: String,
        tunnel_id: u64,
        destination_chain_id: String,
        destination_contract_address: String,
    },
}

impl Originator {
    pub fn direct(source_chain_id: impl Into<String>, requester: impl Into<String>, memo: impl Into<String>) -> Self {
        Originator::Direct {
            source_chain_id: source_chain_id.into(),
            requester: requester.into(),
            memo: memo.into(),
        }
    }

    pub fn validate(&self, params: &Params) -> Result<()> {
        match self {
            Originator::Direct { source_chain_id, requester, memo } => {
                if source_chain_id.is_empty() {
                    return Err(Error::InvalidOriginator("source chain ID cannot be empty".to_string()));
                }
                if requester.is_empty() {
                    return Err(Error::InvalidOriginator("requester cannot be empty".to_string()));
                }
                if memo.len() as u64 > params.max_memo_length {
                    return Err(Error::InvalidOriginator(format!(
                        "memo length exceeds maximum length of {}",
                        params.max_memo_length
                    )));
                }
            }
            Originator::Tunnel { source_chain_id, tunnel_id, destination_chain_id, destination_contract_address } => {
                if source_chain_id.is_empty() {
                    return Err(Error::InvalidOriginator("source chain ID cannot be empty".to_string()));
                }
                if *tunnel_id == 0 {
                    return Err(Error::InvalidOriginator("tunnel ID cannot be zero".to_string()));
                }
                if destination_contract_address.is_empty() {
                    return Err(Error::InvalidOriginator("destination contract address cannot be empty".to_string()));
                }
                if destination_chain_id.is_empty() {
                    return Err(Error::InvalidOriginator("destination chain ID cannot be empty".to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bz = Vec::with_capacity(4 + 3 * 32 + 8);
        match self {
            Originator::Direct { source_chain_id, requester, memo } => {
                bz.extend_from_slice(&DIRECT_ORIGINATOR_PREFIX);
                bz.extend_from_slice(&hash_bytes(source_chain_id.as_bytes()));
                bz.extend_from_slice(&hash_bytes(requester.as_bytes()));
                bz.extend_from_slice(&hash_bytes(memo.as_bytes()));
            }
            Originator::Tunnel { source_chain_id, tunnel_id, destination_chain_id, destination_contract_address } => {
                bz.extend_from_slice(&TUNNEL_ORIGINATOR_PREFIX);
                bz.extend_from_slice(&hash_bytes(source_chain_id.as_bytes()));
                bz.extend_from_slice(&tunnel_id.to_be_bytes());
                bz.extend_from_slice(&hash_bytes(destination_chain_id.as_bytes()));
                bz.extend_from_slice(&hash_bytes(destination_contract_address.as_bytes()));
            }
        }
        bz
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Originator::Direct { .. } => "DirectOriginator",
            Originator::Tunnel { .. } => "TunnelOriginator",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// Arbitrary bytes.
    Text(Vec<u8>),
    /// Attestation by the current group that `pub_key` takes over at `exec_time`.
    GroupTransition { pub_key: ECPoint, exec_time: u64 },
}

fn content_prefix(name: &str) -> [u8; 4] {
    let digest = hash_bytes(name.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

impl Content {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Content::Text(data) => {
                let mut bz = content_prefix("Text").to_vec();
                bz.extend_from_slice(data);
                bz
            }
            Content::GroupTransition { pub_key, exec_time } => {
                let mut bz = content_prefix("GroupTransition").to_vec();
                bz.extend_from_slice(&pub_key.to_bytes());
                bz.extend_from_slice(&exec_time.to_be_bytes());
                bz
            }
        }
    }
}

/// H(originator) || block_time || signing_id || content
pub fn signing_message(originator: &Originator, block_time: u64, signing_id: SigningId, content: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(32 + 16 + content.len());
    msg.extend_from_slice(&hash_bytes(&originator.encode()));
    msg.extend_from_slice(&block_time.to_be_bytes());
    msg.extend_from_slice(&signing_id.to_be_bytes());
    msg.extend_from_slice(content);
    msg
}
