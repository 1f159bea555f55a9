// LNP/BP Core Library implementing LNPBP specifications & standards
// Written in 2019 by
//     Dr. Maxim Orlovsky <orlovsky@pandoracore.com>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Decoded gossip message fields. Wire deserialization itself is out of
//! scope for this crate (§1) — these structs are the contract a decoder
//! upstream of the routing core is assumed to produce, paired with the raw
//! message bytes the handlers still need for signature verification and
//! for re-broadcasting verbatim.

use crate::features::FeatureBits;
use crate::ids::{NodeId, ShortChannelId};

/// Decoded `channel_announcement` fields (§3, §4.3.1).
#[derive(Clone, Debug)]
pub struct ChannelAnnouncementFields {
    pub node_signature_1: [u8; 64],
    pub node_signature_2: [u8; 64],
    pub bitcoin_signature_1: [u8; 64],
    pub bitcoin_signature_2: [u8; 64],
    pub features: FeatureBits,
    pub chain_hash: [u8; 32],
    pub short_channel_id: ShortChannelId,
    pub node_id_1: NodeId,
    pub node_id_2: NodeId,
    pub bitcoin_key_1: NodeId,
    pub bitcoin_key_2: NodeId,
}

/// Decoded `channel_update` fields (§4.3.3).
#[derive(Clone, Debug)]
pub struct ChannelUpdateFields {
    pub signature: [u8; 64],
    pub chain_hash: [u8; 32],
    pub short_channel_id: ShortChannelId,
    pub timestamp: u32,
    pub message_flags: u8,
    pub channel_flags: u8,
    pub cltv_expiry_delta: u16,
    pub htlc_minimum_msat: u64,
    pub fee_base_msat: u32,
    pub fee_proportional_millionths: u32,
    pub htlc_maximum_msat: Option<u64>,
}

impl ChannelUpdateFields {
    /// Bit 0 of `channel_flags`: which of the channel's two halves this
    /// update describes.
    pub fn direction(&self) -> u8 {
        self.channel_flags & 0x01
    }

    /// Bit 1 of `channel_flags`: the direction is being marked disabled.
    pub fn disabled(&self) -> bool {
        self.channel_flags & 0x02 != 0
    }
}

/// Wire message type of `channel_update`, per the gossip message registry.
/// The failure handler (§4.6) uses this to validate a caller-supplied
/// replay payload's type tag without decoding the rest of the message.
pub const CHANNEL_UPDATE_MESSAGE_TYPE: u16 = 258;

/// Reads the 2-byte big-endian message type prefixing a raw gossip
/// message, or `None` if `raw` is too short to contain one.
pub fn peek_message_type(raw: &[u8]) -> Option<u16> {
    if raw.len() < 2 {
        None
    } else {
        Some(u16::from_be_bytes([raw[0], raw[1]]))
    }
}

/// Decoded `node_announcement` fields (§4.3.4). `addresses` is still the
/// raw address-list payload; [`crate::addr::parse_address_list`] is run by
/// the handler itself since its tolerant-parsing rule is part of this
/// crate's behavior, not the upstream decoder's.
#[derive(Clone, Debug)]
pub struct NodeAnnouncementFields {
    pub signature: [u8; 64],
    pub features: FeatureBits,
    pub timestamp: u32,
    pub node_id: NodeId,
    pub rgb_color: [u8; 3],
    pub alias: [u8; 32],
    pub addresses: Vec<u8>,
}
