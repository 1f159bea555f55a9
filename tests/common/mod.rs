//! Shared fixtures for the cross-module scenario tests in this directory.
//! Fakes accept everything a real collaborator would reject only after
//! genuine cryptographic or I/O work, so these tests exercise the routing
//! core's own state machine without needing real secp256k1 keys.

use lnp_gossip_router::wire::CHANNEL_UPDATE_MESSAGE_TYPE;
use lnp_gossip_router::{
    BroadcastSlot, Broadcaster, ChainSource, ChannelAnnouncementFields,
    ChannelUpdateFields, CryptoVerifier, FeatureBits, MessageKind, NodeId,
    RoutingConfig, RoutingCore, RoutingKeyTag, ShortChannelId,
};

#[derive(Default)]
pub struct AcceptAll;

impl Broadcaster for AcceptAll {
    fn replace_broadcast(
        &mut self,
        _slot: &mut BroadcastSlot,
        _kind: MessageKind,
        _key: RoutingKeyTag,
        _payload: Vec<u8>,
    ) -> bool {
        false
    }
}

impl ChainSource for AcceptAll {
    fn request_confirmation(&self, _scid: ShortChannelId, _k1: NodeId, _k2: NodeId) {}
}

impl CryptoVerifier for AcceptAll {
    fn verify_ecdsa(&self, _msg_hash: &[u8; 32], _signature: &[u8; 64], _pubkey: &NodeId) -> bool {
        true
    }

    fn sha256d(&self, _data: &[u8]) -> [u8; 32] {
        [0; 32]
    }

    fn sha256(&self, _data: &[u8]) -> [u8; 32] {
        [0; 32]
    }

    fn siphash24(&self, seed: u64, scid: ShortChannelId) -> u64 {
        seed ^ scid.as_u64()
    }
}

/// The funding scriptPubKey `confirm_channel` expects given `AcceptAll`'s
/// constant `sha256`.
pub const EXPECTED_P2WSH: [u8; 34] = {
    let mut out = [0u8; 34];
    out[0] = 0x00;
    out[1] = 0x20;
    out
};

/// Real wall-clock seconds since the epoch, for fixtures that need a
/// `channel_update` timestamp the unseen-direction seed (`now -
/// prune_timeout/2`, computed against the real clock by `RoutingCore::now`)
/// will actually accept as fresher. Small literal timestamps like `1` or
/// `100` are below that seed and would be discarded as stale the moment a
/// channel is confirmed.
pub fn now_ts() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as u32
}

pub fn node_id(byte: u8) -> NodeId {
    let mut bytes = [0x02; 33];
    bytes[32] = byte;
    NodeId::from_bytes(bytes)
}

pub fn test_core() -> RoutingCore<AcceptAll, AcceptAll, AcceptAll> {
    let config = RoutingConfig::new(node_id(0), [0; 32], AcceptAll, AcceptAll, AcceptAll);
    RoutingCore::new(config)
}

pub fn test_core_with_prune_timeout(
    prune_timeout: u64,
) -> RoutingCore<AcceptAll, AcceptAll, AcceptAll> {
    let config = RoutingConfig::new(node_id(0), [0; 32], AcceptAll, AcceptAll, AcceptAll)
        .with_prune_timeout(prune_timeout);
    RoutingCore::new(config)
}

/// A `channel_announcement` payload long enough to pass the "is this
/// long enough to hold a signature" length check, paired with fields for
/// `(scid, a, b)`.
pub fn announcement(scid: ShortChannelId, a: NodeId, b: NodeId) -> (Vec<u8>, ChannelAnnouncementFields) {
    let fields = ChannelAnnouncementFields {
        node_signature_1: [0; 64],
        node_signature_2: [0; 64],
        bitcoin_signature_1: [0; 64],
        bitcoin_signature_2: [0; 64],
        features: FeatureBits::from_bytes(vec![]),
        chain_hash: [0; 32],
        short_channel_id: scid,
        node_id_1: a,
        node_id_2: b,
        bitcoin_key_1: a,
        bitcoin_key_2: b,
    };
    (vec![0u8; 300], fields)
}

pub fn update(
    scid: ShortChannelId,
    direction: u8,
    timestamp: u32,
    base_fee: u32,
    ppm: u32,
    delay: u16,
    disabled: bool,
) -> (Vec<u8>, ChannelUpdateFields) {
    let mut channel_flags = direction & 0x01;
    if disabled {
        channel_flags |= 0x02;
    }
    let fields = ChannelUpdateFields {
        signature: [0; 64],
        chain_hash: [0; 32],
        short_channel_id: scid,
        timestamp,
        message_flags: 0,
        channel_flags,
        cltv_expiry_delta: delay,
        htlc_minimum_msat: 0,
        fee_base_msat: base_fee,
        fee_proportional_millionths: ppm,
        htlc_maximum_msat: None,
    };
    let mut raw = vec![0u8; 100];
    raw[0..2].copy_from_slice(&CHANNEL_UPDATE_MESSAGE_TYPE.to_be_bytes());
    (raw, fields)
}
