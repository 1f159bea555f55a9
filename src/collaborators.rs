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

//! External collaborators (§6): the routing core is deliberately ignorant
//! of wire framing, on-chain state and cryptography, and instead depends
//! on these traits so that an embedder — or a test — can supply its own.

use bitcoin::hashes::Hash;
use bitcoin::secp256k1;
use siphasher::sip::SipHasher24;
use std::hash::Hasher;

use crate::ids::{NodeId, ShortChannelId};

/// A handle the graph store hands to the broadcast collaborator so it can
/// later replace the same outbound gossip message in place. Opaque to the
/// routing core; `0` means "never published".
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BroadcastSlot(pub u64);

/// The three gossip message kinds the broadcast collaborator fans out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MessageKind {
    ChannelAnnouncement,
    ChannelUpdate,
    NodeAnnouncement,
}

/// The routing key a broadcast entry is indexed by, per §6.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoutingKeyTag {
    Scid(ShortChannelId),
    ScidDirection(ShortChannelId, u8),
    NodeId(NodeId),
}

/// Replaces/indexes outbound gossip messages for later re-transmission to
/// peers. Out of scope for this crate's own logic — see §1 — but the core
/// still needs a handle to call into it and to detect the "replaced an
/// existing entry on first publish" anomaly called out in §4.3.2/§7.
pub trait Broadcaster {
    /// Stores `payload` under `key`, updating `slot` in place. Returns
    /// `true` if this call replaced a previously broadcast message.
    fn replace_broadcast(
        &mut self,
        slot: &mut BroadcastSlot,
        kind: MessageKind,
        key: RoutingKeyTag,
        payload: Vec<u8>,
    ) -> bool;
}

/// Asks the on-chain backend to confirm a funding output exists and is
/// unspent. The core only *requests* confirmation here; the result arrives
/// later through `RoutingCore::confirm_channel` (§4.3.2), since the whole
/// point of this collaborator is that it does its work off the core's
/// single cooperative thread.
pub trait ChainSource {
    fn request_confirmation(
        &self,
        scid: ShortChannelId,
        funding_key_1: NodeId,
        funding_key_2: NodeId,
    );
}

/// Cryptographic primitives the gossip handlers and pathfinder need:
/// signature verification over a fixed message digest, double-SHA256 (for
/// message-digest hashing ahead of signature verification), single SHA-256
/// (for re-deriving a P2WSH funding output's witness-program hash — BIP141
/// hashes the witness script once, not twice) and SipHash-2-4 (for
/// deterministic per-request fee fuzzing).
pub trait CryptoVerifier {
    fn verify_ecdsa(
        &self,
        msg_hash: &[u8; 32],
        signature: &[u8; 64],
        pubkey: &NodeId,
    ) -> bool;

    fn sha256d(&self, data: &[u8]) -> [u8; 32];

    fn sha256(&self, data: &[u8]) -> [u8; 32];

    fn siphash24(&self, seed: u64, scid: ShortChannelId) -> u64;
}

/// Production [`CryptoVerifier`] built on the same `secp256k1`/`bitcoin`
/// primitives the rest of the Bitcoin ecosystem uses, plus `siphasher` for
/// SipHash-2-4. Provided so the crate is runnable end to end without an
/// embedder having to wire up their own crypto glue; tests typically
/// substitute a fake that always accepts, since exercising real signatures
/// would require generating keypairs for every fixture.
#[derive(Clone, Copy, Default)]
pub struct Secp256k1Verifier;

impl CryptoVerifier for Secp256k1Verifier {
    fn verify_ecdsa(
        &self,
        msg_hash: &[u8; 32],
        signature: &[u8; 64],
        pubkey: &NodeId,
    ) -> bool {
        let pk = match pubkey.to_pubkey() {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let sig = match secp256k1::ecdsa::Signature::from_compact(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let msg = match secp256k1::Message::from_slice(msg_hash) {
            Ok(msg) => msg,
            Err(_) => return false,
        };
        let secp = secp256k1::Secp256k1::verification_only();
        secp.verify_ecdsa(&msg, &sig, &pk).is_ok()
    }

    fn sha256d(&self, data: &[u8]) -> [u8; 32] {
        bitcoin::hashes::sha256d::Hash::hash(data).into_inner()
    }

    fn sha256(&self, data: &[u8]) -> [u8; 32] {
        bitcoin::hashes::sha256::Hash::hash(data).into_inner()
    }

    fn siphash24(&self, seed: u64, scid: ShortChannelId) -> u64 {
        let mut hasher = SipHasher24::new_with_keys(seed, 0);
        hasher.write_u64(scid.as_u64());
        hasher.finish()
    }
}
