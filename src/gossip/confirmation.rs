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

//! On-chain confirmation callback (§4.3.2): promotes a pending channel
//! announcement into the public graph once its funding output is
//! observed, or drops it if the output turns out spent or mismatched.

use bitcoin::blockdata::opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_2};
use bitcoin::blockdata::script::Builder;
use log::{debug, error, warn};

use crate::collaborators::{
    Broadcaster, ChainSource, CryptoVerifier, MessageKind, RoutingKeyTag,
};
use crate::core::RoutingCore;
use crate::error::{Result, RoutingError};
use crate::ids::{NodeId, ShortChannelId};

/// Re-derives the expected P2WSH scriptPubKey for a channel's 2-of-2
/// funding multisig, per §3/§4.3.2: `OP_2 <key_lo> <key_hi> OP_2
/// OP_CHECKMULTISIG`, witness-script-hashed, keys sorted ascending as the
/// multisig convention requires regardless of which key announced as
/// `bitcoin_key_1`/`_2`.
///
/// The witness-program hash is a single SHA-256 of the witness script
/// (BIP141), not a double SHA-256 — using `sha256d` here would never match
/// a genuine on-chain funding output.
fn expected_p2wsh(
    crypto: &impl CryptoVerifier,
    key_a: &NodeId,
    key_b: &NodeId,
) -> Vec<u8> {
    let (lo, hi) = if key_a.as_bytes() <= key_b.as_bytes() {
        (key_a, key_b)
    } else {
        (key_b, key_a)
    };
    let redeem_script = Builder::new()
        .push_opcode(OP_PUSHNUM_2)
        .push_slice(lo.as_bytes())
        .push_slice(hi.as_bytes())
        .push_opcode(OP_PUSHNUM_2)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script();
    let hash = crypto.sha256(redeem_script.as_bytes());
    let mut script_pubkey = vec![0x00, 0x20];
    script_pubkey.extend_from_slice(&hash);
    script_pubkey
}

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Delivers the on-chain collaborator's asynchronous confirmation
    /// result for a previously requested `scid`. Returns `Ok(true)` iff
    /// the channel was adopted and either endpoint is the local node.
    ///
    /// Returns `Err` only for the internal-invariant violation described
    /// in §4.3.2 step 5/§7: the broadcast collaborator reporting that it
    /// replaced an existing entry on what should have been this
    /// channel's first publish.
    pub fn confirm_channel(
        &mut self,
        scid: ShortChannelId,
        value_sat: u64,
        outscript: &[u8],
    ) -> Result<bool> {
        let pending = match self.pending.get(scid) {
            Some(pending) => pending.clone(),
            None => {
                debug!("confirm_channel {}: not ours, ignoring", scid);
                return Ok(false);
            }
        };

        if outscript.is_empty() {
            debug!(
                "confirm_channel {}: funding output spent, dropping pending entry",
                scid
            );
            self.drop_pending_channel(scid);
            return Ok(false);
        }

        let expected =
            expected_p2wsh(&self.config.crypto, &pending.funding_keys[0], &pending.funding_keys[1]);
        if outscript != expected.as_slice() {
            warn!(
                "confirm_channel {}: funding scriptPubKey mismatch, dropping pending entry",
                scid
            );
            self.drop_pending_channel(scid);
            return Ok(false);
        }

        let pending = self
            .pending
            .remove_pending_channel(scid)
            .expect("presence checked above, core is single-threaded");

        let now = self.now();
        let prune_timeout = self.config.prune_timeout;
        let channel = self.graph.create_channel(
            scid,
            pending.node_ids[0],
            pending.node_ids[1],
            value_sat,
            true,
            now,
            prune_timeout,
        );
        channel.public = true;
        channel.capacity_sat = value_sat;
        channel.announcement = Some(pending.raw.clone());

        let replaced = self.config.broadcaster.replace_broadcast(
            &mut channel.broadcast_slot,
            MessageKind::ChannelAnnouncement,
            RoutingKeyTag::Scid(scid),
            pending.raw.clone(),
        );
        if replaced {
            error!(
                "confirm_channel {}: broadcast collaborator replaced an existing \
                 announcement on first publish",
                scid
            );
            return Err(RoutingError::BroadcastReplacedExistingAnnouncement(scid));
        }

        // §5: deferred updates are replayed in direction order 0 then 1,
        // through the normal channel_update handler so they get the same
        // signature/staleness checks a live update would.
        for update in pending.deferred_updates.into_iter().flatten() {
            self.handle_channel_update(&update.raw, update.fields);
        }

        let mut is_local = false;
        for node_id in pending.node_ids {
            is_local = is_local || node_id == self.local_node_id();
            if let Some(announcement) = self.pending.release_node_reference(node_id) {
                self.apply_node_announcement(node_id, announcement);
            }
        }

        Ok(is_local)
    }

    fn drop_pending_channel(&mut self, scid: ShortChannelId) {
        if let Some(pending) = self.pending.remove_pending_channel(scid) {
            for node_id in pending.node_ids {
                // The channel never gets created, so any deferred node
                // descriptor released here has no node to attach to and
                // is discarded along with the pending entry.
                self.pending.release_node_reference(node_id);
            }
        }
    }
}
