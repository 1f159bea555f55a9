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

//! `channel_announcement` ingestion (§4.3.1).

use log::{debug, trace};

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::constants::CHANNEL_ANNOUNCEMENT_SIG_OFFSET;
use crate::core::RoutingCore;
use crate::gossip::Outcome;
use crate::wire::ChannelAnnouncementFields;

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Validates and stages a `channel_announcement`. On success, kicks
    /// off an asynchronous on-chain confirmation request whose result
    /// arrives later through [`RoutingCore::confirm_channel`].
    pub fn handle_channel_announcement(
        &mut self,
        raw: &[u8],
        fields: ChannelAnnouncementFields,
    ) -> Outcome {
        let scid = fields.short_channel_id;

        if self.graph.lookup_channel(scid).map_or(false, |c| c.public) {
            debug!("channel_announcement {}: already public, discarding", scid);
            return Outcome::Discarded;
        }
        if self.pending.contains(scid) {
            debug!("channel_announcement {}: already pending, discarding", scid);
            return Outcome::Discarded;
        }
        if fields.chain_hash != self.config.chain_hash {
            debug!("channel_announcement {}: wrong chain, discarding", scid);
            return Outcome::Discarded;
        }
        if fields
            .features
            .has_unknown_even_bit(&self.config.known_feature_bits)
        {
            debug!(
                "channel_announcement {}: unknown even feature bit, discarding",
                scid
            );
            return Outcome::Discarded;
        }
        if raw.len() <= CHANNEL_ANNOUNCEMENT_SIG_OFFSET {
            trace!("channel_announcement {}: payload too short, discarding", scid);
            return Outcome::Discarded;
        }

        let payload = &raw[CHANNEL_ANNOUNCEMENT_SIG_OFFSET..];
        let msg_hash = self.config.crypto.sha256d(payload);
        let signatures = [
            (&fields.node_signature_1, &fields.node_id_1),
            (&fields.node_signature_2, &fields.node_id_2),
            (&fields.bitcoin_signature_1, &fields.bitcoin_key_1),
            (&fields.bitcoin_signature_2, &fields.bitcoin_key_2),
        ];
        for (signature, pubkey) in signatures {
            if !self.config.crypto.verify_ecdsa(&msg_hash, signature, pubkey) {
                trace!(
                    "channel_announcement {}: signature verification failed, discarding",
                    scid
                );
                return Outcome::Discarded;
            }
        }

        let node_ids = [fields.node_id_1, fields.node_id_2];
        let funding_keys = [fields.bitcoin_key_1, fields.bitcoin_key_2];
        self.pending.insert_pending_channel(
            scid,
            node_ids,
            funding_keys,
            fields,
            raw.to_vec(),
        );
        self.config
            .chain_source
            .request_confirmation(scid, funding_keys[0], funding_keys[1]);
        Outcome::Deferred
    }
}
