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

//! The crate-wide error type.
//!
//! Only the "fatal / internal invariant" class from the routing core's
//! error taxonomy is represented here. Every other outcome (malformed
//! input, stale timestamp, unknown reference, duplicate, ...) is terminal
//! but *not* an error: the gossip handlers report it through their own
//! `Outcome` return values instead, so that ordinary peer noise never
//! forces a caller through error-handling machinery.

use crate::ids::{NodeId, ShortChannelId};

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum RoutingError {
    /// broadcast collaborator reported it replaced an existing announcement
    /// for channel {0} on first publish; the graph and the broadcast store
    /// have diverged
    BroadcastReplacedExistingAnnouncement(ShortChannelId),

    /// channel {scid} is missing from the incident list of node {node}; a
    /// prior mutation violated the graph's bookkeeping invariant
    InconsistentIncidentList { node: NodeId, scid: ShortChannelId },

    /// pruner visited channel {0} but one of its endpoint nodes had no
    /// back-reference to it
    PrunerSawMissingHalf(ShortChannelId),

    /// collaborator reported a fatal condition: {0}
    Collaborator(String),
}

pub type Result<T> = std::result::Result<T, RoutingError>;
