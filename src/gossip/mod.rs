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

//! Gossip handlers (C3): validate, deduplicate and apply the three
//! gossip message kinds, plus the on-chain confirmation callback that
//! promotes a pending channel into the public graph.

pub mod channel_announcement;
pub mod channel_update;
pub mod confirmation;
pub mod node_announcement;

/// What a gossip handler did with a message. Per the error taxonomy
/// (§4.9), none of these are `Result::Err` — only the fatal/internal-
/// invariant class returns `Err`, and that class is confined to
/// [`crate::core::RoutingCore::confirm_channel`], [`crate::core::RoutingCore::routing_failure`]
/// and [`crate::core::RoutingCore::prune`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    /// Applied to the graph (and, where applicable, re-broadcast).
    Accepted,
    /// Staged pending an announcement or on-chain confirmation that
    /// hasn't arrived yet.
    Deferred,
    /// Dropped for any of the reasons in §7's non-fatal rows: malformed,
    /// wrong chain, stale, duplicate, unauthenticated, or orphaned.
    Discarded,
}
