//! Teleport permission model
//!
//! Permission nodes are dotted strings rooted at `multiverse.teleport`:
//! - `multiverse.teleport.self.w.otherworld` - teleport yourself to the
//!   spawn of world `otherworld`
//! - `multiverse.teleport.other.w.otherworld` - teleport someone else there
//! - With finer permissions off the node stops at the destination type,
//!   so `multiverse.teleport.self.w` covers every world spawn
//!
//! Check order (first match wins):
//! 1. Console bypass: console actors may teleport anyone anywhere
//! 2. Node match: exact node, global `*`, or ancestor wildcard (`a.b.*`)
//! 3. Default: denied

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::destination::ResolvedDestination;

/// Root of every teleport permission node
pub const TELEPORT_PERM_ROOT: &str = "multiverse.teleport";

/// Name reported for console actors
pub const CONSOLE_NAME: &str = "CONSOLE";

/// Who the teleport moves relative to the actor issuing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Actor teleports themself
    ToSelf,
    /// Actor teleports someone else
    ToOther,
}

impl Relation {
    /// Node segment for this relation
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::ToSelf => "self",
            Relation::ToOther => "other",
        }
    }

    /// Relation between an actor and a named target (exact name match)
    pub fn between(actor_id: &str, target_id: &str) -> Self {
        if actor_id == target_id {
            Relation::ToSelf
        } else {
            Relation::ToOther
        }
    }
}

/// A set of granted permission nodes with wildcard matching
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    nodes: HashSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission node
    pub fn grant(&mut self, node: impl Into<String>) {
        self.nodes.insert(node.into());
    }

    /// Revoke a permission node. Returns false if it was not granted.
    pub fn revoke(&mut self, node: &str) -> bool {
        self.nodes.remove(node)
    }

    /// Check if this set covers the given node.
    ///
    /// A node is covered by an exact grant, the global `*`, or any
    /// ancestor wildcard: `a.b.c` is covered by `a.b.*` and `a.*`.
    pub fn has(&self, node: &str) -> bool {
        if self.nodes.contains(node) {
            return true;
        }
        if self.nodes.contains("*") {
            return true;
        }

        let mut prefix = node;
        while let Some(idx) = prefix.rfind('.') {
            prefix = &prefix[..idx];
            if self.nodes.contains(&format!("{}.*", prefix)) {
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Identity issuing a teleport command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Actor name; for players this is the player name
    pub id: String,
    /// Granted permission nodes
    pub perms: PermissionSet,
    /// Console actors bypass every permission check
    pub console: bool,
}

impl Actor {
    /// The server console
    pub fn console() -> Self {
        Self {
            id: CONSOLE_NAME.to_string(),
            perms: PermissionSet::new(),
            console: true,
        }
    }

    /// A player with no grants
    pub fn player(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            perms: PermissionSet::new(),
            console: false,
        }
    }

    /// A player with an existing grant set
    pub fn with_perms(id: impl Into<String>, perms: PermissionSet) -> Self {
        Self {
            id: id.into(),
            perms,
            console: false,
        }
    }

    /// Add a grant, fluent style
    pub fn granted(mut self, node: impl Into<String>) -> Self {
        self.perms.grant(node);
        self
    }
}

/// Result of a teleport permission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionResult {
    /// Teleport is allowed
    Allowed,
    /// Teleport denied; `node` is the grant that would have allowed it
    Denied { node: String },
}

impl PermissionResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PermissionResult::Allowed)
    }

    /// The missing node for a denial, if any
    pub fn denied_node(&self) -> Option<&str> {
        match self {
            PermissionResult::Allowed => None,
            PermissionResult::Denied { node } => Some(node),
        }
    }
}

/// Pure teleport permission checker
///
/// Granularity is fixed at construction: callers snapshot the engine
/// config and build a checker per dispatch, so a runtime toggle never
/// changes the rules of an in-flight request.
#[derive(Debug, Clone, Copy)]
pub struct PermissionChecker {
    finer: bool,
}

impl PermissionChecker {
    /// Create a checker with the given permission granularity
    pub fn new(finer: bool) -> Self {
        Self { finer }
    }

    /// Whether finer (per-destination) nodes are required
    pub fn finer(&self) -> bool {
        self.finer
    }

    /// The node required to teleport `relation` to a destination.
    ///
    /// This is the single place permission node strings are formatted.
    /// `suffix` names the specific destination (the world name) and is
    /// ignored in coarse mode.
    pub fn required_node(&self, relation: Relation, type_id: &str, suffix: &str) -> String {
        if self.finer {
            format!(
                "{}.{}.{}.{}",
                TELEPORT_PERM_ROOT,
                relation.as_str(),
                type_id,
                suffix
            )
        } else {
            format!("{}.{}.{}", TELEPORT_PERM_ROOT, relation.as_str(), type_id)
        }
    }

    /// Check whether `actor` may teleport `target_id` to `dest`
    pub fn can_teleport(
        &self,
        actor: &Actor,
        target_id: &str,
        dest: &ResolvedDestination,
    ) -> PermissionResult {
        // 1. Console bypass
        if actor.console {
            return PermissionResult::Allowed;
        }

        // 2. Node match
        let relation = Relation::between(&actor.id, target_id);
        let node = self.required_node(relation, dest.type_id(), dest.finer_suffix());
        if actor.perms.has(&node) {
            return PermissionResult::Allowed;
        }

        // 3. Default: denied
        PermissionResult::Denied { node }
    }
}
