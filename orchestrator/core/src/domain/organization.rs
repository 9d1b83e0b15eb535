// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Organization Model
//!
//! In-memory description of the organization a caller wants provisioned:
//!
//! - [`Group`] — one organizational unit and the names of its declared subgroups.
//! - [`RoleAssignment`] — role name → agents playing that role.
//! - [`EntityGroup`] — a group paired with its role assignment (unit of deployment).
//! - [`DeploymentBatch`] — the ordered entity groups plus organization name and scheme.
//!
//! Subgroup references are weak: a group only records the *names* of the groups
//! it nominally contains. The same group may appear under several parents and
//! cycles are allowed; nothing here owns another group's lifecycle.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique group name as declared by the caller (e.g. `FieldGroup`).
    pub name: String,

    /// Names of the groups this group nominally contains, in declaration order.
    #[serde(default)]
    pub subgroups: IndexSet<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subgroups: IndexSet::new(),
        }
    }

    /// Add subgroup references. Duplicate names are collapsed.
    pub fn with_subgroups<I, S>(mut self, subgroups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subgroups.extend(subgroups.into_iter().map(Into::into));
        self
    }

    /// Identifier used to address this group on the runtime.
    ///
    /// The runtime lower-cases artifact identifiers, so `FarmGroup` and
    /// `farmgroup` address the same artifact.
    pub fn runtime_id(&self) -> String {
        runtime_id(&self.name)
    }
}

/// Lower-cased runtime identifier for any group name.
pub fn runtime_id(name: &str) -> String {
    name.to_lowercase()
}

/// Role name → set of agent identifiers playing that role.
///
/// Iteration order is deterministic (sorted) but carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleAssignment(BTreeMap<String, BTreeSet<String>>);

impl RoleAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `agent` to `role`. Returns `false` if the pair was already present.
    pub fn assign(&mut self, role: impl Into<String>, agent: impl Into<String>) -> bool {
        self.0.entry(role.into()).or_default().insert(agent.into())
    }

    pub fn with(mut self, role: impl Into<String>, agents: &[&str]) -> Self {
        let role = role.into();
        for agent in agents {
            self.assign(role.clone(), *agent);
        }
        self
    }

    /// Every (role, agent) pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(role, agents)| {
            agents.iter().map(move |agent| (role.as_str(), agent.as_str()))
        })
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn agents_for(&self, role: &str) -> Option<&BTreeSet<String>> {
        self.0.get(role)
    }

    /// Number of (role, agent) pairs.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(String, BTreeSet<String>)> for RoleAssignment {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        let mut assignment = Self::new();
        for (role, agents) in iter {
            assignment.0.entry(role).or_default().extend(agents);
        }
        assignment
    }
}

/// A group together with the agents playing roles in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub group: Group,
    #[serde(default)]
    pub players: RoleAssignment,
}

impl EntityGroup {
    pub fn new(group: Group, players: RoleAssignment) -> Self {
        Self { group, players }
    }
}

/// Normative scheme created under the organization and attached to its first group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSpec {
    /// Runtime artifact identifier of the scheme.
    pub id: String,
    /// Scheme name inside the organization specification.
    pub name: String,
}

impl Default for SchemeSpec {
    fn default() -> Self {
        Self {
            id: "orgscheme".to_string(),
            name: "orgScheme".to_string(),
        }
    }
}

/// Everything needed to provision one organization.
///
/// Built by the caller before deployment and only borrowed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentBatch {
    pub organization: String,
    #[serde(default)]
    pub scheme: SchemeSpec,
    pub groups: Vec<EntityGroup>,
}

impl DeploymentBatch {
    pub fn new(organization: impl Into<String>, groups: Vec<EntityGroup>) -> Self {
        Self {
            organization: organization.into(),
            scheme: SchemeSpec::default(),
            groups,
        }
    }

    pub fn with_scheme(mut self, scheme: SchemeSpec) -> Self {
        self.scheme = scheme;
        self
    }

    /// Runtime id of the group the scheme is attached to.
    ///
    /// An empty batch yields an empty string; the attachment call is still
    /// issued and targets a degenerate artifact id.
    pub fn scheme_target(&self) -> String {
        self.groups
            .first()
            .map(|entity| entity.group.runtime_id())
            .unwrap_or_default()
    }

    /// Total number of (role, agent) pairs across all groups.
    pub fn notification_count(&self) -> usize {
        self.groups.iter().map(|entity| entity.players.len()).sum()
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.iter().any(|entity| entity.group.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_id_is_lowercase() {
        assert_eq!(Group::new("AnimalsGroup").runtime_id(), "animalsgroup");
    }

    #[test]
    fn test_subgroups_deduplicate_and_keep_order() {
        let group = Group::new("FarmGroup").with_subgroups(["FieldGroup", "AnimalsGroup", "FieldGroup"]);
        let names: Vec<&str> = group.subgroups.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["FieldGroup", "AnimalsGroup"]);
    }

    #[test]
    fn test_role_assignment_pairs() {
        let mut players = RoleAssignment::new();
        assert!(players.assign("Feeder", "agent3"));
        assert!(!players.assign("Feeder", "agent3"));
        players.assign("Vet", "agent5");
        players.assign("Vet", "agent6");

        assert_eq!(players.len(), 3);
        let mut pairs: Vec<(&str, &str)> = players.pairs().collect();
        pairs.sort();
        assert_eq!(pairs, vec![("Feeder", "agent3"), ("Vet", "agent5"), ("Vet", "agent6")]);
    }

    #[test]
    fn test_scheme_target() {
        let batch = DeploymentBatch::new(
            "smart-farming",
            vec![EntityGroup::new(Group::new("FarmGroup"), RoleAssignment::new())],
        );
        assert_eq!(batch.scheme_target(), "farmgroup");

        let empty = DeploymentBatch::new("smart-farming", vec![]);
        assert_eq!(empty.scheme_target(), "");
    }
}
