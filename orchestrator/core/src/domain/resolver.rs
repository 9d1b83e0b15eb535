// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Subgroup dependency resolution.
//!
//! Derives the parent → subgroup attachments that are valid for one batch.
//! Subgroup references to groups that are not deployed in the same batch are
//! dropped without error. Cycles are passed through untouched: attachment is
//! idempotent on the runtime, so a cycle only yields redundant calls.

use crate::domain::organization::EntityGroup;
use indexmap::{IndexMap, IndexSet};

/// Parent group name → ordered subgroup names, both as declared by the caller.
pub type SubgroupMap = IndexMap<String, Vec<String>>;

/// Build the attachment map for `groups`.
///
/// Parents appear in batch order, subgroups in declaration order. Parents with
/// no in-batch subgroup are omitted entirely.
pub fn resolve_subgroups(groups: &[EntityGroup]) -> SubgroupMap {
    let deployed: IndexSet<&str> = groups
        .iter()
        .map(|entity| entity.group.name.as_str())
        .collect();

    let mut map = SubgroupMap::new();
    for entity in groups {
        let qualifying: Vec<String> = entity
            .group
            .subgroups
            .iter()
            .filter(|name| deployed.contains(name.as_str()))
            .cloned()
            .collect();

        if qualifying.is_empty() {
            continue;
        }

        // A group listed twice in the batch merges its subgroups.
        let entry = map.entry(entity.group.name.clone()).or_default();
        for name in qualifying {
            if !entry.contains(&name) {
                entry.push(name);
            }
        }
    }
    map
}

/// Flatten a [`SubgroupMap`] into `(parent, subgroup)` pairs.
pub fn attachment_pairs(map: &SubgroupMap) -> Vec<(String, String)> {
    map.iter()
        .flat_map(|(parent, subgroups)| {
            subgroups
                .iter()
                .map(move |subgroup| (parent.clone(), subgroup.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::organization::{Group, RoleAssignment};

    fn entity(name: &str, subgroups: &[&str]) -> EntityGroup {
        EntityGroup::new(
            Group::new(name).with_subgroups(subgroups.iter().copied()),
            RoleAssignment::new(),
        )
    }

    #[test]
    fn test_farm_hierarchy() {
        let groups = vec![
            entity("FarmGroup", &["FieldGroup", "AnimalsGroup"]),
            entity("FieldGroup", &[]),
            entity("AnimalsGroup", &[]),
        ];

        let map = resolve_subgroups(&groups);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("FarmGroup"),
            Some(&vec!["FieldGroup".to_string(), "AnimalsGroup".to_string()])
        );
    }

    #[test]
    fn test_out_of_batch_subgroup_is_dropped() {
        let groups = vec![
            entity("FarmGroup", &["FieldGroup", "BarnGroup"]),
            entity("FieldGroup", &[]),
        ];

        let map = resolve_subgroups(&groups);

        assert_eq!(map.get("FarmGroup"), Some(&vec!["FieldGroup".to_string()]));
        assert!(map.values().flatten().all(|name| name != "BarnGroup"));
    }

    #[test]
    fn test_parent_without_qualifying_subgroups_is_omitted() {
        let groups = vec![entity("FarmGroup", &["BarnGroup"]), entity("FieldGroup", &[])];

        let map = resolve_subgroups(&groups);

        assert!(map.is_empty());
    }

    #[test]
    fn test_cycle_passes_through() {
        let groups = vec![entity("A", &["B"]), entity("B", &["A"])];

        let pairs = attachment_pairs(&resolve_subgroups(&groups));

        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "B".to_string()),
                ("B".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn test_shared_subgroup_under_two_parents() {
        let groups = vec![
            entity("North", &["Logistics"]),
            entity("South", &["Logistics"]),
            entity("Logistics", &[]),
        ];

        let pairs = attachment_pairs(&resolve_subgroups(&groups));

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|(_, sub)| sub == "Logistics"));
    }

    #[test]
    fn test_every_entry_is_in_batch() {
        let groups = vec![
            entity("Root", &["Mid", "Ghost"]),
            entity("Mid", &["Leaf", "Phantom"]),
            entity("Leaf", &["Root"]),
        ];

        let map = resolve_subgroups(&groups);

        for (parent, subgroups) in &map {
            assert!(groups.iter().any(|e| &e.group.name == parent));
            assert!(!subgroups.is_empty());
            for sub in subgroups {
                assert!(groups.iter().any(|e| &e.group.name == sub));
            }
        }
    }
}
