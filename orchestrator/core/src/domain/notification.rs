// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Role-assignment notifications sent to agents.

use crate::domain::deployer_config::{OrganizationConventions, RuntimeTarget};
use crate::domain::organization::{runtime_id, DeploymentBatch, EntityGroup};
use serde::{Deserialize, Serialize};

/// Payload an agent receives when it is assigned a role.
///
/// Field names are the ones the agents' plans read from the message map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleNotification {
    /// Runtime id of the group the role is played in
    #[serde(rename = "groupId")]
    pub group_id: String,

    /// Prefixed role identifier (e.g. `role_Feeder`)
    pub role: String,

    /// Full address of the group artifact
    pub group: String,

    /// Full address of the receiving agent
    #[serde(rename = "agentId")]
    pub agent_id: String,

    /// Runtime id of the coordination group
    #[serde(rename = "group2Id")]
    pub coordination_group_id: String,

    /// Full address of the coordination group artifact
    #[serde(rename = "group2")]
    pub coordination_group: String,
}

/// A notification together with the agent it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressedNotification {
    pub agent: String,
    pub notification: RoleNotification,
}

/// Build one notification per (role, agent) pair of `entity`.
pub fn notifications_for_group(
    entity: &EntityGroup,
    runtime: &RuntimeTarget,
    conventions: &OrganizationConventions,
) -> Vec<AddressedNotification> {
    let group_id = entity.group.runtime_id();
    let coordination_id = runtime_id(&conventions.coordination_group);

    entity
        .players
        .pairs()
        .map(|(role, agent)| AddressedNotification {
            agent: agent.to_string(),
            notification: RoleNotification {
                group_id: group_id.clone(),
                role: format!("{}{}", conventions.role_prefix, role),
                group: runtime.artifact_url(&group_id),
                agent_id: runtime.agent_url(agent),
                coordination_group_id: coordination_id.clone(),
                coordination_group: runtime.artifact_url(&coordination_id),
            },
        })
        .collect()
}

/// Build every notification of the batch.
pub fn notifications_for_batch(
    batch: &DeploymentBatch,
    runtime: &RuntimeTarget,
    conventions: &OrganizationConventions,
) -> Vec<AddressedNotification> {
    batch
        .groups
        .iter()
        .flat_map(|entity| notifications_for_group(entity, runtime, conventions))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::organization::{Group, RoleAssignment};

    #[test]
    fn test_notification_payload() {
        let entity = EntityGroup::new(
            Group::new("AnimalsGroup"),
            RoleAssignment::new().with("Feeder", &["agent3"]),
        );

        let notifications = notifications_for_group(
            &entity,
            &RuntimeTarget::default(),
            &OrganizationConventions::default(),
        );

        assert_eq!(notifications.len(), 1);
        let addressed = &notifications[0];
        assert_eq!(addressed.agent, "agent3");

        let json = serde_json::to_value(&addressed.notification).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "groupId": "animalsgroup",
                "role": "role_Feeder",
                "group": "http://localhost:8080/workspaces/102/artifacts/animalsgroup",
                "agentId": "http://localhost:8080/agents/agent3",
                "group2Id": "farmgroup",
                "group2": "http://localhost:8080/workspaces/102/artifacts/farmgroup"
            })
        );
    }

    #[test]
    fn test_one_notification_per_pair() {
        let batch = DeploymentBatch::new(
            "smart-farming",
            vec![
                EntityGroup::new(
                    Group::new("FieldGroup"),
                    RoleAssignment::new()
                        .with("SoilPlower", &["agent7"])
                        .with("Harvester", &["agent4", "agent7"]),
                ),
                EntityGroup::new(
                    Group::new("AnimalsGroup"),
                    RoleAssignment::new().with("Feeder", &["agent3"]),
                ),
                EntityGroup::new(Group::new("EmptyGroup"), RoleAssignment::new()),
            ],
        );

        let notifications = notifications_for_batch(
            &batch,
            &RuntimeTarget::default(),
            &OrganizationConventions::default(),
        );

        assert_eq!(notifications.len(), batch.notification_count());
        assert_eq!(notifications.len(), 4);

        let triples: std::collections::HashSet<(String, String, String)> = notifications
            .iter()
            .map(|n| (n.notification.group_id.clone(), n.notification.role.clone(), n.agent.clone()))
            .collect();
        assert_eq!(triples.len(), 4);
    }

    #[test]
    fn test_custom_conventions() {
        let conventions = OrganizationConventions {
            coordination_group: "HQGroup".to_string(),
            role_prefix: "r:".to_string(),
            ..OrganizationConventions::default()
        };
        let entity = EntityGroup::new(Group::new("Ops"), RoleAssignment::new().with("Lead", &["a1"]));

        let notifications = notifications_for_group(&entity, &RuntimeTarget::default(), &conventions);

        assert_eq!(notifications[0].notification.role, "r:Lead");
        assert_eq!(notifications[0].notification.coordination_group_id, "hqgroup");
    }
}
