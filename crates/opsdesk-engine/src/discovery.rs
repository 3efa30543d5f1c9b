//! Self-description served on `GET /api/v1/command`

use crate::registry::CommandRegistry;
use opsdesk_core::model::timestamp::now_iso;
use opsdesk_core::policy::AdminKeyPolicy;
use serde::Serialize;
use std::collections::BTreeMap;

pub const API_MESSAGE: &str = "API Command System";
pub const API_VERSION: &str = "1.0.0";
pub const COMMAND_ENDPOINT: &str = "POST /api/v1/command";
pub const DOCUMENTATION_ENDPOINT: &str = "GET /api/v1/command";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDocument {
    pub success: bool,
    pub data: DiscoveryData,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryData {
    pub message: String,
    pub version: String,
    pub supported_entities: Vec<EntityDescriptor>,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub entity: String,
    pub supported_operations: Vec<String>,
    pub requires_admin_key: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoints {
    pub command: String,
    pub documentation: String,
}

/// Describe every registered entity
///
/// The admin-key map is derived from the live policy, so it always agrees
/// with what the dispatcher enforces.
pub fn discovery_document(
    registry: &CommandRegistry,
    policy: &dyn AdminKeyPolicy,
) -> DiscoveryDocument {
    let supported_entities = registry
        .iter()
        .map(|(entity, handler)| {
            let operations = handler.supported_operations();
            EntityDescriptor {
                entity: entity.to_string(),
                supported_operations: operations.iter().map(|op| op.to_string()).collect(),
                requires_admin_key: operations
                    .iter()
                    .map(|op| (op.to_string(), policy.requires_admin_key(entity, op)))
                    .collect(),
            }
        })
        .collect();

    DiscoveryDocument {
        success: true,
        data: DiscoveryData {
            message: API_MESSAGE.to_string(),
            version: API_VERSION.to_string(),
            supported_entities,
            endpoints: Endpoints {
                command: COMMAND_ENDPOINT.to_string(),
                documentation: DOCUMENTATION_ENDPOINT.to_string(),
            },
        },
        timestamp: now_iso(),
    }
}
