//! Terraform state reader.
//!
//! Parses tfstate v4 files and extracts the attributes of one managed resource
//! as the "old" side of every diff.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::resource::{ServiceKind, ServiceState};

const SUPPORTED_VERSION: u32 = 4;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to read state file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse state file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported state version {0}, expected 4")]
    UnsupportedVersion(u32),

    #[error("resource '{address}' not found in state")]
    ResourceNotFound { address: String },

    #[error("resource '{address}' has no instance")]
    NoInstance { address: String },

    #[error("resource type '{resource_type}' is not a Qovery service")]
    UnsupportedType { resource_type: String },
}

#[derive(Debug, Deserialize)]
pub struct TerraformState {
    pub version: u32,
    #[serde(default)]
    pub resources: Vec<StateResource>,
}

#[derive(Debug, Deserialize)]
pub struct StateResource {
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub instances: Vec<StateInstance>,
}

impl StateResource {
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct StateInstance {
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl TerraformState {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let state: TerraformState = serde_json::from_str(json)?;
        if state.version != SUPPORTED_VERSION {
            return Err(StateError::UnsupportedVersion(state.version));
        }
        Ok(state)
    }

    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Finds a managed resource by its `type.name` address.
    pub fn resource(&self, address: &str) -> Result<&StateResource, StateError> {
        self.resources
            .iter()
            .filter(|r| r.mode == "managed")
            .find(|r| r.address() == address)
            .ok_or_else(|| StateError::ResourceNotFound {
                address: address.to_string(),
            })
    }

    /// Decodes the first instance of a Qovery service resource.
    pub fn service(&self, address: &str) -> Result<(ServiceKind, ServiceState), StateError> {
        let resource = self.resource(address)?;
        let kind = ServiceKind::from_terraform_type(&resource.resource_type).ok_or_else(|| {
            StateError::UnsupportedType {
                resource_type: resource.resource_type.clone(),
            }
        })?;
        let instance = resource.instances.first().ok_or_else(|| StateError::NoInstance {
            address: address.to_string(),
        })?;
        let state: ServiceState = serde_json::from_value(instance.attributes.clone())?;

        tracing::debug!(
            address,
            kind = %kind,
            id = state.id.as_deref().unwrap_or_default(),
            "loaded resource from state"
        );

        Ok((kind, state))
    }
}
