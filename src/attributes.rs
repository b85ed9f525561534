//! Keyed sub-resources other than variables.
//!
//! [`Label`] and [`Annotation`] belong to label and annotation groups, which
//! are resources of their own. They are not part of [`crate::ServiceState`];
//! callers that manage a group diff its entries with [`crate::diff::diff`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::collection::Keyed;

macro_rules! keyed_by_id_field {
    () => {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: Option<String>) {
            self.id = id;
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortProtocol {
    #[default]
    Http,
    Grpc,
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub internal_port: u16,
    #[serde(default)]
    pub external_port: Option<u16>,
    #[serde(default)]
    pub publicly_accessible: bool,
    #[serde(default)]
    pub protocol: PortProtocol,
    #[serde(default)]
    pub is_default: bool,
}

/// Ports are matched on the container port they expose.
impl Keyed for Port {
    fn key(&self) -> Cow<'_, str> {
        Cow::Owned(self.internal_port.to_string())
    }

    keyed_by_id_field!();

    fn same_value(&self, other: &Self) -> bool {
        self.name == other.name
            && self.external_port == other.external_port
            && self.publicly_accessible == other.publicly_accessible
            && self.protocol == other.protocol
            && self.is_default == other.is_default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    #[default]
    FastSsd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub storage_type: StorageType,
    /// Size in GB.
    pub size: u32,
    pub mount_point: String,
}

impl Keyed for Storage {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.mount_point)
    }

    keyed_by_id_field!();

    fn same_value(&self, other: &Self) -> bool {
        self.storage_type == other.storage_type && self.size == other.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDomain {
    #[serde(default)]
    pub id: Option<String>,
    pub domain: String,
    #[serde(default)]
    pub generate_certificate: bool,
    #[serde(default)]
    pub use_cdn: bool,
}

impl Keyed for CustomDomain {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.domain)
    }

    keyed_by_id_field!();

    fn same_value(&self, other: &Self) -> bool {
        self.generate_certificate == other.generate_certificate && self.use_cdn == other.use_cdn
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionMode {
    Match,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionType {
    Path,
}

/// Git path filter deciding whether a commit triggers a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRestriction {
    #[serde(default)]
    pub id: Option<String>,
    pub mode: RestrictionMode,
    #[serde(rename = "type")]
    pub restriction_type: RestrictionType,
    pub value: String,
}

/// Every field is part of the key: an edited restriction is replaced.
impl Keyed for DeploymentRestriction {
    fn key(&self) -> Cow<'_, str> {
        let mode = match self.mode {
            RestrictionMode::Match => "MATCH",
            RestrictionMode::Exclude => "EXCLUDE",
        };
        let restriction_type = match self.restriction_type {
            RestrictionType::Path => "PATH",
        };
        Cow::Owned(format!("{mode}:{restriction_type}:{}", self.value))
    }

    keyed_by_id_field!();

    fn same_value(&self, _other: &Self) -> bool {
        true
    }
}

/// Entry of a label group. Not planned or applied with a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub propagate_to_cloud_provider: bool,
}

/// Labels and annotations live inside a group; entries have no backend ID.
impl Keyed for Label {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.key)
    }

    fn id(&self) -> Option<&str> {
        None
    }

    fn set_id(&mut self, _id: Option<String>) {}

    fn same_value(&self, other: &Self) -> bool {
        self.value == other.value
            && self.propagate_to_cloud_provider == other.propagate_to_cloud_provider
    }
}

/// Entry of an annotation group. Not planned or applied with a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub key: String,
    pub value: String,
}

impl Keyed for Annotation {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.key)
    }

    fn id(&self) -> Option<&str> {
        None
    }

    fn set_id(&mut self, _id: Option<String>) {}

    fn same_value(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
