//! Variables and secrets as Qovery reports them, and as Terraform stores them.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::Keyed;
use crate::preserve::Preserve;

/// Resource level a variable or secret is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    BuiltIn,
    Project,
    Environment,
    Application,
    Container,
    Job,
    Helm,
    /// Tag added by a newer API version. Never selected by projection.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BuiltIn => "BUILT_IN",
            Self::Project => "PROJECT",
            Self::Environment => "ENVIRONMENT",
            Self::Application => "APPLICATION",
            Self::Container => "CONTAINER",
            Self::Job => "JOB",
            Self::Helm => "HELM",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableType {
    Value,
    Alias,
    Override,
    BuiltIn,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Value => "VALUE",
            Self::Alias => "ALIAS",
            Self::Override => "OVERRIDE",
            Self::BuiltIn => "BUILT_IN",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

/// Whether a flat list came from the variable or the secret endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    EnvironmentVariable,
    Secret,
}

impl VariableKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::EnvironmentVariable => "environmentVariable",
            Self::Secret => "secret",
        }
    }
}

/// Variable an alias points at or an override replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    pub id: String,
    pub key: String,
    pub scope: Scope,
}

/// One entry of the flat list returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub key: String,
    /// Always `None` for secrets.
    pub value: Option<String>,
    pub description: Option<String>,
    pub scope: Scope,
    pub variable_type: VariableType,
    pub aliased: Option<VariableRef>,
    pub overridden: Option<VariableRef>,
}

impl Variable {
    /// Value Terraform stores for this variable: the target key for aliases.
    pub fn state_value(&self) -> Option<&str> {
        match (&self.variable_type, &self.aliased) {
            (VariableType::Alias, Some(target)) => Some(&target.key),
            _ => self.value.as_deref(),
        }
    }
}

/// Builds a state entry from an API variable.
pub trait FromVariable {
    fn from_variable(variable: &Variable) -> Self;
}

/// Variable whose value the API returns. Used for plain variables, aliases,
/// overrides, built-ins and secret aliases (whose value is the target key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl VariableEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Keyed for VariableEntry {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.key)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn same_value(&self, other: &Self) -> bool {
        self.value == other.value && self.description == other.description
    }
}

impl Preserve for VariableEntry {
    fn carry_from(&mut self, prior: &Self) {
        self.description = prior.description.clone();
    }

    fn reset_preserved(&mut self) {
        self.description = None;
    }
}

impl FromVariable for VariableEntry {
    fn from_variable(variable: &Variable) -> Self {
        Self {
            id: Some(variable.id.clone()),
            key: variable.key.clone(),
            value: variable.state_value().unwrap_or_default().to_string(),
            description: variable.description.clone(),
        }
    }
}

/// Secret or secret override. The value is write-only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SecretEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: Some(value.into()),
            description: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEntry")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("value", &self.value.as_ref().map(|_| "[REDACTED]"))
            .field("description", &self.description)
            .finish()
    }
}

impl Keyed for SecretEntry {
    fn key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.key)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    fn same_value(&self, other: &Self) -> bool {
        self.value == other.value && self.description == other.description
    }
}

impl Preserve for SecretEntry {
    fn carry_from(&mut self, prior: &Self) {
        self.value = prior.value.clone();
        self.description = prior.description.clone();
    }

    fn reset_preserved(&mut self) {
        self.value = None;
        self.description = None;
    }
}

impl FromVariable for SecretEntry {
    fn from_variable(variable: &Variable) -> Self {
        Self {
            id: Some(variable.id.clone()),
            key: variable.key.clone(),
            value: variable.value.clone(),
            description: variable.description.clone(),
        }
    }
}
