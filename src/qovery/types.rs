use serde::{Deserialize, Serialize};

use crate::attributes::{CustomDomain, DeploymentRestriction, RestrictionMode, RestrictionType};
use crate::variable::{Scope, Variable, VariableRef, VariableType};

pub const QOVERY_API_BASE: &str = "https://api.qovery.com";

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Body of a non-2xx response. Qovery uses either field depending on the layer.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct VariableRefResponse {
    pub id: String,
    pub key: String,
    pub scope: Scope,
}

#[derive(Debug, Deserialize)]
pub struct VariableResponse {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub scope: Scope,
    pub variable_type: VariableType,
    #[serde(default)]
    pub aliased_variable: Option<VariableRefResponse>,
    #[serde(default)]
    pub overridden_variable: Option<VariableRefResponse>,
}

impl From<VariableRefResponse> for VariableRef {
    fn from(r: VariableRefResponse) -> Self {
        VariableRef {
            id: r.id,
            key: r.key,
            scope: r.scope,
        }
    }
}

impl VariableResponse {
    pub fn into_variable(self) -> Variable {
        Variable {
            id: self.id,
            key: self.key,
            value: self.value,
            description: self.description,
            scope: self.scope,
            variable_type: self.variable_type,
            aliased: self.aliased_variable.map(Into::into),
            overridden: self.overridden_variable.map(Into::into),
        }
    }
}

/// Variable or secret to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewVariable {
    Value {
        key: String,
        value: String,
        description: Option<String>,
    },
    Alias {
        parent_id: String,
        key: String,
        description: Option<String>,
    },
    Override {
        parent_id: String,
        value: String,
        description: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ValueRequest<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct AliasRequest<'a> {
    pub key: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct OverrideRequest<'a> {
    pub value: &'a str,
    pub description: Option<&'a str>,
}

/// Payload of a variable edit. The API takes key, value and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditVariable {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomDomainRequest<'a> {
    pub domain: &'a str,
    pub generate_certificate: bool,
    pub use_cdn: bool,
}

impl<'a> From<&'a CustomDomain> for CustomDomainRequest<'a> {
    fn from(domain: &'a CustomDomain) -> Self {
        Self {
            domain: &domain.domain,
            generate_certificate: domain.generate_certificate,
            use_cdn: domain.use_cdn,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomDomainResponse {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub generate_certificate: bool,
    #[serde(default)]
    pub use_cdn: bool,
}

impl CustomDomainResponse {
    pub fn into_custom_domain(self) -> CustomDomain {
        CustomDomain {
            id: Some(self.id),
            domain: self.domain,
            generate_certificate: self.generate_certificate,
            use_cdn: self.use_cdn,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeploymentRestrictionRequest<'a> {
    pub mode: RestrictionMode,
    #[serde(rename = "type")]
    pub restriction_type: RestrictionType,
    pub value: &'a str,
}

impl<'a> From<&'a DeploymentRestriction> for DeploymentRestrictionRequest<'a> {
    fn from(restriction: &'a DeploymentRestriction) -> Self {
        Self {
            mode: restriction.mode,
            restriction_type: restriction.restriction_type,
            value: &restriction.value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeploymentRestrictionResponse {
    pub id: String,
    pub mode: RestrictionMode,
    #[serde(rename = "type")]
    pub restriction_type: RestrictionType,
    pub value: String,
}

impl DeploymentRestrictionResponse {
    pub fn into_restriction(self) -> DeploymentRestriction {
        DeploymentRestriction {
            id: Some(self.id),
            mode: self.mode,
            restriction_type: self.restriction_type,
            value: self.value,
        }
    }
}
