use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::advanced_settings;
use crate::attributes::{CustomDomain, DeploymentRestriction, Port, Storage};
use crate::project::{Selector, project_nullable};
use crate::variable::{Scope, SecretEntry, Variable, VariableEntry, VariableType};

/// Qovery service types whose variables this crate reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Project,
    Environment,
    Application,
    Container,
    Job,
    Helm,
}

impl ServiceKind {
    /// Path segment of the service in the Qovery REST API.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Environment => "environment",
            Self::Application => "application",
            Self::Container => "container",
            Self::Job => "job",
            Self::Helm => "helm",
        }
    }

    pub fn terraform_type(&self) -> &'static str {
        match self {
            Self::Project => "qovery_project",
            Self::Environment => "qovery_environment",
            Self::Application => "qovery_application",
            Self::Container => "qovery_container",
            Self::Job => "qovery_job",
            Self::Helm => "qovery_helm",
        }
    }

    /// Scope of the variables declared directly on this service.
    pub fn scope(&self) -> Scope {
        match self {
            Self::Project => Scope::Project,
            Self::Environment => Scope::Environment,
            Self::Application => Scope::Application,
            Self::Container => Scope::Container,
            Self::Job => Scope::Job,
            Self::Helm => Scope::Helm,
        }
    }

    pub fn from_terraform_type(resource_type: &str) -> Option<Self> {
        [
            Self::Project,
            Self::Environment,
            Self::Application,
            Self::Container,
            Self::Job,
            Self::Helm,
        ]
        .into_iter()
        .find(|kind| kind.terraform_type() == resource_type)
    }

    /// Only deployable services carry domains, restrictions and advanced settings.
    pub fn is_deployable(&self) -> bool {
        !matches!(self, Self::Project | Self::Environment)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// A concrete service instance on Qovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRef {
    pub kind: ServiceKind,
    pub id: String,
}

impl ServiceRef {
    pub fn new(kind: ServiceKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

/// Reconciled attributes of one Terraform resource. Null attributes are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServiceState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub environment_variables: Option<Vec<VariableEntry>>,
    #[serde(default)]
    pub environment_variable_aliases: Option<Vec<VariableEntry>>,
    #[serde(default)]
    pub environment_variable_overrides: Option<Vec<VariableEntry>>,
    #[serde(default)]
    pub built_in_environment_variables: Option<Vec<VariableEntry>>,
    #[serde(default)]
    pub secrets: Option<Vec<SecretEntry>>,
    #[serde(default)]
    pub secret_aliases: Option<Vec<VariableEntry>>,
    #[serde(default)]
    pub secret_overrides: Option<Vec<SecretEntry>>,
    #[serde(default)]
    pub ports: Option<Vec<Port>>,
    #[serde(default)]
    pub storage: Option<Vec<Storage>>,
    #[serde(default)]
    pub custom_domains: Option<Vec<CustomDomain>>,
    #[serde(default)]
    pub deployment_restrictions: Option<Vec<DeploymentRestriction>>,
    #[serde(default)]
    pub advanced_settings_json: Option<String>,
}

/// What the API reported for a service during a refresh.
#[derive(Debug, Clone, Default)]
pub struct Observed {
    pub variables: Vec<Variable>,
    pub secrets: Vec<Variable>,
    pub advanced_settings: Option<Map<String, Value>>,
}

impl ServiceState {
    /// Rebuilds state from what the API reported, keeping values it hides.
    ///
    /// Collections the API call did not cover (ports, storage, domains,
    /// restrictions) are carried over from `prior` unchanged.
    pub fn refreshed(kind: ServiceKind, observed: &Observed, prior: &ServiceState) -> ServiceState {
        let scope = kind.scope();
        let value = Selector::new(scope, VariableType::Value);
        let alias = Selector::new(scope, VariableType::Alias);
        let overridden = Selector::new(scope, VariableType::Override);

        ServiceState {
            id: prior.id.clone(),
            environment_variables: project_nullable(
                &observed.variables,
                value,
                prior.environment_variables.as_deref(),
            ),
            environment_variable_aliases: project_nullable(
                &observed.variables,
                alias,
                prior.environment_variable_aliases.as_deref(),
            ),
            environment_variable_overrides: project_nullable(
                &observed.variables,
                overridden,
                prior.environment_variable_overrides.as_deref(),
            ),
            built_in_environment_variables: project_nullable(
                &observed.variables,
                Selector::built_in(),
                prior.built_in_environment_variables.as_deref(),
            ),
            secrets: project_nullable(&observed.secrets, value, prior.secrets.as_deref()),
            secret_aliases: project_nullable(
                &observed.secrets,
                alias,
                prior.secret_aliases.as_deref(),
            ),
            secret_overrides: project_nullable(
                &observed.secrets,
                overridden,
                prior.secret_overrides.as_deref(),
            ),
            ports: prior.ports.clone(),
            storage: prior.storage.clone(),
            custom_domains: prior.custom_domains.clone(),
            deployment_restrictions: prior.deployment_restrictions.clone(),
            advanced_settings_json: refresh_advanced_settings(
                prior.advanced_settings_json.as_deref(),
                observed.advanced_settings.as_ref(),
            ),
        }
    }

    /// Parsed advanced settings, empty when the attribute is null.
    pub fn advanced_settings(
        &self,
    ) -> Result<Map<String, Value>, advanced_settings::AdvancedSettingsError> {
        match &self.advanced_settings_json {
            Some(json) => advanced_settings::parse(json),
            None => Ok(Map::new()),
        }
    }
}

fn refresh_advanced_settings(
    prior: Option<&str>,
    api: Option<&Map<String, Value>>,
) -> Option<String> {
    let (prior_json, api) = match (prior, api) {
        (Some(prior_json), Some(api)) => (prior_json, api),
        (prior, _) => return prior.map(str::to_string),
    };

    match advanced_settings::parse(prior_json) {
        Ok(configured) => {
            let refreshed = advanced_settings::retain_configured(api, &configured);
            Some(Value::Object(refreshed).to_string())
        }
        Err(e) => {
            tracing::warn!(error = %e, "keeping unparseable advanced settings from state");
            Some(prior_json.to_string())
        }
    }
}
