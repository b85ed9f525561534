//! Whole-service plan: one diff per reconciled collection.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::advanced_settings::{self, AdvancedSettingsError};
use crate::attributes::{CustomDomain, DeploymentRestriction, Port, Storage};
use crate::collection::{DuplicateKeyError, Keyed, ensure_unique_keys};
use crate::diff::{DiffRequest, diff_nullable};
use crate::resource::ServiceState;
use crate::variable::{SecretEntry, VariableEntry};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServicePlan {
    pub environment_variables: DiffRequest<VariableEntry>,
    pub environment_variable_aliases: DiffRequest<VariableEntry>,
    pub environment_variable_overrides: DiffRequest<VariableEntry>,
    pub secrets: DiffRequest<SecretEntry>,
    pub secret_aliases: DiffRequest<VariableEntry>,
    pub secret_overrides: DiffRequest<SecretEntry>,
    pub ports: DiffRequest<Port>,
    pub storage: DiffRequest<Storage>,
    pub custom_domains: DiffRequest<CustomDomain>,
    pub deployment_restrictions: DiffRequest<DeploymentRestriction>,
    /// Settings to send; empty when nothing changed.
    pub advanced_settings: Map<String, Value>,
}

impl ServicePlan {
    /// Diffs `desired` (plan) against `current` (refreshed state).
    ///
    /// Built-in variables are read-only and never planned.
    pub fn compute(
        desired: &ServiceState,
        current: &ServiceState,
    ) -> Result<Self, AdvancedSettingsError> {
        let desired_settings = desired.advanced_settings()?;
        let current_settings = current.advanced_settings()?;

        Ok(Self {
            environment_variables: diff_nullable(
                desired.environment_variables.as_deref(),
                current.environment_variables.as_deref(),
            ),
            environment_variable_aliases: diff_nullable(
                desired.environment_variable_aliases.as_deref(),
                current.environment_variable_aliases.as_deref(),
            ),
            environment_variable_overrides: diff_nullable(
                desired.environment_variable_overrides.as_deref(),
                current.environment_variable_overrides.as_deref(),
            ),
            secrets: diff_nullable(desired.secrets.as_deref(), current.secrets.as_deref()),
            secret_aliases: diff_nullable(
                desired.secret_aliases.as_deref(),
                current.secret_aliases.as_deref(),
            ),
            secret_overrides: diff_nullable(
                desired.secret_overrides.as_deref(),
                current.secret_overrides.as_deref(),
            ),
            ports: diff_nullable(desired.ports.as_deref(), current.ports.as_deref()),
            storage: diff_nullable(desired.storage.as_deref(), current.storage.as_deref()),
            custom_domains: diff_nullable(
                desired.custom_domains.as_deref(),
                current.custom_domains.as_deref(),
            ),
            deployment_restrictions: diff_nullable(
                desired.deployment_restrictions.as_deref(),
                current.deployment_restrictions.as_deref(),
            ),
            advanced_settings: advanced_settings::changed(&desired_settings, &current_settings),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    pub fn change_count(&self) -> usize {
        self.environment_variables.len()
            + self.environment_variable_aliases.len()
            + self.environment_variable_overrides.len()
            + self.secrets.len()
            + self.secret_aliases.len()
            + self.secret_overrides.len()
            + self.ports.len()
            + self.storage.len()
            + self.custom_domains.len()
            + self.deployment_restrictions.len()
            + self.advanced_settings.len()
    }
}

/// Validates a user supplied document before it is planned.
pub fn validate_desired(desired: &ServiceState) -> Result<(), DesiredStateError> {
    check_unique("environment_variables", &desired.environment_variables)?;
    check_unique("environment_variable_aliases", &desired.environment_variable_aliases)?;
    check_unique("environment_variable_overrides", &desired.environment_variable_overrides)?;
    check_unique("secrets", &desired.secrets)?;
    check_unique("secret_aliases", &desired.secret_aliases)?;
    check_unique("secret_overrides", &desired.secret_overrides)?;
    check_unique("ports", &desired.ports)?;
    check_unique("storage", &desired.storage)?;
    check_unique("custom_domains", &desired.custom_domains)?;
    check_unique("deployment_restrictions", &desired.deployment_restrictions)?;
    advanced_settings::validate(&desired.advanced_settings()?)?;
    Ok(())
}

fn check_unique<T: Keyed>(
    collection: &str,
    items: &Option<Vec<T>>,
) -> Result<(), DuplicateKeyError> {
    match items {
        Some(items) => ensure_unique_keys(collection, items),
        None => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DesiredStateError {
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),

    #[error(transparent)]
    AdvancedSettings(#[from] AdvancedSettingsError),
}
