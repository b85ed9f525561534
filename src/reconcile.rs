//! Refresh, plan and apply for one Qovery service.
//!
//! The API sits behind [`QoveryApi`] so the reconciler can be constructed
//! with any implementation; the CLI passes a [`crate::QoveryClient`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::attributes::{CustomDomain, DeploymentRestriction};
use crate::collection::{Keyed, find_by_key};
use crate::diff::DiffRequest;
use crate::error::ReconcileError;
use crate::plan::{ServicePlan, validate_desired};
use crate::qovery::{EditVariable, NewVariable, QoveryError};
use crate::resource::{Observed, ServiceRef, ServiceState};
use crate::variable::{Scope, SecretEntry, Variable, VariableEntry, VariableKind, VariableType};

#[async_trait]
pub trait QoveryApi: Send + Sync {
    async fn list_variables(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
    ) -> Result<Vec<Variable>, QoveryError>;

    async fn create_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        variable: &NewVariable,
    ) -> Result<Variable, QoveryError>;

    async fn update_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
        edit: &EditVariable,
    ) -> Result<Variable, QoveryError>;

    async fn delete_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
    ) -> Result<(), QoveryError>;

    async fn create_custom_domain(
        &self,
        service: &ServiceRef,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError>;

    async fn update_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError>;

    async fn delete_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError>;

    async fn create_deployment_restriction(
        &self,
        service: &ServiceRef,
        restriction: &DeploymentRestriction,
    ) -> Result<DeploymentRestriction, QoveryError>;

    async fn delete_deployment_restriction(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError>;

    async fn get_advanced_settings(
        &self,
        service: &ServiceRef,
    ) -> Result<Map<String, Value>, QoveryError>;

    async fn update_advanced_settings(
        &self,
        service: &ServiceRef,
        settings: &Map<String, Value>,
    ) -> Result<Map<String, Value>, QoveryError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Changes that travel in the service edit payload (ports, storage).
    pub skipped: usize,
}

/// Variable payload shared by plain entries and secrets.
trait Payload: Keyed {
    fn value(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
}

impl Payload for VariableEntry {
    fn value(&self) -> Option<&str> {
        Some(&self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Payload for SecretEntry {
    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Value,
    Alias,
    Override,
}

/// Where a planned collection goes on the API.
#[derive(Clone, Copy)]
struct Target<'a> {
    service: &'a ServiceRef,
    kind: VariableKind,
    role: Role,
    collection: &'static str,
}

/// Variables known to exist on the service, used to resolve alias and
/// override parents. Updated as apply creates and deletes.
struct VariablePool {
    items: Vec<Variable>,
}

impl VariablePool {
    fn new(items: Vec<Variable>) -> Self {
        Self { items }
    }

    fn get(&self, id: &str) -> Option<&Variable> {
        self.items.iter().find(|v| v.id == id)
    }

    fn remove(&mut self, id: &str) {
        self.items.retain(|v| v.id != id);
    }

    fn alias_target(&self, key: &str) -> Option<&Variable> {
        self.items.iter().find(|v| {
            v.key == key && matches!(v.variable_type, VariableType::Value | VariableType::BuiltIn)
        })
    }

    fn override_target(&self, key: &str, own_scope: Scope) -> Option<&Variable> {
        self.items.iter().find(|v| {
            v.key == key && v.variable_type == VariableType::Value && v.scope != own_scope
        })
    }
}

/// Mutable bookkeeping of one apply.
struct Run {
    variables: VariablePool,
    secrets: VariablePool,
    report: ApplyReport,
    custom_domains: Vec<CustomDomain>,
    deployment_restrictions: Vec<DeploymentRestriction>,
}

impl Run {
    fn new(observed: &Observed) -> Self {
        Self {
            variables: VariablePool::new(observed.variables.clone()),
            secrets: VariablePool::new(observed.secrets.clone()),
            report: ApplyReport::default(),
            custom_domains: Vec::new(),
            deployment_restrictions: Vec::new(),
        }
    }

    fn pool(&mut self, kind: VariableKind) -> &mut VariablePool {
        match kind {
            VariableKind::EnvironmentVariable => &mut self.variables,
            VariableKind::Secret => &mut self.secrets,
        }
    }
}

fn require_id<'a, T: Keyed>(collection: &str, entry: &'a T) -> Result<&'a str, ReconcileError> {
    entry.id().ok_or_else(|| ReconcileError::MissingId {
        collection: collection.to_string(),
        key: entry.key().into_owned(),
    })
}

fn require_value<'a, T: Payload>(
    collection: &str,
    entry: &'a T,
) -> Result<&'a str, ReconcileError> {
    entry.value().ok_or_else(|| ReconcileError::MissingValue {
        collection: collection.to_string(),
        key: entry.key().into_owned(),
    })
}

/// Copies IDs onto `desired` entries from what apply created, then from
/// what already existed.
fn with_ids<T: Keyed + Clone>(desired: &[T], created: &[T], current: Option<&[T]>) -> Vec<T> {
    desired
        .iter()
        .map(|item| {
            let mut item = item.clone();
            let id = find_by_key(created, &item.key())
                .or_else(|| find_by_key(current.unwrap_or_default(), &item.key()))
                .and_then(|found| found.id())
                .map(str::to_string);
            if id.is_some() {
                item.set_id(id);
            }
            item
        })
        .collect()
}

pub struct Reconciler {
    api: Arc<dyn QoveryApi>,
}

impl Reconciler {
    pub fn new(api: Arc<dyn QoveryApi>) -> Self {
        Self { api }
    }

    /// Fetches everything refresh needs from the API.
    pub async fn observe(
        &self,
        service: &ServiceRef,
        prior: &ServiceState,
    ) -> Result<Observed, ReconcileError> {
        let env = VariableKind::EnvironmentVariable;
        let variables = self.api.list_variables(service, env).await?;
        let secrets = self.api.list_variables(service, VariableKind::Secret).await?;

        let configured = prior.advanced_settings_json.is_some();
        let advanced_settings = if service.kind.is_deployable() && configured {
            Some(self.api.get_advanced_settings(service).await?)
        } else {
            None
        };

        Ok(Observed {
            variables,
            secrets,
            advanced_settings,
        })
    }

    /// Rebuilds state from the API the way a Terraform Read does.
    pub async fn refresh(
        &self,
        service: &ServiceRef,
        prior: &ServiceState,
    ) -> Result<(ServiceState, Observed), ReconcileError> {
        let observed = self.observe(service, prior).await?;
        let state = ServiceState::refreshed(service.kind, &observed, prior);

        info!(
            service = %service.id,
            kind = %service.kind,
            variables = observed.variables.len(),
            secrets = observed.secrets.len(),
            "refresh complete"
        );

        Ok((state, observed))
    }

    pub fn plan(
        desired: &ServiceState,
        current: &ServiceState,
    ) -> Result<ServicePlan, ReconcileError> {
        validate_desired(desired)?;
        Ok(ServicePlan::compute(desired, current)?)
    }

    /// Executes `plan` against the API.
    ///
    /// Deletes run first (aliases and overrides before the values they hang
    /// off), then updates, then creates (values before their aliases and
    /// overrides). `observed` must come from the refresh the plan was built on.
    pub async fn apply(
        &self,
        service: &ServiceRef,
        plan: &ServicePlan,
        observed: &Observed,
    ) -> Result<ApplyReport, ReconcileError> {
        let run = self.execute(service, plan, observed).await?;
        Ok(run.report)
    }

    /// Applies `plan` and returns the state to persist afterwards.
    ///
    /// Values the API never lists, such as secret values, come from
    /// `desired`. Ports and storage are not applied and keep their `current`
    /// value.
    pub async fn converge(
        &self,
        service: &ServiceRef,
        desired: &ServiceState,
        current: &ServiceState,
        plan: &ServicePlan,
        observed: &Observed,
    ) -> Result<(ApplyReport, ServiceState), ReconcileError> {
        let run = self.execute(service, plan, observed).await?;

        let prior = ServiceState {
            id: current.id.clone(),
            ports: current.ports.clone(),
            storage: current.storage.clone(),
            custom_domains: desired.custom_domains.as_deref().map(|domains| {
                with_ids(domains, &run.custom_domains, current.custom_domains.as_deref())
            }),
            deployment_restrictions: desired.deployment_restrictions.as_deref().map(|items| {
                let current = current.deployment_restrictions.as_deref();
                with_ids(items, &run.deployment_restrictions, current)
            }),
            ..desired.clone()
        };

        let observed = self.observe(service, &prior).await?;
        let state = ServiceState::refreshed(service.kind, &observed, &prior);
        Ok((run.report, state))
    }

    async fn execute(
        &self,
        service: &ServiceRef,
        plan: &ServicePlan,
        observed: &Observed,
    ) -> Result<Run, ReconcileError> {
        let mut run = Run::new(observed);

        let env_values = Target {
            service,
            kind: VariableKind::EnvironmentVariable,
            role: Role::Value,
            collection: "environment_variables",
        };
        let env_aliases = Target {
            role: Role::Alias,
            collection: "environment_variable_aliases",
            ..env_values
        };
        let env_overrides = Target {
            role: Role::Override,
            collection: "environment_variable_overrides",
            ..env_values
        };
        let secret_values = Target {
            kind: VariableKind::Secret,
            collection: "secrets",
            ..env_values
        };
        let secret_aliases = Target {
            role: Role::Alias,
            collection: "secret_aliases",
            ..secret_values
        };
        let secret_overrides = Target {
            role: Role::Override,
            collection: "secret_overrides",
            ..secret_values
        };

        let env_overrides_plan = &plan.environment_variable_overrides;
        let env_aliases_plan = &plan.environment_variable_aliases;

        self.delete_variables(env_overrides, &env_overrides_plan.delete, &mut run).await?;
        self.delete_variables(env_aliases, &env_aliases_plan.delete, &mut run).await?;
        self.delete_variables(secret_overrides, &plan.secret_overrides.delete, &mut run).await?;
        self.delete_variables(secret_aliases, &plan.secret_aliases.delete, &mut run).await?;
        self.delete_variables(env_values, &plan.environment_variables.delete, &mut run).await?;
        self.delete_variables(secret_values, &plan.secrets.delete, &mut run).await?;

        self.update_variables(env_values, &plan.environment_variables.update, &mut run).await?;
        self.update_variables(secret_values, &plan.secrets.update, &mut run).await?;
        self.update_variables(env_aliases, &env_aliases_plan.update, &mut run).await?;
        self.update_variables(secret_aliases, &plan.secret_aliases.update, &mut run).await?;
        self.update_variables(env_overrides, &env_overrides_plan.update, &mut run).await?;
        self.update_variables(secret_overrides, &plan.secret_overrides.update, &mut run).await?;

        self.create_variables(env_values, &plan.environment_variables.create, &mut run).await?;
        self.create_variables(secret_values, &plan.secrets.create, &mut run).await?;
        self.create_variables(env_aliases, &env_aliases_plan.create, &mut run).await?;
        self.create_variables(secret_aliases, &plan.secret_aliases.create, &mut run).await?;
        self.create_variables(env_overrides, &env_overrides_plan.create, &mut run).await?;
        self.create_variables(secret_overrides, &plan.secret_overrides.create, &mut run).await?;

        self.apply_custom_domains(service, &plan.custom_domains, &mut run).await?;
        self.apply_deployment_restrictions(service, &plan.deployment_restrictions, &mut run)
            .await?;
        self.apply_advanced_settings(service, &plan.advanced_settings, &mut run.report)
            .await?;

        let skipped = plan.ports.len() + plan.storage.len();
        if skipped > 0 {
            warn!(
                ports = plan.ports.len(),
                storage = plan.storage.len(),
                "port and storage changes are sent with the service edit and were not applied"
            );
            run.report.skipped += skipped;
        }

        let report = &run.report;
        info!(
            service = %service.id,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            "apply complete"
        );

        Ok(run)
    }

    async fn delete_variables<T: Payload>(
        &self,
        target: Target<'_>,
        entries: &[T],
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        for entry in entries {
            let id = require_id(target.collection, entry)?;
            self.api.delete_variable(target.service, target.kind, id).await?;
            run.pool(target.kind).remove(id);
            run.report.deleted += 1;
            info!(collection = target.collection, key = %entry.key(), "deleted");
        }
        Ok(())
    }

    async fn update_variables<T: Payload>(
        &self,
        target: Target<'_>,
        entries: &[T],
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        for entry in entries {
            let id = require_id(target.collection, entry)?;
            let value = require_value(target.collection, entry)?;

            // An alias cannot be repointed, so a new target means a new alias.
            let retarget = target.role == Role::Alias
                && run
                    .pool(target.kind)
                    .get(id)
                    .is_none_or(|alias| alias.state_value() != Some(value));

            if retarget {
                self.api.delete_variable(target.service, target.kind, id).await?;
                run.pool(target.kind).remove(id);
                self.create_variable(target, entry, run).await?;
            } else {
                let edit = EditVariable {
                    key: entry.key().into_owned(),
                    value: value.to_string(),
                    description: entry.description().map(str::to_string),
                };
                self.api.update_variable(target.service, target.kind, id, &edit).await?;
            }

            run.report.updated += 1;
            info!(collection = target.collection, key = %entry.key(), "updated");
        }
        Ok(())
    }

    async fn create_variables<T: Payload>(
        &self,
        target: Target<'_>,
        entries: &[T],
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        for entry in entries {
            self.create_variable(target, entry, run).await?;
            run.report.created += 1;
            info!(collection = target.collection, key = %entry.key(), "created");
        }
        Ok(())
    }

    async fn create_variable<T: Payload>(
        &self,
        target: Target<'_>,
        entry: &T,
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        let key = entry.key().into_owned();
        let description = entry.description().map(str::to_string);
        let missing_parent = |parent_key: &str| ReconcileError::MissingParent {
            collection: target.collection.to_string(),
            key: parent_key.to_string(),
        };

        let request = match target.role {
            Role::Value => NewVariable::Value {
                key,
                value: require_value(target.collection, entry)?.to_string(),
                description,
            },
            Role::Alias => {
                let parent_key = require_value(target.collection, entry)?;
                let parent = run
                    .pool(target.kind)
                    .alias_target(parent_key)
                    .ok_or_else(|| missing_parent(parent_key))?;
                NewVariable::Alias {
                    parent_id: parent.id.clone(),
                    key,
                    description,
                }
            }
            Role::Override => {
                let parent = run
                    .pool(target.kind)
                    .override_target(&key, target.service.kind.scope())
                    .ok_or_else(|| missing_parent(&key))?;
                NewVariable::Override {
                    parent_id: parent.id.clone(),
                    value: require_value(target.collection, entry)?.to_string(),
                    description,
                }
            }
        };

        let created = self.api.create_variable(target.service, target.kind, &request).await?;
        run.pool(target.kind).items.push(created);
        Ok(())
    }

    async fn apply_custom_domains(
        &self,
        service: &ServiceRef,
        diff: &DiffRequest<CustomDomain>,
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        for domain in &diff.delete {
            let id = require_id("custom_domains", domain)?;
            self.api.delete_custom_domain(service, id).await?;
            run.report.deleted += 1;
            info!(domain = %domain.domain, "custom domain deleted");
        }
        for domain in &diff.update {
            let id = require_id("custom_domains", domain)?;
            self.api.update_custom_domain(service, id, domain).await?;
            run.report.updated += 1;
            info!(domain = %domain.domain, "custom domain updated");
        }
        for domain in &diff.create {
            let created = self.api.create_custom_domain(service, domain).await?;
            run.custom_domains.push(created);
            run.report.created += 1;
            info!(domain = %domain.domain, "custom domain created");
        }
        Ok(())
    }

    async fn apply_deployment_restrictions(
        &self,
        service: &ServiceRef,
        diff: &DiffRequest<DeploymentRestriction>,
        run: &mut Run,
    ) -> Result<(), ReconcileError> {
        for restriction in &diff.delete {
            let id = require_id("deployment_restrictions", restriction)?;
            self.api.delete_deployment_restriction(service, id).await?;
            run.report.deleted += 1;
        }
        for restriction in &diff.create {
            let created = self.api.create_deployment_restriction(service, restriction).await?;
            run.deployment_restrictions.push(created);
            run.report.created += 1;
        }
        Ok(())
    }

    /// The API replaces the whole object, so changes are merged into the
    /// current settings first.
    async fn apply_advanced_settings(
        &self,
        service: &ServiceRef,
        changed: &Map<String, Value>,
        report: &mut ApplyReport,
    ) -> Result<(), ReconcileError> {
        if changed.is_empty() {
            return Ok(());
        }

        let mut settings = self.api.get_advanced_settings(service).await?;
        settings.extend(changed.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.api.update_advanced_settings(service, &settings).await?;

        report.updated += changed.len();
        info!(count = changed.len(), "advanced settings updated");
        Ok(())
    }
}
