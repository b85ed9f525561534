//! Rendering of states, plans and apply reports for the terminal.

use std::fmt;

use clap::ValueEnum;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::collection::Keyed;
use crate::diff::DiffRequest;
use crate::plan::ServicePlan;
use crate::reconcile::ApplyReport;
use crate::resource::ServiceState;
use crate::variable::SecretEntry;

/// Stands in for secret values in rendered output.
pub const SENSITIVE: &str = "(sensitive value)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Tree,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    fn marker(&self) -> char {
        match self {
            Action::Create => '+',
            Action::Update => '~',
            Action::Delete => '-',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct ChangeRow {
    pub collection: &'static str,
    pub action: Action,
    pub key: String,
    #[tabled(display_with = "display_id")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct StateRow {
    pub collection: &'static str,
    pub key: String,
    #[tabled(display_with = "display_id")]
    pub id: Option<String>,
}

fn display_id(id: &Option<String>) -> String {
    id.clone().unwrap_or_else(|| "-".to_string())
}

fn push_changes<T: Keyed>(
    rows: &mut Vec<ChangeRow>,
    collection: &'static str,
    diff: &DiffRequest<T>,
) {
    let groups = [
        (Action::Delete, &diff.delete),
        (Action::Update, &diff.update),
        (Action::Create, &diff.create),
    ];
    for (action, items) in groups {
        rows.extend(items.iter().map(|item| ChangeRow {
            collection,
            action,
            key: item.key().into_owned(),
            id: item.id().map(str::to_string),
        }));
    }
}

/// Flattens a plan into one row per change.
pub fn plan_rows(plan: &ServicePlan) -> Vec<ChangeRow> {
    let mut rows = Vec::new();
    push_changes(&mut rows, "environment_variables", &plan.environment_variables);
    push_changes(
        &mut rows,
        "environment_variable_aliases",
        &plan.environment_variable_aliases,
    );
    push_changes(
        &mut rows,
        "environment_variable_overrides",
        &plan.environment_variable_overrides,
    );
    push_changes(&mut rows, "secrets", &plan.secrets);
    push_changes(&mut rows, "secret_aliases", &plan.secret_aliases);
    push_changes(&mut rows, "secret_overrides", &plan.secret_overrides);
    push_changes(&mut rows, "ports", &plan.ports);
    push_changes(&mut rows, "storage", &plan.storage);
    push_changes(&mut rows, "custom_domains", &plan.custom_domains);
    push_changes(&mut rows, "deployment_restrictions", &plan.deployment_restrictions);
    rows.extend(plan.advanced_settings.keys().map(|key| ChangeRow {
        collection: "advanced_settings",
        action: Action::Update,
        key: key.clone(),
        id: None,
    }));
    rows
}

fn push_state<T: Keyed>(rows: &mut Vec<StateRow>, collection: &'static str, items: Option<&[T]>) {
    rows.extend(items.unwrap_or_default().iter().map(|item| StateRow {
        collection,
        key: item.key().into_owned(),
        id: item.id().map(str::to_string),
    }));
}

/// Lists every keyed entry in a state. Values are left out of the rows.
pub fn state_rows(state: &ServiceState) -> Vec<StateRow> {
    let mut rows = Vec::new();
    push_state(&mut rows, "environment_variables", state.environment_variables.as_deref());
    push_state(
        &mut rows,
        "environment_variable_aliases",
        state.environment_variable_aliases.as_deref(),
    );
    push_state(
        &mut rows,
        "environment_variable_overrides",
        state.environment_variable_overrides.as_deref(),
    );
    push_state(
        &mut rows,
        "built_in_environment_variables",
        state.built_in_environment_variables.as_deref(),
    );
    push_state(&mut rows, "secrets", state.secrets.as_deref());
    push_state(&mut rows, "secret_aliases", state.secret_aliases.as_deref());
    push_state(&mut rows, "secret_overrides", state.secret_overrides.as_deref());
    push_state(&mut rows, "ports", state.ports.as_deref());
    push_state(&mut rows, "storage", state.storage.as_deref());
    push_state(&mut rows, "custom_domains", state.custom_domains.as_deref());
    push_state(&mut rows, "deployment_restrictions", state.deployment_restrictions.as_deref());
    rows
}

fn mask(secrets: &mut [SecretEntry]) {
    for secret in secrets {
        if secret.value.is_some() {
            secret.value = Some(SENSITIVE.to_string());
        }
    }
}

fn mask_diff(diff: &mut DiffRequest<SecretEntry>) {
    mask(&mut diff.create);
    mask(&mut diff.update);
    mask(&mut diff.delete);
}

/// Copy of `plan` with secret values replaced by [`SENSITIVE`].
pub fn masked_plan(plan: &ServicePlan) -> ServicePlan {
    let mut plan = plan.clone();
    mask_diff(&mut plan.secrets);
    mask_diff(&mut plan.secret_overrides);
    plan
}

/// Copy of `state` with secret values replaced by [`SENSITIVE`].
pub fn masked_state(state: &ServiceState) -> ServiceState {
    let mut state = state.clone();
    if let Some(secrets) = state.secrets.as_mut() {
        mask(secrets);
    }
    if let Some(overrides) = state.secret_overrides.as_mut() {
        mask(overrides);
    }
    state
}

/// Groups rows under one node per collection, keeping first-seen order.
fn group_tree<R>(
    root: String,
    rows: &[R],
    collection: impl Fn(&R) -> &'static str,
    leaf: impl Fn(&R) -> String,
) -> Tree<String> {
    let mut tree = Tree::new(root);
    let mut current: Option<Tree<String>> = None;

    for row in rows {
        let name = collection(row);
        if !current.as_ref().is_some_and(|node| node.root == name) {
            if let Some(done) = current.take() {
                tree.push(done);
            }
            current = Some(Tree::new(name.to_string()));
        }
        if let Some(node) = current.as_mut() {
            node.push(leaf(row));
        }
    }
    if let Some(done) = current {
        tree.push(done);
    }
    tree
}

pub fn render_plan(
    plan: &ServicePlan,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(&masked_plan(plan));
    }

    let rows = plan_rows(plan);
    if rows.is_empty() {
        return Ok("No changes.".to_string());
    }

    Ok(match format {
        OutputFormat::Table => Table::new(&rows).with(Style::rounded()).to_string(),
        _ => group_tree(
            format!("plan: {} change(s)", rows.len()),
            &rows,
            |row| row.collection,
            |row| format!("{} {}", row.action.marker(), row.key),
        )
        .to_string(),
    })
}

pub fn render_state(
    state: &ServiceState,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(&masked_state(state));
    }

    let rows = state_rows(state);
    let root = state.id.clone().unwrap_or_else(|| "service".to_string());

    Ok(match format {
        OutputFormat::Table => Table::new(&rows).with(Style::rounded()).to_string(),
        _ => group_tree(root, &rows, |row| row.collection, |row| row.key.clone()).to_string(),
    })
}

pub fn render_report(
    report: &ApplyReport,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(report);
    }
    Ok(format!(
        "Apply complete: {} created, {} updated, {} deleted, {} skipped.",
        report.created, report.updated, report.deleted, report.skipped
    ))
}
