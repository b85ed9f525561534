//! Projection of the API's flat variable lists into typed state collections.

use tracing::debug;

use crate::preserve::{Preserve, backfill};
use crate::variable::{FromVariable, Scope, Variable, VariableType};

/// Scope and type a state collection is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector {
    pub scope: Scope,
    pub variable_type: VariableType,
}

impl Selector {
    pub const fn new(scope: Scope, variable_type: VariableType) -> Self {
        Self {
            scope,
            variable_type,
        }
    }

    pub fn matches(&self, variable: &Variable) -> bool {
        variable.scope == self.scope && variable.variable_type == self.variable_type
    }

    /// Built-in variables Qovery injects into every service.
    pub const fn built_in() -> Self {
        Self::new(Scope::BuiltIn, VariableType::BuiltIn)
    }
}

/// Filters `flat` by `selector` and backfills each entry from `old`.
///
/// `old` must be the prior state of the same scope and type.
pub fn project<T>(flat: &[Variable], selector: Selector, old: &[T]) -> Vec<T>
where
    T: FromVariable + Preserve,
{
    let projected: Vec<T> = flat
        .iter()
        .filter(|variable| selector.matches(variable))
        .map(|variable| backfill(T::from_variable(variable), old))
        .collect();

    debug!(
        scope = %selector.scope,
        variable_type = %selector.variable_type,
        total = flat.len(),
        selected = projected.len(),
        "projected variables"
    );

    projected
}

/// Same as [`project`] for optional Terraform attributes.
///
/// A null prior attribute stays null when nothing matches, so a block the user
/// never wrote does not show up as a change from null to empty.
pub fn project_nullable<T>(
    flat: &[Variable],
    selector: Selector,
    old: Option<&[T]>,
) -> Option<Vec<T>>
where
    T: FromVariable + Preserve,
{
    let projected = project(flat, selector, old.unwrap_or_default());
    if projected.is_empty() && old.is_none() {
        return None;
    }
    Some(projected)
}
