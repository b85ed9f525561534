//! Qovery service reconciliation.
//!
//! Diffs keyed collections between desired and current Terraform state,
//! projects the API's flat variable lists back into typed state and keeps
//! write-only values the API never returns.

pub mod advanced_settings;
pub mod attributes;
pub mod collection;
pub mod diff;
pub mod error;
pub mod output;
pub mod plan;
pub mod preserve;
pub mod project;
pub mod qovery;
pub mod reconcile;
pub mod resource;
pub mod terraform;
pub mod variable;

pub use collection::Keyed;
pub use diff::{DiffRequest, diff, diff_nullable};
pub use error::ReconcileError;
pub use plan::ServicePlan;
pub use preserve::{Preserve, backfill, backfill_all};
pub use project::{Selector, project, project_nullable};
pub use qovery::{QoveryClient, QoveryError};
pub use reconcile::{ApplyReport, QoveryApi, Reconciler};
pub use resource::{Observed, ServiceKind, ServiceRef, ServiceState};
pub use terraform::TerraformState;
