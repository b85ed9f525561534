mod client;
mod error;
mod types;

pub use client::QoveryClient;
pub use error::QoveryError;
pub use types::{EditVariable, NewVariable, QOVERY_API_BASE};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::attributes::{CustomDomain, DeploymentRestriction};
use crate::reconcile::QoveryApi;
use crate::resource::ServiceRef;
use crate::variable::{Variable, VariableKind};

#[async_trait]
impl QoveryApi for QoveryClient {
    async fn list_variables(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
    ) -> Result<Vec<Variable>, QoveryError> {
        QoveryClient::list_variables(self, service, kind).await
    }

    async fn create_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        variable: &NewVariable,
    ) -> Result<Variable, QoveryError> {
        QoveryClient::create_variable(self, service, kind, variable).await
    }

    async fn update_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
        edit: &EditVariable,
    ) -> Result<Variable, QoveryError> {
        QoveryClient::update_variable(self, service, kind, id, edit).await
    }

    async fn delete_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
    ) -> Result<(), QoveryError> {
        QoveryClient::delete_variable(self, service, kind, id).await
    }

    async fn create_custom_domain(
        &self,
        service: &ServiceRef,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError> {
        QoveryClient::create_custom_domain(self, service, domain).await
    }

    async fn update_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError> {
        QoveryClient::update_custom_domain(self, service, id, domain).await
    }

    async fn delete_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError> {
        QoveryClient::delete_custom_domain(self, service, id).await
    }

    async fn create_deployment_restriction(
        &self,
        service: &ServiceRef,
        restriction: &DeploymentRestriction,
    ) -> Result<DeploymentRestriction, QoveryError> {
        QoveryClient::create_deployment_restriction(self, service, restriction).await
    }

    async fn delete_deployment_restriction(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError> {
        QoveryClient::delete_deployment_restriction(self, service, id).await
    }

    async fn get_advanced_settings(
        &self,
        service: &ServiceRef,
    ) -> Result<Map<String, Value>, QoveryError> {
        QoveryClient::get_advanced_settings(self, service).await
    }

    async fn update_advanced_settings(
        &self,
        service: &ServiceRef,
        settings: &Map<String, Value>,
    ) -> Result<Map<String, Value>, QoveryError> {
        QoveryClient::update_advanced_settings(self, service, settings).await
    }
}
