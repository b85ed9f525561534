use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::QoveryError;
use super::types::{
    AliasRequest, ApiErrorBody, CustomDomainRequest, CustomDomainResponse,
    DeploymentRestrictionRequest, DeploymentRestrictionResponse, EditVariable, ListResponse,
    NewVariable, OverrideRequest, QOVERY_API_BASE, ValueRequest, VariableResponse,
};
use crate::attributes::{CustomDomain, DeploymentRestriction};
use crate::resource::ServiceRef;
use crate::variable::{Variable, VariableKind};

#[derive(Clone)]
pub struct QoveryClient {
    client: reqwest::Client,
    base_url: String,
}

impl QoveryClient {
    pub fn new(token: String) -> Result<Self, QoveryError> {
        Self::with_base_url(token, QOVERY_API_BASE.to_string())
    }

    /// NOTE: Primarily used for testing with mock servers.
    pub fn with_base_url(token: String, base_url: String) -> Result<Self, QoveryError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Token {}", token);
        let mut header_value = HeaderValue::from_str(&auth_value).map_err(|_| QoveryError::Auth {
            message: "Invalid token format".to_string(),
        })?;
        header_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(QoveryError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    pub async fn verify_auth(&self) -> Result<(), QoveryError> {
        let url = format!("{}/account", self.base_url);
        self.send::<Value>(self.client.get(&url), "account").await?;
        Ok(())
    }

    fn service_url(&self, service: &ServiceRef) -> String {
        format!("{}/{}/{}", self.base_url, service.kind.path_segment(), service.id)
    }

    fn variables_url(&self, service: &ServiceRef, kind: VariableKind) -> String {
        format!("{}/{}", self.service_url(service), kind.path_segment())
    }

    pub async fn list_variables(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
    ) -> Result<Vec<Variable>, QoveryError> {
        let url = self.variables_url(service, kind);
        let response: ListResponse<VariableResponse> =
            self.send(self.client.get(&url), kind.path_segment()).await?;

        let variables: Vec<Variable> = response
            .results
            .into_iter()
            .map(VariableResponse::into_variable)
            .collect();

        tracing::debug!(
            service = %service.id,
            kind = kind.path_segment(),
            count = variables.len(),
            "listed variables"
        );

        Ok(variables)
    }

    pub async fn create_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        variable: &NewVariable,
    ) -> Result<Variable, QoveryError> {
        let base = self.variables_url(service, kind);
        let request = match variable {
            NewVariable::Value {
                key,
                value,
                description,
            } => self.client.post(&base).json(&ValueRequest {
                key,
                value,
                description: description.as_deref(),
            }),
            NewVariable::Alias {
                parent_id,
                key,
                description,
            } => self
                .client
                .post(format!("{}/{}/alias", base, parent_id))
                .json(&AliasRequest {
                    key,
                    description: description.as_deref(),
                }),
            NewVariable::Override {
                parent_id,
                value,
                description,
            } => self
                .client
                .post(format!("{}/{}/override", base, parent_id))
                .json(&OverrideRequest {
                    value,
                    description: description.as_deref(),
                }),
        };

        let response: VariableResponse = self.send(request, kind.path_segment()).await?;
        Ok(response.into_variable())
    }

    pub async fn update_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
        edit: &EditVariable,
    ) -> Result<Variable, QoveryError> {
        let url = format!("{}/{}", self.variables_url(service, kind), id);
        let response: VariableResponse = self
            .send(self.client.put(&url).json(edit), kind.path_segment())
            .await?;
        Ok(response.into_variable())
    }

    pub async fn delete_variable(
        &self,
        service: &ServiceRef,
        kind: VariableKind,
        id: &str,
    ) -> Result<(), QoveryError> {
        let url = format!("{}/{}", self.variables_url(service, kind), id);
        self.send_empty(self.client.delete(&url), kind.path_segment()).await
    }

    pub async fn create_custom_domain(
        &self,
        service: &ServiceRef,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError> {
        let url = format!("{}/customDomain", self.service_url(service));
        let response: CustomDomainResponse = self
            .send(self.client.post(&url).json(&CustomDomainRequest::from(domain)), "customDomain")
            .await?;
        Ok(response.into_custom_domain())
    }

    pub async fn update_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
        domain: &CustomDomain,
    ) -> Result<CustomDomain, QoveryError> {
        let url = format!("{}/customDomain/{}", self.service_url(service), id);
        let response: CustomDomainResponse = self
            .send(self.client.put(&url).json(&CustomDomainRequest::from(domain)), "customDomain")
            .await?;
        Ok(response.into_custom_domain())
    }

    pub async fn delete_custom_domain(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError> {
        let url = format!("{}/customDomain/{}", self.service_url(service), id);
        self.send_empty(self.client.delete(&url), "customDomain").await
    }

    pub async fn create_deployment_restriction(
        &self,
        service: &ServiceRef,
        restriction: &DeploymentRestriction,
    ) -> Result<DeploymentRestriction, QoveryError> {
        let url = format!("{}/deploymentRestriction", self.service_url(service));
        let body = DeploymentRestrictionRequest::from(restriction);
        let response: DeploymentRestrictionResponse = self
            .send(self.client.post(&url).json(&body), "deploymentRestriction")
            .await?;
        Ok(response.into_restriction())
    }

    pub async fn delete_deployment_restriction(
        &self,
        service: &ServiceRef,
        id: &str,
    ) -> Result<(), QoveryError> {
        let url = format!("{}/deploymentRestriction/{}", self.service_url(service), id);
        self.send_empty(self.client.delete(&url), "deploymentRestriction").await
    }

    pub async fn get_advanced_settings(
        &self,
        service: &ServiceRef,
    ) -> Result<Map<String, Value>, QoveryError> {
        let url = format!("{}/advancedSettings", self.service_url(service));
        self.send(self.client.get(&url), "advancedSettings").await
    }

    /// Replaces the whole settings object. Callers merge before sending.
    pub async fn update_advanced_settings(
        &self,
        service: &ServiceRef,
        settings: &Map<String, Value>,
    ) -> Result<Map<String, Value>, QoveryError> {
        let url = format!("{}/advancedSettings", self.service_url(service));
        self.send(self.client.put(&url).json(settings), "advancedSettings").await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, QoveryError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &body, resource));
        }

        serde_json::from_str(&body).map_err(|e| QoveryError::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    async fn send_empty(&self, request: RequestBuilder, resource: &str) -> Result<(), QoveryError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body, resource));
        }

        Ok(())
    }
}

fn error_for_status(status: StatusCode, body: &str, resource: &str) -> QoveryError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => QoveryError::Auth { message },
        StatusCode::NOT_FOUND => QoveryError::NotFound {
            resource: resource.to_string(),
        },
        _ => QoveryError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

impl std::fmt::Debug for QoveryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QoveryClient")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
