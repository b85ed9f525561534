use qovery_reconcile::attributes::{
    CustomDomain, DeploymentRestriction, RestrictionMode, RestrictionType,
};
use qovery_reconcile::qovery::{EditVariable, NewVariable};
use qovery_reconcile::variable::{Scope, VariableKind, VariableType};
use qovery_reconcile::{QoveryClient, QoveryError, ServiceKind, ServiceRef};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> QoveryClient {
    QoveryClient::with_base_url("test_token".to_string(), server.uri()).unwrap()
}

fn app() -> ServiceRef {
    ServiceRef::new(ServiceKind::Application, "app-1")
}

#[tokio::test]
async fn test_list_variables_parses_flat_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/application/app-1/environmentVariable"))
        .and(header("Authorization", "Token test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {
                    "id": "v1",
                    "key": "PORT",
                    "value": "8080",
                    "scope": "APPLICATION",
                    "variable_type": "VALUE"
                },
                {
                    "id": "al1",
                    "key": "DB",
                    "scope": "APPLICATION",
                    "variable_type": "ALIAS",
                    "aliased_variable": {
                        "id": "env1",
                        "key": "DATABASE_URL",
                        "scope": "ENVIRONMENT"
                    }
                },
                {
                    "id": "b1",
                    "key": "QOVERY_APPLICATION_ID",
                    "value": "app-1",
                    "scope": "BUILT_IN",
                    "variable_type": "BUILT_IN"
                },
                {
                    "id": "x1",
                    "key": "FROM_THE_FUTURE",
                    "value": "?",
                    "scope": "ORGANIZATION",
                    "variable_type": "VALUE"
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let variables = client(&mock_server)
        .list_variables(&app(), VariableKind::EnvironmentVariable)
        .await
        .unwrap();

    assert_eq!(variables.len(), 4);
    assert_eq!(variables[0].value.as_deref(), Some("8080"));
    assert_eq!(variables[1].variable_type, VariableType::Alias);
    assert_eq!(variables[1].state_value(), Some("DATABASE_URL"));
    assert_eq!(variables[2].scope, Scope::BuiltIn);
    assert_eq!(variables[3].scope, Scope::Unknown);
}

#[tokio::test]
async fn test_list_secrets_without_values() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/job/job-1/secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"id": "s1", "key": "TOKEN", "scope": "JOB", "variable_type": "VALUE"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let secrets = client(&mock_server)
        .list_variables(&ServiceRef::new(ServiceKind::Job, "job-1"), VariableKind::Secret)
        .await
        .unwrap();

    assert_eq!(secrets.len(), 1);
    assert!(secrets[0].value.is_none());
}

#[tokio::test]
async fn test_create_value_alias_and_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/application/app-1/environmentVariable"))
        .and(body_json(serde_json::json!({"key": "PORT", "value": "80", "description": null})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "v1",
            "key": "PORT",
            "value": "80",
            "scope": "APPLICATION",
            "variable_type": "VALUE"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/application/app-1/environmentVariable/env1/alias"))
        .and(body_json(serde_json::json!({"key": "DB", "description": "db alias"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "al1", "key": "DB", "scope": "APPLICATION", "variable_type": "ALIAS",
            "aliased_variable": {"id": "env1", "key": "DATABASE_URL", "scope": "ENVIRONMENT"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/application/app-1/environmentVariable/proj1/override"))
        .and(body_json(serde_json::json!({"value": "debug", "description": null})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "ov1",
            "key": "LOG_LEVEL",
            "value": "debug",
            "scope": "APPLICATION",
            "variable_type": "OVERRIDE",
            "overridden_variable": {"id": "proj1", "key": "LOG_LEVEL", "scope": "PROJECT"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let kind = VariableKind::EnvironmentVariable;

    let value = client
        .create_variable(
            &app(),
            kind,
            &NewVariable::Value {
                key: "PORT".to_string(),
                value: "80".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(value.id, "v1");

    let alias = client
        .create_variable(
            &app(),
            kind,
            &NewVariable::Alias {
                parent_id: "env1".to_string(),
                key: "DB".to_string(),
                description: Some("db alias".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(alias.aliased.unwrap().key, "DATABASE_URL");

    let overridden = client
        .create_variable(
            &app(),
            kind,
            &NewVariable::Override {
                parent_id: "proj1".to_string(),
                value: "debug".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(overridden.variable_type, VariableType::Override);
}

#[tokio::test]
async fn test_update_and_delete_variable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/container/c-1/secret/s1"))
        .and(body_json(serde_json::json!({"key": "TOKEN", "value": "new", "description": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "s1", "key": "TOKEN", "scope": "CONTAINER", "variable_type": "VALUE"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/container/c-1/secret/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let service = ServiceRef::new(ServiceKind::Container, "c-1");

    let updated = client
        .update_variable(
            &service,
            VariableKind::Secret,
            "s1",
            &EditVariable {
                key: "TOKEN".to_string(),
                value: "new".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, "s1");

    client
        .delete_variable(&service, VariableKind::Secret, "s1")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Invalid token"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).verify_auth().await;

    match result {
        Err(QoveryError::Auth { message }) => assert_eq!(message, "Invalid token"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_forbidden_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/application/app-1/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": "Forbidden"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .list_variables(&app(), VariableKind::Secret)
        .await;

    assert!(matches!(result, Err(QoveryError::Auth { ref message }) if message == "Forbidden"));
}

#[tokio::test]
async fn test_api_error_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/application/app-1/environmentVariable"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "key PORT already exists"
        })))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .create_variable(
            &app(),
            VariableKind::EnvironmentVariable,
            &NewVariable::Value {
                key: "PORT".to_string(),
                value: "80".to_string(),
                description: None,
            },
        )
        .await;

    match result {
        Err(QoveryError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "key PORT already exists");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/application/app-1/environmentVariable/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .delete_variable(&app(), VariableKind::EnvironmentVariable, "gone")
        .await;

    assert!(matches!(result, Err(QoveryError::NotFound { .. })));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/application/app-1/environmentVariable"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .list_variables(&app(), VariableKind::EnvironmentVariable)
        .await;

    assert!(matches!(result, Err(QoveryError::Decode { .. })));
}

#[tokio::test]
async fn test_error_does_not_leak_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client =
        QoveryClient::with_base_url("qov_secret_token_abc".to_string(), mock_server.uri()).unwrap();
    let err = client.verify_auth().await.unwrap_err();

    assert!(!err.to_string().contains("qov_secret_token_abc"));
    assert!(!format!("{:?}", err).contains("qov_secret_token_abc"));
}

#[tokio::test]
async fn test_custom_domain_endpoints() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/application/app-1/customDomain"))
        .and(body_json(serde_json::json!({
            "domain": "api.example.com", "generate_certificate": true, "use_cdn": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "cd1",
            "domain": "api.example.com",
            "generate_certificate": true,
            "use_cdn": false,
            "status": "VALIDATION_PENDING"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/application/app-1/customDomain/cd1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let created = client
        .create_custom_domain(
            &app(),
            &CustomDomain {
                id: None,
                domain: "api.example.com".to_string(),
                generate_certificate: true,
                use_cdn: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("cd1"));
    client.delete_custom_domain(&app(), "cd1").await.unwrap();
}

#[tokio::test]
async fn test_deployment_restriction_create() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/job/job-1/deploymentRestriction"))
        .and(body_json(serde_json::json!({"mode": "EXCLUDE", "type": "PATH", "value": "docs/"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": "dr1", "mode": "EXCLUDE", "type": "PATH", "value": "docs/"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let created = client(&mock_server)
        .create_deployment_restriction(
            &ServiceRef::new(ServiceKind::Job, "job-1"),
            &DeploymentRestriction {
                id: None,
                mode: RestrictionMode::Exclude,
                restriction_type: RestrictionType::Path,
                value: "docs/".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("dr1"));
}

#[tokio::test]
async fn test_advanced_settings_get_and_put() {
    let mock_server = MockServer::start().await;
    let settings = serde_json::json!({
        "build.timeout_max_sec": 3600,
        "deployment.termination_grace_period_seconds": 60
    });

    Mock::given(method("GET"))
        .and(path("/helm/h-1/advancedSettings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings.clone()))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/helm/h-1/advancedSettings"))
        .and(body_json(settings.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(settings.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let service = ServiceRef::new(ServiceKind::Helm, "h-1");

    let current = client.get_advanced_settings(&service).await.unwrap();
    assert_eq!(current["build.timeout_max_sec"], 3600);

    let saved = client.update_advanced_settings(&service, &current).await.unwrap();
    assert_eq!(saved, current);
}
