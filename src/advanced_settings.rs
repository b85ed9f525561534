//! Service advanced settings.
//!
//! Qovery exposes several hundred tuning knobs as one flat JSON object. The
//! provider stores the subset a user configured as a JSON string, so refresh
//! must only look at those keys and plan must only send what changed.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Bool,
    Integer,
    String,
    StringList,
}

impl SettingKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Integer => "integer",
            Self::String => "string",
            Self::StringList => "list of strings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingSpec {
    pub key: &'static str,
    pub description: &'static str,
    pub kind: SettingKind,
}

const fn setting(key: &'static str, kind: SettingKind, description: &'static str) -> SettingSpec {
    SettingSpec {
        key,
        description,
        kind,
    }
}

pub const SERVICE_SETTINGS: &[SettingSpec] = &[
    setting("build.timeout_max_sec", SettingKind::Integer, "Maximum build duration in seconds"),
    setting(
        "build.cpu_max_in_milli",
        SettingKind::Integer,
        "CPU allocated to the build in millicores",
    ),
    setting("build.ram_max_in_gib", SettingKind::Integer, "Memory allocated to the build in GiB"),
    setting(
        "deployment.termination_grace_period_seconds",
        SettingKind::Integer,
        "Seconds Kubernetes waits before killing a terminating pod",
    ),
    setting("deployment.update_strategy.type", SettingKind::String, "RollingUpdate or Recreate"),
    setting(
        "deployment.update_strategy.rolling_update.max_unavailable_percent",
        SettingKind::Integer,
        "Share of pods that may be unavailable during a rolling update",
    ),
    setting(
        "deployment.update_strategy.rolling_update.max_surge_percent",
        SettingKind::Integer,
        "Share of extra pods allowed during a rolling update",
    ),
    setting(
        "deployment.affinity.node.required",
        SettingKind::StringList,
        "Node labels a pod must be scheduled on",
    ),
    setting(
        "network.ingress.proxy_body_size_mb",
        SettingKind::Integer,
        "Maximum request body size accepted by the ingress",
    ),
    setting("network.ingress.enable_cors", SettingKind::Bool, "Enable CORS on the ingress"),
    setting("network.ingress.cors_allow_origin", SettingKind::String, "Allowed CORS origins"),
    setting(
        "network.ingress.whitelist_source_range",
        SettingKind::String,
        "Comma separated CIDRs allowed to reach the service",
    ),
    setting(
        "network.ingress.proxy_read_timeout_seconds",
        SettingKind::Integer,
        "Timeout for reading a response from the service",
    ),
    setting(
        "readiness_probe.initial_delay_seconds",
        SettingKind::Integer,
        "Delay before the first readiness probe",
    ),
    setting(
        "readiness_probe.period_seconds",
        SettingKind::Integer,
        "Interval between readiness probes",
    ),
    setting(
        "liveness_probe.initial_delay_seconds",
        SettingKind::Integer,
        "Delay before the first liveness probe",
    ),
    setting(
        "liveness_probe.period_seconds",
        SettingKind::Integer,
        "Interval between liveness probes",
    ),
    setting(
        "hpa.cpu.average_utilization_percent",
        SettingKind::Integer,
        "CPU target for horizontal autoscaling",
    ),
    setting(
        "security.service_account_name",
        SettingKind::String,
        "Kubernetes service account to run as",
    ),
    setting(
        "security.read_only_root_filesystem",
        SettingKind::Bool,
        "Mount the root filesystem read-only",
    ),
];

pub fn spec_for(key: &str) -> Option<&'static SettingSpec> {
    SERVICE_SETTINGS.iter().find(|spec| spec.key == key)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvancedSettingsError {
    #[error("advanced settings must be a JSON object: {0}")]
    Malformed(String),

    #[error("unknown advanced setting '{key}'")]
    UnknownKey { key: String },

    #[error("advanced setting '{key}' expects a {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// Parses the JSON string stored in state.
pub fn parse(json: &str) -> Result<Map<String, Value>, AdvancedSettingsError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AdvancedSettingsError::Malformed(format!("got {other}"))),
        Err(e) => Err(AdvancedSettingsError::Malformed(e.to_string())),
    }
}

/// Checks every key is known and every value has the declared type.
pub fn validate(settings: &Map<String, Value>) -> Result<(), AdvancedSettingsError> {
    for (key, value) in settings {
        let spec = spec_for(key)
            .ok_or_else(|| AdvancedSettingsError::UnknownKey { key: key.clone() })?;
        if !spec.kind.accepts(value) {
            return Err(AdvancedSettingsError::WrongType {
                key: key.clone(),
                expected: spec.kind.name(),
            });
        }
    }
    Ok(())
}

/// Desired settings whose value differs from the current one.
pub fn changed(desired: &Map<String, Value>, current: &Map<String, Value>) -> Map<String, Value> {
    desired
        .iter()
        .filter(|(key, value)| current.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Keeps the API values of the keys prior state configured.
///
/// Keys the API no longer returns are dropped, which surfaces as drift.
pub fn retain_configured(
    api: &Map<String, Value>,
    prior: &Map<String, Value>,
) -> Map<String, Value> {
    prior
        .keys()
        .filter_map(|key| api.get(key).map(|value| (key.clone(), value.clone())))
        .collect()
}
