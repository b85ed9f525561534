use std::path::PathBuf;

use clap::{Parser, Subcommand};
use qovery_reconcile::output::OutputFormat;
use qovery_reconcile::qovery::QOVERY_API_BASE;

/// Reconcile a Qovery service recorded in Terraform state against the API.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild the resource's state from the API
    Refresh(RefreshArgs),
    /// Show the changes needed to reach a desired state
    Plan(PlanArgs),
    /// Plan, then execute the changes
    Apply(ApplyArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    #[arg(long, env = "QOVERY_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "QOVERY_API_URL", default_value = QOVERY_API_BASE)]
    pub api_url: String,
}

#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Path to a terraform.tfstate file
    #[arg(long, default_value = "terraform.tfstate")]
    pub state: PathBuf,

    /// Resource address, e.g. qovery_application.api
    #[arg(long)]
    pub address: String,

    /// Overrides the id recorded in state
    #[arg(long)]
    pub service_id: Option<String>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Write the refreshed attributes as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub target: TargetArgs,

    /// JSON document with the desired resource attributes
    #[arg(long)]
    pub desired: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Write the post-apply attributes as JSON, secret values included
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let backup: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(name, _)| (name.to_string(), std::env::var(name).ok()))
            .collect();

        unsafe {
            for (name, value) in vars {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }

        let result = f();

        unsafe {
            for (name, value) in backup {
                match value {
                    Some(value) => std::env::set_var(&name, value),
                    None => std::env::remove_var(&name),
                }
            }
        }

        result
    }

    #[test]
    fn test_refresh_args_from_flags() {
        let cli = Cli::parse_from([
            "qovery-reconcile",
            "refresh",
            "--token=test_token",
            "--state=prod.tfstate",
            "--address=qovery_application.api",
            "--format=json",
            "--out=refreshed.json",
        ]);

        if let Command::Refresh(args) = cli.command {
            assert_eq!(args.connection.token, Some("test_token".to_string()));
            assert_eq!(args.target.state, PathBuf::from("prod.tfstate"));
            assert_eq!(args.target.address, "qovery_application.api");
            assert_eq!(args.target.format, OutputFormat::Json);
            assert_eq!(args.out, Some(PathBuf::from("refreshed.json")));
        } else {
            panic!("Expected Refresh command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_plan_requires_desired() {
        let result = Cli::try_parse_from(["qovery-reconcile", "plan", "--address=qovery_job.cron"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_args() {
        let cli = Cli::parse_from([
            "qovery-reconcile",
            "apply",
            "--address=qovery_job.cron",
            "--desired=desired.json",
            "--service-id=job-1",
            "--format=tree",
            "--out=applied.json",
        ]);

        if let Command::Apply(args) = cli.command {
            assert_eq!(args.plan.desired, PathBuf::from("desired.json"));
            assert_eq!(args.plan.target.service_id, Some("job-1".to_string()));
            assert_eq!(args.plan.target.format, OutputFormat::Tree);
            assert_eq!(args.plan.target.state, PathBuf::from("terraform.tfstate"));
            assert_eq!(args.out, Some(PathBuf::from("applied.json")));
        } else {
            panic!("Expected Apply command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_apply_out_is_optional() {
        let cli = Cli::parse_from([
            "qovery-reconcile",
            "apply",
            "--address=qovery_application.api",
            "--desired=desired.json",
        ]);

        if let Command::Apply(args) = cli.command {
            assert!(args.out.is_none());
        } else {
            panic!("Expected Apply command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        let cli = with_env(&[("QOVERY_API_TOKEN", None), ("QOVERY_API_URL", None)], || {
            Cli::parse_from(["qovery-reconcile", "refresh", "--address=qovery_application.api"])
        });

        if let Command::Refresh(args) = cli.command {
            assert!(args.connection.token.is_none());
            assert_eq!(args.connection.api_url, QOVERY_API_BASE);
            assert_eq!(args.target.format, OutputFormat::Table);
        } else {
            panic!("Expected Refresh command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_token_and_url_from_env() {
        let cli = with_env(
            &[
                ("QOVERY_API_TOKEN", Some("env_token")),
                ("QOVERY_API_URL", Some("http://localhost:8080")),
            ],
            || Cli::parse_from(["qovery-reconcile", "refresh", "--address=qovery_application.api"]),
        );

        if let Command::Refresh(args) = cli.command {
            assert_eq!(args.connection.token, Some("env_token".to_string()));
            assert_eq!(args.connection.api_url, "http://localhost:8080");
        } else {
            panic!("Expected Refresh command, got {:?}", cli.command);
        }
    }

    #[test]
    #[serial]
    fn test_cli_flag_takes_precedence_over_env() {
        let cli = with_env(&[("QOVERY_API_TOKEN", Some("env_token"))], || {
            Cli::parse_from([
                "qovery-reconcile",
                "refresh",
                "--address=qovery_application.api",
                "--token=cli_token",
            ])
        });

        if let Command::Refresh(args) = cli.command {
            assert_eq!(args.connection.token, Some("cli_token".to_string()));
        } else {
            panic!("Expected Refresh command, got {:?}", cli.command);
        }
    }
}
