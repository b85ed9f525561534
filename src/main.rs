mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;

use cli::{ApplyArgs, Cli, Command, ConnectionArgs, PlanArgs, TargetArgs};
use qovery_reconcile::output::{self, OutputFormat};
use qovery_reconcile::{
    Observed, QoveryClient, ReconcileError, Reconciler, ServicePlan, ServiceRef, ServiceState,
    TerraformState,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Refresh(args) => {
            let reconciler = reconciler(&args.connection)?;
            let (service, prior) = load_target(&args.target)?;
            let (state, _) = reconciler.refresh(&service, &prior).await?;

            if let Some(out) = &args.out {
                write_state(out, &state)?;
            }
            println!("{}", output::render_state(&state, args.target.format)?);
        }
        Command::Plan(args) => {
            let prepared = prepare(&args).await?;
            println!("{}", output::render_plan(&prepared.plan, args.target.format)?);
        }
        Command::Apply(args) => apply(&args).await?,
    }

    Ok(())
}

async fn apply(args: &ApplyArgs) -> Result<()> {
    let format = args.plan.target.format;
    let prepared = prepare(&args.plan).await?;

    if format != OutputFormat::Json {
        println!("{}", output::render_plan(&prepared.plan, format)?);
    }
    if prepared.plan.is_empty() {
        if let Some(out) = &args.out {
            write_state(out, &prepared.current)?;
        }
        return Ok(());
    }

    let (report, state) = prepared
        .reconciler
        .converge(
            &prepared.service,
            &prepared.desired,
            &prepared.current,
            &prepared.plan,
            &prepared.observed,
        )
        .await?;

    if let Some(out) = &args.out {
        write_state(out, &state)?;
    }
    println!("{}", output::render_report(&report, format)?);
    Ok(())
}

/// Writes unmasked attributes so they can feed the next run as prior state.
fn write_state(out: &Path, state: &ServiceState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(out, json).wrap_err_with(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), "state written");
    Ok(())
}

fn reconciler(connection: &ConnectionArgs) -> Result<Reconciler> {
    let token = connection
        .token
        .clone()
        .ok_or_else(|| eyre!("missing API token: pass --token or set QOVERY_API_TOKEN"))?;
    let client = QoveryClient::with_base_url(token, connection.api_url.clone())?;
    Ok(Reconciler::new(Arc::new(client)))
}

fn load_target(target: &TargetArgs) -> Result<(ServiceRef, ServiceState)> {
    let state = TerraformState::load(&target.state)?;
    let (kind, prior) = state.service(&target.address)?;

    let id = target
        .service_id
        .clone()
        .or_else(|| prior.id.clone())
        .ok_or_else(|| eyre!("{} has no id in state, pass --service-id", target.address))?;

    Ok((ServiceRef::new(kind, id), prior))
}

fn load_desired(path: &Path) -> Result<ServiceState, ReconcileError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ReconcileError::Parse {
        what: path.display().to_string(),
        source,
    })
}

struct Prepared {
    reconciler: Reconciler,
    service: ServiceRef,
    desired: ServiceState,
    current: ServiceState,
    plan: ServicePlan,
    observed: Observed,
}

/// Refreshes the target and plans the desired document against it.
async fn prepare(args: &PlanArgs) -> Result<Prepared> {
    let reconciler = reconciler(&args.connection)?;
    let (service, prior) = load_target(&args.target)?;
    let (current, observed) = reconciler.refresh(&service, &prior).await?;
    let desired = load_desired(&args.desired)?;
    let plan = Reconciler::plan(&desired, &current)?;

    Ok(Prepared {
        reconciler,
        service,
        desired,
        current,
        plan,
        observed,
    })
}
