//! `kv-provisioner` binary: resolve configuration, then run one provisioning workflow.

use anyhow::Context;
use clap::Parser;
use kv_provisioner::{Cli, Config, ProvisioningWorkflow, TokenHandoff, WorkflowPlan};
use kv_vault_client::VaultClient;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            err.print()?;
            anyhow::bail!("invalid command-line arguments");
        }
    };

    rust_common::init_tracing(&cli.tracing_config()).context("failed to initialise tracing")?;

    let config = Config::from_cli(cli).context("invalid configuration")?;
    info!(
        addr = %config.vault.addr,
        region = %config.region,
        mount = %config.mount,
        path = %config.secret_path,
        fields = config.record.len(),
        "Starting KV provisioner"
    );

    let client = VaultClient::new(config.vault.clone(), config.token.clone())
        .context("failed to build Vault client")?;
    let handoff = TokenHandoff::new(
        &config.vault,
        config.token.clone(),
        &config.mount,
        &config.secret_path,
    );
    let plan = WorkflowPlan::from(&config);

    let mut stdout = std::io::stdout();
    match ProvisioningWorkflow::new(&client, plan, handoff)
        .run(&mut stdout)
        .await
    {
        Ok(report) => {
            info!(run_id = %report.run_id, version = report.written.version, "Done");
            Ok(())
        }
        Err(failure) => {
            if let Some(hint) = failure.error.hint() {
                error!(run_id = %failure.run_id, hint = %hint, "Provisioning aborted");
            }
            Err(failure.into())
        }
    }
}
