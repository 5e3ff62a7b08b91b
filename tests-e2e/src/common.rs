use anyhow::{anyhow, Context, Result};
use ibc_solana_submitter::{RpcConnection, Submitter, SubmitterConfig};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::env;
use std::str::FromStr;
use std::sync::Arc;

pub struct TestContext {
    pub submitter: Submitter<RpcConnection>,
    /// Same key as the submitter's payer, doubles as the faucet
    pub payer: Arc<Keypair>,
    pub client_id: String,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        let config = match env::var("SUBMITTER_CONFIG") {
            Ok(path) => SubmitterConfig::from_file(shellexpand::tilde(&path).into_owned())
                .and_then(SubmitterConfig::with_env_overrides),
            Err(_) => SubmitterConfig::from_env(),
        }
        .context("invalid submitter config")?;

        let keypair_path = env::var("KEYPAIR")
            .unwrap_or_else(|_| shellexpand::tilde("~/.config/solana/id.json").into_owned());
        let payer = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow!("failed to read keypair {}: {}", keypair_path, e))?;
        let payer = Arc::new(payer);

        let connection = Arc::new(RpcConnection::from_config(&config));
        let submitter = Submitter::from_shared(connection, Arc::clone(&payer), config);
        let client_id = env::var("CLIENT_ID").unwrap_or_else(|_| "07-tendermint-0".to_string());

        Ok(Self {
            submitter,
            payer,
            client_id,
        })
    }
}

/// Pubkey from the environment, `None` when unset
pub fn pubkey_var(name: &str) -> Result<Option<Pubkey>> {
    match env::var(name) {
        Ok(value) => Pubkey::from_str(&value)
            .map(Some)
            .with_context(|| format!("{} is not a valid pubkey", name)),
        Err(_) => Ok(None),
    }
}
