//! btc-attest: Bitcoin signature attestation CLI
//!
//! Encodes and decodes verification instructions, checks the outcome of a
//! broadcast attestation, and runs the whole pipeline against the
//! in-memory ledger.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use btc_attestation::{
    decode, encode, AttestationApi, AttestationConfig, AttestationService, FinalityTier,
    InMemoryLedger, RpcLedgerClient, ServiceConfig, SubmissionHandle, VerificationRequest,
};

/// btc-attest: prove Bitcoin signatures on-chain
#[derive(Parser, Debug)]
#[command(name = "btc-attest")]
#[command(about = "Bitcoin signature attestation through an on-chain verification program")]
#[command(version)]
struct Args {
    /// JSON-RPC endpoint (overrides BTC_ATTEST_RPC_URL)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Verification program id (overrides BTC_ATTEST_PROGRAM_ID)
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// processed | confirmed | finalized (overrides BTC_ATTEST_COMMITMENT)
    #[arg(long, global = true)]
    commitment: Option<FinalityTier>,

    /// Finality deadline in seconds (overrides BTC_ATTEST_CONFIRM_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the instruction payload for a request as hex
    Encode {
        /// Bitcoin address
        #[arg(long)]
        address: String,
        /// Signed message
        #[arg(long)]
        message: String,
        /// Signature as hex
        #[arg(long)]
        signature: String,
    },
    /// Decode a hex instruction payload
    Decode {
        /// Payload hex
        payload: String,
    },
    /// Wait for a broadcast attestation and print its outcome
    Check {
        /// Transaction signature returned by the signer
        signature: String,
    },
    /// Run the full pipeline against the in-memory ledger
    Simulate {
        /// Bitcoin address
        #[arg(long)]
        address: String,
        /// Signed message
        #[arg(long)]
        message: String,
        /// Signature as hex
        #[arg(long)]
        signature: String,
    },
}

impl Args {
    fn config(&self) -> AttestationConfig {
        let mut config = AttestationConfig::from_env();
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(program_id) = &self.program_id {
            config.program_id = Some(program_id.clone());
        }
        if let Some(commitment) = self.commitment {
            config.commitment = commitment;
        }
        if let Some(secs) = self.timeout {
            config.confirm_timeout = Duration::from_secs(secs);
        }
        config.json_logs |= self.json;
        config
    }
}

fn init_tracing(config: &AttestationConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.config();
    init_tracing(&config)?;
    debug!(?config, "Loaded configuration");

    match args.command {
        Command::Encode {
            address,
            message,
            signature,
        } => {
            let request = VerificationRequest::new(address, message, &signature)
                .context("invalid verification request")?;
            let payload = encode(&request);
            info!(len = payload.len(), "Encoded instruction");
            println!("{}", payload.to_hex());
        }

        Command::Decode { payload } => {
            let bytes = hex::decode(payload.trim()).context("payload is not hex")?;
            let decoded = decode(&bytes).context("payload is not a verification instruction")?;
            println!("address:   {}", decoded.address);
            println!("message:   {}", decoded.message);
            println!("signature: {}", decoded.signature_hex());
        }

        Command::Check { signature } => {
            let service_config =
                ServiceConfig::for_reading(&config).context("invalid configuration")?;
            let ledger = Arc::new(
                RpcLedgerClient::from_config(&config).context("failed to build RPC client")?,
            );
            let service = AttestationService::new(ledger, service_config);

            let outcome = service
                .check(&SubmissionHandle::new(signature))
                .await
                .context("attestation check failed")?;
            println!("{outcome}");
        }

        Command::Simulate {
            address,
            message,
            signature,
        } => {
            let mut service_config = match config.program() {
                Ok(program_id) => ServiceConfig::new(program_id),
                Err(_) => ServiceConfig::new(btc_attestation::Pubkey::new([7u8; 32])),
            };
            service_config.commitment = config.commitment;
            service_config.poll_interval = Duration::from_millis(10);
            service_config.confirm_timeout = config.confirm_timeout;
            if service_config.confirm_timeout.is_zero() {
                bail!("timeout must be greater than zero");
            }

            let ledger = Arc::new(InMemoryLedger::new(service_config.program_id));
            let service =
                AttestationService::new(ledger.clone(), service_config).with_signer(ledger);

            let outcome = service
                .verify(&address, &message, &signature)
                .await
                .context("simulated attestation failed")?;
            println!("{outcome}");
        }
    }

    Ok(())
}
