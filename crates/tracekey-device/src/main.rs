//! Tracekey command line.
//!
//! # Usage
//!
//! ```bash
//! # Provision a device identity
//! tracekey --store identity.cbor generate --source nist
//!
//! # Identifier to broadcast right now
//! tracekey --store identity.cbor identifier
//!
//! # Disclose the matching key of day 12
//! tracekey --store identity.cbor matching-key --day 12
//!
//! # Check an entropy source
//! tracekey self-test --source csprng
//! ```

#![allow(clippy::print_stdout, reason = "Command line output")]

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use tracekey_crypto::{KeySchedule, ScheduleConfig};
use tracekey_device::{
    Clock, DeviceError, DeviceIdentity, FileStore, FixedClock, SecretKeyStore, SystemClock,
};
use tracekey_entropy::{EntropyKind, EntropySource, OsSeedSource, Provisioned, stats::SelfTest};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Forward-secure contact identifiers
#[derive(Parser, Debug)]
#[command(name = "tracekey")]
#[command(about = "Forward-secure contact identifier key schedule")]
#[command(version)]
struct Args {
    /// Path of the identity record
    #[arg(short, long, default_value = "tracekey.cbor")]
    store: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a new secret key and store it
    Generate {
        /// Entropy source (prng, csprng, secure, blocking, shared, nist)
        #[arg(long, default_value = "nist")]
        source: EntropyKind,

        /// Replace an existing identity
        #[arg(long)]
        force: bool,
    },

    /// Print the identifier to broadcast
    Identifier {
        /// Unix time to evaluate instead of now
        #[arg(long)]
        at: Option<i64>,
    },

    /// Print the matching key of one day
    MatchingKey {
        /// Days since epoch
        #[arg(long)]
        day: i64,
    },

    /// Run the statistical self-test against an entropy source
    SelfTest {
        /// Entropy source (prng, csprng, secure, blocking, shared, nist)
        #[arg(long, default_value = "nist")]
        source: EntropyKind,

        /// Bytes sampled per histogram
        #[arg(long, default_value = "200000")]
        samples: u64,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            if e.requires_new_secret() {
                tracing::error!("Identity expired or missing; run `tracekey generate --force`");
            }
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<ExitCode, DeviceError> {
    let schedule = KeySchedule::new(ScheduleConfig::default())?;
    let store = FileStore::new(&args.store);

    match args.command {
        Command::Generate { source, force } => {
            let existing = match store.load() {
                Ok(existing) => existing.is_some(),
                Err(e) if force => {
                    tracing::warn!(error = %e, "Discarding unreadable identity record");
                    store.clear()?;
                    false
                },
                Err(e) => return Err(e.into()),
            };
            if existing && !force {
                tracing::warn!(
                    path = %store.path().display(),
                    "Identity exists; pass --force to replace it"
                );
                return Ok(ExitCode::FAILURE);
            }

            let Provisioned { source, origin } =
                EntropySource::provision(source, Arc::new(OsSeedSource))?;
            let mut identity = DeviceIdentity::open(store, SystemClock, schedule, &source)?;
            if existing {
                identity.rotate(&source)?;
            }

            println!("entropy source: {} ({origin:?})", identity.entropy_kind());
            println!("created at: {}", identity.created_at_secs());
        },

        Command::Identifier { at: Some(secs) } => {
            let mut identity = DeviceIdentity::load(store, FixedClock::at_secs(secs), schedule)?;
            print_identifier(&mut identity)?;
        },

        Command::Identifier { at: None } => {
            let mut identity = DeviceIdentity::load(store, SystemClock, schedule)?;
            print_identifier(&mut identity)?;
        },

        Command::MatchingKey { day } => {
            let identity = DeviceIdentity::load(store, SystemClock, schedule)?;
            println!("{}", hex::encode(identity.matching_key(day)?.as_bytes()));
        },

        Command::SelfTest { source, samples } => {
            let Provisioned { source, origin } =
                EntropySource::provision(source, Arc::new(OsSeedSource))?;
            let report = SelfTest { samples, ..SelfTest::default() }.run(&source)?;

            let kind = source.kind();
            println!("source: {kind} ({origin:?})");
            println!("cryptographic: {}", kind.is_cryptographic());
            println!("blocking: {}", kind.is_blocking());
            println!("sequence uniformity error: {:.4}", report.sequence_error);
            println!("first-byte uniformity error: {:.4}", report.value_error);
            println!("u32 repeats: {}", report.u32_duplicates);
            println!("u64 repeats: {}", report.u64_duplicates);
            println!("next_u64: {:?}", Duration::from_nanos(report.nanos_per_u64));

            if !report.passed() {
                println!("FAILED");
                return Ok(ExitCode::FAILURE);
            }
            println!("passed");
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn print_identifier<S: SecretKeyStore, C: Clock>(
    identity: &mut DeviceIdentity<S, C>,
) -> Result<(), DeviceError> {
    let current = identity.contact_identifier()?;
    println!("day: {}", current.day);
    println!("period: {}", current.period);
    println!("identifier: {}", current.identifier);
    Ok(())
}
