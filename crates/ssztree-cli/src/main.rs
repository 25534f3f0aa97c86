// crates/ssztree-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ssztree_state::generator::generate_state;
use ssztree_state::io::{ensure_parent_dir, read_state_auto, write_state_auto};
use ssztree_state::{
    load_state_altair, load_state_phase0, AnyStateView, ForkName, MigrationOutcome,
};
use ssztree_view::ViewStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "ssztree-cli",
    about = "ssztree reference CLI",
    long_about = "ssztree reference CLI.\n\nUse this tool to generate synthetic state snapshots, compute hash-tree-roots, run diff-load migrations between snapshots, and convert snapshot encodings.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate a deterministic synthetic state snapshot.
    /// Encoding follows the output extension (.ssz/.json/.cbor).
    Generate {
        /// Target fork
        #[arg(value_enum, long, default_value_t = ForkOpt::Altair)]
        fork: ForkOpt,

        /// Number of validators (>0)
        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(1..))]
        validators: u32,

        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output path for the snapshot
        #[arg(long, default_value = "state.ssz")]
        out: PathBuf,
    },

    /// Compute the hash-tree-root of a state snapshot
    Root {
        /// Input snapshot (.ssz/.json/.cbor)
        #[arg(long)]
        state: PathBuf,

        /// Fork of the snapshot (used for raw .ssz inputs)
        #[arg(value_enum, long, default_value_t = ForkOpt::Altair)]
        fork: ForkOpt,
    },

    /// Diff-load a new snapshot against a seed snapshot and report the
    /// modified validator indices
    Diff {
        /// Seed snapshot (.ssz/.json/.cbor)
        #[arg(long)]
        seed: PathBuf,

        /// New snapshot to load (.ssz/.json/.cbor)
        #[arg(long)]
        state: PathBuf,

        /// Fork of both snapshots (used for raw .ssz inputs)
        #[arg(value_enum, long, default_value_t = ForkOpt::Altair)]
        fork: ForkOpt,
    },

    /// Convert a snapshot between encodings (by extension)
    Export {
        /// Input snapshot (.ssz/.json/.cbor)
        #[arg(long)]
        input: PathBuf,

        /// Output snapshot (.ssz/.json/.cbor)
        #[arg(long)]
        output: PathBuf,

        /// Fork of the input (used for raw .ssz inputs)
        #[arg(value_enum, long, default_value_t = ForkOpt::Altair)]
        fork: ForkOpt,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum ForkOpt {
    /// Genesis fork
    Phase0,
    /// Altair fork
    Altair,
}

impl From<ForkOpt> for ForkName {
    fn from(f: ForkOpt) -> Self {
        match f {
            ForkOpt::Phase0 => Self::Phase0,
            ForkOpt::Altair => Self::Altair,
        }
    }
}

impl std::fmt::Display for ForkOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phase0 => write!(f, "phase0"),
            Self::Altair => write!(f, "altair"),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate { fork, validators, seed, out } => generate(fork, validators, seed, out),
        Cmd::Root { state, fork } => root(state, fork),
        Cmd::Diff { seed, state, fork } => diff(seed, state, fork),
        Cmd::Export { input, output, fork } => export(input, output, fork),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn generate(fork: ForkOpt, validators: u32, seed: u64, out: PathBuf) -> Result<()> {
    info!(?fork, validators, seed, "generating synthetic state");
    let state = generate_state(fork.into(), validators as usize, seed);

    ensure_parent_dir(&out)?;
    write_state_auto(&out, &state)
        .with_context(|| format!("writing state snapshot to {}", out.display()))?;

    println!(
        "Generated {} state: {} validators, root={}, wrote {}",
        state.fork(),
        state.validator_count(),
        hex::encode(state.hash_tree_root()),
        out.display()
    );
    Ok(())
}

fn root(state_path: PathBuf, fork: ForkOpt) -> Result<()> {
    info!(state=%state_path.display(), "computing hash-tree-root");
    let state = read_state_auto(&state_path, fork.into())
        .with_context(|| format!("reading state snapshot {}", state_path.display()))?;

    // Compute through the tree views as well and insist they agree.
    let store = ViewStore::with_new_pool();
    let mut view = AnyStateView::from_value(&store, &state).context("building state view")?;
    let tree_root = view.hash_tree_root().context("hashing state view")?;
    anyhow::ensure!(
        tree_root == state.hash_tree_root(),
        "tree root disagrees with value root"
    );
    view.destroy();

    println!("{}", hex::encode(tree_root));
    Ok(())
}

fn diff(seed_path: PathBuf, state_path: PathBuf, fork: ForkOpt) -> Result<()> {
    info!(seed=%seed_path.display(), state=%state_path.display(), "diff-loading state");
    let seed_state = read_state_auto(&seed_path, fork.into())
        .with_context(|| format!("reading seed snapshot {}", seed_path.display()))?;
    let new_state = read_state_auto(&state_path, fork.into())
        .with_context(|| format!("reading state snapshot {}", state_path.display()))?;
    let bytes = new_state.to_ssz_bytes().context("serializing new state")?;

    let store = ViewStore::with_new_pool();
    let mut seed_view =
        AnyStateView::from_value(&store, &seed_state).context("building seed view")?;

    let MigrationOutcome { mut view, modified_validators, modified_scores } =
        match ForkName::from(fork) {
            ForkName::Phase0 => load_state_phase0(&mut seed_view, &bytes),
            ForkName::Altair => load_state_altair(&mut seed_view, &bytes),
        }
        .context("diff-load migration failed")?;

    let migrated_root = view.hash_tree_root().context("hashing migrated view")?;
    println!(
        "Migrated {} → {}: root={}",
        seed_path.display(),
        state_path.display(),
        hex::encode(migrated_root)
    );
    println!(
        "Modified validators ({}): {:?}",
        modified_validators.len(),
        modified_validators
    );
    if fork == ForkOpt::Altair {
        println!(
            "Modified inactivity scores ({}): {:?}",
            modified_scores.len(),
            modified_scores
        );
    }
    Ok(())
}

fn export(input: PathBuf, output: PathBuf, fork: ForkOpt) -> Result<()> {
    info!(input=%input.display(), output=%output.display(), "converting snapshot");
    let state = read_state_auto(&input, fork.into())
        .with_context(|| format!("reading state snapshot {}", input.display()))?;

    ensure_parent_dir(&output)?;
    write_state_auto(&output, &state)
        .with_context(|| format!("writing state snapshot to {}", output.display()))?;

    println!("Exported {} → {}", input.display(), output.display());
    Ok(())
}
