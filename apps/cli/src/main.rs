//! cPOP CLI
//!
//! Build claim trees from exported claim records, print roots and proofs,
//! and check proofs the way a verifier would.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use cpop_core::{ClaimRecord, Node, TreeConfig};
use cpop_logging::LogLevel;
use cpop_merkle::{
    claim_leaf, node_from_slice, verify_positional, Hasher, MerkleProof, MerkleTree,
    PoseidonHasher, Sha256Hasher,
};

/// cPOP - compressed proof-of-participation claim trees
#[derive(Parser)]
#[command(name = "cpop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Hash function for leaves and nodes
    #[arg(long, value_enum, default_value_t = HasherKind::Poseidon)]
    hasher: HasherKind,

    /// Tree configuration file (JSON); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refuse hashers the on-chain verifier cannot reproduce
    #[arg(long)]
    production: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum HasherKind {
    /// Development placeholder
    Sha256,
    /// Circom Poseidon over BN254
    Poseidon,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the leaf for a single claim
    Leaf {
        /// Event account (hex)
        #[arg(long)]
        event: String,

        /// Claimer wallet (hex)
        #[arg(long)]
        claimer: String,

        #[arg(long)]
        token_id: u64,

        /// Unix timestamp of the claim
        #[arg(long)]
        claim_time: u64,
    },

    /// Build the tree from a claims file and print its root
    Root {
        /// JSON array of claim records
        claims: PathBuf,
    },

    /// Print the inclusion proof for one claim
    Proof {
        /// JSON array of claim records
        claims: PathBuf,

        /// Leaf index (insertion order)
        index: i64,
    },

    /// Verify a leaf against a root
    Verify {
        /// Leaf hash (hex)
        #[arg(long)]
        leaf: String,

        /// Expected root (hex)
        #[arg(long)]
        root: String,

        /// Sibling hashes in order, checked with the positional side rule
        #[arg(long = "sibling")]
        siblings: Vec<String>,

        /// Proof file with explicit sides (output of `proof`), used instead of --sibling
        #[arg(long, conflicts_with = "siblings")]
        proof: Option<PathBuf>,
    },

    /// Estimate the on-chain account size for a tree
    Space {
        #[arg(long)]
        depth: Option<u32>,

        #[arg(long)]
        buffer: Option<u32>,

        #[arg(long)]
        canopy: Option<u32>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = cpop_logging::init(LogLevel::from_verbosity(cli.verbose)) {
        eprintln!("{}", e);
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when a verification was performed and failed.
fn run(cli: Cli) -> Result<bool> {
    let mut config = load_config(cli.config.as_deref())?;
    if cli.production {
        config.require_circuit_friendly = true;
    }
    let hasher = make_hasher(cli.hasher);

    match cli.command {
        Commands::Leaf {
            event,
            claimer,
            token_id,
            claim_time,
        } => {
            let record = ClaimRecord::new(
                parse_node(&event).context("Invalid --event")?,
                parse_node(&claimer).context("Invalid --claimer")?,
                token_id,
                claim_time,
            );
            let leaf = claim_leaf(&hasher, &record)?;
            println!("{}", hex::encode(leaf));
        }

        Commands::Root { claims } => {
            let mut tree = build_tree(hasher, config, &claims)?;
            let root = tree.root()?;
            info!("Tree has {} leaves, depth {}", tree.len(), tree.depth());
            println!("{}", hex::encode(root));
        }

        Commands::Proof { claims, index } => {
            let mut tree = build_tree(hasher, config, &claims)?;
            let root = tree.root()?;
            let proof = tree.get_path(index)?;
            if !proof.matches_positional_rule() {
                warn!(
                    "Proof for leaf {} needs explicit sides; bare-sibling verifiers will reject it",
                    index
                );
            }
            let leaf = tree.leaves()[proof.leaf_index];
            let output = serde_json::json!({
                "leaf": hex::encode(leaf),
                "root": hex::encode(root),
                "proof": proof,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Verify {
            leaf,
            root,
            siblings,
            proof,
        } => {
            let leaf = parse_node(&leaf).context("Invalid --leaf")?;
            let root = parse_node(&root).context("Invalid --root")?;

            let valid = match proof {
                Some(path) => {
                    let proof = load_proof(&path)?;
                    proof.verify(&hasher, &leaf, &root)?
                }
                None => {
                    let siblings = siblings
                        .iter()
                        .map(|s| hex::decode(s).with_context(|| format!("Invalid --sibling {}", s)))
                        .collect::<Result<Vec<_>>>()?;
                    verify_positional(&hasher, &leaf, &siblings, &root)?
                }
            };

            println!("{}", if valid { "valid" } else { "invalid" });
            return Ok(valid);
        }

        Commands::Space {
            depth,
            buffer,
            canopy,
        } => {
            config.max_depth = depth.unwrap_or(config.max_depth);
            config.max_buffer_size = buffer.unwrap_or(config.max_buffer_size);
            config.canopy_depth = canopy.unwrap_or(config.canopy_depth);
            config.validate()?;
            println!("{}", config.account_space());
        }
    }

    Ok(true)
}

fn make_hasher(kind: HasherKind) -> Box<dyn Hasher> {
    match kind {
        HasherKind::Sha256 => Box::new(Sha256Hasher::new()),
        HasherKind::Poseidon => Box::new(PoseidonHasher::new()),
    }
}

fn load_config(path: Option<&Path>) -> Result<TreeConfig> {
    let Some(path) = path else {
        return Ok(TreeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: TreeConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid config {:?}", path))?;
    Ok(config)
}

fn load_claims(path: &Path) -> Result<Vec<ClaimRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read claims {:?}", path))?;
    let claims: Vec<ClaimRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid claims file {:?}", path))?;
    if claims.is_empty() {
        warn!("Claims file {:?} is empty; root will be all zeros", path);
    }
    Ok(claims)
}

fn load_proof(path: &Path) -> Result<MerkleProof> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read proof {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid proof file {:?}", path))?;
    // Accept both the bare proof and the full `proof` command output
    let proof = value.get("proof").cloned().unwrap_or(value);
    Ok(serde_json::from_value(proof)?)
}

fn build_tree(
    hasher: Box<dyn Hasher>,
    config: TreeConfig,
    claims: &Path,
) -> Result<MerkleTree<Box<dyn Hasher>>> {
    let records = load_claims(claims)?;
    let mut tree = MerkleTree::with_config(hasher, config)?;
    for record in &records {
        tree.append_claim(record)?;
    }
    info!("Loaded {} claims from {:?}", records.len(), claims);
    Ok(tree)
}

fn parse_node(s: &str) -> Result<Node> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)?;
    Ok(node_from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_node() {
        let hex = "ab".repeat(32);
        assert_eq!(parse_node(&hex).unwrap(), [0xABu8; 32]);
        assert_eq!(parse_node(&format!("0x{}", hex)).unwrap(), [0xABu8; 32]);
        assert!(parse_node(&"ab".repeat(31)).is_err());
        assert!(parse_node("zz").is_err());
    }

    #[test]
    fn test_verify_flags_conflict() {
        let result = Cli::try_parse_from([
            "cpop", "verify", "--leaf", "00", "--root", "00", "--sibling", "00", "--proof", "p.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_make_hasher() {
        assert_eq!(make_hasher(HasherKind::Sha256).name(), "sha256");
        assert!(make_hasher(HasherKind::Poseidon).is_circuit_friendly());
    }
}
