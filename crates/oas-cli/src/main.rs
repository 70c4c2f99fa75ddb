//! # oas-cli
//!
//! CLI application for the OAS Document Engine.
//!
//! This crate provides the command-line interface for rendering schema
//! manifests into JSON documents and probing their namespace trees.

use anyhow::Context;
use clap::{Parser, Subcommand};
use oas_registry::{Lookup, ManifestLoader, Member, Resolver};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oas")]
#[command(about = "OAS Document Engine CLI")]
#[command(version)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a manifest into a JSON document
    Generate {
        /// Manifest file path (JSON or YAML)
        manifest: PathBuf,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Resolve a slash path against a manifest's namespace tree
    Lookup {
        /// Manifest file path (JSON or YAML)
        manifest: PathBuf,

        /// Query path, e.g. schemas/Person
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            manifest,
            output,
            compact,
        } => {
            let loader = ManifestLoader::new();
            let mut loaded = loader
                .load_from_file(&manifest)
                .with_context(|| format!("loading manifest {}", manifest.display()))?;
            let resolver = Resolver::new();
            let document = loaded.registry.as_document(loaded.root, &resolver)?;

            let rendered = if compact {
                serde_json::to_string(&document)?
            } else {
                serde_json::to_string_pretty(&document)?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!("wrote document to {}", path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(())
        }
        Commands::Lookup { manifest, path } => {
            let loader = ManifestLoader::new();
            let loaded = loader
                .load_from_file(&manifest)
                .with_context(|| format!("loading manifest {}", manifest.display()))?;
            let mut lookup = Lookup::new();

            match lookup.lookup(&loaded.registry, loaded.root, &path) {
                Some(member) => {
                    let kind = match &member {
                        Member::Entity(_) => "entity",
                        Member::Namespace(_) => "namespace",
                        Member::Alias { .. } => "alias",
                    };
                    println!("{kind} {}", loaded.registry.member_name(&member));
                    Ok(())
                }
                None => anyhow::bail!("no member found at path: {path}"),
            }
        }
    }
}
