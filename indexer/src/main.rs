use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::index::missing_searchable_field;
use search_core::persist::{save_artifact, validate_global_name, DEFAULT_GLOBAL_NAME};
use search_core::{load_documents, searchable_fields_with, BuildOptions, Error, FieldSpec, IndexBuilder};
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the static search index artifact for the advisory site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index artifact from a JSON array of documents
    Build {
        /// Input document list, e.g. <site-output>/index.json
        #[arg(long)]
        input: PathBuf,
        /// Output script, e.g. <site-output>/search-index.js
        #[arg(long)]
        output: PathBuf,
        /// Global variable the artifact assigns
        #[arg(long, env = "SEARCH_INDEX_GLOBAL", default_value = DEFAULT_GLOBAL_NAME)]
        global_name: String,
        /// Extra field or boost as NAME or NAME:BOOST; repeatable. title, aliases, keywords and package are always indexed
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<FieldSpec>,
        /// Use smoothed IDF = ln(1 + N/df) instead of ln(N/df)
        #[arg(long, default_value_t = false)]
        smoothed_idf: bool,
    },
}

fn parse_field(raw: &str) -> Result<FieldSpec, String> {
    match raw.split_once(':') {
        Some((name, boost)) if !name.is_empty() => {
            let boost: f32 = boost.parse().map_err(|_| format!("invalid boost in `{raw}`"))?;
            if !boost.is_finite() || boost <= 0.0 {
                return Err(format!("boost must be positive in `{raw}`"));
            }
            Ok(FieldSpec::boosted(name, boost))
        }
        None if !raw.is_empty() => Ok(FieldSpec::new(raw)),
        _ => Err(format!("invalid field `{raw}`")),
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, global_name, fields, smoothed_idf } => {
            let fields = searchable_fields_with(&fields);
            build_index(&input, &output, &global_name, BuildOptions { fields, smoothed_idf })?;
            Ok(())
        }
    }
}

/// Load the collection, index it in order and write the artifact. Returns the document count.
fn build_index(input: &Path, output: &Path, global_name: &str, options: BuildOptions) -> Result<usize> {
    validate_global_name(global_name)?;
    if let Some(missing) = missing_searchable_field(&options.fields) {
        return Err(Error::Config(format!("field list lacks searchable field `{missing}`")).into());
    }
    let docs = load_documents(input).with_context(|| format!("loading {}", input.display()))?;
    tracing::info!(input = %input.display(), num_docs = docs.len(), "loaded documents");

    let mut builder = IndexBuilder::with_options(options);
    builder.add_all(&docs).context("indexing documents")?;
    let index = builder.build();

    save_artifact(output, global_name, &index).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(output = %output.display(), global_name, "index build complete");
    Ok(docs.len())
}
