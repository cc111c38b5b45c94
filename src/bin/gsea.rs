//! GSEA - pathway set enrichment analysis CLI
//!
//! Command-line interface for enrichment runs and GSEA/DAA comparison.

use clap::{Parser, Subcommand, ValueEnum};
use composable_gsea::annotate::annotate;
use composable_gsea::compare::{compare, ComparisonMode};
use composable_gsea::correct::CorrectionMethod;
use composable_gsea::data::{
    read_results_tsv, write_results_tsv, AbundanceMatrix, DaaResultSet, Metadata,
    PathwayAnnotations, PathwayDatabase,
};
use composable_gsea::enrich::PermutationType;
use composable_gsea::error::Result;
use composable_gsea::pipeline::{run_gsea, GseaConfig};
use composable_gsea::rank::RankMethod;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// CLI-friendly ranking metric
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRankMethod {
    /// Signal-to-noise ratio of group means
    Signal2noise,
    /// Welch t statistic
    TTest,
    /// Difference of group means
    DiffAbundance,
    /// Log2 ratio of group means
    Log2Ratio,
}

impl From<CliRankMethod> for RankMethod {
    fn from(method: CliRankMethod) -> Self {
        match method {
            CliRankMethod::Signal2noise => RankMethod::Signal2Noise,
            CliRankMethod::TTest => RankMethod::TTest,
            CliRankMethod::DiffAbundance => RankMethod::DiffAbundance,
            CliRankMethod::Log2Ratio => RankMethod::Log2Ratio,
        }
    }
}

/// CLI-friendly correction method
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCorrection {
    /// Benjamini-Hochberg
    Bh,
    /// Benjamini-Yekutieli
    By,
    /// Bonferroni
    Bonferroni,
    /// No correction
    None,
}

impl From<CliCorrection> for CorrectionMethod {
    fn from(method: CliCorrection) -> Self {
        match method {
            CliCorrection::Bh => CorrectionMethod::BenjaminiHochberg,
            CliCorrection::By => CorrectionMethod::BenjaminiYekutieli,
            CliCorrection::Bonferroni => CorrectionMethod::Bonferroni,
            CliCorrection::None => CorrectionMethod::None,
        }
    }
}

/// CLI-friendly permutation type
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPermutation {
    /// Shuffle sample group labels
    Phenotype,
    /// Draw random same-size feature sets
    FeatureSet,
}

impl From<CliPermutation> for PermutationType {
    fn from(kind: CliPermutation) -> Self {
        match kind {
            CliPermutation::Phenotype => PermutationType::Phenotype,
            CliPermutation::FeatureSet => PermutationType::FeatureSet,
        }
    }
}

/// CLI-friendly comparison mode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// Two-set (Venn) summary
    Pairwise,
    /// Directional four-set (UpSet) summary
    MultiSet,
}

impl From<CliMode> for ComparisonMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Pairwise => ComparisonMode::Pairwise,
            CliMode::MultiSet => ComparisonMode::MultiSet,
        }
    }
}

/// Composable pathway set enrichment analysis
#[derive(Parser)]
#[command(name = "gsea")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run enrichment analysis
    Run {
        /// Path to abundance matrix TSV (features x samples)
        #[arg(short, long)]
        abundance: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Pathway database: GMT, or long TSV (pathway_id, feature_id)
        #[arg(short, long)]
        pathways: PathBuf,

        /// Output path for results TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Optional YAML configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pathway annotation TSV (pathway_id, name, description)
        #[arg(long)]
        annotations: Option<PathBuf>,

        /// Metadata column with the two groups
        #[arg(short, long)]
        group: Option<String>,

        /// Reference group (default: alphabetically first)
        #[arg(long)]
        reference: Option<String>,

        /// Ranking metric
        #[arg(long, value_enum)]
        rank_method: Option<CliRankMethod>,

        /// Minimum testable pathway size
        #[arg(long)]
        min_size: Option<usize>,

        /// Maximum testable pathway size
        #[arg(long)]
        max_size: Option<usize>,

        /// Number of permutations
        #[arg(long)]
        permutations: Option<usize>,

        /// Multiple testing correction
        #[arg(long, value_enum)]
        p_adjust: Option<CliCorrection>,

        /// Hit weight exponent
        #[arg(long)]
        weight: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Permutation type
        #[arg(long, value_enum)]
        permutation_type: Option<CliPermutation>,

        /// Worker threads for permutations
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Compare GSEA results with DAA results
    Compare {
        /// GSEA results TSV written by `gsea run`
        #[arg(short, long)]
        gsea: PathBuf,

        /// DAA results TSV
        #[arg(short, long)]
        daa: PathBuf,

        /// Significance threshold on adjusted p-values
        #[arg(short, long, default_value = "0.05")]
        threshold: f64,

        /// Set summary shape
        #[arg(long, value_enum, default_value = "pairwise")]
        mode: CliMode,

        /// Output path for merged records TSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output path for full comparison JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Generate an example configuration file
    Example {
        /// Output path for the example YAML
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            abundance,
            metadata,
            pathways,
            output,
            config,
            annotations,
            group,
            reference,
            rank_method,
            min_size,
            max_size,
            permutations,
            p_adjust,
            weight,
            seed,
            permutation_type,
            threads,
        } => load_config(config.as_deref())
            .map(|base| {
                apply_overrides(
                    base,
                    Overrides {
                        group,
                        reference,
                        rank_method,
                        min_size,
                        max_size,
                        permutations,
                        p_adjust,
                        weight,
                        seed,
                        permutation_type,
                        threads,
                    },
                )
            })
            .and_then(|config| {
                cmd_run(
                    &abundance,
                    &metadata,
                    &pathways,
                    annotations.as_deref(),
                    &output,
                    &config,
                )
            }),

        Commands::Compare {
            gsea,
            daa,
            threshold,
            mode,
            output,
            json,
        } => cmd_compare(
            &gsea,
            &daa,
            threshold,
            mode.into(),
            output.as_deref(),
            json.as_deref(),
        ),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "composable_gsea=debug"
    } else {
        "composable_gsea=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line values that override the YAML configuration.
struct Overrides {
    group: Option<String>,
    reference: Option<String>,
    rank_method: Option<CliRankMethod>,
    min_size: Option<usize>,
    max_size: Option<usize>,
    permutations: Option<usize>,
    p_adjust: Option<CliCorrection>,
    weight: Option<f64>,
    seed: Option<u64>,
    permutation_type: Option<CliPermutation>,
    threads: Option<usize>,
}

fn load_config(path: Option<&Path>) -> Result<GseaConfig> {
    match path {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            GseaConfig::from_yaml_file(path)
        }
        None => Ok(GseaConfig::default()),
    }
}

fn apply_overrides(mut config: GseaConfig, o: Overrides) -> GseaConfig {
    if let Some(group) = o.group {
        config.group_column = group;
    }
    if let Some(reference) = o.reference {
        config.reference_group = Some(reference);
    }
    if let Some(method) = o.rank_method {
        config.rank_method = method.into();
    }
    if let Some(min_size) = o.min_size {
        config.min_size = min_size;
    }
    if let Some(max_size) = o.max_size {
        config.max_size = max_size;
    }
    if let Some(n) = o.permutations {
        config.n_permutations = n;
    }
    if let Some(method) = o.p_adjust {
        config.p_adjust_method = method.into();
    }
    if let Some(weight) = o.weight {
        config.weight_exponent = weight;
    }
    if let Some(seed) = o.seed {
        config.seed = seed;
    }
    if let Some(kind) = o.permutation_type {
        config.permutation_type = kind.into();
    }
    if let Some(threads) = o.threads {
        config.threads = Some(threads);
    }
    config
}

/// Load a pathway database, choosing the format by file extension.
fn load_pathways(path: &Path) -> Result<(PathwayDatabase, PathwayAnnotations)> {
    let is_gmt = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("gmt"))
        .unwrap_or(false);
    if is_gmt {
        PathwayDatabase::from_gmt(path)
    } else {
        Ok((PathwayDatabase::from_tsv(path)?, PathwayAnnotations::new()))
    }
}

/// Run enrichment analysis
fn cmd_run(
    abundance_path: &Path,
    metadata_path: &Path,
    pathways_path: &Path,
    annotations_path: Option<&Path>,
    output_path: &Path,
    config: &GseaConfig,
) -> Result<()> {
    eprintln!("Loading data...");
    let abundance = AbundanceMatrix::from_tsv(abundance_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;
    let (pathways, gmt_annotations) = load_pathways(pathways_path)?;

    eprintln!(
        "Loaded {} features x {} samples, {} pathways",
        abundance.n_features(),
        abundance.n_samples(),
        pathways.len()
    );

    let lookup = match annotations_path {
        Some(path) => PathwayAnnotations::from_tsv(path)?,
        None => gmt_annotations,
    };

    eprintln!(
        "Running GSEA on '{}' ({}, {} permutations, seed {})...",
        config.group_column, config.rank_method, config.n_permutations, config.seed
    );
    let results = run_gsea(&abundance, &metadata, &pathways, config)?;
    let annotated = annotate(&results.results, &lookup);

    eprintln!("Writing results to {:?}...", output_path);
    write_results_tsv(output_path, &annotated)?;

    eprintln!(
        "Done! {} vs {} (reference)",
        results.info.case_group, results.info.reference_group
    );
    eprintln!("{}", results.summary());

    if !annotated.is_empty() {
        eprintln!("\nTop 5 pathways:");
        for a in annotated.iter().take(5) {
            eprintln!(
                "  {}: NES={:.3}, q={:.4}",
                a.display_label(),
                a.result.nes,
                a.result.p_adjust
            );
        }
    }

    Ok(())
}

/// Compare GSEA and DAA result tables
fn cmd_compare(
    gsea_path: &Path,
    daa_path: &Path,
    threshold: f64,
    mode: ComparisonMode,
    output_path: Option<&Path>,
    json_path: Option<&Path>,
) -> Result<()> {
    eprintln!("Loading results...");
    let gsea = read_results_tsv(gsea_path)?;
    let daa = DaaResultSet::from_tsv(daa_path)?;

    let comparison = compare(&gsea, &daa.results, threshold, mode)?;

    if let Some(path) = output_path {
        eprintln!("Writing merged records to {:?}...", path);
        comparison.to_tsv(path)?;
    }
    if let Some(path) = json_path {
        eprintln!("Writing comparison to {:?}...", path);
        comparison.to_json(path)?;
    }

    eprintln!("{}", comparison.summary);
    if let Some(mismatch) = comparison.scheme_mismatch {
        eprintln!(
            "Warning: GSEA ids look like {} but DAA ids look like {}",
            mismatch.gsea, mismatch.daa
        );
    }
    if !comparison.sets.intersections.is_empty() {
        eprintln!("\nIntersections:");
        for i in &comparison.sets.intersections {
            eprintln!("  {}: {}", i.sets.join(" & "), i.count);
        }
    }

    Ok(())
}

/// Generate example configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let config = GseaConfig::new("group")
        .with_rank_method(RankMethod::Signal2Noise)
        .with_size_bounds(10, 500)
        .with_permutations(1000)
        .with_seed(42);
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
