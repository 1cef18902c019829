use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use ribo_profile::annotation::io::open_bufread;
use ribo_profile::rnaseq::{rnaseq_from_alignments, rnaseq_from_table};
use ribo_profile::{create_file, merge_files, Container, CreateOptions};

/// Create, merge and inspect ribosome profiling containers.
#[derive(Parser, Debug)]
#[command(name = "ribo-profile")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Quantify alignments into a new single-experiment container
    Create(CreateArgs),

    /// Merge two or more compatible containers into one
    Merge(MergeArgs),

    /// Print a summary of a container
    Info(InfoArgs),

    /// Attach RNA-seq region values to an experiment, writing a new container
    Rnaseq(RnaseqArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// Experiment name
    #[arg(long, short)]
    name: String,

    /// Reference name stored in the container
    #[arg(long, short)]
    reference: String,

    /// Transcript lengths table (`name length`, optionally .gz)
    #[arg(long)]
    lengths: PathBuf,

    /// Annotation BED with UTR5 / CDS / UTR3 rows (optionally .gz)
    #[arg(long, short)]
    annotation: PathBuf,

    /// Transcriptome alignments in BED format (optionally .gz)
    #[arg(long)]
    alignments: PathBuf,

    /// Output container
    #[arg(long, short)]
    output: PathBuf,

    #[arg(long, default_value_t = 15)]
    length_min: u32,

    #[arg(long, default_value_t = 35)]
    length_max: u32,

    /// Nucleotides on each side of the start / stop site
    #[arg(long, default_value_t = 50)]
    radius: u32,

    /// Junction span upstream of the start / stop site
    #[arg(long, default_value_t = 35)]
    left_span: u32,

    /// Junction span downstream of the start / stop site
    #[arg(long, default_value_t = 15)]
    right_span: u32,

    /// Do not store nucleotide coverage
    #[arg(long)]
    no_coverage: bool,

    /// Worker threads for per-length quantification
    #[arg(long, short, default_value_t = 1)]
    threads: usize,

    /// Directory for temporary partition files
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// JSON file with experiment metadata
    #[arg(long)]
    experiment_metadata: Option<PathBuf>,

    /// JSON file with container metadata
    #[arg(long)]
    container_metadata: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// Output container
    #[arg(long, short)]
    output: PathBuf,

    /// Input containers
    #[arg(required = true, num_args = 2..)]
    inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Container file
    container: PathBuf,
}

#[derive(Args, Debug)]
struct RnaseqArgs {
    /// Input container
    #[arg(long, short)]
    input: PathBuf,

    /// Experiment to attach the values to
    #[arg(long, short)]
    name: String,

    /// RNA-seq values, as a counts table or as alignments (see --format)
    #[arg(long)]
    values: PathBuf,

    /// How to read --values
    #[arg(long, value_enum, default_value_t = RnaseqFormat::Table)]
    format: RnaseqFormat,

    /// Output container
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RnaseqFormat {
    /// `transcript UTR5 UTR5_junction CDS UTR3_junction UTR3`
    Table,
    /// BED alignments, quantified per extended region
    Alignments,
}

fn read_optional(path: &Option<PathBuf>) -> Result<Option<String>> {
    path.as_ref()
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Create(args) => {
            let mut opts = CreateOptions::new(&args.reference)
                .lengths(args.length_min, args.length_max)
                .radius(args.radius)
                .spans(args.left_span, args.right_span)
                .store_coverage(!args.no_coverage)
                .threads(args.threads);
            if let Some(dir) = &args.tmp_dir {
                opts = opts.tmp_dir(dir);
            }
            opts.experiment_metadata = read_optional(&args.experiment_metadata)?;
            opts.container_metadata = read_optional(&args.container_metadata)?;

            let container = create_file(
                &args.output,
                &args.name,
                &args.lengths,
                &args.annotation,
                &args.alignments,
                &opts,
            )
            .with_context(|| format!("creating {} from {}", args.output.display(), args.alignments.display()))?;
            println!("{container}");
        }

        Command::Merge(args) => {
            let merged = merge_files(&args.output, &args.inputs)
                .with_context(|| format!("merging into {}", args.output.display()))?;
            println!("{merged}");
        }

        Command::Info(args) => {
            let container = Container::load(&args.container)
                .with_context(|| format!("reading container {}", args.container.display()))?;
            println!("{container}");
        }

        Command::Rnaseq(args) => {
            let container = Container::load(&args.input)
                .with_context(|| format!("reading container {}", args.input.display()))?;
            let reader = open_bufread(&args.values)?;
            let table = match args.format {
                RnaseqFormat::Table => rnaseq_from_table(reader, container.transcripts()),
                RnaseqFormat::Alignments => {
                    rnaseq_from_alignments(reader, container.transcripts(), &container.extended_annotation())
                }
            }
            .with_context(|| format!("reading RNA-seq values from {}", args.values.display()))?;
            let updated = container.with_rnaseq(&args.name, table)?;
            updated
                .save(&args.output)
                .with_context(|| format!("writing {}", args.output.display()))?;
            info!("RNA-seq values attached to {} in {}", args.name, args.output.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rnaseq_format_defaults_to_a_table() {
        let cli = Cli::try_parse_from(["ribo-profile", "rnaseq", "-i", "in.ribo", "-n", "e1", "--values", "v.tsv", "-o", "out.ribo"])
            .unwrap();
        let Command::Rnaseq(args) = cli.cmd else { panic!("expected rnaseq") };
        assert!(matches!(args.format, RnaseqFormat::Table));

        let cli = Cli::try_parse_from([
            "ribo-profile", "rnaseq", "-i", "in.ribo", "-n", "e1", "--values", "r.bed.gz", "--format", "alignments", "-o", "o.ribo",
        ])
        .unwrap();
        let Command::Rnaseq(args) = cli.cmd else { panic!("expected rnaseq") };
        assert!(matches!(args.format, RnaseqFormat::Alignments));

        assert!(Cli::try_parse_from(["ribo-profile", "rnaseq", "-i", "in.ribo", "-n", "e1", "-o", "o.ribo"]).is_err());
    }
}
