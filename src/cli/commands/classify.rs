use super::{open_input, resolve_config, spinner, ChunkedRecords};
use crate::core::classifier::PlasmidClassifier;
use crate::core::model::ModelDirectory;
use crate::PlasClassError;
use clap::Args;
use colored::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Input FASTA/FASTQ file (.gz supported)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file [default: <input>.probs.out]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory with one scale_<L>.json model per length scale
    #[arg(short, long, value_name = "DIR", env = "PLASCLASS_MODELS")]
    pub models: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of sequences read and classified at once
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// Classify chunk by chunk, writing `id<TAB>probability` lines for each
/// chunk before the next is read. Returns the number of records written.
pub fn classify_records<W: Write>(
    classifier: &PlasmidClassifier,
    chunks: &mut ChunkedRecords<'_>,
    writer: &mut W,
    mut on_chunk: impl FnMut(usize),
) -> anyhow::Result<usize> {
    let mut total = 0;
    loop {
        let chunk = chunks.next_chunk()?;
        if chunk.is_empty() {
            break;
        }
        let probabilities = classifier.classify_batch(&chunk)?;
        for (seq, p) in chunk.iter().zip(&probabilities) {
            writeln!(writer, "{}\t{}", seq.id, p)?;
        }
        total += chunk.len();
        on_chunk(total);
    }
    writer.flush()?;
    Ok(total)
}

pub fn run(args: ClassifyArgs, threads: Option<usize>) -> anyhow::Result<()> {
    let config = resolve_config(args.config.as_ref(), threads, args.batch_size)?;

    let model_dir = args
        .models
        .clone()
        .or_else(|| config.models.directory.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            PlasClassError::Config(
                "no model directory given; use --models or set models.directory".to_string(),
            )
        })?;

    let classifier = PlasmidClassifier::new(&config, &ModelDirectory::new(&model_dir))?;
    let input = open_input(&args.input)?;
    let mut chunks = ChunkedRecords::new(input.records(), config.performance.batch_size);

    let output = args.output.unwrap_or_else(|| {
        let mut name = args.input.clone().into_os_string();
        name.push(".probs.out");
        PathBuf::from(name)
    });
    let mut writer = BufWriter::new(File::create(&output)?);

    let progress = spinner(&format!("Classifying {}...", args.input.display()))?;
    let total = classify_records(&classifier, &mut chunks, &mut writer, |done| {
        progress.set_message(format!("Classified {} sequences", done))
    })?;
    progress.finish_and_clear();
    chunks.report_converted();

    println!("{} Classified {} sequences", "✓".green().bold(), total);
    println!("Class scores written in: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::fastx::FastxRecords;
    use crate::core::config::default_config;
    use crate::core::model::{logistic, LinearClassifier, ScaleModel, Standardizer};
    use std::collections::HashMap;

    fn gc_classifier() -> PlasmidClassifier {
        let mut config = default_config();
        config.features.kmer_lengths = vec![1];
        config.scales.breakpoints = vec![1000];
        let mut models = HashMap::new();
        models.insert(
            1000,
            ScaleModel::new(
                Standardizer::identity(2),
                LinearClassifier::new(vec![0.0, 1.0], 0.0),
            ),
        );
        PlasmidClassifier::new(&config, &models).unwrap()
    }

    #[test]
    fn test_output_independent_of_chunk_size() {
        let data = b">a\nGGCC\n>b\nacgt\n>c\nAATT\n>d\nNNNN\n>e\nGCGA\n";
        let classifier = gc_classifier();

        let mut outputs = Vec::new();
        for chunk_size in [1, 2, 5, 100] {
            let mut chunks = ChunkedRecords::new(FastxRecords::new(data), chunk_size);
            let mut out = Vec::new();
            let mut seen = Vec::new();
            let total =
                classify_records(&classifier, &mut chunks, &mut out, |n| seen.push(n)).unwrap();
            assert_eq!(total, 5);
            assert_eq!(seen.last(), Some(&5));
            assert_eq!(seen.len(), (5 + chunk_size - 1) / chunk_size);
            outputs.push(String::from_utf8(out).unwrap());
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));

        let lines: Vec<&str> = outputs[0].lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], format!("a\t{}", logistic(1.0)));
        assert_eq!(lines[1], format!("b\t{}", logistic(0.5)));
        assert_eq!(lines[3], format!("d\t{}", logistic(0.0)));
    }
}
