use super::{open_input, resolve_config, spinner, ChunkedRecords};
use crate::kmer::{CanonicalIndexTable, KmerProfiler};
use crate::utils::parallel::build_worker_pool;
use clap::Args;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct FeaturesArgs {
    /// Input FASTA/FASTQ file (.gz supported)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output TSV file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file (TOML); k-mer lengths and performance settings are used
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of feature rows held in memory at once
    #[arg(long)]
    pub batch_size: Option<usize>,
}

/// One row per record: identifier followed by its feature vector. Rows of a
/// chunk are computed into one flat matrix and written before the next chunk
/// is read. Returns the number of rows written.
pub fn write_features<W: Write>(
    profiler: &KmerProfiler,
    pool: &ThreadPool,
    chunks: &mut ChunkedRecords<'_>,
    writer: &mut W,
) -> anyhow::Result<usize> {
    let dimension = profiler.dimension();
    let mut matrix = Vec::new();
    let mut total = 0;

    loop {
        let chunk = chunks.next_chunk()?;
        if chunk.is_empty() {
            break;
        }

        matrix.clear();
        matrix.resize(chunk.len() * dimension, 0.0);
        pool.install(|| {
            matrix
                .par_chunks_mut(dimension)
                .zip(chunk.par_iter())
                .try_for_each(|(row, seq)| profiler.count_into(&seq.sequence, row))
        })?;

        for (seq, row) in chunk.iter().zip(matrix.chunks(dimension)) {
            write!(writer, "{}", seq.id)?;
            for value in row {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }
        total += chunk.len();
        tracing::debug!("Wrote features for {} sequences", total);
    }

    writer.flush()?;
    Ok(total)
}

pub fn run(args: FeaturesArgs, threads: Option<usize>) -> anyhow::Result<()> {
    let config = resolve_config(args.config.as_ref(), threads, args.batch_size)?;
    let table = Arc::new(CanonicalIndexTable::build(&config.features.kmer_lengths)?);
    let profiler = KmerProfiler::new(table);
    let pool = build_worker_pool(config.performance.threads)?;

    let input = open_input(&args.input)?;
    let mut chunks = ChunkedRecords::new(input.records(), config.performance.batch_size);

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let progress = spinner(&format!("Counting k-mers in {}...", args.input.display()))?;
    let total = write_features(&profiler, &pool, &mut chunks, &mut writer)?;
    progress.finish_and_clear();
    chunks.report_converted();

    tracing::info!(
        "Wrote {} features for {} sequences",
        profiler.dimension(),
        total
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::fastx::FastxRecords;

    fn rows(output: &[u8]) -> Vec<Vec<String>> {
        String::from_utf8(output.to_vec())
            .unwrap()
            .lines()
            .map(|l| l.split('\t').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_rows_independent_of_chunk_size() {
        let data = b">a\nACGTACGT\n>b\nggccNA\n>c\n\n>d\nATATAT\n>e\nCCCGGGA\n";
        let profiler = KmerProfiler::new(Arc::new(CanonicalIndexTable::build(&[1, 2]).unwrap()));
        let pool = build_worker_pool(2).unwrap();

        let mut outputs = Vec::new();
        for chunk_size in [1, 2, 3, 50] {
            let mut chunks = ChunkedRecords::new(FastxRecords::new(data), chunk_size);
            let mut out = Vec::new();
            assert_eq!(write_features(&profiler, &pool, &mut chunks, &mut out).unwrap(), 5);
            outputs.push(out);
        }
        assert!(outputs.windows(2).all(|w| w[0] == w[1]));

        let table = rows(&outputs[0]);
        assert_eq!(table.len(), 5);
        let ids: Vec<&str> = table.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(table.iter().all(|r| r.len() == 1 + profiler.dimension()));

        // Uppercased before counting, and an empty record is all zero
        let b: Vec<f64> = table[1][1..].iter().map(|v| v.parse().unwrap()).collect();
        assert_eq!(b, profiler.count(b"GGCCNA"));
        assert!(table[2][1..].iter().all(|v| v == "0"));
    }
}
