use crate::{
    cli::MergeArgs,
    constants::QUEUE_SLOTS_PER_THREAD,
    core::{
        field::FieldBuffer,
        genotyper::DummyGenotyper,
        operator::{MergeOperator, MergeOptions, MergedSite},
        query::{KnownField, QueryConfig},
        variant::Variant,
    },
    io::{genotype_writer::GenotypeWriter, site_reader::load_site_tables},
    utils::util::{format_number_with_commas, Result},
};
use crossbeam_channel::{bounded, Sender};
use rayon::{prelude::*, ThreadPoolBuilder};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
    thread,
};

/// A run of consecutive sites handed to one worker. The sequence number
/// restores input order on the writer side.
pub struct SiteBlob {
    pub sequence: u64,
    pub variants: Vec<Variant>,
}

pub struct SiteBlobResult {
    pub sequence: u64,
    pub genotype_lines: Vec<u8>,
    pub merged_dump: Option<String>,
    pub num_sites: usize,
}

pub fn merge(args: MergeArgs) -> Result<()> {
    let site_paths = args.process_site_paths()?;
    let (query, ploidy, variants) = load_site_tables(&site_paths)?;
    let options = MergeOptions {
        ploidy,
        permissive_ref_check: args.permissive_ref,
    };
    log::info!(
        "Merging {} sites from {} table(s)",
        format_number_with_commas(variants.len()),
        site_paths.len()
    );

    let query = Arc::new(query);
    let queue_capacity = args.num_threads * QUEUE_SLOTS_PER_THREAD;
    let (blob_sender, blob_receiver) = bounded::<SiteBlob>(queue_capacity);
    let (result_sender, result_receiver) = bounded::<SiteBlobResult>(queue_capacity);

    let block_size = args.block_size;
    let reader_thread = thread::spawn(move || -> Result<()> {
        log::debug!("Reader thread started.");
        let mut blocks: Vec<Vec<Variant>> = Vec::new();
        let mut current = Vec::with_capacity(block_size);
        for variant in variants {
            current.push(variant);
            if current.len() == block_size {
                blocks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }
        for (sequence, block) in blocks.into_iter().enumerate() {
            log::debug!("Reader: sending block {} with {} sites", sequence, block.len());
            let blob = SiteBlob {
                sequence: sequence as u64,
                variants: block,
            };
            if blob_sender.send(blob).is_err() {
                return Err(crate::gvx_error!(
                    "Channel receiver closed unexpectedly in reader thread"
                ));
            }
        }
        log::debug!("Reader thread finished.");
        Ok(())
    });

    let output_path = args.output.clone();
    let dump_path = args.dump_merged.clone();
    let writer_thread = thread::spawn(move || -> Result<()> {
        log::debug!("Writer thread started.");
        let mut writer = GenotypeWriter::new(output_path.as_deref())?;
        let mut dump_writer = match dump_path.as_deref() {
            Some(path) => Some(MergedDumpWriter::create(path)?),
            None => None,
        };
        let mut pending: HashMap<u64, SiteBlobResult> = HashMap::new();
        let mut next_sequence = 0u64;
        let mut written_sites = 0usize;
        for result in result_receiver {
            pending.insert(result.sequence, result);
            while let Some(block) = pending.remove(&next_sequence) {
                writer.write_block(&block.genotype_lines)?;
                if let (Some(dump), Some(text)) = (dump_writer.as_mut(), block.merged_dump.as_deref())
                {
                    dump.write_block(text)?;
                }
                written_sites += block.num_sites;
                next_sequence += 1;
            }
        }
        writer.finish()?;
        if let Some(dump) = dump_writer.as_mut() {
            dump.finish()?;
        }
        log::debug!("Writer thread finished after {written_sites} sites.");
        Ok(())
    });

    log::debug!(
        "Initializing merge thread pool with {} threads...",
        args.num_threads
    );
    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("gvx-merge-{i}"))
        .build()
        .map_err(|e| crate::gvx_error!("Failed to initialize merge thread pool: {e}"))?;

    let dump_enabled = args.dump_merged.is_some();
    let worker_result: Result<()> = pool.install(|| {
        blob_receiver
            .into_iter()
            .par_bridge()
            .try_for_each_with((result_sender, query, options), |state, blob| {
                process_blob(blob, state.1.as_ref(), &state.2, dump_enabled, &state.0)
            })
    });

    let reader_result = reader_thread
        .join()
        .map_err(|_| crate::gvx_error!("Reader thread panicked"))?;
    let writer_result = writer_thread
        .join()
        .map_err(|_| crate::gvx_error!("Writer thread panicked"))?;
    worker_result?;
    reader_result?;
    writer_result
}

/// Per-worker body: every worker owns its genotyper (and, when dumping, its
/// merge operator), so no scratch is shared between concurrent merges.
fn process_blob(
    blob: SiteBlob,
    query: &QueryConfig,
    options: &MergeOptions,
    dump_enabled: bool,
    sender: &Sender<SiteBlobResult>,
) -> Result<()> {
    let current_thread = thread::current();
    let worker_name = current_thread.name().unwrap_or("unnamed");
    log::debug!(
        "Worker [{worker_name}]: processing block {} with {} sites",
        blob.sequence,
        blob.variants.len()
    );

    let mut genotyper = DummyGenotyper::new(options.clone());
    let mut operator = dump_enabled.then(|| MergeOperator::new(options.clone()));
    let mut genotype_lines: Vec<u8> = Vec::new();
    let mut merged_dump = dump_enabled.then(String::new);
    let num_sites = blob.variants.len();

    for mut variant in blob.variants {
        if let (Some(operator), Some(dump)) = (operator.as_mut(), merged_dump.as_mut()) {
            let merged = operator.operate(&mut variant, query)?;
            dump.push_str(&format_merged_site(&merged, query));
        }
        genotyper.genotype(&mut variant, query, &mut genotype_lines)?;
    }

    let result = SiteBlobResult {
        sequence: blob.sequence,
        genotype_lines,
        merged_dump,
        num_sites,
    };
    if sender.send(result).is_err() {
        return Err(crate::gvx_error!(
            "Failed to send result block to writer thread"
        ));
    }
    Ok(())
}

const DUMP_HEADER: &str = "column_begin\tref\talts\tcall_idx\tfield\tvalues";

struct MergedDumpWriter {
    writer: BufWriter<File>,
}

impl MergedDumpWriter {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|error| {
            crate::gvx_error!("Failed to create dump file at {}: {error}", path.display())
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{DUMP_HEADER}")?;
        Ok(Self { writer })
    }

    fn write_block(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One TSV row per remapped field of each valid call, under the merged
/// REF/ALT of the site.
fn format_merged_site(merged: &MergedSite, query: &QueryConfig) -> String {
    let alts = merged
        .merged_alts()
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let mut out = String::new();
    for (call_idx, call) in merged.variant.valid_calls() {
        for (query_idx, info) in query.fields().iter().enumerate() {
            if matches!(info.known, Some(KnownField::Ref | KnownField::Alt)) {
                continue;
            }
            let Some(field) = call.field(query_idx) else {
                continue;
            };
            if !field.valid {
                continue;
            }
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\n",
                merged.variant.column_begin(),
                merged.merged_ref(),
                alts,
                call_idx,
                info.name,
                format_buffer(&field.data)
            ));
        }
    }
    out
}

fn format_buffer(buffer: &FieldBuffer) -> String {
    fn join<T: std::fmt::Display>(values: &[T]) -> String {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
    match buffer {
        FieldBuffer::Int32(v) => join(v),
        FieldBuffer::Int64(v) => join(v),
        FieldBuffer::UInt32(v) => join(v),
        FieldBuffer::UInt64(v) => join(v),
        FieldBuffer::Float32(v) => join(v),
        FieldBuffer::Float64(v) => join(v),
        FieldBuffer::Str(v) => join(v),
        FieldBuffer::Char(v) => join(v),
        FieldBuffer::Alleles(v) => join(v),
    }
}
