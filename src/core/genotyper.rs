use crate::{
    core::{
        allele_map::AlleleMap,
        alt::merge_alt_alleles,
        field::FieldElement,
        operator::MergeOptions,
        query::{KnownField, QueryConfig},
        reference::merge_reference_allele,
        remap::{remap_by_genotype, RemappedMatrix},
        variant::Variant,
    },
    utils::util::{Result, MISSING_INTEGER},
};
use std::io;

/// Reference consumer of the merge machinery: merges one site, remaps every
/// sample's PL into a dense genotype-by-sample matrix, and emits one CSV line
/// of per-genotype medians.
///
/// The median is the element at rank `num_valid/2` under descending order,
/// i.e. the lower median for even counts. Genotypes no sample covered render
/// as the INT32 missing sentinel. Owns per-site scratch; one instance per
/// worker.
#[derive(Debug, Default)]
pub struct DummyGenotyper {
    options: MergeOptions,
    allele_map: AlleleMap,
    merged_ref: String,
    remapped_pls: RemappedMatrix<i32>,
}

impl DummyGenotyper {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn genotype<W: io::Write>(
        &mut self,
        variant: &mut Variant,
        query: &QueryConfig,
        output: &mut W,
    ) -> Result<()> {
        let column_begin = variant.column_begin();
        for (_, call) in variant.valid_calls_mut() {
            call.normalize_placeholder_ref(column_begin, query);
        }

        self.allele_map.reset();
        self.merged_ref.clear();
        merge_reference_allele(
            variant,
            query,
            &mut self.merged_ref,
            self.options.permissive_ref_check,
        )?;
        self.allele_map.ensure_capacity(variant.num_calls(), 1);
        let (merged_alts, non_ref_exists) =
            merge_alt_alleles(variant, query, &self.merged_ref, &mut self.allele_map)?;

        let num_calls = variant.num_calls();
        let num_merged_alleles = merged_alts.len() + 1;
        let num_genotypes = num_merged_alleles * (num_merged_alleles + 1) / 2;
        self.remapped_pls
            .resize(num_genotypes, num_calls, MISSING_INTEGER);
        let mut num_valid = vec![0u64; num_genotypes];

        if let Some(pl_query_idx) = query.query_idx_for(KnownField::Pl) {
            for (call_idx, call) in variant.valid_calls() {
                let Some(field) = call.field(pl_query_idx) else {
                    continue;
                };
                if !field.valid {
                    continue;
                }
                let Some(input_pl) = i32::from_buffer(&field.data) else {
                    continue;
                };
                remap_by_genotype(
                    input_pl,
                    call_idx,
                    &self.allele_map,
                    num_merged_alleles,
                    non_ref_exists,
                    &mut self.remapped_pls,
                    &mut num_valid,
                );
            }
        }

        write!(output, "{}", column_begin)?;
        write!(output, ",{}", self.merged_ref)?;
        for alt in &merged_alts {
            write!(output, ",{alt}")?;
        }
        for genotype_idx in 0..num_genotypes {
            let median = if num_valid[genotype_idx] == 0 {
                MISSING_INTEGER
            } else {
                let mut values = self.remapped_pls.row(genotype_idx).to_vec();
                let rank = (num_valid[genotype_idx] / 2) as usize;
                // Descending order pushes the missing sentinel (i32::MIN)
                // past every real value, so the rank stays inside the valid
                // prefix.
                let (_, median, _) = values.select_nth_unstable_by(rank, |a, b| b.cmp(a));
                *median
            };
            write!(output, ",{median}")?;
        }
        writeln!(output)?;
        Ok(())
    }
}
