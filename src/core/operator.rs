use crate::{
    constants::{DEFAULT_PERMISSIVE_REF, DEFAULT_PLOIDY},
    core::{
        allele::Allele,
        allele_map::AlleleMap,
        alt::merge_alt_alleles,
        field::{FieldBuffer, FieldElement, FieldValue},
        genotype::remap_gt,
        query::{FieldInfo, KnownField, QueryConfig},
        reference::merge_reference_allele,
        remap::{remap_by_alleles, remap_by_genotype, VariantFieldSink},
        variant::Variant,
    },
    error::GvxError,
    utils::util::Result,
};

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub ploidy: usize,
    pub permissive_ref_check: bool,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, updates: impl FnOnce(&mut Self)) -> Self {
        updates(&mut self);
        self
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            ploidy: DEFAULT_PLOIDY,
            permissive_ref_check: DEFAULT_PERMISSIVE_REF,
        }
    }
}

/// One merged site: the rewritten variant copy plus, for every remapped
/// query field, the per-output-slot count of calls that contributed data.
/// Downstream aggregators consume the counts together with the values.
#[derive(Debug, Clone)]
pub struct MergedSite {
    pub variant: Variant,
    pub valid_counts: Vec<Option<Vec<u64>>>,
}

impl MergedSite {
    pub fn merged_ref(&self) -> &str {
        self.variant.common_ref.as_deref().unwrap_or("")
    }

    pub fn merged_alts(&self) -> &[Allele] {
        self.variant.common_alts.as_deref().unwrap_or(&[])
    }
}

/// Merges one multi-sample variant at a time: longest REF, padded/deduped
/// ALT union, and every allele-length-dependent field of every call rewritten
/// to merged allele order. Owns the scratch allele map and merged-allele
/// buffers, so an instance must not be shared between concurrent merges;
/// per-worker instances are the intended pattern.
#[derive(Debug, Default)]
pub struct MergeOperator {
    options: MergeOptions,
    allele_map: AlleleMap,
    merged_ref: String,
    merged_alts: Vec<Allele>,
    non_ref_exists: bool,
}

impl MergeOperator {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    fn reset(&mut self) {
        self.allele_map.reset();
        self.merged_ref.clear();
        self.merged_alts.clear();
        self.non_ref_exists = false;
    }

    /// Produces the merged copy of `variant`. The input is only written by
    /// the placeholder-REF normalization; everything else reads it. The
    /// merged REF and ALT are moved out of the operator's scratch, which is
    /// left reset for the next call.
    pub fn operate(&mut self, variant: &mut Variant, query: &QueryConfig) -> Result<MergedSite> {
        self.reset();
        let column_begin = variant.column_begin();
        for required in [KnownField::Ref, KnownField::Alt] {
            if query.query_idx_for(required).is_none() {
                return Err(GvxError::MissingRequiredField {
                    column_begin,
                    field: required.name().to_string(),
                });
            }
        }

        for (_, call) in variant.valid_calls_mut() {
            call.normalize_placeholder_ref(column_begin, query);
        }
        merge_reference_allele(
            variant,
            query,
            &mut self.merged_ref,
            self.options.permissive_ref_check,
        )?;
        self.allele_map.ensure_capacity(variant.num_calls(), 1);
        let (merged_alts, non_ref_exists) =
            merge_alt_alleles(variant, query, &self.merged_ref, &mut self.allele_map)?;
        self.merged_alts = merged_alts;
        self.non_ref_exists = non_ref_exists;

        let num_merged_alleles = self.merged_alts.len() + 1;
        let mut copy = variant.clone();
        let mut valid_counts: Vec<Option<Vec<u64>>> = vec![None; query.num_queried_attributes()];

        for query_idx in 0..query.num_queried_attributes() {
            let info = query.field_info(query_idx);
            if matches!(
                info.known,
                Some(KnownField::Ref | KnownField::Alt | KnownField::Gt)
            ) {
                continue;
            }
            if !info.length.is_allele_dependent() {
                continue;
            }
            let field_size = info
                .length
                .num_elements(self.merged_alts.len(), self.options.ploidy);
            let mut counters = vec![0u64; field_size];
            let call_indices: Vec<usize> = variant
                .valid_calls()
                .filter(|(_, call)| call.field(query_idx).is_some_and(|f| f.valid))
                .map(|(call_idx, _)| call_idx)
                .collect();
            for &call_idx in &call_indices {
                let field = copy
                    .call_mut(call_idx)
                    .field_mut(query_idx)
                    .expect("copy and input share the same field layout");
                field.data.resize_missing(field_size);
            }
            for &call_idx in &call_indices {
                self.remap_field(
                    variant,
                    &mut copy,
                    call_idx,
                    query_idx,
                    info,
                    num_merged_alleles,
                    &mut counters,
                )?;
            }
            valid_counts[query_idx] = Some(counters);
        }

        if let Some(gt_query_idx) = query.query_idx_for(KnownField::Gt) {
            let call_indices: Vec<usize> = variant
                .valid_calls()
                .filter(|(_, call)| call.field(gt_query_idx).is_some_and(|f| f.valid))
                .map(|(call_idx, _)| call_idx)
                .collect();
            for call_idx in call_indices {
                let input_field = variant
                    .call(call_idx)
                    .field(gt_query_idx)
                    .expect("call index was selected for a populated GT field");
                let input_gt = i32::from_buffer(&input_field.data).ok_or_else(|| {
                    GvxError::UnsupportedElementType {
                        field: KnownField::Gt.name().to_string(),
                        element_type: input_field.data.element_type().to_string(),
                    }
                })?;
                let output_field = copy
                    .call_mut(call_idx)
                    .field_mut(gt_query_idx)
                    .expect("copy and input share the same field layout");
                let output_gt = i32::from_buffer_mut(&mut output_field.data)
                    .expect("copy and input share the same element type");
                remap_gt(input_gt, output_gt, &self.allele_map, call_idx, column_begin)?;
            }
        }

        copy.common_ref = Some(std::mem::take(&mut self.merged_ref));
        copy.common_alts = Some(std::mem::take(&mut self.merged_alts));
        self.non_ref_exists = false;
        Ok(MergedSite {
            variant: copy,
            valid_counts,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn remap_field(
        &self,
        source: &Variant,
        copy: &mut Variant,
        call_idx: usize,
        query_idx: usize,
        info: &FieldInfo,
        num_merged_alleles: usize,
        counters: &mut [u64],
    ) -> Result<()> {
        let input = source
            .call(call_idx)
            .field(query_idx)
            .expect("call index was selected for a populated field");
        match &input.data {
            FieldBuffer::Int32(_) => {
                self.remap_typed::<i32>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Int64(_) => {
                self.remap_typed::<i64>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::UInt32(_) => {
                self.remap_typed::<u32>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::UInt64(_) => {
                self.remap_typed::<u64>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Float32(_) => {
                self.remap_typed::<f32>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Float64(_) => {
                self.remap_typed::<f64>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Str(_) => {
                self.remap_typed::<String>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Char(_) => {
                self.remap_typed::<char>(input, copy, call_idx, query_idx, info, num_merged_alleles, counters)
            }
            FieldBuffer::Alleles(_) => Err(GvxError::UnsupportedElementType {
                field: info.name.clone(),
                element_type: "allele list".to_string(),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn remap_typed<T: FieldElement>(
        &self,
        input: &FieldValue,
        copy: &mut Variant,
        call_idx: usize,
        query_idx: usize,
        info: &FieldInfo,
        num_merged_alleles: usize,
        counters: &mut [u64],
    ) -> Result<()> {
        let input_data =
            T::from_buffer(&input.data).expect("dispatch selected the buffer's element type");
        let mut sink = VariantFieldSink::new(copy, query_idx);
        if info.length.is_genotype_dependent() {
            remap_by_genotype(
                input_data,
                call_idx,
                &self.allele_map,
                num_merged_alleles,
                self.non_ref_exists,
                &mut sink,
                counters,
            );
        } else {
            remap_by_alleles(
                input_data,
                call_idx,
                &self.allele_map,
                num_merged_alleles,
                self.non_ref_exists,
                info.length.is_only_alt_dependent(),
                &mut sink,
                counters,
            );
        }
        Ok(())
    }
}
