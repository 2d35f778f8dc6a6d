use crate::{
    core::{allele::Allele, allele_map::AlleleMap, query::QueryConfig, variant::Variant},
    error::GvxError,
    utils::util::Result,
};
use std::collections::{hash_map::Entry, HashMap};

/// Folds per-sample ALT lists into the merged ALT list and records every
/// input<->merged allele index pair in `map`.
///
/// A sample whose REF is shorter than the merged REF has each of its alts
/// right-padded with the merged REF's tail so the allele keeps its meaning
/// under the longer reference (REF `T` / ALT `G` becomes ALT `GG` under
/// merged REF `TG`). Merged order is first discovery across calls scanned in
/// ascending call-index order; duplicates collapse by exact string equality
/// after padding; the symbolic catch-all, when any sample carries it, is
/// appended last so its merged index is known only at the end.
///
/// Returns the merged ALT list and whether the catch-all was present.
pub fn merge_alt_alleles(
    variant: &Variant,
    query: &QueryConfig,
    merged_ref: &str,
    map: &mut AlleleMap,
) -> Result<(Vec<Allele>, bool)> {
    let mut seen_alleles: HashMap<String, usize> = HashMap::new();
    let mut merged_alts: Vec<Allele> = Vec::new();
    let mut input_non_ref_idx: Vec<Option<usize>> = vec![None; variant.num_calls()];
    let mut non_ref_exists = false;
    let mut next_merged_idx = 1usize;

    map.ensure_capacity(variant.num_calls(), 1);
    for (call_idx, call) in variant.valid_calls() {
        let curr_ref = call
            .ref_allele(query)
            .ok_or_else(|| GvxError::MissingRequiredField {
                column_begin: variant.column_begin(),
                field: "REF".to_string(),
            })?;
        let alts = call
            .alt_alleles(query)
            .ok_or_else(|| GvxError::MissingRequiredField {
                column_begin: variant.column_begin(),
                field: "ALT".to_string(),
            })?;
        let suffix = merged_ref.get(curr_ref.len()..).unwrap_or("");

        map.set(call_idx, 0, 0);
        for (alt_pos, allele) in alts.iter().enumerate() {
            let input_idx = alt_pos + 1;
            let seq = match allele {
                Allele::NonRef => {
                    input_non_ref_idx[call_idx] = Some(input_idx);
                    non_ref_exists = true;
                    continue;
                }
                Allele::Seq(seq) => seq,
            };
            let padded = if suffix.is_empty() {
                seq.clone()
            } else {
                format!("{seq}{suffix}")
            };
            if padded == merged_ref {
                return Err(GvxError::InconsistentReference {
                    column_begin: variant.column_begin(),
                    shorter: padded,
                    longer: merged_ref.to_string(),
                });
            }
            match seen_alleles.entry(padded) {
                Entry::Vacant(slot) => {
                    let merged_idx = next_merged_idx;
                    next_merged_idx += 1;
                    map.ensure_capacity(variant.num_calls(), merged_idx + 1);
                    map.set(call_idx, input_idx, merged_idx);
                    merged_alts.push(Allele::Seq(slot.key().clone()));
                    slot.insert(merged_idx);
                }
                Entry::Occupied(entry) => {
                    map.set(call_idx, input_idx, *entry.get());
                }
            }
        }
    }

    if non_ref_exists {
        // Counting REF, the last slot's allele index equals the ALT count.
        merged_alts.push(Allele::NonRef);
        let non_ref_merged_idx = merged_alts.len();
        map.ensure_capacity(variant.num_calls(), non_ref_merged_idx + 1);
        for (call_idx, _) in variant.valid_calls() {
            if let Some(input_idx) = input_non_ref_idx[call_idx] {
                map.set(call_idx, input_idx, non_ref_merged_idx);
            }
        }
    }

    Ok((merged_alts, non_ref_exists))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{reference::merge_reference_allele, variant::test_utils::*};

    fn merge(variant: &Variant) -> Result<(String, Vec<Allele>, bool, AlleleMap)> {
        let query = standard_query();
        let mut merged_ref = String::new();
        merge_reference_allele(variant, &query, &mut merged_ref, false)?;
        let mut map = AlleleMap::new();
        let (alts, non_ref) = merge_alt_alleles(variant, &query, &merged_ref, &mut map)?;
        Ok((merged_ref, alts, non_ref, map))
    }

    fn seqs(alts: &[Allele]) -> Vec<String> {
        alts.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn shorter_ref_alts_are_padded_with_the_merged_tail() {
        // A(REF=T, ALT=[G]) + B(REF=TG, ALT=[T]) -> REF=TG, ALT=[GG, T].
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["G"]),
                call_with_alleles(100, "TG", &["T"]),
            ],
        );
        let (merged_ref, alts, non_ref, map) = merge(&variant).unwrap();
        assert_eq!(merged_ref, "TG");
        assert_eq!(seqs(&alts), vec!["GG", "T"]);
        assert!(!non_ref);
        assert_eq!(map.merged_of(0, 0), Some(0));
        assert_eq!(map.merged_of(0, 1), Some(1));
        assert_eq!(map.merged_of(1, 0), Some(0));
        assert_eq!(map.merged_of(1, 1), Some(2));
    }

    #[test]
    fn non_ref_is_always_last_with_index_counting_ref() {
        // Both samples carry the catch-all; it lands after every
        // sequence allele with merged index 3.
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["G", "<NON_REF>"]),
                call_with_alleles(100, "T", &["C", "<NON_REF>"]),
            ],
        );
        let (merged_ref, alts, non_ref, map) = merge(&variant).unwrap();
        assert_eq!(merged_ref, "T");
        assert_eq!(seqs(&alts), vec!["G", "C", "<NON_REF>"]);
        assert!(non_ref);
        assert_eq!(map.merged_of(0, 2), Some(3));
        assert_eq!(map.merged_of(1, 2), Some(3));
        assert_eq!(map.input_of(0, 3), Some(2));
        assert_eq!(map.input_of(0, 2), None);
        assert_eq!(map.input_of(1, 1), None);
    }

    #[test]
    fn identical_padded_alts_deduplicate_to_one_merged_index() {
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["G"]),
                call_with_alleles(100, "TG", &["GG", "A"]),
            ],
        );
        let (_, alts, _, map) = merge(&variant).unwrap();
        assert_eq!(seqs(&alts), vec!["GG", "A"]);
        assert_eq!(map.merged_of(0, 1), Some(1));
        assert_eq!(map.merged_of(1, 1), Some(1));
        assert_eq!(map.merged_of(1, 2), Some(2));
    }

    #[test]
    fn padded_alt_equal_to_merged_ref_fails_the_site() {
        // REF=T / ALT=[T] against merged REF=TG pads the alt to TG,
        // which collides with the reference.
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "TG", &["G"]),
                call_with_alleles(100, "T", &["T"]),
            ],
        );
        let err = merge(&variant).unwrap_err();
        assert!(matches!(
            err,
            GvxError::InconsistentReference { column_begin: 100, .. }
        ));
    }

    #[test]
    fn merged_order_is_first_seen_across_calls() {
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["C", "A"]),
                call_with_alleles(100, "T", &["A", "G"]),
            ],
        );
        let (_, alts, _, map) = merge(&variant).unwrap();
        assert_eq!(seqs(&alts), vec!["C", "A", "G"]);
        assert_eq!(map.merged_of(1, 1), Some(2));
        assert_eq!(map.merged_of(1, 2), Some(3));
    }

    #[test]
    fn every_input_allele_maps_and_round_trips() {
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["G", "<NON_REF>"]),
                call_with_alleles(100, "TG", &["T", "GG"]),
            ],
        );
        let (_, _, _, map) = merge(&variant).unwrap();
        for call_idx in 0..2 {
            for input_idx in 0..3 {
                let merged = map
                    .merged_of(call_idx, input_idx)
                    .expect("every input allele must have a merged mapping");
                assert_eq!(map.input_of(call_idx, merged), Some(input_idx));
            }
        }
    }
}
