use crate::{core::allele_map::AlleleMap, error::GvxError, utils::util::Result};

/// Canonical index of the unordered genotype (j, k), j <= k, in the standard
/// enumeration (0,0)(0,1)(1,1)(0,2)(1,2)(2,2)... This encoding is shared
/// with downstream consumers and must not change.
pub const fn gt_index(j: usize, k: usize) -> usize {
    k * (k + 1) / 2 + j
}

/// Rewrites one call's GT vector from input allele indices to merged allele
/// indices. Every GT allele was declared by the call, so a missing mapping
/// is a contract violation, not a data condition.
pub fn remap_gt(
    input_gt: &[i32],
    output_gt: &mut [i32],
    map: &AlleleMap,
    call_idx: usize,
    column_begin: u64,
) -> Result<()> {
    debug_assert_eq!(input_gt.len(), output_gt.len());
    for (ploidy_pos, &allele) in input_gt.iter().enumerate() {
        let merged = usize::try_from(allele)
            .ok()
            .and_then(|input_idx| map.merged_of(call_idx, input_idx))
            .ok_or(GvxError::UnmappedGtAllele {
                column_begin,
                call_idx,
                allele_idx: allele,
            })?;
        output_gt[ploidy_pos] = merged as i32;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gt_index_matches_the_canonical_enumeration() {
        assert_eq!(gt_index(0, 0), 0);
        assert_eq!(gt_index(0, 1), 1);
        assert_eq!(gt_index(1, 1), 2);
        assert_eq!(gt_index(0, 2), 3);
        assert_eq!(gt_index(1, 2), 4);
        assert_eq!(gt_index(2, 2), 5);
        assert_eq!(gt_index(0, 3), 6);
        assert_eq!(gt_index(3, 3), 9);
    }

    #[test]
    fn remap_gt_rewrites_through_the_map() {
        let mut map = AlleleMap::new();
        map.set(1, 0, 0);
        map.set(1, 1, 2);
        let input = vec![0, 1];
        let mut output = vec![0; 2];
        remap_gt(&input, &mut output, &map, 1, 100).unwrap();
        assert_eq!(output, vec![0, 2]);
    }

    #[test]
    fn undeclared_gt_allele_is_a_contract_violation() {
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        let input = vec![0, 2];
        let mut output = vec![0; 2];
        let err = remap_gt(&input, &mut output, &map, 0, 100).unwrap_err();
        assert!(matches!(
            err,
            GvxError::UnmappedGtAllele {
                column_begin: 100,
                call_idx: 0,
                allele_idx: 2,
            }
        ));
    }

    #[test]
    fn negative_gt_allele_is_a_contract_violation() {
        let map = AlleleMap::new();
        let input = vec![-1];
        let mut output = vec![0; 1];
        assert!(remap_gt(&input, &mut output, &map, 0, 100).is_err());
    }
}
