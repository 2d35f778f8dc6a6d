use crate::core::{
    allele_map::AlleleMap,
    field::FieldElement,
    genotype::gt_index,
    variant::Variant,
};

/// Destination of remapped values. The remap routines never own the output
/// buffer; they write one element at a time through this capability.
pub trait RemapSink<T: FieldElement> {
    fn put(&mut self, call_idx: usize, out_idx: usize) -> &mut T;
}

/// Dense output keyed (output slot, call index); rows are output slots so an
/// aggregation job can take a whole genotype slot across samples at once.
#[derive(Debug, Default)]
pub struct RemappedMatrix<T> {
    rows: Vec<Vec<T>>,
}

impl<T: Clone> RemappedMatrix<T> {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn resize(&mut self, num_rows: usize, num_columns: usize, init_value: T) {
        self.rows.clear();
        self.rows
            .resize(num_rows, vec![init_value; num_columns]);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, out_idx: usize) -> &[T] {
        &self.rows[out_idx]
    }
}

impl<T: FieldElement> RemapSink<T> for RemappedMatrix<T> {
    fn put(&mut self, call_idx: usize, out_idx: usize) -> &mut T {
        &mut self.rows[out_idx][call_idx]
    }
}

/// Writes straight into one queried field of a variant copy, for the
/// rewrite-in-place path. The copy's field must already be resized to the
/// merged length and carry the element type being written.
pub struct VariantFieldSink<'a> {
    variant: &'a mut Variant,
    query_idx: usize,
}

impl<'a> VariantFieldSink<'a> {
    pub fn new(variant: &'a mut Variant, query_idx: usize) -> Self {
        Self { variant, query_idx }
    }
}

impl<'a, T: FieldElement> RemapSink<T> for VariantFieldSink<'a> {
    fn put(&mut self, call_idx: usize, out_idx: usize) -> &mut T {
        let field = self
            .variant
            .call_mut(call_idx)
            .field_mut(self.query_idx)
            .expect("remap target call lost the queried field");
        let data =
            T::from_buffer_mut(&mut field.data).expect("remap target buffer changed element type");
        &mut data[out_idx]
    }
}

fn non_ref_input_idx(
    map: &AlleleMap,
    call_idx: usize,
    num_merged_alleles: usize,
    non_ref_exists: bool,
) -> Option<usize> {
    if non_ref_exists {
        map.input_of(call_idx, num_merged_alleles - 1)
    } else {
        None
    }
}

/// Rewrites an allele-indexed (or, with `alt_alleles_only`, an alt-indexed)
/// vector from input allele order to merged allele order.
///
/// A merged allele the sample never declared resolves to the sample's
/// catch-all allele when it has one; otherwise the output slot receives the
/// missing sentinel. `num_valid[out_idx]` is incremented for every slot that
/// received input data.
pub fn remap_by_alleles<T, S>(
    input_data: &[T],
    call_idx: usize,
    map: &AlleleMap,
    num_merged_alleles: usize,
    non_ref_exists: bool,
    alt_alleles_only: bool,
    sink: &mut S,
    num_valid: &mut [u64],
) where
    T: FieldElement,
    S: RemapSink<T>,
{
    let input_non_ref = non_ref_input_idx(map, call_idx, num_merged_alleles, non_ref_exists);
    let length = if alt_alleles_only {
        num_merged_alleles - 1
    } else {
        num_merged_alleles
    };
    for out_idx in 0..length {
        let allele_j = if alt_alleles_only {
            out_idx + 1
        } else {
            out_idx
        };
        let input_j_allele = match map.input_of(call_idx, allele_j).or(input_non_ref) {
            Some(idx) => idx,
            None => {
                *sink.put(call_idx, out_idx) = T::missing();
                continue;
            }
        };
        debug_assert!(!alt_alleles_only || input_j_allele > 0);
        let input_j = if alt_alleles_only {
            input_j_allele - 1
        } else {
            input_j_allele
        };
        *sink.put(call_idx, out_idx) = input_data[input_j].clone();
        num_valid[out_idx] += 1;
    }
}

/// Rewrites a genotype-indexed vector from input genotype order to merged
/// genotype order under the canonical unordered-pair enumeration.
///
/// The catch-all substitution applies independently to both components of a
/// pair; if either component is unmapped and the sample has no catch-all,
/// the whole output genotype slot is the missing sentinel. When the first
/// component is unmapped, every genotype containing it is missing at once.
pub fn remap_by_genotype<T, S>(
    input_data: &[T],
    call_idx: usize,
    map: &AlleleMap,
    num_merged_alleles: usize,
    non_ref_exists: bool,
    sink: &mut S,
    num_valid: &mut [u64],
) where
    T: FieldElement,
    S: RemapSink<T>,
{
    let input_non_ref = non_ref_input_idx(map, call_idx, num_merged_alleles, non_ref_exists);
    for allele_j in 0..num_merged_alleles {
        let input_j = match map.input_of(call_idx, allele_j).or(input_non_ref) {
            Some(idx) => idx,
            None => {
                for allele_k in allele_j..num_merged_alleles {
                    *sink.put(call_idx, gt_index(allele_j, allele_k)) = T::missing();
                }
                continue;
            }
        };
        for allele_k in allele_j..num_merged_alleles {
            let out_idx = gt_index(allele_j, allele_k);
            let input_k = match map.input_of(call_idx, allele_k).or(input_non_ref) {
                Some(idx) => idx,
                None => {
                    *sink.put(call_idx, out_idx) = T::missing();
                    continue;
                }
            };
            // The merged pair is ordered but the mapped input pair need not
            // be; reorder before encoding.
            let (lo, hi) = if input_j <= input_k {
                (input_j, input_k)
            } else {
                (input_k, input_j)
            };
            *sink.put(call_idx, out_idx) = input_data[gt_index(lo, hi)].clone();
            num_valid[out_idx] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::util::MISSING_INTEGER;

    /// Call 0 declared T/G/<NON_REF>; the merged order is
    /// T,G,C,<NON_REF> after a second sample contributed C.
    fn s2_call0_map() -> AlleleMap {
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        map.set(0, 1, 1);
        map.set(0, 2, 3);
        map
    }

    #[test]
    fn allele_indexed_remap_uses_the_catch_all_for_unseen_alleles() {
        let map = s2_call0_map();
        let input = vec![100, 200, 300];
        let mut sink = RemappedMatrix::new();
        sink.resize(4, 1, MISSING_INTEGER);
        let mut num_valid = vec![0u64; 4];
        remap_by_alleles(&input, 0, &map, 4, true, false, &mut sink, &mut num_valid);
        // Merged allele 2 (C) was never declared by call 0: it reads through
        // the catch-all at input index 2.
        assert_eq!(sink.row(0), &[100]);
        assert_eq!(sink.row(1), &[200]);
        assert_eq!(sink.row(2), &[300]);
        assert_eq!(sink.row(3), &[300]);
        assert_eq!(num_valid, vec![1, 1, 1, 1]);
    }

    #[test]
    fn unseen_allele_without_catch_all_is_missing() {
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        map.set(0, 1, 2);
        let input = vec![5, 7];
        let mut sink = RemappedMatrix::new();
        sink.resize(3, 1, MISSING_INTEGER);
        let mut num_valid = vec![0u64; 3];
        remap_by_alleles(&input, 0, &map, 3, false, false, &mut sink, &mut num_valid);
        assert_eq!(sink.row(0), &[5]);
        assert_eq!(sink.row(1), &[MISSING_INTEGER]);
        assert_eq!(sink.row(2), &[7]);
        assert_eq!(num_valid, vec![1, 0, 1]);
    }

    #[test]
    fn alt_only_remap_is_the_permutation_induced_by_alt_reordering() {
        // Input ALT [C, A] against merged ALT [A, C].
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        map.set(0, 1, 2);
        map.set(0, 2, 1);
        let input = vec![100, 200];
        let mut sink = RemappedMatrix::new();
        sink.resize(2, 1, MISSING_INTEGER);
        let mut num_valid = vec![0u64; 2];
        remap_by_alleles(&input, 0, &map, 3, false, true, &mut sink, &mut num_valid);
        assert_eq!(sink.row(0), &[200]);
        assert_eq!(sink.row(1), &[100]);
        assert_eq!(num_valid, vec![1, 1]);
    }

    #[test]
    fn genotype_remap_reads_through_the_catch_all_pairwise() {
        // Input PL over T,G,<NON_REF> remapped to merged T,G,C,<NON_REF>.
        let map = s2_call0_map();
        let input = vec![0, 10, 20, 30, 40, 50];
        let mut sink = RemappedMatrix::new();
        sink.resize(10, 1, MISSING_INTEGER);
        let mut num_valid = vec![0u64; 10];
        remap_by_genotype(&input, 0, &map, 4, true, &mut sink, &mut num_valid);
        let remapped: Vec<i32> = (0..10).map(|g| sink.row(g)[0]).collect();
        assert_eq!(remapped, vec![0, 10, 20, 30, 40, 50, 30, 40, 50, 50]);
        assert_eq!(num_valid, vec![1; 10]);
    }

    #[test]
    fn genotype_remap_without_catch_all_blanks_whole_pairs() {
        // Input declared T,C; merged order is T,G,C with no catch-all.
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        map.set(0, 1, 2);
        let input = vec![0, 10, 20];
        let mut sink = RemappedMatrix::new();
        sink.resize(6, 1, MISSING_INTEGER);
        let mut num_valid = vec![0u64; 6];
        remap_by_genotype(&input, 0, &map, 3, false, &mut sink, &mut num_valid);
        let remapped: Vec<i32> = (0..6).map(|g| sink.row(g)[0]).collect();
        assert_eq!(
            remapped,
            vec![
                0,
                MISSING_INTEGER,
                MISSING_INTEGER,
                10,
                MISSING_INTEGER,
                20
            ]
        );
        assert_eq!(num_valid, vec![1, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn float_remap_writes_the_encoded_nan_sentinel() {
        let mut map = AlleleMap::new();
        map.set(0, 0, 0);
        let input = vec![1.5f32];
        let mut sink = RemappedMatrix::new();
        sink.resize(2, 1, f32::missing());
        let mut num_valid = vec![0u64; 2];
        remap_by_alleles(&input, 0, &map, 2, false, false, &mut sink, &mut num_valid);
        assert_eq!(sink.row(0)[0], 1.5);
        assert!(sink.row(1)[0].is_missing());
        assert_eq!(num_valid, vec![1, 0]);
    }
}
