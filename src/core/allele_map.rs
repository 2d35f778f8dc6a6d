/// Bidirectional table between per-sample allele indices and merged allele
/// indices, REF included at index 0 on both sides.
///
/// Rows (one per sample) grow independently so the merged-allele axis can be
/// extended mid-merge without relocating earlier entries. A single instance
/// is meant to be reused across many sites with a `reset` in between.
#[derive(Debug, Default)]
pub struct AlleleMap {
    input_to_merged: Vec<Vec<Option<usize>>>,
    merged_to_input: Vec<Vec<Option<usize>>>,
}

impl AlleleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_samples(&self) -> usize {
        self.input_to_merged.len()
    }

    /// Clears every mapping while keeping allocations for reuse.
    pub fn reset(&mut self) {
        for row in &mut self.input_to_merged {
            row.fill(None);
        }
        for row in &mut self.merged_to_input {
            row.fill(None);
        }
    }

    /// Grows the table to at least `num_samples` rows of `num_alleles`
    /// columns on both sides. Growth is monotonic: existing entries are
    /// never moved or dropped.
    pub fn ensure_capacity(&mut self, num_samples: usize, num_alleles: usize) {
        Self::grow(&mut self.input_to_merged, num_samples, num_alleles);
        Self::grow(&mut self.merged_to_input, num_samples, num_alleles);
    }

    fn grow(rows: &mut Vec<Vec<Option<usize>>>, num_samples: usize, num_alleles: usize) {
        if rows.len() < num_samples {
            rows.resize_with(num_samples, Vec::new);
        }
        for row in rows.iter_mut() {
            if row.len() < num_alleles {
                row.resize(num_alleles, None);
            }
        }
    }

    /// Records `input_idx <-> merged_idx` for `sample`, in both directions.
    pub fn set(&mut self, sample: usize, input_idx: usize, merged_idx: usize) {
        Self::grow(&mut self.input_to_merged, sample + 1, input_idx + 1);
        Self::grow(&mut self.merged_to_input, sample + 1, merged_idx + 1);
        self.input_to_merged[sample][input_idx] = Some(merged_idx);
        self.merged_to_input[sample][merged_idx] = Some(input_idx);
    }

    pub fn merged_of(&self, sample: usize, input_idx: usize) -> Option<usize> {
        self.input_to_merged
            .get(sample)
            .and_then(|row| row.get(input_idx))
            .copied()
            .flatten()
    }

    pub fn input_of(&self, sample: usize, merged_idx: usize) -> Option<usize> {
        self.merged_to_input
            .get(sample)
            .and_then(|row| row.get(merged_idx))
            .copied()
            .flatten()
    }
}
