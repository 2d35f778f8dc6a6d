use crate::{
    constants::PLACEHOLDER_REF,
    core::{
        allele::Allele,
        field::{FieldBuffer, FieldValue},
        query::{KnownField, QueryConfig},
    },
};

/// One sample's call at one site. Fields are indexed by query index; a `None`
/// slot means the field was not populated for this call.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCall {
    pub column_begin: u64,
    pub valid: bool,
    /// Set when this call's REF was replaced by the deletion placeholder; the
    /// reference merger skips the prefix check for such calls.
    pub ref_is_placeholder: bool,
    fields: Vec<Option<FieldValue>>,
}

impl VariantCall {
    pub fn new(column_begin: u64, num_fields: usize) -> Self {
        Self {
            column_begin,
            valid: true,
            ref_is_placeholder: false,
            fields: vec![None; num_fields],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn field(&self, query_idx: usize) -> Option<&FieldValue> {
        self.fields.get(query_idx).and_then(|f| f.as_ref())
    }

    pub fn field_mut(&mut self, query_idx: usize) -> Option<&mut FieldValue> {
        self.fields.get_mut(query_idx).and_then(|f| f.as_mut())
    }

    pub fn set_field(&mut self, query_idx: usize, value: FieldValue) {
        self.fields[query_idx] = Some(value);
    }

    /// The call's REF string, if the REF field is present and valid.
    pub fn ref_allele<'a>(&'a self, query: &QueryConfig) -> Option<&'a str> {
        let query_idx = query.query_idx_for(KnownField::Ref)?;
        let field = self.field(query_idx)?;
        if !field.valid {
            return None;
        }
        match &field.data {
            FieldBuffer::Str(strings) => strings.first().map(|s| s.as_str()),
            _ => None,
        }
    }

    /// The call's ALT allele list, if the ALT field is present and valid.
    pub fn alt_alleles<'a>(&'a self, query: &QueryConfig) -> Option<&'a [Allele]> {
        let query_idx = query.query_idx_for(KnownField::Alt)?;
        let field = self.field(query_idx)?;
        if !field.valid {
            return None;
        }
        match &field.data {
            FieldBuffer::Alleles(alleles) => Some(alleles.as_slice()),
            _ => None,
        }
    }

    /// Boundary normalization for calls that continue an upstream deletion:
    /// a call beginning before the site's start has no meaningful REF
    /// sequence, so it is replaced by the single-character placeholder and
    /// excluded from the prefix invariant.
    pub fn normalize_placeholder_ref(&mut self, site_begin: u64, query: &QueryConfig) {
        if self.column_begin >= site_begin {
            return;
        }
        let Some(query_idx) = query.query_idx_for(KnownField::Ref) else {
            return;
        };
        if let Some(field) = self.field_mut(query_idx) {
            if let FieldBuffer::Str(strings) = &mut field.data {
                if let Some(first) = strings.first_mut() {
                    first.clear();
                    first.push_str(PLACEHOLDER_REF);
                }
            }
        }
        self.ref_is_placeholder = true;
    }
}

/// All samples' calls at one site. Call indices are stable; invalid calls
/// keep their slot so indices stay meaningful when some calls are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub column_begin: u64,
    pub calls: Vec<VariantCall>,
    /// Merged REF installed by the merge operator; `None` on raw input.
    pub common_ref: Option<String>,
    /// Merged ALT list installed by the merge operator; `None` on raw input.
    pub common_alts: Option<Vec<Allele>>,
}

impl Variant {
    pub fn new(column_begin: u64, calls: Vec<VariantCall>) -> Self {
        Self {
            column_begin,
            calls,
            common_ref: None,
            common_alts: None,
        }
    }

    pub fn num_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn column_begin(&self) -> u64 {
        self.column_begin
    }

    pub fn call(&self, call_idx: usize) -> &VariantCall {
        &self.calls[call_idx]
    }

    pub fn call_mut(&mut self, call_idx: usize) -> &mut VariantCall {
        &mut self.calls[call_idx]
    }

    /// Valid calls with their stable call-index-in-variant, ascending.
    pub fn valid_calls(&self) -> impl Iterator<Item = (usize, &VariantCall)> {
        self.calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.is_valid())
    }

    pub fn valid_calls_mut(&mut self) -> impl Iterator<Item = (usize, &mut VariantCall)> {
        self.calls
            .iter_mut()
            .enumerate()
            .filter(|(_, call)| call.is_valid())
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    #[test]
    fn valid_calls_skip_invalid_slots_but_keep_indices() {
        let query = standard_query();
        let mut skipped = call_with_alleles(100, "T", &["G"]);
        skipped.valid = false;
        let variant = Variant::new(
            100,
            vec![
                call_with_alleles(100, "T", &["G"]),
                skipped,
                call_with_alleles(100, "TG", &["T"]),
            ],
        );
        let indices: Vec<usize> = variant.valid_calls().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(variant.call(2).ref_allele(&query), Some("TG"));
    }

    #[test]
    fn normalize_replaces_ref_only_for_upstream_calls() {
        let query = standard_query();
        let mut upstream = call_with_alleles(95, "TGGA", &["<NON_REF>"]);
        upstream.normalize_placeholder_ref(100, &query);
        assert_eq!(upstream.ref_allele(&query), Some("N"));
        assert!(upstream.ref_is_placeholder);

        let mut at_site = call_with_alleles(100, "TGGA", &["T"]);
        at_site.normalize_placeholder_ref(100, &query);
        assert_eq!(at_site.ref_allele(&query), Some("TGGA"));
        assert!(!at_site.ref_is_placeholder);
    }
}
