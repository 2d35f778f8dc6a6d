use crate::{core::field::ElementType, utils::util::Result};
use serde::Deserialize;

/// Fields the merger understands beyond opaque pass-through data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownField {
    Ref,
    Alt,
    Gt,
    Pl,
    Ad,
    Gq,
    Dp,
}

impl KnownField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "REF" => Some(KnownField::Ref),
            "ALT" => Some(KnownField::Alt),
            "GT" => Some(KnownField::Gt),
            "PL" => Some(KnownField::Pl),
            "AD" => Some(KnownField::Ad),
            "GQ" => Some(KnownField::Gq),
            "DP" => Some(KnownField::Dp),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KnownField::Ref => "REF",
            KnownField::Alt => "ALT",
            KnownField::Gt => "GT",
            KnownField::Pl => "PL",
            KnownField::Ad => "AD",
            KnownField::Gq => "GQ",
            KnownField::Dp => "DP",
        }
    }
}

/// Length class of a queried field. The allele-dependent classes are the ones
/// the merger has to rewrite when the merged allele list differs from a
/// sample's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLength {
    Fixed(usize),
    /// One element per allele, REF included (VCF Number=R).
    Alleles,
    /// One element per ALT allele (VCF Number=A).
    AltAlleles,
    /// One element per unordered genotype (VCF Number=G).
    Genotypes,
    /// One element per ploidy position (the GT vector itself).
    Ploidy,
}

impl FieldLength {
    pub fn is_allele_dependent(&self) -> bool {
        matches!(
            self,
            FieldLength::Alleles | FieldLength::AltAlleles | FieldLength::Genotypes
        )
    }

    pub fn is_only_alt_dependent(&self) -> bool {
        matches!(self, FieldLength::AltAlleles)
    }

    pub fn is_genotype_dependent(&self) -> bool {
        matches!(self, FieldLength::Genotypes)
    }

    pub fn num_elements(&self, num_alt_alleles: usize, ploidy: usize) -> usize {
        match self {
            FieldLength::Fixed(n) => *n,
            FieldLength::Alleles => num_alt_alleles + 1,
            FieldLength::AltAlleles => num_alt_alleles,
            FieldLength::Genotypes => {
                let num_alleles = num_alt_alleles + 1;
                num_alleles * (num_alleles + 1) / 2
            }
            FieldLength::Ploidy => ploidy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub element_type: ElementType,
    pub length: FieldLength,
    pub known: Option<KnownField>,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, element_type: ElementType, length: FieldLength) -> Self {
        let name = name.into();
        let known = KnownField::from_name(&name);
        Self {
            name,
            element_type,
            length,
            known,
        }
    }
}

/// Read-only description of which fields are queried at each site and how
/// their buffers are indexed. Query indices are positions in the `fields`
/// list and double as indices into each call's field vector.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    fields: Vec<FieldInfo>,
}

impl QueryConfig {
    pub fn new(fields: Vec<FieldInfo>) -> Result<Self> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|other| other.name == field.name) {
                return Err(crate::gvx_error!(
                    "Duplicate queried field name: {}",
                    field.name
                ));
            }
        }
        Ok(Self { fields })
    }

    pub fn num_queried_attributes(&self) -> usize {
        self.fields.len()
    }

    pub fn field_info(&self, query_idx: usize) -> &FieldInfo {
        &self.fields[query_idx]
    }

    pub fn known_field(&self, query_idx: usize) -> Option<KnownField> {
        self.fields[query_idx].known
    }

    pub fn is_known_field(&self, query_idx: usize) -> bool {
        self.known_field(query_idx).is_some()
    }

    pub fn query_idx_for(&self, known: KnownField) -> Option<usize> {
        self.fields.iter().position(|f| f.known == Some(known))
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_fields() -> Vec<FieldInfo> {
        vec![
            FieldInfo::new("REF", ElementType::String, FieldLength::Fixed(1)),
            FieldInfo::new("ALT", ElementType::String, FieldLength::AltAlleles),
            FieldInfo::new("GT", ElementType::Int32, FieldLength::Ploidy),
            FieldInfo::new("PL", ElementType::Int32, FieldLength::Genotypes),
        ]
    }

    #[test]
    fn query_idx_round_trips_known_fields() {
        let config = QueryConfig::new(standard_fields()).unwrap();
        assert_eq!(config.query_idx_for(KnownField::Pl), Some(3));
        assert_eq!(config.known_field(3), Some(KnownField::Pl));
        assert_eq!(config.query_idx_for(KnownField::Ad), None);
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let mut fields = standard_fields();
        fields.push(FieldInfo::new(
            "PL",
            ElementType::Int32,
            FieldLength::Genotypes,
        ));
        assert!(QueryConfig::new(fields).is_err());
    }

    #[test]
    fn num_elements_follows_the_length_class() {
        assert_eq!(FieldLength::Alleles.num_elements(2, 0), 3);
        assert_eq!(FieldLength::AltAlleles.num_elements(2, 0), 2);
        assert_eq!(FieldLength::Genotypes.num_elements(2, 0), 6);
        assert_eq!(FieldLength::Genotypes.num_elements(3, 0), 10);
        assert_eq!(FieldLength::Ploidy.num_elements(5, 2), 2);
        assert_eq!(FieldLength::Fixed(7).num_elements(5, 2), 7);
    }
}
