use crate::{constants::NON_REF_ALLELE, error::GvxError, utils::util::Result};
use std::fmt;

/// A single allele at a site: either a nucleotide sequence over {A,C,G,T,N},
/// or the symbolic catch-all that stands for any allele not otherwise listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Allele {
    Seq(String),
    NonRef,
}

impl Allele {
    pub fn parse(s: &str) -> Result<Self> {
        if s == NON_REF_ALLELE {
            return Ok(Allele::NonRef);
        }
        if s.is_empty()
            || !s
                .bytes()
                .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T' | b'N'))
        {
            return Err(GvxError::InvalidAllele {
                value: s.to_string(),
            });
        }
        Ok(Allele::Seq(s.to_string()))
    }

    pub fn is_non_ref(&self) -> bool {
        matches!(self, Allele::NonRef)
    }

    /// The nucleotide sequence, `None` for the symbolic allele.
    pub fn seq(&self) -> Option<&str> {
        match self {
            Allele::Seq(s) => Some(s),
            Allele::NonRef => None,
        }
    }
}

impl std::str::FromStr for Allele {
    type Err = GvxError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allele::Seq(s) => write!(f, "{s}"),
            Allele::NonRef => write!(f, "{NON_REF_ALLELE}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_nucleotide_strings() {
        assert_eq!(Allele::parse("TG").unwrap(), Allele::Seq("TG".to_string()));
        assert_eq!(Allele::parse("N").unwrap(), Allele::Seq("N".to_string()));
    }

    #[test]
    fn parse_maps_the_symbolic_literal_to_non_ref() {
        let allele = Allele::parse("<NON_REF>").unwrap();
        assert!(allele.is_non_ref());
        assert_eq!(allele.seq(), None);
    }

    #[test]
    fn parse_rejects_lowercase_and_empty_strings() {
        assert!(matches!(
            Allele::parse("tg"),
            Err(GvxError::InvalidAllele { .. })
        ));
        assert!(matches!(
            Allele::parse(""),
            Err(GvxError::InvalidAllele { .. })
        ));
        assert!(matches!(
            Allele::parse("T-G"),
            Err(GvxError::InvalidAllele { .. })
        ));
    }

    #[test]
    fn display_round_trips_the_symbolic_literal() {
        assert_eq!(Allele::NonRef.to_string(), "<NON_REF>");
        assert_eq!(Allele::Seq("GG".to_string()).to_string(), "GG");
    }
}
