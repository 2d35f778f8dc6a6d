use crate::{
    core::{query::QueryConfig, variant::Variant},
    error::GvxError,
    utils::util::Result,
};

/// Folds the REF alleles of all valid calls into the longest one.
///
/// All calls begin at the same column, so every non-placeholder REF must be a
/// prefix of the longest; a shorter REF contributes nothing, a longer one
/// appends its tail. Placeholder REFs (deletion continuations, normalized to
/// "N" upstream) are excluded from the prefix check and never contribute
/// sequence unless nothing else has.
///
/// With `permissive` set, a prefix violation is logged and merging continues
/// as if the check had passed; the default is to fail the site with
/// `InconsistentReference`.
pub fn merge_reference_allele(
    variant: &Variant,
    query: &QueryConfig,
    merged: &mut String,
    permissive: bool,
) -> Result<()> {
    let mut merged_is_placeholder = false;
    for (_, call) in variant.valid_calls() {
        let curr = call
            .ref_allele(query)
            .ok_or_else(|| GvxError::MissingRequiredField {
                column_begin: variant.column_begin(),
                field: "REF".to_string(),
            })?;
        let curr_is_placeholder = call.ref_is_placeholder;

        if merged.is_empty() {
            merged.push_str(curr);
            merged_is_placeholder = curr_is_placeholder;
            continue;
        }

        let curr_is_longer = curr.len() > merged.len();
        let prefix_ok = if curr_is_longer {
            curr.starts_with(merged.as_str())
        } else {
            merged.starts_with(curr)
        };
        if !curr_is_placeholder && !merged_is_placeholder && !prefix_ok {
            let (shorter, longer) = if curr_is_longer {
                (merged.clone(), curr.to_string())
            } else {
                (curr.to_string(), merged.clone())
            };
            if permissive {
                log::warn!(
                    "Inconsistent reference alleles at column {}: '{}' vs '{}'; continuing",
                    variant.column_begin(),
                    shorter,
                    longer
                );
            } else {
                return Err(GvxError::InconsistentReference {
                    column_begin: variant.column_begin(),
                    shorter,
                    longer,
                });
            }
        }

        if curr_is_longer {
            if merged_is_placeholder {
                merged.clear();
                merged.push_str(curr);
                merged_is_placeholder = curr_is_placeholder;
            } else {
                merged.push_str(&curr[merged.len()..]);
            }
        } else if merged_is_placeholder && !curr_is_placeholder {
            merged.clear();
            merged.push_str(curr);
            merged_is_placeholder = false;
        }
    }
    Ok(())
}
