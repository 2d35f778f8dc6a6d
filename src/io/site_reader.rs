use crate::{
    constants::DEFAULT_PLOIDY,
    core::{
        allele::Allele,
        field::{ElementType, FieldBuffer, FieldValue},
        query::{FieldInfo, FieldLength, KnownField, QueryConfig},
        variant::{Variant, VariantCall},
    },
    error::GvxError,
    utils::util::{
        format_number_with_commas, Result, MISSING_DOUBLE, MISSING_FLOAT, MISSING_INTEGER,
        MISSING_INTEGER64, MISSING_UNSIGNED, MISSING_UNSIGNED64,
    },
};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use serde_json::Value;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

/// On-disk form of a site table: the queried-field configuration followed by
/// one record per site, each holding one call per sample. Numeric `null`
/// entries decode to the element type's missing sentinel.
#[derive(Debug, Deserialize)]
pub struct SiteTable {
    #[serde(default = "default_ploidy")]
    pub ploidy: usize,
    pub fields: Vec<FieldSpec>,
    pub sites: Vec<SiteRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub element_type: ElementType,
    pub length: FieldLength,
}

#[derive(Debug, Deserialize)]
pub struct SiteRecord {
    pub column_begin: u64,
    pub calls: Vec<CallRecord>,
}

#[derive(Debug, Deserialize)]
pub struct CallRecord {
    pub column_begin: u64,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

fn default_ploidy() -> usize {
    DEFAULT_PLOIDY
}

fn default_valid() -> bool {
    true
}

#[derive(Debug)]
pub struct LoadedTable {
    pub ploidy: usize,
    pub specs: Vec<FieldSpec>,
    pub query: QueryConfig,
    pub variants: Vec<Variant>,
}

pub fn open_table_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path)
        .map_err(|error| crate::gvx_error!("Failed to open file {}: {error}", path.display()))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(GvxError::InvalidGzipHeader {
                path: path.to_path_buf(),
            })
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

pub fn load_site_table(path: &Path) -> Result<LoadedTable> {
    let reader = open_table_reader(path)?;
    let table: SiteTable = serde_json::from_reader(reader)
        .map_err(|error| crate::gvx_error!("Failed to parse {}: {error}", path.display()))?;
    build_table(table)
}

/// Loads and concatenates several site tables. Every table must declare the
/// same field configuration and ploidy as the first.
pub fn load_site_tables(paths: &[PathBuf]) -> Result<(QueryConfig, usize, Vec<Variant>)> {
    let mut first: Option<LoadedTable> = None;
    for path in paths {
        let table = load_site_table(path)?;
        log::info!(
            "Loaded {} sites from {}",
            format_number_with_commas(table.variants.len()),
            path.display()
        );
        match first.as_mut() {
            None => first = Some(table),
            Some(head) => {
                if table.specs != head.specs {
                    return Err(crate::gvx_error!(
                        "Site table {} declares a different field configuration than the first table",
                        path.display()
                    ));
                }
                if table.ploidy != head.ploidy {
                    return Err(crate::gvx_error!(
                        "Site table {} declares ploidy {} but the first table declared {}",
                        path.display(),
                        table.ploidy,
                        head.ploidy
                    ));
                }
                head.variants.extend(table.variants);
            }
        }
    }
    let head = first.ok_or_else(|| crate::gvx_error!("No site tables given"))?;
    Ok((head.query, head.ploidy, head.variants))
}

fn build_table(table: SiteTable) -> Result<LoadedTable> {
    let field_infos = table
        .fields
        .iter()
        .map(|spec| FieldInfo::new(spec.name.clone(), spec.element_type, spec.length))
        .collect();
    let query = QueryConfig::new(field_infos)?;
    let mut variants = Vec::with_capacity(table.sites.len());
    for site in &table.sites {
        let mut calls = Vec::with_capacity(site.calls.len());
        for record in &site.calls {
            let mut call = VariantCall::new(record.column_begin, table.fields.len());
            call.valid = record.valid;
            for (query_idx, spec) in table.fields.iter().enumerate() {
                if let Some(value) = record.fields.get(&spec.name) {
                    call.set_field(query_idx, decode_field(spec, value)?);
                }
            }
            calls.push(call);
        }
        variants.push(Variant::new(site.column_begin, calls));
    }
    Ok(LoadedTable {
        ploidy: table.ploidy,
        specs: table.fields,
        query,
        variants,
    })
}

fn decode_field(spec: &FieldSpec, value: &Value) -> Result<FieldValue> {
    let items = value
        .as_array()
        .ok_or_else(|| crate::gvx_error!("Field {} must be an array of values", spec.name))?;
    let buffer = match spec.element_type {
        ElementType::Int32 => FieldBuffer::Int32(
            items
                .iter()
                .map(|v| decode_signed(spec, v, MISSING_INTEGER as i64).map(|x| x as i32))
                .collect::<Result<_>>()?,
        ),
        ElementType::Int64 => FieldBuffer::Int64(
            items
                .iter()
                .map(|v| decode_signed(spec, v, MISSING_INTEGER64))
                .collect::<Result<_>>()?,
        ),
        ElementType::UInt32 => FieldBuffer::UInt32(
            items
                .iter()
                .map(|v| decode_unsigned(spec, v, MISSING_UNSIGNED as u64).map(|x| x as u32))
                .collect::<Result<_>>()?,
        ),
        ElementType::UInt64 => FieldBuffer::UInt64(
            items
                .iter()
                .map(|v| decode_unsigned(spec, v, MISSING_UNSIGNED64))
                .collect::<Result<_>>()?,
        ),
        ElementType::Float32 => FieldBuffer::Float32(
            items
                .iter()
                .map(|v| decode_float(spec, v).map(|x| x.map_or(MISSING_FLOAT, |f| f as f32)))
                .collect::<Result<_>>()?,
        ),
        ElementType::Float64 => FieldBuffer::Float64(
            items
                .iter()
                .map(|v| decode_float(spec, v).map(|x| x.unwrap_or(MISSING_DOUBLE)))
                .collect::<Result<_>>()?,
        ),
        ElementType::String => {
            let strings = items
                .iter()
                .map(|v| decode_string(spec, v))
                .collect::<Result<Vec<_>>>()?;
            if KnownField::from_name(&spec.name) == Some(KnownField::Alt) {
                FieldBuffer::Alleles(
                    strings
                        .iter()
                        .map(|s| Allele::parse(s))
                        .collect::<Result<_>>()?,
                )
            } else {
                FieldBuffer::Str(strings)
            }
        }
        ElementType::Char => FieldBuffer::Char(
            items
                .iter()
                .map(|v| {
                    let s = decode_string(spec, v)?;
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(c),
                        (None, None) => Ok('\0'),
                        _ => Err(crate::gvx_error!(
                            "Field {}: expected a single character, got '{s}'",
                            spec.name
                        )),
                    }
                })
                .collect::<Result<_>>()?,
        ),
    };
    Ok(FieldValue::new(buffer))
}

fn decode_signed(spec: &FieldSpec, value: &Value, missing: i64) -> Result<i64> {
    if value.is_null() {
        return Ok(missing);
    }
    value
        .as_i64()
        .ok_or_else(|| crate::gvx_error!("Field {}: expected an integer, got {value}", spec.name))
}

fn decode_unsigned(spec: &FieldSpec, value: &Value, missing: u64) -> Result<u64> {
    if value.is_null() {
        return Ok(missing);
    }
    value.as_u64().ok_or_else(|| {
        crate::gvx_error!(
            "Field {}: expected an unsigned integer, got {value}",
            spec.name
        )
    })
}

fn decode_float(spec: &FieldSpec, value: &Value) -> Result<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| crate::gvx_error!("Field {}: expected a number, got {value}", spec.name))
}

fn decode_string(spec: &FieldSpec, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| crate::gvx_error!("Field {}: expected a string, got {value}", spec.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, time::SystemTime};

    fn make_temp_table(contents: &str, suffix: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("gvx_test_sites_{nanos}{suffix}"));
        fs::write(&path, contents).unwrap();
        path
    }

    const TWO_SAMPLE_TABLE: &str = r#"{
        "ploidy": 2,
        "fields": [
            {"name": "REF", "element_type": "STRING", "length": {"fixed": 1}},
            {"name": "ALT", "element_type": "STRING", "length": "alt_alleles"},
            {"name": "GT", "element_type": "INT32", "length": "ploidy"},
            {"name": "PL", "element_type": "INT32", "length": "genotypes"}
        ],
        "sites": [
            {
                "column_begin": 100,
                "calls": [
                    {
                        "column_begin": 100,
                        "fields": {"REF": ["T"], "ALT": ["G", "<NON_REF>"], "GT": [0, 1], "PL": [0, 10, null]}
                    },
                    {
                        "column_begin": 100,
                        "valid": false,
                        "fields": {}
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn loads_fields_sites_and_missing_values() {
        let path = make_temp_table(TWO_SAMPLE_TABLE, ".json");
        let table = load_site_table(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(table.ploidy, 2);
        assert_eq!(table.query.num_queried_attributes(), 4);
        assert_eq!(table.query.query_idx_for(KnownField::Pl), Some(3));
        assert_eq!(table.variants.len(), 1);

        let variant = &table.variants[0];
        assert_eq!(variant.num_calls(), 2);
        assert_eq!(variant.valid_calls().count(), 1);

        let call = variant.call(0);
        assert_eq!(call.ref_allele(&table.query), Some("T"));
        let alts = call.alt_alleles(&table.query).unwrap();
        assert_eq!(alts.len(), 2);
        assert!(alts[1].is_non_ref());
        match &call.field(3).unwrap().data {
            FieldBuffer::Int32(values) => assert_eq!(values, &vec![0, 10, MISSING_INTEGER]),
            other => panic!("expected INT32 PL buffer, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_field_configurations_are_rejected() {
        let other = r#"{
            "fields": [
                {"name": "REF", "element_type": "STRING", "length": {"fixed": 1}},
                {"name": "ALT", "element_type": "STRING", "length": "alt_alleles"}
            ],
            "sites": []
        }"#;
        let path_a = make_temp_table(TWO_SAMPLE_TABLE, ".json");
        let path_b = make_temp_table(other, ".json");
        let err = load_site_tables(&[path_a.clone(), path_b.clone()]).unwrap_err();
        fs::remove_file(&path_a).ok();
        fs::remove_file(&path_b).ok();
        assert!(err.to_string().contains("different field configuration"));
    }

    #[test]
    fn invalid_alt_allele_strings_are_rejected() {
        let table = r#"{
            "fields": [
                {"name": "REF", "element_type": "STRING", "length": {"fixed": 1}},
                {"name": "ALT", "element_type": "STRING", "length": "alt_alleles"}
            ],
            "sites": [
                {"column_begin": 1, "calls": [
                    {"column_begin": 1, "fields": {"REF": ["T"], "ALT": ["g"]}}
                ]}
            ]
        }"#;
        let path = make_temp_table(table, ".json");
        let err = load_site_table(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, GvxError::InvalidAllele { .. }));
    }

    #[test]
    fn garbage_gz_files_are_rejected_by_header_check() {
        let path = make_temp_table("not actually gzip", ".json.gz");
        let err = open_table_reader(&path).map(|_| ()).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, GvxError::InvalidGzipHeader { .. }));
    }
}
