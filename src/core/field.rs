use crate::{
    core::allele::Allele,
    utils::util::{
        MISSING_DOUBLE, MISSING_FLOAT, MISSING_INTEGER, MISSING_INTEGER64, MISSING_UNSIGNED,
        MISSING_UNSIGNED64,
    },
};
use serde::Deserialize;
use std::fmt;

/// Closed set of element types a per-call field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Char,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Int32 => "INT32",
            ElementType::Int64 => "INT64",
            ElementType::UInt32 => "UINT32",
            ElementType::UInt64 => "UINT64",
            ElementType::Float32 => "FLOAT32",
            ElementType::Float64 => "FLOAT64",
            ElementType::String => "STRING",
            ElementType::Char => "CHAR",
        };
        write!(f, "{name}")
    }
}

/// Typed, resizable payload of one field of one call.
///
/// `Alleles` is the in-core representation of the ALT field; its serialized
/// element type is STRING but the symbolic token is kept as an enum case so
/// the core never compares magic strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldBuffer {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Str(Vec<String>),
    Char(Vec<char>),
    Alleles(Vec<Allele>),
}

impl FieldBuffer {
    pub fn element_type(&self) -> ElementType {
        match self {
            FieldBuffer::Int32(_) => ElementType::Int32,
            FieldBuffer::Int64(_) => ElementType::Int64,
            FieldBuffer::UInt32(_) => ElementType::UInt32,
            FieldBuffer::UInt64(_) => ElementType::UInt64,
            FieldBuffer::Float32(_) => ElementType::Float32,
            FieldBuffer::Float64(_) => ElementType::Float64,
            FieldBuffer::Str(_) | FieldBuffer::Alleles(_) => ElementType::String,
            FieldBuffer::Char(_) => ElementType::Char,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldBuffer::Int32(v) => v.len(),
            FieldBuffer::Int64(v) => v.len(),
            FieldBuffer::UInt32(v) => v.len(),
            FieldBuffer::UInt64(v) => v.len(),
            FieldBuffer::Float32(v) => v.len(),
            FieldBuffer::Float64(v) => v.len(),
            FieldBuffer::Str(v) => v.len(),
            FieldBuffer::Char(v) => v.len(),
            FieldBuffer::Alleles(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resizes the buffer, filling new slots with the element type's missing
    /// sentinel.
    pub fn resize_missing(&mut self, new_len: usize) {
        match self {
            FieldBuffer::Int32(v) => v.resize(new_len, MISSING_INTEGER),
            FieldBuffer::Int64(v) => v.resize(new_len, MISSING_INTEGER64),
            FieldBuffer::UInt32(v) => v.resize(new_len, MISSING_UNSIGNED),
            FieldBuffer::UInt64(v) => v.resize(new_len, MISSING_UNSIGNED64),
            FieldBuffer::Float32(v) => v.resize(new_len, MISSING_FLOAT),
            FieldBuffer::Float64(v) => v.resize(new_len, MISSING_DOUBLE),
            FieldBuffer::Str(v) => v.resize(new_len, String::new()),
            FieldBuffer::Char(v) => v.resize(new_len, '\0'),
            FieldBuffer::Alleles(v) => v.resize(new_len, Allele::Seq(String::new())),
        }
    }
}

/// One field of one call: the typed buffer plus a validity flag. Invalid
/// fields are carried but never remapped.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub data: FieldBuffer,
    pub valid: bool,
}

impl FieldValue {
    pub fn new(data: FieldBuffer) -> Self {
        Self { data, valid: true }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Element-level view of the tagged buffer. Implementors carry the missing
/// sentinel for their type and project a `FieldBuffer` onto a typed vector,
/// which is the single dispatch point for the generic remap routines.
pub trait FieldElement: Clone + PartialEq + fmt::Debug {
    const ELEMENT_TYPE: ElementType;

    fn missing() -> Self;
    fn is_missing(&self) -> bool;
    fn from_buffer(buffer: &FieldBuffer) -> Option<&Vec<Self>>;
    fn from_buffer_mut(buffer: &mut FieldBuffer) -> Option<&mut Vec<Self>>;
}

macro_rules! impl_field_element {
    ($ty:ty, $variant:ident, $element_type:ident, $missing:expr) => {
        impl FieldElement for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$element_type;

            fn missing() -> Self {
                $missing
            }

            fn is_missing(&self) -> bool {
                *self == $missing
            }

            fn from_buffer(buffer: &FieldBuffer) -> Option<&Vec<Self>> {
                match buffer {
                    FieldBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_buffer_mut(buffer: &mut FieldBuffer) -> Option<&mut Vec<Self>> {
                match buffer {
                    FieldBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_field_element!(i32, Int32, Int32, MISSING_INTEGER);
impl_field_element!(i64, Int64, Int64, MISSING_INTEGER64);
impl_field_element!(u32, UInt32, UInt32, MISSING_UNSIGNED);
impl_field_element!(u64, UInt64, UInt64, MISSING_UNSIGNED64);
impl_field_element!(String, Str, String, String::new());
impl_field_element!(char, Char, Char, '\0');

// The float sentinels are specific NaN bit patterns; equality comparison
// would always be false, so these two compare bits.
impl FieldElement for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float32;

    fn missing() -> Self {
        MISSING_FLOAT
    }

    fn is_missing(&self) -> bool {
        self.to_bits() == MISSING_FLOAT.to_bits()
    }

    fn from_buffer(buffer: &FieldBuffer) -> Option<&Vec<Self>> {
        match buffer {
            FieldBuffer::Float32(v) => Some(v),
            _ => None,
        }
    }

    fn from_buffer_mut(buffer: &mut FieldBuffer) -> Option<&mut Vec<Self>> {
        match buffer {
            FieldBuffer::Float32(v) => Some(v),
            _ => None,
        }
    }
}

impl FieldElement for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Float64;

    fn missing() -> Self {
        MISSING_DOUBLE
    }

    fn is_missing(&self) -> bool {
        self.to_bits() == MISSING_DOUBLE.to_bits()
    }

    fn from_buffer(buffer: &FieldBuffer) -> Option<&Vec<Self>> {
        match buffer {
            FieldBuffer::Float64(v) => Some(v),
            _ => None,
        }
    }

    fn from_buffer_mut(buffer: &mut FieldBuffer) -> Option<&mut Vec<Self>> {
        match buffer {
            FieldBuffer::Float64(v) => Some(v),
            _ => None,
        }
    }
}
