//! Column descriptors and the metadata type vocabulary.
//!
//! Arrow's [`DataType`] is open-ended; the sidecar vocabulary is not. This
//! module first narrows a `DataType` to the closed [`PhysicalType`] enum and
//! then maps that to a [`BaseKind`] with an exhaustive match, so adding a
//! physical variant forces a decision here instead of a silent fallthrough.
use std::fmt;

use arrow::datatypes::{DataType, Field};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Physical column types the converter distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicalType {
    /// Integer with the given signedness and bit width.
    Integer {
        /// Whether the integer is signed.
        signed: bool,
        /// Width in bits (8, 16, 32 or 64).
        bits: u32,
    },
    /// IEEE floating point with the given bit width.
    Float {
        /// Width in bits (16, 32 or 64).
        bits: u32,
    },
    /// Boolean.
    Boolean,
    /// Variable-length UTF-8 string.
    Utf8,
    /// Calendar date stored as a 32-bit day count since the epoch.
    Date32,
    /// Fixed-size binary with the given byte width.
    FixedSizeBinary {
        /// Byte width of every value.
        byte_width: i32,
    },
    /// Any other Arrow type.
    Other(DataType),
}

impl PhysicalType {
    /// Narrow an Arrow data type to a `PhysicalType`.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8 => Self::Integer {
                signed: true,
                bits: 8,
            },
            DataType::Int16 => Self::Integer {
                signed: true,
                bits: 16,
            },
            DataType::Int32 => Self::Integer {
                signed: true,
                bits: 32,
            },
            DataType::Int64 => Self::Integer {
                signed: true,
                bits: 64,
            },
            DataType::UInt8 => Self::Integer {
                signed: false,
                bits: 8,
            },
            DataType::UInt16 => Self::Integer {
                signed: false,
                bits: 16,
            },
            DataType::UInt32 => Self::Integer {
                signed: false,
                bits: 32,
            },
            DataType::UInt64 => Self::Integer {
                signed: false,
                bits: 64,
            },
            DataType::Float16 => Self::Float { bits: 16 },
            DataType::Float32 => Self::Float { bits: 32 },
            DataType::Float64 => Self::Float { bits: 64 },
            DataType::Boolean => Self::Boolean,
            DataType::Utf8 => Self::Utf8,
            DataType::Date32 => Self::Date32,
            DataType::FixedSizeBinary(byte_width) => Self::FixedSizeBinary {
                byte_width: *byte_width,
            },
            other => Self::Other(other.clone()),
        }
    }

    /// Numeric bit width, for integer and floating point types only.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            PhysicalType::Integer { bits, .. } | PhysicalType::Float { bits } => Some(*bits),
            _ => None,
        }
    }
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Integer { signed: true, bits } => write!(f, "int{bits}"),
            PhysicalType::Integer {
                signed: false,
                bits,
            } => write!(f, "uint{bits}"),
            PhysicalType::Float { bits } => write!(f, "float{bits}"),
            PhysicalType::Boolean => write!(f, "bool"),
            PhysicalType::Utf8 => write!(f, "utf8"),
            PhysicalType::Date32 => write!(f, "date32"),
            PhysicalType::FixedSizeBinary { byte_width } => {
                write!(f, "fixed_size_binary[{byte_width}]")
            }
            PhysicalType::Other(dt) => write!(f, "{dt}"),
        }
    }
}

/// Name, physical type and nullability of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as written in the schema.
    pub name: String,
    /// Physical type of the column.
    pub physical: PhysicalType,
    /// Whether the column allows nulls.
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Derive a descriptor from an Arrow field.
    pub fn from_field(field: &Field) -> Self {
        Self {
            name: field.name().clone(),
            physical: PhysicalType::from_data_type(field.data_type()),
            nullable: field.is_nullable(),
        }
    }
}

/// A physical type with no entry in the base-kind vocabulary.
#[derive(Debug, Snafu)]
#[snafu(display("Unsupported column type {physical}: no metadata base kind"))]
pub struct UnsupportedTypeError {
    /// The offending physical type.
    pub physical: PhysicalType,
}

/// Base kinds recorded in metadata sidecars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseKind {
    /// Any signed or unsigned integer.
    Int,
    /// Any floating point type.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// 32-bit calendar date.
    Date,
}

impl BaseKind {
    /// Lower-case name as written to JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::Bool => "bool",
            BaseKind::String => "string",
            BaseKind::Date => "date",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&PhysicalType> for BaseKind {
    type Error = UnsupportedTypeError;

    fn try_from(physical: &PhysicalType) -> Result<Self, Self::Error> {
        // No wildcard: every new PhysicalType variant must be decided here.
        match physical {
            PhysicalType::Integer { .. } => Ok(BaseKind::Int),
            PhysicalType::Float { .. } => Ok(BaseKind::Float),
            PhysicalType::Boolean => Ok(BaseKind::Bool),
            PhysicalType::Utf8 => Ok(BaseKind::String),
            PhysicalType::Date32 => Ok(BaseKind::Date),
            PhysicalType::FixedSizeBinary { .. } | PhysicalType::Other(_) => {
                Err(UnsupportedTypeError {
                    physical: physical.clone(),
                })
            }
        }
    }
}

/// Map an Arrow data type to its metadata base kind.
pub fn extract_type_name(data_type: &DataType) -> Result<BaseKind, UnsupportedTypeError> {
    BaseKind::try_from(&PhysicalType::from_data_type(data_type))
}

/// Extra numeric properties recorded for a type: `[bit_width]` for integers
/// and floats, empty for everything else.
pub fn type_props(physical: &PhysicalType) -> Vec<u32> {
    physical.bit_width().into_iter().collect()
}

/// The `type` object of a sidecar column entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Base kind of the column.
    pub base: BaseKind,
    /// Whether the column allows nulls.
    pub nullable: bool,
    /// Numeric properties (bit width for numeric kinds).
    pub props: Vec<u32>,
}

impl TypeDescriptor {
    /// Build the descriptor for a column, failing for unmapped types.
    pub fn for_column(column: &ColumnDescriptor) -> Result<Self, UnsupportedTypeError> {
        Ok(Self {
            base: BaseKind::try_from(&column.physical)?,
            nullable: column.nullable,
            props: type_props(&column.physical),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn descriptor(name: &str, data_type: DataType, nullable: bool) -> TypeDescriptor {
        let field = Field::new(name, data_type, nullable);
        TypeDescriptor::for_column(&ColumnDescriptor::from_field(&field))
            .expect("supported type")
    }

    #[test]
    fn integers_map_to_int_with_bit_width() {
        let d = descriptor("id", DataType::Int32, false);
        assert_eq!(d.base, BaseKind::Int);
        assert_eq!(d.props, vec![32]);
        assert!(!d.nullable);

        assert_eq!(descriptor("a", DataType::UInt8, true).props, vec![8]);
        assert_eq!(descriptor("b", DataType::Int64, true).props, vec![64]);
        assert_eq!(
            descriptor("c", DataType::UInt16, true).base,
            BaseKind::Int
        );
    }

    #[test]
    fn floats_map_to_float_with_bit_width() {
        let d = descriptor("price", DataType::Float64, true);
        assert_eq!(d.base, BaseKind::Float);
        assert_eq!(d.props, vec![64]);
        assert!(d.nullable);

        assert_eq!(descriptor("f", DataType::Float32, false).props, vec![32]);
    }

    #[test]
    fn non_numeric_kinds_have_no_props() {
        let b = descriptor("flag", DataType::Boolean, false);
        assert_eq!(b.base, BaseKind::Bool);
        assert!(b.props.is_empty());

        let s = descriptor("name", DataType::Utf8, true);
        assert_eq!(s.base, BaseKind::String);
        assert!(s.props.is_empty());

        let d = descriptor("day", DataType::Date32, false);
        assert_eq!(d.base, BaseKind::Date);
        assert!(d.props.is_empty());
    }

    #[test]
    fn unmapped_types_are_rejected() {
        let list = DataType::List(Arc::new(Field::new("item", DataType::Int32, true)));
        assert!(extract_type_name(&list).is_err());

        let err = extract_type_name(&DataType::FixedSizeBinary(4)).unwrap_err();
        assert_eq!(
            err.physical,
            PhysicalType::FixedSizeBinary { byte_width: 4 }
        );

        assert!(extract_type_name(&DataType::Date64).is_err());
        assert!(extract_type_name(&DataType::LargeUtf8).is_err());
        assert!(extract_type_name(&DataType::Binary).is_err());
    }

    #[test]
    fn base_kind_serializes_lowercase() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&BaseKind::String)?, "\"string\"");
        assert_eq!(serde_json::to_string(&BaseKind::Date)?, "\"date\"");
        assert_eq!(BaseKind::Float.to_string(), "float");
        Ok(())
    }
}
