//! XSD built-in types
//!
//! Maps the built-in primitive and derived types of XML Schema onto JSON
//! Schema type/format pairs. The mapping is a pure lookup behind the
//! [`BuiltinTypeMapper`] trait so that different target drafts can map
//! primitives differently.

use crate::jsonschema::JsonType;

/// XSD string type name
pub const XSD_STRING: &str = "string";
/// XSD normalizedString type name
pub const XSD_NORMALIZED_STRING: &str = "normalizedString";
/// XSD token type name
pub const XSD_TOKEN: &str = "token";
/// XSD language type name
pub const XSD_LANGUAGE: &str = "language";
/// XSD Name type name
pub const XSD_NAME: &str = "Name";
/// XSD NCName type name
pub const XSD_NCNAME: &str = "NCName";
/// XSD ID type name
pub const XSD_ID: &str = "ID";
/// XSD IDREF type name
pub const XSD_IDREF: &str = "IDREF";
/// XSD ENTITY type name
pub const XSD_ENTITY: &str = "ENTITY";
/// XSD NMTOKEN type name
pub const XSD_NMTOKEN: &str = "NMTOKEN";
/// XSD QName type name
pub const XSD_QNAME: &str = "QName";
/// XSD NOTATION type name
pub const XSD_NOTATION: &str = "NOTATION";

/// XSD boolean type name
pub const XSD_BOOLEAN: &str = "boolean";

/// XSD decimal type name
pub const XSD_DECIMAL: &str = "decimal";
/// XSD float type name
pub const XSD_FLOAT: &str = "float";
/// XSD double type name
pub const XSD_DOUBLE: &str = "double";

/// XSD integer type name
pub const XSD_INTEGER: &str = "integer";
/// XSD long type name
pub const XSD_LONG: &str = "long";
/// XSD int type name
pub const XSD_INT: &str = "int";
/// XSD short type name
pub const XSD_SHORT: &str = "short";
/// XSD byte type name
pub const XSD_BYTE: &str = "byte";
/// XSD nonNegativeInteger type name
pub const XSD_NON_NEGATIVE_INTEGER: &str = "nonNegativeInteger";
/// XSD positiveInteger type name
pub const XSD_POSITIVE_INTEGER: &str = "positiveInteger";
/// XSD nonPositiveInteger type name
pub const XSD_NON_POSITIVE_INTEGER: &str = "nonPositiveInteger";
/// XSD negativeInteger type name
pub const XSD_NEGATIVE_INTEGER: &str = "negativeInteger";
/// XSD unsignedLong type name
pub const XSD_UNSIGNED_LONG: &str = "unsignedLong";
/// XSD unsignedInt type name
pub const XSD_UNSIGNED_INT: &str = "unsignedInt";
/// XSD unsignedShort type name
pub const XSD_UNSIGNED_SHORT: &str = "unsignedShort";
/// XSD unsignedByte type name
pub const XSD_UNSIGNED_BYTE: &str = "unsignedByte";

/// XSD duration type name
pub const XSD_DURATION: &str = "duration";
/// XSD dateTime type name
pub const XSD_DATETIME: &str = "dateTime";
/// XSD date type name
pub const XSD_DATE: &str = "date";
/// XSD time type name
pub const XSD_TIME: &str = "time";
/// XSD gYearMonth type name
pub const XSD_GYEAR_MONTH: &str = "gYearMonth";
/// XSD gYear type name
pub const XSD_GYEAR: &str = "gYear";
/// XSD gMonthDay type name
pub const XSD_GMONTH_DAY: &str = "gMonthDay";
/// XSD gDay type name
pub const XSD_GDAY: &str = "gDay";
/// XSD gMonth type name
pub const XSD_GMONTH: &str = "gMonth";

/// XSD hexBinary type name
pub const XSD_HEX_BINARY: &str = "hexBinary";
/// XSD base64Binary type name
pub const XSD_BASE64_BINARY: &str = "base64Binary";

/// XSD anyURI type name
pub const XSD_ANY_URI: &str = "anyURI";
/// XSD anyType type name
pub const XSD_ANY_TYPE: &str = "anyType";
/// XSD anySimpleType type name
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";

/// A JSON Schema type/format pair produced for an XSD built-in type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    /// JSON Schema `type` keyword value
    pub json_type: JsonType,
    /// JSON Schema `format` keyword value, if any
    pub format: Option<&'static str>,
}

impl TypeMapping {
    /// Mapping with a bare type and no format
    pub const fn plain(json_type: JsonType) -> Self {
        Self {
            json_type,
            format: None,
        }
    }

    /// Mapping with a type and a format string
    pub const fn with_format(json_type: JsonType, format: &'static str) -> Self {
        Self {
            json_type,
            format: Some(format),
        }
    }
}

/// Pure lookup from an XSD built-in type name to a JSON Schema mapping
pub trait BuiltinTypeMapper {
    /// Map a built-in type's local name, `None` if the name is not a
    /// recognized built-in
    fn map(&self, local_name: &str) -> Option<TypeMapping>;

    /// Whether the local name denotes a recognized built-in type
    fn is_builtin(&self, local_name: &str) -> bool {
        self.map(local_name).is_some()
    }
}

/// Built-in mapping targeting JSON Schema draft-04
#[derive(Debug, Clone, Copy, Default)]
pub struct Draft04TypeMapper;

impl Draft04TypeMapper {
    /// Create a new draft-04 mapper
    pub fn new() -> Self {
        Self
    }
}

impl BuiltinTypeMapper for Draft04TypeMapper {
    fn map(&self, local_name: &str) -> Option<TypeMapping> {
        let mapping = match local_name {
            XSD_STRING | XSD_NORMALIZED_STRING | XSD_TOKEN | XSD_LANGUAGE | XSD_NAME
            | XSD_NCNAME | XSD_ID | XSD_IDREF | XSD_ENTITY | XSD_NMTOKEN | XSD_QNAME
            | XSD_NOTATION | XSD_ANY_SIMPLE_TYPE => TypeMapping::plain(JsonType::String),

            XSD_BOOLEAN => TypeMapping::plain(JsonType::Boolean),

            XSD_DECIMAL | XSD_FLOAT | XSD_DOUBLE => TypeMapping::plain(JsonType::Number),

            XSD_INTEGER | XSD_LONG | XSD_INT | XSD_SHORT | XSD_BYTE
            | XSD_NON_NEGATIVE_INTEGER | XSD_POSITIVE_INTEGER | XSD_NON_POSITIVE_INTEGER
            | XSD_NEGATIVE_INTEGER | XSD_UNSIGNED_LONG | XSD_UNSIGNED_INT
            | XSD_UNSIGNED_SHORT | XSD_UNSIGNED_BYTE => TypeMapping::plain(JsonType::Integer),

            XSD_DATETIME => TypeMapping::with_format(JsonType::String, "date-time"),
            XSD_ANY_URI => TypeMapping::with_format(JsonType::String, "uri"),

            XSD_DURATION | XSD_DATE | XSD_TIME | XSD_GYEAR_MONTH | XSD_GYEAR
            | XSD_GMONTH_DAY | XSD_GDAY | XSD_GMONTH | XSD_HEX_BINARY | XSD_BASE64_BINARY => {
                TypeMapping::plain(JsonType::String)
            }

            XSD_ANY_TYPE => TypeMapping::plain(JsonType::Object),

            _ => return None,
        };
        Some(mapping)
    }
}
