use std::collections::HashMap;

/// Dictionary payload of a [`PDFObject`].
pub type Dict = HashMap<String, PDFObject>;

/// PDF object types as defined in the PDF specification.
///
/// Values are either direct (everything but `Ref`) or an indirect reference
/// that has to go through an [`ObjectResolver`](super::xref::ObjectResolver)
/// before it can be used. Based on PDF.js's primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null value
    Null,

    /// Boolean value
    Boolean(bool),

    /// Numeric value (integers and reals)
    Number(f64),

    /// String value
    String(Vec<u8>),

    /// Name value (from /Name)
    Name(String),

    /// Array of objects
    Array(Vec<PDFObject>),

    /// Dictionary (key-value pairs)
    Dictionary(Dict),

    /// Stream object (dictionary + binary data)
    Stream { dict: Dict, data: Vec<u8> },

    /// Indirect object reference (like "5 0 R")
    Ref { num: u32, generation: u32 },
}

impl PDFObject {
    /// Builds a `/Name` object.
    pub fn name(name: &str) -> Self {
        PDFObject::Name(name.to_string())
    }

    /// Builds an indirect reference `num generation R`.
    pub fn reference(num: u32, generation: u32) -> Self {
        PDFObject::Ref { num, generation }
    }

    /// Builds a dictionary from `(key, value)` pairs.
    pub fn dict<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PDFObject)>,
        K: Into<String>,
    {
        PDFObject::Dictionary(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true if this object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, PDFObject::Null)
    }

    /// Returns true if this object is an indirect reference.
    pub fn is_ref(&self) -> bool {
        matches!(self, PDFObject::Ref { .. })
    }

    /// Returns `(num, generation)` for an indirect reference.
    pub fn as_ref_pair(&self) -> Option<(u32, u32)> {
        match self {
            PDFObject::Ref { num, generation } => Some((*num, *generation)),
            _ => None,
        }
    }

    /// Returns the dictionary of a dictionary or stream object.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            PDFObject::Dictionary(dict) => Some(dict),
            PDFObject::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PDFObject]> {
        match self {
            PDFObject::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PDFObject::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PDFObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PDFObject::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as an integer if it is a finite number with no
    /// fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PDFObject::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    /// Looks up `key` in a dictionary or stream dictionary.
    ///
    /// The value is returned as stored, so it may still be a reference.
    pub fn get(&self, key: &str) -> Option<&PDFObject> {
        self.as_dict()?.get(key)
    }

    /// Returns true if this is a dictionary (or stream) with `key`.
    pub fn has(&self, key: &str) -> bool {
        self.as_dict().is_some_and(|dict| dict.contains_key(key))
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PDFObject::Null => "null",
            PDFObject::Boolean(_) => "boolean",
            PDFObject::Number(_) => "number",
            PDFObject::String(_) => "string",
            PDFObject::Name(_) => "name",
            PDFObject::Array(_) => "array",
            PDFObject::Dictionary(_) => "dictionary",
            PDFObject::Stream { .. } => "stream",
            PDFObject::Ref { .. } => "reference",
        }
    }
}
