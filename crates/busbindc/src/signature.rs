//! Wire type signature decoder.
//!
//! A signature is a compact string encoding of a possibly-nested type:
//! single-character primitive codes, `a` + element for arrays, `(...)` for
//! structures, and `a{KV}` for associative maps. A map is represented on
//! the wire as an array of dict entries, which makes `a{` locally
//! ambiguous with a plain array; the decoder resolves that before emitting
//! any container type, so a map decodes to a single `DictEntry` node and
//! never to "array of pair".

use std::collections::BTreeSet;
use std::fmt;

use crate::model::TypeExpression;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    UnknownTypeCode { code: char, offset: usize },
    UnterminatedContainer { opener: char, offset: usize },
    MissingElementType { offset: usize },
    DictEntryOutsideArray { offset: usize },
    DictEntryArity { offset: usize },
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::UnknownTypeCode { code, offset } => {
                write!(f, "unknown type code {code:?} at offset {offset}")
            }
            SignatureError::UnterminatedContainer { opener, offset } => {
                write!(f, "unterminated {opener:?} container opened at offset {offset}")
            }
            SignatureError::MissingElementType { offset } => {
                write!(f, "array marker at offset {offset} has no element type")
            }
            SignatureError::DictEntryOutsideArray { offset } => {
                write!(f, "dict entry at offset {offset} outside of an array")
            }
            SignatureError::DictEntryArity { offset } => {
                write!(
                    f,
                    "dict entry at offset {offset} must hold exactly a key type and a value type"
                )
            }
        }
    }
}

impl std::error::Error for SignatureError {}

/// Decoded form of one signature string: the top-level types in order, and
/// the union of every auxiliary import requirement found anywhere in them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub types: Vec<TypeExpression>,
    pub requires: BTreeSet<String>,
}

/// Decode a full signature string.
///
/// A single signature may contain several sibling top-level types; whether
/// that is acceptable is the caller's concern, the grammar allows it.
pub fn decode_signature(signature: &str) -> Result<Decoded, SignatureError> {
    let mut cursor = Cursor {
        bytes: signature.as_bytes(),
        pos: 0,
    };
    let mut types = Vec::new();
    while cursor.peek().is_some() {
        types.push(decode_one(&mut cursor)?);
    }
    let mut requires = BTreeSet::new();
    for ty in &types {
        ty.collect_requires(&mut requires);
    }
    Ok(Decoded { types, requires })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }
}

fn decode_one(cursor: &mut Cursor<'_>) -> Result<TypeExpression, SignatureError> {
    let offset = cursor.pos;
    // Callers guarantee at least one byte remains.
    let code = match cursor.bump() {
        Some(code) => code,
        None => return Err(SignatureError::MissingElementType { offset }),
    };
    match code {
        b'a' => {
            match cursor.peek() {
                // The dictionary case: suppress the array wrapper entirely.
                Some(b'{') => decode_dict_entry(cursor),
                Some(_) => Ok(TypeExpression::array(decode_one(cursor)?)),
                None => Err(SignatureError::MissingElementType { offset }),
            }
        }
        b'(' => {
            let mut members = Vec::new();
            loop {
                match cursor.peek() {
                    None => {
                        return Err(SignatureError::UnterminatedContainer {
                            opener: '(',
                            offset,
                        })
                    }
                    Some(b')') => {
                        cursor.bump();
                        return Ok(TypeExpression::structure(members));
                    }
                    Some(_) => members.push(decode_one(cursor)?),
                }
            }
        }
        b'{' => Err(SignatureError::DictEntryOutsideArray { offset }),
        b'v' => Ok(TypeExpression::variant()),
        _ => primitive(code).ok_or(SignatureError::UnknownTypeCode {
            code: code as char,
            offset,
        }),
    }
}

fn decode_dict_entry(cursor: &mut Cursor<'_>) -> Result<TypeExpression, SignatureError> {
    let offset = cursor.pos;
    cursor.bump(); // consume '{'
    if matches!(cursor.peek(), None | Some(b'}')) {
        return Err(SignatureError::DictEntryArity { offset });
    }
    let key = decode_one(cursor)?;
    if matches!(cursor.peek(), None | Some(b'}')) {
        return Err(SignatureError::DictEntryArity { offset });
    }
    let value = decode_one(cursor)?;
    match cursor.bump() {
        Some(b'}') => Ok(TypeExpression::dict_entry(key, value)),
        Some(_) => Err(SignatureError::DictEntryArity { offset }),
        None => Err(SignatureError::UnterminatedContainer {
            opener: '{',
            offset,
        }),
    }
}

fn primitive(code: u8) -> Option<TypeExpression> {
    let expr = match code {
        b'y' => TypeExpression::primitive("u8"),
        b'b' => TypeExpression::primitive("bool"),
        b'n' => TypeExpression::primitive("i16"),
        b'q' => TypeExpression::primitive("u16"),
        b'i' => TypeExpression::primitive("i32"),
        b'u' => TypeExpression::primitive("u32"),
        b'x' => TypeExpression::primitive("i64"),
        b't' => TypeExpression::primitive("u64"),
        b'd' => TypeExpression::primitive("f64"),
        b's' => TypeExpression::primitive("String"),
        b'o' => TypeExpression::primitive_with("ObjectPath", "busbind::ObjectPath"),
        b'g' => TypeExpression::primitive_with("Signature", "busbind::Signature"),
        b'h' => TypeExpression::primitive_with("FileDescriptor", "busbind::FileDescriptor"),
        _ => return None,
    };
    Some(expr)
}
