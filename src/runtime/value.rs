//! Runtime values
//!
//! A small dynamically-checked value model: five primitives plus arrays.
//! Arrays carry their declared element type and per-dimension extents, fixed
//! at declaration time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexer::Literal;
use crate::parser::PrimitiveType;

/// A value produced by expression evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Real(f64),
    /// Single character
    Char(char),
    /// Character string
    Str(String),
    /// Truth value
    Boolean(bool),
    /// Multi-dimensional array
    Array(ArrayValue),
}

/// Array storage: declared element type, cached extents, flat element vector
///
/// Extents are evaluated once when the array is declared and never change.
/// Elements start unset; an unset slot is distinct from any zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Declared element type
    pub element: PrimitiveType,
    /// Inclusive `(lower, upper)` bound per dimension
    pub extents: Vec<(i64, i64)>,
    /// Row-major element storage, `None` until first assignment
    pub elements: Vec<Option<Value>>,
}

impl ArrayValue {
    /// Allocate an array with every element unset
    ///
    /// Each extent must satisfy `lower <= upper`.
    pub fn new(element: PrimitiveType, extents: Vec<(i64, i64)>) -> Result<Self> {
        let mut len: usize = 1;
        for &(lower, upper) in &extents {
            if lower > upper {
                return Err(Error::IndexOutOfBounds {
                    index: lower,
                    lower,
                    upper,
                });
            }
            len = len.saturating_mul((upper - lower + 1) as usize);
        }
        Ok(ArrayValue {
            element,
            extents,
            elements: vec![None; len],
        })
    }

    /// Row-major flat offset for `indices`, checking each against its extent
    pub fn flat_index(&self, indices: &[i64]) -> Result<usize> {
        if indices.len() != self.extents.len() {
            return Err(Error::TypeMismatch {
                expected: format!("{} array indices", self.extents.len()),
                got: format!("{}", indices.len()),
            });
        }
        let mut offset = 0usize;
        for (&index, &(lower, upper)) in indices.iter().zip(&self.extents) {
            if index < lower || index > upper {
                return Err(Error::IndexOutOfBounds {
                    index,
                    lower,
                    upper,
                });
            }
            let width = (upper - lower + 1) as usize;
            offset = offset * width + (index - lower) as usize;
        }
        Ok(offset)
    }

    /// Read the element at `indices`; `None` when it was never assigned
    pub fn get(&self, indices: &[i64]) -> Result<Option<&Value>> {
        let offset = self.flat_index(indices)?;
        Ok(self.elements[offset].as_ref())
    }
}

impl Value {
    /// Human-readable type name, matching the source language's spelling
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Char(_) => "CHAR",
            Value::Str(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Array(_) => "ARRAY",
        }
    }

    /// Narrow to a boolean
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(Error::TypeMismatch {
                expected: "BOOLEAN".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// Narrow to an integer
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(Error::TypeMismatch {
                expected: "INTEGER".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// Narrow to a real, promoting integers
    pub fn as_real(&self) -> Result<f64> {
        match self {
            Value::Real(r) => Ok(*r),
            Value::Integer(n) => Ok(*n as f64),
            other => Err(Error::TypeMismatch {
                expected: "REAL".to_string(),
                got: other.type_name().to_string(),
            }),
        }
    }

    /// True when this value inhabits `ty` (integers are accepted for REAL)
    pub fn conforms(&self, ty: PrimitiveType) -> bool {
        matches!(
            (self, ty),
            (Value::Integer(_), PrimitiveType::Integer)
                | (Value::Real(_), PrimitiveType::Real)
                | (Value::Integer(_), PrimitiveType::Real)
                | (Value::Char(_), PrimitiveType::Char)
                | (Value::Str(_), PrimitiveType::String)
                | (Value::Boolean(_), PrimitiveType::Boolean)
        )
    }

    /// Parse one line of raw input as a value of `ty`
    ///
    /// This is the coercion behind `INPUT` and `READFILE` into a typed
    /// target: INTEGER and REAL parse numerically, CHAR takes the first
    /// character, STRING takes the line verbatim, BOOLEAN accepts the
    /// spellings `TRUE` and `FALSE`.
    pub fn coerce_input(ty: PrimitiveType, line: &str) -> Result<Value> {
        let mismatch = || Error::TypeMismatch {
            expected: ty.to_string(),
            got: format!("input {line:?}"),
        };
        match ty {
            PrimitiveType::Integer => line.trim().parse().map(Value::Integer).map_err(|_| mismatch()),
            PrimitiveType::Real => line.trim().parse().map(Value::Real).map_err(|_| mismatch()),
            PrimitiveType::Char => line.chars().next().map(Value::Char).ok_or_else(mismatch),
            PrimitiveType::String => Ok(Value::Str(line.to_string())),
            PrimitiveType::Boolean => match line.trim() {
                "TRUE" => Ok(Value::Boolean(true)),
                "FALSE" => Ok(Value::Boolean(false)),
                _ => Err(mismatch()),
            },
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Integer(n) => Value::Integer(n),
            Literal::Real(r) => Value::Real(r),
            Literal::Str(s) => Value::Str(s),
            Literal::Boolean(b) => Value::Boolean(b),
        }
    }
}

impl fmt::Display for Value {
    /// Output form used by `OUTPUT` and `WRITEFILE`
    ///
    /// Reals always show a decimal point; booleans print in upper case.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(r) => {
                if r.fract() == 0.0 && r.is_finite() {
                    write!(f, "{r:.1}")
                } else {
                    write!(f, "{r}")
                }
            }
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Array(array) => {
                write!(f, "[")?;
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match element {
                        Some(value) => write!(f, "{value}")?,
                        None => write!(f, "?")?,
                    }
                }
                write!(f, "]")
            }
        }
    }
}
