//! Name binding state
//!
//! Four independent tables: variables, constants, functions and procedures.
//! Subprogram invocation pushes a fresh variable frame; constants and
//! subprograms stay visible from every frame, outer variables do not.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::parser::{Parameter, PrimitiveType, Statement, TypeExpr};
use crate::runtime::value::Value;

/// A variable's declared type with array extents already evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// One of the five primitive types
    Primitive(PrimitiveType),
    /// Array with cached extents
    Array {
        /// Element type
        element: PrimitiveType,
        /// Inclusive `(lower, upper)` bound per dimension
        extents: Vec<(i64, i64)>,
    },
}

/// A declared variable: its type and current value
///
/// `value` is `None` between declaration and first assignment. Array
/// variables are backed by storage from the moment they are declared, with
/// every element unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Declared type
    pub ty: DeclaredType,
    /// Current value, `None` while unset
    pub value: Option<Value>,
}

/// A declared procedure or function body, shared between call sites
#[derive(Debug, Clone, PartialEq)]
pub struct Subprogram {
    /// Parameter list, `None` when declared without parentheses
    pub params: Option<Vec<Parameter>>,
    /// Declared return type, `None` for procedures
    pub return_type: Option<TypeExpr>,
    /// Statements of the body
    pub body: Vec<Statement>,
}

/// All name bindings visible to the interpreter
#[derive(Debug, Default)]
pub struct VariableState {
    globals: HashMap<String, Variable>,
    frames: Vec<HashMap<String, Variable>>,
    constants: HashMap<String, Value>,
    functions: HashMap<String, Rc<Subprogram>>,
    procedures: HashMap<String, Rc<Subprogram>>,
}

impl VariableState {
    /// Empty state with no bindings
    pub fn new() -> Self {
        VariableState::default()
    }

    fn scope(&self) -> &HashMap<String, Variable> {
        self.frames.last().unwrap_or(&self.globals)
    }

    fn scope_mut(&mut self) -> &mut HashMap<String, Variable> {
        self.frames.last_mut().unwrap_or(&mut self.globals)
    }

    /// Enter a fresh variable frame for a subprogram call
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Leave the current subprogram frame
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Bind `name` in the current frame with the given type and value
    pub fn declare(&mut self, name: &str, ty: DeclaredType, value: Option<Value>) {
        self.scope_mut()
            .insert(name.to_string(), Variable { ty, value });
    }

    /// Bind an immutable constant
    pub fn declare_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.to_string(), value);
    }

    /// Record a function body
    pub fn define_function(&mut self, name: &str, subprogram: Subprogram) {
        self.functions.insert(name.to_string(), Rc::new(subprogram));
    }

    /// Record a procedure body
    pub fn define_procedure(&mut self, name: &str, subprogram: Subprogram) {
        self.procedures.insert(name.to_string(), Rc::new(subprogram));
    }

    /// Read the value bound to `name`: constants first, then the current
    /// variable frame
    pub fn read(&self, name: &str) -> Result<&Value> {
        if let Some(value) = self.constants.get(name) {
            return Ok(value);
        }
        match self.scope().get(name) {
            Some(Variable {
                value: Some(value), ..
            }) => Ok(value),
            Some(Variable { value: None, .. }) => Err(Error::UnassignedVariable {
                name: name.to_string(),
            }),
            None => Err(Error::UndefinedName {
                name: name.to_string(),
            }),
        }
    }

    /// Look up the variable record for `name` in the current frame
    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.scope().get(name).ok_or_else(|| Error::UndefinedName {
            name: name.to_string(),
        })
    }

    /// Assign `value` to the declared variable `name`
    ///
    /// Integers are widened when the variable is declared REAL; any other
    /// type disagreement is a `TypeMismatch`. Constants and whole arrays are
    /// not assignable.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        if self.constants.contains_key(name) {
            return Err(Error::InvalidAssignmentTarget {
                reason: format!("{name} is a constant"),
            });
        }
        let variable = match self.scope_mut().get_mut(name) {
            Some(variable) => variable,
            None => {
                return Err(Error::UndefinedName {
                    name: name.to_string(),
                })
            }
        };
        match variable.ty {
            DeclaredType::Primitive(ty) => {
                let value = widen(value, ty)?;
                variable.value = Some(value);
                Ok(())
            }
            DeclaredType::Array { .. } => Err(Error::InvalidAssignmentTarget {
                reason: format!("{name} is an array"),
            }),
        }
    }

    /// Look up a declared function
    pub fn function(&self, name: &str) -> Result<Rc<Subprogram>> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedName {
                name: name.to_string(),
            })
    }

    /// Look up a declared procedure
    pub fn procedure(&self, name: &str) -> Result<Rc<Subprogram>> {
        self.procedures
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedName {
                name: name.to_string(),
            })
    }
}

/// Check `value` against a declared primitive type, widening INTEGER to REAL
pub fn widen(value: Value, ty: PrimitiveType) -> Result<Value> {
    if let (Value::Integer(n), PrimitiveType::Real) = (&value, ty) {
        return Ok(Value::Real(*n as f64));
    }
    if value.conforms(ty) {
        Ok(value)
    } else {
        Err(Error::TypeMismatch {
            expected: ty.to_string(),
            got: value.type_name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undeclared_read_is_undefined_name() {
        let state = VariableState::new();
        assert!(matches!(
            state.read("x"),
            Err(Error::UndefinedName { .. })
        ));
    }

    #[test]
    fn declared_but_unset_read_is_unassigned() {
        let mut state = VariableState::new();
        state.declare("x", DeclaredType::Primitive(PrimitiveType::Integer), None);
        assert!(matches!(
            state.read("x"),
            Err(Error::UnassignedVariable { .. })
        ));
    }

    #[test]
    fn assignment_requires_declaration() {
        let mut state = VariableState::new();
        assert!(matches!(
            state.assign("y", Value::Integer(5)),
            Err(Error::UndefinedName { .. })
        ));
    }

    #[test]
    fn assignment_widens_integer_to_real() {
        let mut state = VariableState::new();
        state.declare("r", DeclaredType::Primitive(PrimitiveType::Real), None);
        state.assign("r", Value::Integer(2)).unwrap();
        assert_eq!(state.read("r").unwrap(), &Value::Real(2.0));
    }

    #[test]
    fn constants_shadow_nothing_and_reject_assignment() {
        let mut state = VariableState::new();
        state.declare_constant("Pi", Value::Real(3.14));
        assert_eq!(state.read("Pi").unwrap(), &Value::Real(3.14));
        assert!(matches!(
            state.assign("Pi", Value::Real(3.0)),
            Err(Error::InvalidAssignmentTarget { .. })
        ));
    }

    #[test]
    fn frames_hide_outer_variables_but_not_constants() {
        let mut state = VariableState::new();
        state.declare_constant("Limit", Value::Integer(10));
        state.declare("x", DeclaredType::Primitive(PrimitiveType::Integer), None);
        state.assign("x", Value::Integer(1)).unwrap();
        state.push_frame();
        assert!(matches!(state.read("x"), Err(Error::UndefinedName { .. })));
        assert_eq!(state.read("Limit").unwrap(), &Value::Integer(10));
        state.pop_frame();
        assert_eq!(state.read("x").unwrap(), &Value::Integer(1));
    }
}
