//! In-memory map of client-visible name → typed binding, per `spec.md` §4.4.
//! Only Embedding B uses this; Embedding A resolves paths directly through
//! the simulator's own symbol table via [`crate::SimAdapter::resolve_path`].

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::adapter::Value;
use crate::HashMap;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown variable path '{0}'")]
    UnknownPath(String),
    #[error("'{0}' is not an array and cannot be indexed")]
    NotArray(String),
    #[error("index {index} out of range for '{path}' (depth {depth})")]
    IndexOutOfRange {
        path: String,
        index: i64,
        depth: usize,
    },
    #[error("value {0:?} is not representable for this binding's primitive kind")]
    TypeMismatch(Value),
    #[error("duplicate registration for '{0}'")]
    Duplicate(String),
}

/// How the underlying cell is loaded/stored, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    F64,
    Str,
    Event,
}

/// Client-visible semantic of a binding, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Scalar,
    Param,
    Array,
    Event,
    Clock,
}

#[derive(Debug, Clone)]
pub enum CellData {
    Int(i64),
    Real(f64),
    Str(String),
    Event(bool),
}

impl CellData {
    fn from_primitive(primitive: Primitive) -> Self {
        match primitive {
            Primitive::F64 => CellData::Real(0.0),
            Primitive::Str => CellData::Str(String::new()),
            Primitive::Event => CellData::Event(false),
            _ => CellData::Int(0),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            CellData::Int(i) => Value::Int(*i),
            CellData::Real(r) => Value::Real(*r),
            CellData::Str(s) => Value::Str(s.clone()),
            CellData::Event(b) => Value::Event(*b),
        }
    }

    /// Truncates a real to the nearest integer for integer-typed cells, per
    /// `spec.md` §4.4 ("Writing a scalar truncates a real to the nearest
    /// integer for integer-typed cells").
    fn write(&mut self, primitive: Primitive, value: &Value) -> Result<(), RegistryError> {
        match primitive {
            Primitive::F64 => {
                *self = CellData::Real(value.as_f64().ok_or_else(|| RegistryError::TypeMismatch(value.clone()))?);
            }
            Primitive::Str => {
                if let Value::Str(s) = value {
                    *self = CellData::Str(s.clone());
                } else {
                    return Err(RegistryError::TypeMismatch(value.clone()));
                }
            }
            Primitive::Event => {
                let truthy = value
                    .as_f64()
                    .ok_or_else(|| RegistryError::TypeMismatch(value.clone()))?;
                *self = CellData::Event(truthy != 0.0);
            }
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => {
                let raw = value
                    .as_f64()
                    .ok_or_else(|| RegistryError::TypeMismatch(value.clone()))?;
                *self = CellData::Int(raw.round() as i64);
            }
        }
        Ok(())
    }

    pub(crate) fn as_bit(&self) -> u8 {
        match self {
            CellData::Int(i) => (*i != 0) as u8,
            CellData::Real(r) => (*r != 0.0) as u8,
            CellData::Event(b) => *b as u8,
            CellData::Str(_) => 0,
        }
    }

    pub(crate) fn set_bit(&mut self, v: u8) {
        *self = CellData::Int(v as i64);
    }
}

pub(crate) type SharedCell = Rc<RefCell<CellData>>;

/// Backing storage for a binding: one cell for scalar/param/event, a vector
/// of cells for an array's elements. Scalar cells are `Rc`-shared so a
/// [`crate::Clock`] can hold the same cell its registry binding exposes.
pub enum Cell {
    Scalar(Rc<RefCell<CellData>>),
    Array(Vec<Rc<RefCell<CellData>>>),
}

/// `(name, primitive_kind, kind, dims, width, depth)` plus backing storage,
/// per `spec.md` §3 "Variable binding". Invariants (ARRAY ⇒ dims=2 ∧
/// depth≥1; EVENT ⇒ primitive=event ∧ width=1) are enforced by the smart
/// constructors below rather than checked ad hoc by callers.
pub struct Binding {
    pub name: String,
    pub primitive: Primitive,
    pub kind: VarKind,
    pub dims: u8,
    pub width: u32,
    pub depth: usize,
    cell: Cell,
}

impl Binding {
    pub fn scalar(name: impl Into<String>, primitive: Primitive, width: u32) -> Self {
        Self {
            name: name.into(),
            primitive,
            kind: VarKind::Scalar,
            dims: 0,
            width,
            depth: 0,
            cell: Cell::Scalar(Rc::new(RefCell::new(CellData::from_primitive(primitive)))),
        }
    }

    pub fn param(name: impl Into<String>, primitive: Primitive, width: u32) -> Self {
        Self {
            kind: VarKind::Param,
            ..Self::scalar(name, primitive, width)
        }
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitive: Primitive::Event,
            kind: VarKind::Event,
            dims: 0,
            width: 1,
            depth: 0,
            cell: Cell::Scalar(Rc::new(RefCell::new(CellData::Event(false)))),
        }
    }

    pub fn array(name: impl Into<String>, primitive: Primitive, width: u32, depth: usize) -> Self {
        assert!(depth >= 1, "array binding requires depth >= 1");
        let cells = (0..depth)
            .map(|_| Rc::new(RefCell::new(CellData::from_primitive(primitive))))
            .collect();
        Self {
            name: name.into(),
            primitive,
            kind: VarKind::Array,
            dims: 2,
            width,
            depth,
            cell: Cell::Array(cells),
        }
    }

    /// Backing storage for a clock's 1-bit output cell, shared with the
    /// [`crate::Clock`] that drives it: both the binding and the clock hold
    /// the same `Rc<RefCell<_>>`, so toggling the clock is visible through
    /// `get {sel:"value"}` without a copy step.
    pub(crate) fn clock_cell(name: impl Into<String>) -> (Self, SharedCell) {
        let cell = Rc::new(RefCell::new(CellData::Int(0)));
        let binding = Self {
            name: name.into(),
            primitive: Primitive::U8,
            kind: VarKind::Clock,
            dims: 0,
            width: 1,
            depth: 0,
            cell: Cell::Scalar(Rc::clone(&cell)),
        };
        (binding, cell)
    }

    pub fn read_scalar(&self) -> Value {
        match &self.cell {
            Cell::Scalar(c) => c.borrow().to_value(),
            Cell::Array(_) => unreachable!("caller must check kind before reading scalar"),
        }
    }

    pub fn write_scalar(&self, value: &Value) -> Result<(), RegistryError> {
        match &self.cell {
            Cell::Scalar(c) => c.borrow_mut().write(self.primitive, value),
            Cell::Array(_) => Err(RegistryError::NotArray(self.name.clone())),
        }
    }

    pub fn read_array(&self) -> Result<Vec<Value>, RegistryError> {
        match &self.cell {
            Cell::Array(cells) => Ok(cells.iter().map(|c| c.borrow().to_value()).collect()),
            Cell::Scalar(_) => Err(RegistryError::NotArray(self.name.clone())),
        }
    }

    pub fn read_index(&self, index: usize) -> Result<Value, RegistryError> {
        match &self.cell {
            Cell::Array(cells) => cells
                .get(index)
                .map(|c| c.borrow().to_value())
                .ok_or(RegistryError::IndexOutOfRange {
                    path: self.name.clone(),
                    index: index as i64,
                    depth: self.depth,
                }),
            Cell::Scalar(_) => Err(RegistryError::NotArray(self.name.clone())),
        }
    }

    /// Writes a single array element, per `spec.md` §4.4's indexed `set`/
    /// `get` path syntax (`name[i]`).
    pub fn write_index(&self, index: usize, value: &Value) -> Result<(), RegistryError> {
        match &self.cell {
            Cell::Array(cells) => {
                let cell = cells.get(index).ok_or(RegistryError::IndexOutOfRange {
                    path: self.name.clone(),
                    index: index as i64,
                    depth: self.depth,
                })?;
                cell.borrow_mut().write(self.primitive, value)
            }
            Cell::Scalar(_) => Err(RegistryError::NotArray(self.name.clone())),
        }
    }

    /// Writes `values[0..min(depth, values.len())]` into the array's
    /// elements 0.. in order, leaving remaining cells untouched, per
    /// `spec.md` §4.7 `set` on a 2-dim array path.
    pub fn write_array(&self, values: &[Value]) -> Result<(), RegistryError> {
        match &self.cell {
            Cell::Array(cells) => {
                for (cell, value) in cells.iter().zip(values.iter()) {
                    cell.borrow_mut().write(self.primitive, value)?;
                }
                Ok(())
            }
            Cell::Scalar(_) => Err(RegistryError::NotArray(self.name.clone())),
        }
    }
}

/// The client-visible variable registry: exact-match, case-sensitive,
/// populated once at startup and immutable thereafter (`spec.md` §4.4).
#[derive(Default)]
pub struct Registry {
    bindings: HashMap<String, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: Binding) -> Result<(), RegistryError> {
        if self.bindings.contains_key(&binding.name) {
            return Err(RegistryError::Duplicate(binding.name));
        }
        self.bindings.insert(binding.name.clone(), binding);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_write_truncates_real_to_integer() {
        let b = Binding::scalar("s", Primitive::U32, 32);
        b.write_scalar(&Value::Real(41.6)).unwrap();
        assert_eq!(b.read_scalar(), Value::Int(42));
    }

    #[test]
    fn array_write_leaves_trailing_cells_untouched() {
        let b = Binding::array("a", Primitive::U8, 8, 4);
        b.write_array(&[Value::Int(1), Value::Int(2)]).unwrap();
        let values = b.read_array().unwrap();
        assert_eq!(
            values,
            vec![Value::Int(1), Value::Int(2), Value::Int(0), Value::Int(0)]
        );
    }

    #[test]
    fn array_write_ignores_surplus_values() {
        let b = Binding::array("a", Primitive::U8, 8, 2);
        b.write_array(&[Value::Int(9), Value::Int(9), Value::Int(9)])
            .unwrap();
        assert_eq!(b.read_array().unwrap(), vec![Value::Int(9), Value::Int(9)]);
    }
}
