//! Shared, in-place mutable mirror of every parameter uniform.
//!
//! Writer: the parameter store. Reader: the engine, once per frame. Both hold
//! a [`SnapshotHandle`] to the same record; nothing is copied in between, so
//! the latest write before a tick is what that tick uploads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::contract::{UniformContract, UniformKind};

/// Numeric value of a single uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
        }
    }

    /// Borrowed component view used for uploads.
    pub fn as_slice(&self) -> &[f32] {
        match self {
            UniformValue::Float(value) => std::slice::from_ref(value),
            UniformValue::Vec2(values) => values,
            UniformValue::Vec3(values) => values,
        }
    }

    /// Applies `f` to every component, keeping the shape.
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Self {
        match self {
            UniformValue::Float(value) => UniformValue::Float(f(value)),
            UniformValue::Vec2(values) => UniformValue::Vec2(values.map(f)),
            UniformValue::Vec3(values) => UniformValue::Vec3(values.map(f)),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("uniform '{0}' is not part of the snapshot")]
    UnknownUniform(String),
    #[error("uniform '{name}' expects a {expected} value, got {actual}")]
    KindMismatch {
        name: String,
        expected: UniformKind,
        actual: UniformKind,
    },
}

/// Name-indexed uniform values. Entries are fixed once built; only their
/// values change afterwards.
#[derive(Debug, Clone, Default)]
pub struct UniformSnapshot {
    entries: Vec<(String, UniformValue)>,
    index: HashMap<String, usize>,
}

impl UniformSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one entry per parameter uniform with the contract default.
    pub fn from_contract(contract: &UniformContract) -> Self {
        let mut snapshot = Self::new();
        for decl in contract.parameters() {
            snapshot.insert(&decl.name, decl.default);
        }
        snapshot
    }

    /// Adds (or replaces) an entry. Only meant for construction.
    pub fn insert(&mut self, name: &str, value: UniformValue) {
        match self.index.get(name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), value));
            }
        }
    }

    /// Overwrites an existing entry in place.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), SnapshotError> {
        let slot = self
            .position(name)
            .ok_or_else(|| SnapshotError::UnknownUniform(name.to_string()))?;
        let current = &mut self.entries[slot].1;
        if current.kind() != value.kind() {
            return Err(SnapshotError::KindMismatch {
                name: name.to_string(),
                expected: current.kind(),
                actual: value.kind(),
            });
        }
        *current = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.position(name).map(|slot| self.entries[slot].1)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Value at a slot previously returned by [`Self::position`].
    pub fn value_at(&self, slot: usize) -> Option<UniformValue> {
        self.entries.get(slot).map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }
}

/// Reference-counted handle to the one snapshot shared by store and engine.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle(Rc<RefCell<UniformSnapshot>>);

impl SnapshotHandle {
    pub fn new(snapshot: UniformSnapshot) -> Self {
        Self(Rc::new(RefCell::new(snapshot)))
    }

    pub fn from_contract(contract: &UniformContract) -> Self {
        Self::new(UniformSnapshot::from_contract(contract))
    }

    pub fn write(&self, name: &str, value: UniformValue) -> Result<(), SnapshotError> {
        self.0.borrow_mut().set(name, value)
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.0.borrow().get(name)
    }

    /// Runs `f` against the current record without copying it.
    pub fn read<R>(&self, f: impl FnOnce(&UniformSnapshot) -> R) -> R {
        f(&self.0.borrow())
    }

    /// True when both handles point at the same record.
    pub fn shares_with(&self, other: &SnapshotHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
