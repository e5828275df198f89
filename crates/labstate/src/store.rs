//! Raw control values and their projection onto the uniform snapshot.
//!
//! The store keeps what the user dialled in (raw) and writes what the shader
//! should see (effective) straight into the shared [`SnapshotHandle`]. For
//! controls flagged `scaled_by_master` the effective value is
//! `raw * master`, so moving the master slider rewrites every one of them.

use std::collections::BTreeMap;

use renderer::{ShaderVariant, SnapshotHandle, UniformContract, UniformKind, UniformValue};
use tracing::{debug, warn};

use crate::error::{Result, StateError};
use crate::params::{ParamValue, ParameterDef, ParameterSet, MASTER_KEY};

pub struct ParameterStore {
    set: ParameterSet,
    contract: UniformContract,
    snapshot: SnapshotHandle,
    raw: Vec<ParamValue>,
    dirty: bool,
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterStore")
            .field("variant", &self.set.variant())
            .field("raw", &self.raw)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl ParameterStore {
    /// Creates a store and a fresh snapshot seeded with the defaults.
    pub fn new(variant: ShaderVariant) -> Result<Self> {
        let contract = UniformContract::for_variant(variant);
        let snapshot = SnapshotHandle::from_contract(&contract);
        Self::with_snapshot(variant, snapshot)
    }

    /// Creates a store writing into an existing snapshot.
    pub fn with_snapshot(variant: ShaderVariant, snapshot: SnapshotHandle) -> Result<Self> {
        let set = ParameterSet::for_variant(variant);
        let mut store = Self {
            set,
            contract: UniformContract::for_variant(variant),
            snapshot,
            raw: set.defs().iter().map(ParameterDef::default_value).collect(),
            dirty: false,
        };
        store.write_all()?;
        Ok(store)
    }

    pub fn variant(&self) -> ShaderVariant {
        self.set.variant()
    }

    pub fn parameter_set(&self) -> ParameterSet {
        self.set
    }

    pub fn contract(&self) -> &UniformContract {
        &self.contract
    }

    pub fn snapshot(&self) -> &SnapshotHandle {
        &self.snapshot
    }

    /// Sets a control by key or uniform name. The raw value is clamped into
    /// the control's range before it is stored.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        let value = value.into();
        let index = self
            .set
            .position(name)
            .ok_or_else(|| StateError::UnknownParameter(name.to_string()))?;
        let def = &self.set.defs()[index];
        if !value.is_finite() {
            return Err(StateError::NonFinite(def.key.to_string()));
        }
        let raw = def.clamp_raw(value).ok_or_else(|| StateError::KindMismatch {
            name: def.key.to_string(),
            expected: expected_kind(def),
        })?;

        self.raw[index] = raw;
        self.dirty = true;
        if def.key == MASTER_KEY {
            self.write_all()
        } else {
            self.write_effective(index)
        }
    }

    /// Raw (pre-master) value of a control.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.set.position(name).map(|index| self.raw[index])
    }

    /// Value currently in the snapshot for a control.
    pub fn effective(&self, name: &str) -> Option<UniformValue> {
        let def = self.set.get(name)?;
        self.snapshot.get(def.uniform)
    }

    pub fn master(&self) -> f32 {
        self.get(MASTER_KEY)
            .and_then(|value| value.as_scalar())
            .unwrap_or(1.0)
    }

    /// Raw values keyed by control key.
    pub fn values(&self) -> BTreeMap<String, ParamValue> {
        self.set
            .defs()
            .iter()
            .zip(&self.raw)
            .map(|(def, value)| (def.key.to_string(), *value))
            .collect()
    }

    /// Applies a batch of raw values. Unknown keys and invalid values are
    /// logged and skipped; returns how many were applied.
    pub fn apply(&mut self, values: &BTreeMap<String, ParamValue>) -> usize {
        let mut applied = 0;
        for (key, value) in values {
            match self.set_parameter(key, *value) {
                Ok(()) => applied += 1,
                Err(err) => warn!(parameter = %key, "skipping stored value: {err}"),
            }
        }
        debug!(applied, total = values.len(), "applied parameter batch");
        applied
    }

    pub fn reset(&mut self) -> Result<()> {
        self.raw = self
            .set
            .defs()
            .iter()
            .map(ParameterDef::default_value)
            .collect();
        self.dirty = true;
        self.write_all()
    }

    /// Moves a scalar control by `steps` increments of its step size.
    pub fn nudge(&mut self, name: &str, steps: f32) -> Result<ParamValue> {
        let def = self
            .set
            .get(name)
            .ok_or_else(|| StateError::UnknownParameter(name.to_string()))?;
        let (Some(step), Some(current)) = (def.step(), self.get(name).and_then(|v| v.as_scalar()))
        else {
            return Err(StateError::KindMismatch {
                name: def.key.to_string(),
                expected: UniformKind::Float,
            });
        };
        self.set_parameter(def.key, current + step * steps)?;
        Ok(self.get(def.key).unwrap_or(ParamValue::Scalar(current)))
    }

    /// True once after any change since the previous call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn write_all(&mut self) -> Result<()> {
        for index in 0..self.raw.len() {
            self.write_effective(index)?;
        }
        Ok(())
    }

    fn write_effective(&self, index: usize) -> Result<()> {
        let def = &self.set.defs()[index];
        let mut value = self.raw[index].to_uniform();
        if def.scaled_by_master {
            let master = self.master();
            value = value.map(|component| component * master);
        }
        if let Some(decl) = self.contract.get(def.uniform) {
            value = decl.clamp(value);
        }
        self.snapshot.write(def.uniform, value)?;
        Ok(())
    }
}

fn expected_kind(def: &ParameterDef) -> UniformKind {
    def.default_value().to_uniform().kind()
}
