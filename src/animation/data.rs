use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::animation::ease::Ease;
use crate::animation::param::{Parameter, ParameterKey, ParameterRegistry};
use crate::animation::sequence::{AutomationSequence, Interpolation};
use crate::animation::value::ParamValue;
use crate::foundation::core::Frame;
use crate::foundation::error::{MontageError, MontageResult};

/// An object whose fields can be driven by keyframes.
///
/// Implementors own exactly one [`AutomationData`], built for their concrete type.
pub trait Automatable: Any {
    /// Keyframe storage for this object.
    fn automation(&self) -> &AutomationData;

    /// Mutable keyframe storage for this object.
    fn automation_mut(&mut self) -> &mut AutomationData;
}

/// Values pending application to an owner, produced by [`AutomationData::evaluate_active`].
pub type PendingValues = SmallVec<[(Parameter, ParamValue); 8]>;

/// Per-owner map from parameter to keyframe sequence.
///
/// Holds one sequence for every parameter registered for the owner type at construction time.
/// Cloning deep-copies every sequence, so two owners never share keyframes.
#[derive(Clone, Debug)]
pub struct AutomationData {
    owner: TypeId,
    sequences: BTreeMap<Parameter, AutomationSequence>,
}

impl AutomationData {
    /// Build sequences for every parameter `O` has in `registry`.
    pub fn for_owner<O: Any>(registry: &ParameterRegistry) -> Self {
        let sequences = registry
            .parameters_for::<O>()
            .into_iter()
            .map(|p| (p.clone(), AutomationSequence::new(p)))
            .collect();
        Self {
            owner: TypeId::of::<O>(),
            sequences,
        }
    }

    /// `TypeId` of the owner this data was built for.
    pub fn owner_type(&self) -> TypeId {
        self.owner
    }

    /// Sequence for `param`.
    pub fn sequence(&self, param: &Parameter) -> Option<&AutomationSequence> {
        self.sequences.get(param)
    }

    /// Mutable sequence for `param`.
    pub fn sequence_mut(&mut self, param: &Parameter) -> Option<&mut AutomationSequence> {
        self.sequences.get_mut(param)
    }

    /// Sequence whose parameter has `key`.
    pub fn sequence_by_key(&self, key: &ParameterKey) -> Option<&AutomationSequence> {
        self.sequences
            .iter()
            .find(|(p, _)| p.key() == key)
            .map(|(_, s)| s)
    }

    /// Mutable sequence whose parameter has `key`.
    pub fn sequence_by_key_mut(&mut self, key: &ParameterKey) -> Option<&mut AutomationSequence> {
        self.sequences
            .iter_mut()
            .find(|(p, _)| p.key() == key)
            .map(|(_, s)| s)
    }

    /// Like [`Self::sequence_by_key_mut`], but a missing key is an error.
    pub fn require_mut(&mut self, key: &ParameterKey) -> MontageResult<&mut AutomationSequence> {
        self.sequence_by_key_mut(key).ok_or_else(|| {
            MontageError::validation(format!("owner has no automation sequence for {key}"))
        })
    }

    /// Sequences in parameter registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Parameter, &AutomationSequence)> {
        self.sequences.iter()
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Return `true` when the owner type has no parameters.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Return `true` when any sequence currently follows keyframes.
    pub fn is_automated(&self) -> bool {
        self.sequences.values().any(AutomationSequence::can_automate)
    }

    /// Move every keyframe of every sequence by `delta` frames.
    pub fn shift_keyframes(&mut self, delta: Frame) {
        for seq in self.sequences.values_mut() {
            seq.shift_keyframes(delta);
        }
    }

    /// Evaluate every sequence that has keyframes at `frame`.
    ///
    /// Sequences without keyframes are skipped: their value only changes through
    /// [`Self::set_default`], which pushes immediately.
    pub fn evaluate_active(&self, frame: Frame) -> PendingValues {
        self.sequences
            .iter()
            .filter(|(_, s)| !s.is_empty())
            .map(|(p, s)| (p.clone(), s.evaluate(frame)))
            .collect()
    }

    /// Evaluate `owner`'s sequences at `frame` and write the values through each parameter's
    /// setter. This is the only path by which automated fields change.
    ///
    /// Returns the number of parameters written.
    pub fn update(owner: &mut dyn Automatable, frame: Frame) -> MontageResult<usize> {
        let pending = owner.automation().evaluate_active(frame);
        let n = pending.len();
        let any: &mut dyn Any = owner;
        for (param, value) in pending {
            param.set_on(any, value)?;
        }
        Ok(n)
    }

    /// Like [`Self::update`], but also pushes the default of sequences without keyframes.
    ///
    /// Used after restoring automation so the owner's fields match its sequences.
    pub fn refresh(owner: &mut dyn Automatable, frame: Frame) -> MontageResult<()> {
        let pending: PendingValues = owner
            .automation()
            .sequences
            .iter()
            .map(|(p, s)| (p.clone(), s.evaluate(frame)))
            .collect();
        let any: &mut dyn Any = owner;
        for (param, value) in pending {
            param.set_on(any, value)?;
        }
        Ok(())
    }

    /// Set the default keyframe of `key` on `owner` and push the value immediately.
    pub fn set_default(
        owner: &mut dyn Automatable,
        key: &ParameterKey,
        value: ParamValue,
    ) -> MontageResult<()> {
        let (param, value, automated) = {
            let seq = owner.automation_mut().require_mut(key)?;
            seq.set_default_value(value)?;
            (seq.parameter().clone(), seq.default_value(), seq.can_automate())
        };
        if automated {
            return Ok(());
        }
        let any: &mut dyn Any = owner;
        param.set_on(any, value)
    }

    /// Write non-trivial sequences into `into`, keyed by `domain::name`.
    pub fn write(&self, into: &mut serde_json::Map<String, serde_json::Value>) {
        for (param, seq) in &self.sequences {
            let untouched = seq.is_empty()
                && !seq.override_enabled()
                && seq.default_value() == param.descriptor().default;
            if untouched {
                continue;
            }
            let keys: Vec<serde_json::Value> = seq
                .keyframes()
                .iter()
                .map(|k| {
                    serde_json::json!({
                        "frame": k.frame,
                        "value": k.value.to_json(),
                        "ease": k.ease,
                    })
                })
                .collect();
            into.insert(
                param.key().to_string(),
                serde_json::json!({
                    "default": seq.default_value().to_json(),
                    "override": seq.override_enabled(),
                    "interpolation": seq.interpolation(),
                    "keys": keys,
                }),
            );
        }
    }

    /// Restore sequences written by [`Self::write`]. Keys the owner does not have are rejected.
    pub fn read(&mut self, from: &serde_json::Map<String, serde_json::Value>) -> MontageResult<()> {
        for (key, entry) in from {
            let key = ParameterKey::parse(key)?;
            let seq = self
                .sequence_by_key_mut(&key)
                .ok_or_else(|| MontageError::serde(format!("unknown automation key {key}")))?;
            let kind = seq.parameter().kind();

            if let Some(v) = entry.get("default") {
                seq.set_default_value(ParamValue::from_json(kind, v)?)?;
            }
            seq.set_override_enabled(
                entry
                    .get("override")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false),
            );
            if let Some(v) = entry.get("interpolation") {
                let interp: Interpolation = serde_json::from_value(v.clone())
                    .map_err(|e| MontageError::serde(format!("{key} interpolation: {e}")))?;
                seq.set_interpolation(interp);
            }

            seq.clear();
            let keys = entry
                .get("keys")
                .and_then(serde_json::Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for k in keys {
                let frame = k
                    .get("frame")
                    .and_then(serde_json::Value::as_i64)
                    .ok_or_else(|| MontageError::serde(format!("{key} keyframe missing frame")))?;
                let value = k
                    .get("value")
                    .ok_or_else(|| MontageError::serde(format!("{key} keyframe missing value")))
                    .and_then(|v| ParamValue::from_json(kind, v))?;
                let ease: Ease = match k.get("ease") {
                    Some(e) => serde_json::from_value(e.clone())
                        .map_err(|e| MontageError::serde(format!("{key} ease: {e}")))?,
                    None => Ease::Linear,
                };
                seq.add_keyframe_eased(frame, value, ease)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/data.rs"]
mod tests;
