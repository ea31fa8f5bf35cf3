use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::animation::value::{DataKind, ParamDescriptor, ParamScalar, ParamValue};
use crate::foundation::error::{MontageError, MontageResult};

/// Serialization-stable identity of a parameter: `(domain, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey {
    domain: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl ParameterKey {
    /// Key from static strings, usable in `const` items.
    pub const fn from_static(domain: &'static str, name: &'static str) -> Self {
        Self {
            domain: Cow::Borrowed(domain),
            name: Cow::Borrowed(name),
        }
    }

    /// Key from owned or borrowed strings.
    pub fn new(domain: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
        }
    }

    /// Parse the `domain::name` form written by [`std::fmt::Display`].
    pub fn parse(s: &str) -> MontageResult<Self> {
        match s.split_once("::") {
            Some((d, n)) if !d.is_empty() && !n.is_empty() => {
                Ok(Self::new(d.to_string(), n.to_string()))
            }
            _ => Err(MontageError::serde(format!(
                "parameter key '{s}' is not of the form domain::name"
            ))),
        }
    }

    /// Domain part (usually the owning type family, e.g. `clip`).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Parameter name inside its domain.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.domain, self.name)
    }
}

trait Accessor: Send + Sync {
    fn get(&self, owner: &dyn Any) -> Option<ParamValue>;
    fn set(&self, owner: &mut dyn Any, value: ParamValue) -> Option<()>;
}

struct FieldAccessor<O, T> {
    get: fn(&O) -> T,
    set: fn(&mut O, T),
}

impl<O: Any, T: ParamScalar> Accessor for FieldAccessor<O, T> {
    fn get(&self, owner: &dyn Any) -> Option<ParamValue> {
        owner.downcast_ref::<O>().map(|o| (self.get)(o).into_value())
    }

    fn set(&self, owner: &mut dyn Any, value: ParamValue) -> Option<()> {
        let o = owner.downcast_mut::<O>()?;
        (self.set)(o, T::from_value(value)?);
        Some(())
    }
}

struct ParameterInfo {
    key: ParameterKey,
    owner: TypeId,
    owner_name: &'static str,
    descriptor: ParamDescriptor,
    global_index: u32,
    accessor: Box<dyn Accessor>,
}

/// Handle to a registered animatable parameter.
///
/// Cheap to clone. Equality, ordering and hashing use only the process-local `global_index`,
/// which must never be persisted; use [`Parameter::key`] for that.
#[derive(Clone)]
pub struct Parameter(Arc<ParameterInfo>);

impl Parameter {
    /// Stable `(domain, name)` identity.
    pub fn key(&self) -> &ParameterKey {
        &self.0.key
    }

    /// `TypeId` of the owning Rust type.
    pub fn owner_type(&self) -> TypeId {
        self.0.owner
    }

    /// Type name of the owner, for diagnostics.
    pub fn owner_name(&self) -> &'static str {
        self.0.owner_name
    }

    /// Storage kind.
    pub fn kind(&self) -> DataKind {
        self.0.descriptor.kind()
    }

    /// Default/bounds/step.
    pub fn descriptor(&self) -> &ParamDescriptor {
        &self.0.descriptor
    }

    /// Registration order index. Process-lifetime only.
    pub fn global_index(&self) -> u32 {
        self.0.global_index
    }

    /// Read the current value from `owner` through the registered getter.
    pub fn get_from(&self, owner: &dyn Any) -> Option<ParamValue> {
        self.0.accessor.get(owner)
    }

    /// Clamp `value` and write it into `owner` through the registered setter.
    pub fn set_on(&self, owner: &mut dyn Any, value: ParamValue) -> MontageResult<()> {
        if value.kind() != self.kind() {
            return Err(MontageError::validation(format!(
                "parameter {} expects {:?}, got {:?}",
                self.key(),
                self.kind(),
                value.kind()
            )));
        }
        let value = self.0.descriptor.clamp(value);
        self.0.accessor.set(owner, value).ok_or_else(|| {
            MontageError::corrupted(format!(
                "parameter {} applied to an owner that is not {}",
                self.key(),
                self.owner_name()
            ))
        })
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.0.global_index == other.0.global_index
    }
}

impl Eq for Parameter {}

impl std::hash::Hash for Parameter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.global_index.hash(state);
    }
}

impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.global_index.cmp(&other.0.global_index)
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("key", &self.0.key.to_string())
            .field("owner", &self.0.owner_name)
            .field("kind", &self.kind())
            .field("global_index", &self.0.global_index)
            .finish()
    }
}

#[derive(Default)]
struct RegistryInner {
    by_key: HashMap<ParameterKey, Parameter>,
    by_owner: HashMap<TypeId, Vec<Parameter>>,
    next_index: u32,
}

/// Append-only catalog of animatable parameters.
///
/// Both registration and lookup go through one `RwLock`; `global_index` is assigned while the
/// write lock is held, so indices are unique and strictly increasing in registration order even
/// when several threads register at once.
#[derive(Default)]
pub struct ParameterRegistry {
    inner: RwLock<RegistryInner>,
}

static GLOBAL: OnceLock<ParameterRegistry> = OnceLock::new();

impl std::fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("parameters", &self.len())
            .finish_non_exhaustive()
    }
}

impl ParameterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in clip, track and effect parameter.
    pub fn with_builtins() -> MontageResult<Self> {
        let reg = Self::new();
        crate::builtins::register_builtin_parameters(&reg)?;
        Ok(reg)
    }

    /// Process-wide registry with the built-ins, created on first use.
    ///
    /// Prefer passing a `&ParameterRegistry` down explicitly; this exists for the process entry
    /// point and for callers that only ever use one registry.
    pub fn global() -> &'static ParameterRegistry {
        GLOBAL.get_or_init(|| {
            Self::with_builtins()
                .unwrap_or_else(|e| panic!("built-in parameter registration failed: {e}"))
        })
    }

    /// Register a parameter for owner type `O`, backed by a getter/setter pair.
    ///
    /// Fails with [`MontageError::Config`] when the key is already registered or when the
    /// descriptor does not match `T`.
    pub fn register<O: Any, T: ParamScalar>(
        &self,
        key: ParameterKey,
        descriptor: ParamDescriptor,
        get: fn(&O) -> T,
        set: fn(&mut O, T),
    ) -> MontageResult<Parameter> {
        if descriptor.kind() != T::KIND {
            return Err(MontageError::config(format!(
                "parameter {key}: descriptor kind {:?} does not match accessor kind {:?}",
                descriptor.kind(),
                T::KIND
            )));
        }
        descriptor
            .validate()
            .map_err(|e| MontageError::config(format!("parameter {key}: {e}")))?;

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.by_key.contains_key(&key) {
            return Err(MontageError::config(format!(
                "parameter {key} is already registered"
            )));
        }
        let global_index = inner.next_index;
        inner.next_index = inner
            .next_index
            .checked_add(1)
            .ok_or_else(|| MontageError::config("parameter index overflow"))?;

        let owner = TypeId::of::<O>();
        let param = Parameter(Arc::new(ParameterInfo {
            key: key.clone(),
            owner,
            owner_name: std::any::type_name::<O>(),
            descriptor,
            global_index,
            accessor: Box::new(FieldAccessor { get, set }),
        }));
        inner.by_key.insert(key, param.clone());
        inner.by_owner.entry(owner).or_default().push(param.clone());
        tracing::trace!(param = ?param, "registered parameter");
        Ok(param)
    }

    /// Register a `Float` parameter.
    pub fn register_float<O: Any>(
        &self,
        domain: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        descriptor: ParamDescriptor,
        get: fn(&O) -> f32,
        set: fn(&mut O, f32),
    ) -> MontageResult<Parameter> {
        self.register(ParameterKey::new(domain, name), descriptor, get, set)
    }

    /// Register a `Double` parameter.
    pub fn register_double<O: Any>(
        &self,
        domain: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        descriptor: ParamDescriptor,
        get: fn(&O) -> f64,
        set: fn(&mut O, f64),
    ) -> MontageResult<Parameter> {
        self.register(ParameterKey::new(domain, name), descriptor, get, set)
    }

    /// Register a `Long` parameter.
    pub fn register_long<O: Any>(
        &self,
        domain: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        descriptor: ParamDescriptor,
        get: fn(&O) -> i64,
        set: fn(&mut O, i64),
    ) -> MontageResult<Parameter> {
        self.register(ParameterKey::new(domain, name), descriptor, get, set)
    }

    /// Register a `Boolean` parameter.
    pub fn register_boolean<O: Any>(
        &self,
        domain: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        descriptor: ParamDescriptor,
        get: fn(&O) -> bool,
        set: fn(&mut O, bool),
    ) -> MontageResult<Parameter> {
        self.register(ParameterKey::new(domain, name), descriptor, get, set)
    }

    /// Find a parameter by key.
    pub fn lookup(&self, key: &ParameterKey) -> Option<Parameter> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_key.get(key).cloned()
    }

    /// Like [`Self::lookup`], but a missing key is a configuration error.
    pub fn require(&self, key: &ParameterKey) -> MontageResult<Parameter> {
        self.lookup(key)
            .ok_or_else(|| MontageError::config(format!("parameter {key} is not registered")))
    }

    /// All parameters registered for `owner`, in registration order.
    pub fn parameters_for_type(&self, owner: TypeId) -> Vec<Parameter> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_owner.get(&owner).cloned().unwrap_or_default()
    }

    /// All parameters registered for `O`, in registration order.
    pub fn parameters_for<O: Any>(&self) -> Vec<Parameter> {
        self.parameters_for_type(TypeId::of::<O>())
    }

    /// Number of registered parameters.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_key.len()
    }

    /// Return `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/param.rs"]
mod tests;
