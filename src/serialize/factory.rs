use std::collections::BTreeMap;

use crate::animation::param::ParameterRegistry;
use crate::content::{ClipContent, ImageContent, SolidColour};
use crate::effects::{Effect, OpacityEffect, PixelateEffect, TransformEffect};
use crate::foundation::error::{MontageError, MontageResult};

/// Constructor for an empty clip content of one type.
pub type ContentCtor = fn() -> Box<dyn ClipContent>;

/// Constructor for a default effect of one type.
pub type EffectCtor = fn(&ParameterRegistry) -> Box<dyn Effect>;

/// Clip content types by serialization name.
#[derive(Clone, Debug, Default)]
pub struct ClipFactory {
    ctors: BTreeMap<String, ContentCtor>,
}

impl ClipFactory {
    /// Factory knowing the built-in contents.
    pub fn with_builtins() -> Self {
        let mut f = Self::default();
        f.ctors.insert(SolidColour::KIND.to_owned(), new_solid);
        f.ctors.insert(ImageContent::KIND.to_owned(), new_image);
        f
    }

    /// Add a content type. Fails when `kind` is taken.
    pub fn register(&mut self, kind: impl Into<String>, ctor: ContentCtor) -> MontageResult<()> {
        let kind = kind.into();
        if self.ctors.contains_key(&kind) {
            return Err(MontageError::config(format!(
                "clip content type '{kind}' already registered"
            )));
        }
        self.ctors.insert(kind, ctor);
        Ok(())
    }

    /// Fresh content for `kind`.
    pub fn create(&self, kind: &str) -> MontageResult<Box<dyn ClipContent>> {
        self.ctors
            .get(kind)
            .map(|ctor| ctor())
            .ok_or_else(|| MontageError::serde(format!("unknown clip content type '{kind}'")))
    }

    /// Registered names.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }
}

/// Effect types by serialization name.
#[derive(Clone, Debug, Default)]
pub struct EffectFactory {
    ctors: BTreeMap<String, EffectCtor>,
}

impl EffectFactory {
    /// Factory knowing the built-in effects.
    pub fn with_builtins() -> Self {
        let mut f = Self::default();
        f.ctors.insert(TransformEffect::KIND.to_owned(), new_transform);
        f.ctors.insert(PixelateEffect::KIND.to_owned(), new_pixelate);
        f.ctors.insert(OpacityEffect::KIND.to_owned(), new_opacity);
        f
    }

    /// Add an effect type. Fails when `kind` is taken.
    pub fn register(&mut self, kind: impl Into<String>, ctor: EffectCtor) -> MontageResult<()> {
        let kind = kind.into();
        if self.ctors.contains_key(&kind) {
            return Err(MontageError::config(format!(
                "effect type '{kind}' already registered"
            )));
        }
        self.ctors.insert(kind, ctor);
        Ok(())
    }

    /// Default effect for `kind`.
    pub fn create(
        &self,
        kind: &str,
        registry: &ParameterRegistry,
    ) -> MontageResult<Box<dyn Effect>> {
        self.ctors
            .get(kind)
            .map(|ctor| ctor(registry))
            .ok_or_else(|| MontageError::serde(format!("unknown effect type '{kind}'")))
    }

    /// Registered names.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }
}

fn new_solid() -> Box<dyn ClipContent> {
    Box::new(SolidColour::default())
}

fn new_image() -> Box<dyn ClipContent> {
    Box::new(ImageContent::from_path(""))
}

fn new_transform(reg: &ParameterRegistry) -> Box<dyn Effect> {
    Box::new(TransformEffect::new(reg))
}

fn new_pixelate(reg: &ParameterRegistry) -> Box<dyn Effect> {
    Box::new(PixelateEffect::new(reg))
}

fn new_opacity(reg: &ParameterRegistry) -> Box<dyn Effect> {
    Box::new(OpacityEffect::new(reg))
}

#[cfg(test)]
#[path = "../../tests/unit/serialize/factory.rs"]
mod tests;
