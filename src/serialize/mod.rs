//! `write`/`read` of the model into `serde_json` maps.
//!
//! Every object writes its primitive fields plus a `"type"` string where the concrete type is
//! open-ended (clip contents, effects). Reading resolves those strings through a
//! [`ClipFactory`] / [`EffectFactory`]. Parameters are identified by `domain::name`; their
//! registry indices never reach the output.

pub mod factory;

use std::path::Path;

use serde_json::{Map, Value, json};

use crate::animation::data::{AutomationData, Automatable};
use crate::animation::param::ParameterRegistry;
use crate::effects::EffectChain;
use crate::foundation::core::{Fps, FrameSpan, Rgba8Premul};
use crate::foundation::error::{MontageError, MontageResult};
use crate::timeline::{Clip, Timeline, Track};

pub use factory::{ClipFactory, ContentCtor, EffectCtor, EffectFactory};

type Object = Map<String, Value>;

/// Reads and writes timelines against one parameter registry and one set of factories.
#[derive(Debug)]
pub struct Serializer<'r> {
    registry: &'r ParameterRegistry,
    clips: ClipFactory,
    effects: EffectFactory,
}

impl<'r> Serializer<'r> {
    /// Serializer knowing the built-in contents and effects.
    pub fn new(registry: &'r ParameterRegistry) -> Self {
        Self {
            registry,
            clips: ClipFactory::with_builtins(),
            effects: EffectFactory::with_builtins(),
        }
    }

    /// Content factory, for registering custom types.
    pub fn clips_mut(&mut self) -> &mut ClipFactory {
        &mut self.clips
    }

    /// Effect factory, for registering custom types.
    pub fn effects_mut(&mut self) -> &mut EffectFactory {
        &mut self.effects
    }

    /// Pretty JSON for `timeline`.
    pub fn to_json_string(&self, timeline: &Timeline) -> MontageResult<String> {
        serde_json::to_string_pretty(&Value::Object(self.write_timeline(timeline)))
            .map_err(|e| MontageError::serde(e.to_string()))
    }

    /// Parse a timeline from JSON text.
    pub fn from_json_str(&self, s: &str) -> MontageResult<Timeline> {
        let v: Value = serde_json::from_str(s).map_err(|e| MontageError::serde(e.to_string()))?;
        let obj = v
            .as_object()
            .ok_or_else(|| MontageError::serde("timeline document must be an object"))?;
        self.read_timeline(obj)
    }

    /// Load a timeline from a JSON file.
    pub fn from_path(&self, path: &Path) -> MontageResult<Timeline> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            MontageError::Other(anyhow::Error::new(e).context(format!("read '{}'", path.display())))
        })?;
        self.from_json_str(&s)
    }

    /// Write `timeline` into a fresh map.
    pub fn write_timeline(&self, timeline: &Timeline) -> Object {
        let tracks: Vec<Value> = timeline
            .tracks()
            .iter()
            .map(|t| Value::Object(self.write_track(t)))
            .collect();
        let mut out = Object::new();
        out.insert("total_frames".into(), json!(timeline.total_frames()));
        out.insert("playhead".into(), json!(timeline.playhead()));
        out.insert("zoom".into(), json!(timeline.zoom()));
        out.insert("fps".into(), json!(timeline.fps()));
        out.insert("tracks".into(), Value::Array(tracks));
        out
    }

    /// Rebuild a timeline written by [`Self::write_timeline`].
    pub fn read_timeline(&self, from: &Object) -> MontageResult<Timeline> {
        let total = get_i64(from, "total_frames")?;
        let fps: Fps = match from.get("fps") {
            Some(v) => decode(v, "fps")?,
            None => Fps::default(),
        };
        let mut tl = Timeline::with_length(total, fps)?;
        for t in get_array(from, "tracks")? {
            let track = self.read_track(as_object(t, "track")?)?;
            tl.add_track(track);
        }
        if let Some(z) = from.get("zoom").and_then(Value::as_f64) {
            tl.set_zoom(z);
        }
        if let Some(p) = from.get("playhead").and_then(Value::as_i64) {
            tl.set_playhead(p)?;
        }
        Ok(tl)
    }

    /// Write one track.
    pub fn write_track(&self, track: &Track) -> Object {
        let clips: Vec<Value> = track
            .clips()
            .iter()
            .map(|c| Value::Object(self.write_clip(c)))
            .collect();
        let mut out = Object::new();
        out.insert("name".into(), json!(track.display_name()));
        out.insert("height".into(), json!(track.height()));
        out.insert("colour".into(), json!(track.colour()));
        out.insert("automation".into(), Value::Object(write_automation(track)));
        out.insert("effects".into(), self.write_effects(track.effects()));
        out.insert("clips".into(), Value::Array(clips));
        out
    }

    /// Rebuild one track.
    pub fn read_track(&self, from: &Object) -> MontageResult<Track> {
        let mut track = Track::new(self.registry);
        if let Some(name) = from.get("name").and_then(Value::as_str) {
            track.set_display_name(name);
        }
        if let Some(h) = from.get("height").and_then(Value::as_f64) {
            track.set_height(h);
        }
        if let Some(c) = from.get("colour") {
            track.set_colour(decode::<Rgba8Premul>(c, "track colour")?);
        }
        read_automation(&mut track, from)?;
        self.read_effects(track.effects_mut(), from)?;
        for c in get_array(from, "clips")? {
            let clip = self.read_clip(as_object(c, "clip")?)?;
            track.add_clip(clip);
        }
        Ok(track)
    }

    /// Write one clip.
    pub fn write_clip(&self, clip: &Clip) -> Object {
        let mut content = Object::new();
        clip.content().write(&mut content);
        let mut out = Object::new();
        out.insert("type".into(), json!(clip.content().kind()));
        out.insert("name".into(), json!(clip.display_name()));
        out.insert("span".into(), json!(clip.span()));
        out.insert("automation".into(), Value::Object(write_automation(clip)));
        out.insert("effects".into(), self.write_effects(clip.effects()));
        out.insert("content".into(), Value::Object(content));
        out
    }

    /// Rebuild one clip; its content type is resolved through the clip factory.
    pub fn read_clip(&self, from: &Object) -> MontageResult<Clip> {
        let kind = get_str(from, "type")?;
        let mut content = self.clips.create(kind)?;
        if let Some(c) = from.get("content") {
            content.read(as_object(c, "clip content")?)?;
        }
        let span: FrameSpan = decode(
            from.get("span")
                .ok_or_else(|| MontageError::serde("clip missing 'span'"))?,
            "clip span",
        )?;
        let mut clip = Clip::new(self.registry, span, content);
        if let Some(name) = from.get("name").and_then(Value::as_str) {
            clip.set_display_name(name);
        }
        read_automation(&mut clip, from)?;
        self.read_effects(clip.effects_mut(), from)?;
        Ok(clip)
    }

    fn write_effects(&self, chain: &EffectChain) -> Value {
        Value::Array(
            chain
                .iter()
                .map(|e| {
                    let mut data = Object::new();
                    e.write(&mut data);
                    let mut automation = Object::new();
                    e.automation().write(&mut automation);
                    json!({
                        "type": e.kind(),
                        "automation": automation,
                        "data": data,
                    })
                })
                .collect(),
        )
    }

    fn read_effects(&self, chain: &mut EffectChain, from: &Object) -> MontageResult<()> {
        let Some(list) = from.get("effects") else {
            return Ok(());
        };
        let list = list
            .as_array()
            .ok_or_else(|| MontageError::serde("'effects' must be an array"))?;
        for entry in list {
            let entry = as_object(entry, "effect")?;
            let mut effect = self.effects.create(get_str(entry, "type")?, self.registry)?;
            if let Some(d) = entry.get("data") {
                effect.read(as_object(d, "effect data")?)?;
            }
            read_automation(&mut *effect, entry)?;
            chain.push(effect);
        }
        Ok(())
    }
}

fn write_automation(owner: &dyn Automatable) -> Object {
    let mut out = Object::new();
    owner.automation().write(&mut out);
    out
}

fn read_automation(owner: &mut dyn Automatable, from: &Object) -> MontageResult<()> {
    if let Some(a) = from.get("automation") {
        owner.automation_mut().read(as_object(a, "automation")?)?;
    }
    AutomationData::refresh(owner, 0)
}

fn decode<T: serde::de::DeserializeOwned>(v: &Value, what: &str) -> MontageResult<T> {
    serde_json::from_value(v.clone()).map_err(|e| MontageError::serde(format!("{what}: {e}")))
}

fn as_object<'a>(v: &'a Value, what: &str) -> MontageResult<&'a Object> {
    v.as_object()
        .ok_or_else(|| MontageError::serde(format!("{what} must be an object")))
}

fn get_str<'a>(from: &'a Object, key: &str) -> MontageResult<&'a str> {
    from.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| MontageError::serde(format!("missing string '{key}'")))
}

fn get_i64(from: &Object, key: &str) -> MontageResult<i64> {
    from.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| MontageError::serde(format!("missing integer '{key}'")))
}

fn get_array<'a>(from: &'a Object, key: &str) -> MontageResult<&'a [Value]> {
    match from.get(key) {
        None => Ok(Default::default()),
        Some(v) => v
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| MontageError::serde(format!("'{key}' must be an array"))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/serialize/serializer.rs"]
mod tests;
