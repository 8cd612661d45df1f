//! Typed property bags with text import and export.
//!
//! Export follows the editor's text format (`True`, `100.000000`,
//! `(X=1.000000,Y=2.000000,Z=3.000000)`) so values read back from
//! `/scene/get` can be written unchanged through `/scene/set-property`.

use novabridge_types::{LinearColor, Vec3};

use crate::scene::PropertyEntry;

/// A reflected field value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector(Vec3),
    Color(LinearColor),
}

impl PropValue {
    pub(crate) fn export(&self) -> String {
        match self {
            Self::Bool(b) => if *b { "True" } else { "False" }.to_owned(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:.6}"),
            Self::Text(s) => s.clone(),
            Self::Vector(v) => format!("(X={:.6},Y={:.6},Z={:.6})", v.x, v.y, v.z),
            Self::Color(c) => format!("(R={:.6},G={:.6},B={:.6},A={:.6})", c.r, c.g, c.b, c.a),
        }
    }

    /// Parse `text` into a value of the same type as `self`.
    pub(crate) fn import(&self, text: &str) -> Option<Self> {
        let text = text.trim();
        match self {
            Self::Bool(_) => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(Self::Bool(true)),
                "false" | "0" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            Self::Int(_) => text.parse().ok().map(Self::Int),
            Self::Float(_) => text
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Float),
            Self::Text(_) => Some(Self::Text(text.to_owned())),
            Self::Vector(_) => {
                let fields = parse_struct(text, &["X", "Y", "Z"])?;
                let [x, y, z] = fields.as_slice() else {
                    return None;
                };
                Some(Self::Vector(Vec3::new(*x, *y, *z)))
            }
            Self::Color(_) => {
                let fields = parse_struct(text, &["R", "G", "B", "A"])?;
                let [r, g, b, a] = fields.as_slice() else {
                    return None;
                };
                Some(Self::Color(LinearColor::new(*r, *g, *b, *a)))
            }
        }
    }
}

/// Parse `(K=v,K=v,...)`. Every key must be present exactly once.
fn parse_struct(text: &str, keys: &[&str]) -> Option<Vec<f64>> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let mut out = vec![None; keys.len()];
    for part in inner.split(',') {
        let (key, value) = part.split_once('=')?;
        let position = keys
            .iter()
            .position(|k| k.eq_ignore_ascii_case(key.trim()))?;
        let parsed: f64 = value.trim().parse().ok()?;
        *out.get_mut(position)? = Some(parsed);
    }
    out.into_iter().collect()
}

/// Ordered named fields of one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PropertyBag {
    fields: Vec<(String, PropValue)>,
}

impl PropertyBag {
    pub(crate) fn with(mut self, name: &str, value: PropValue) -> Self {
        self.fields.push((name.to_owned(), value));
        self
    }

    pub(crate) fn entries(&self) -> Vec<PropertyEntry> {
        self.fields
            .iter()
            .map(|(name, value)| PropertyEntry {
                name: name.clone(),
                value: value.export(),
            })
            .collect()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&PropValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn set_value(&mut self, name: &str, value: PropValue) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }

    /// Import text into an existing field.
    pub(crate) fn import(&mut self, name: &str, text: &str) -> Result<(), ImportFailure> {
        let (_, slot) = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or(ImportFailure::Missing)?;
        *slot = slot.import(text).ok_or(ImportFailure::Unparseable)?;
        Ok(())
    }

    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Why a text import was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportFailure {
    Missing,
    Unparseable,
}
