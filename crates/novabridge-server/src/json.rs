//! Request field access.
//!
//! Bodies are parsed into a generic JSON object and fields are read on
//! demand. Absent or `null` fields fall back to the caller's default; a
//! field present with the wrong type is a 400 naming the field. Query
//! parameters can be merged in for routes that accept both verbs, and
//! arrive as strings, so numeric and boolean accessors also accept a
//! string that parses.

use std::collections::BTreeMap;

use axum::extract::{FromRequest, Request};
use bytes::Bytes;
use novabridge_types::{LinearColor, PartialRotator, PartialVec3};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A parsed request body, optionally merged with query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    map: Map<String, Value>,
}

fn type_error(key: &str, expected: &str) -> ApiError {
    ApiError::bad_request(format!("Field '{key}' must be {expected}"))
}

impl Fields {
    /// Parse a request body. An empty body is an empty object.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the body is not a JSON object.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self { map }),
            _ => Err(ApiError::bad_request("Invalid JSON body")),
        }
    }

    /// Wrap an already-parsed object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Add query parameters for keys the body does not set.
    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        for (key, value) in query {
            self.map.entry(key).or_insert(Value::String(value));
        }
        self
    }

    /// Raw value of a field. `null` reads as absent.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Field names, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Whether the field is present and not `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    // -----------------------------------------------------------------------
    // Strings
    // -----------------------------------------------------------------------

    /// A string field.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a string.
    pub fn str(&self, key: &str) -> Result<Option<&str>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(type_error(key, "a string")),
        }
    }

    /// A non-empty string field, or a 400 with `missing` as its message.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when absent, empty, or not a string.
    pub fn require_str(&self, key: &str, missing: &str) -> Result<&str, ApiError> {
        self.str(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::bad_request(missing))
    }

    /// A non-empty string field; a miss reads `Missing '<key>' parameter`.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when absent, empty, or not a string.
    pub fn required(&self, key: &str) -> Result<&str, ApiError> {
        self.require_str(key, &format!("Missing '{key}' parameter"))
    }

    /// A string field with a default for absent or empty values.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a string.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, ApiError> {
        Ok(self.str(key)?.filter(|s| !s.is_empty()).unwrap_or(default))
    }

    /// Any scalar rendered as text: strings as-is, numbers and booleans
    /// in their JSON spelling.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for arrays and objects.
    pub fn text(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
            Some(_) => Err(type_error(key, "a string, number, or boolean")),
        }
    }

    // -----------------------------------------------------------------------
    // Numbers and booleans
    // -----------------------------------------------------------------------

    /// A numeric field.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a number.
    pub fn f64(&self, key: &str) -> Result<Option<f64>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| type_error(key, "a number")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| type_error(key, "a number")),
            Some(_) => Err(type_error(key, "a number")),
        }
    }

    /// A numeric field with a default.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a number.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ApiError> {
        Ok(self.f64(key)?.unwrap_or(default))
    }

    /// An integer field. Whole-valued floats such as `30.0` are accepted.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not an integer.
    #[allow(clippy::cast_possible_truncation)]
    pub fn i64(&self, key: &str) -> Result<Option<i64>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Some(i));
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Some(f as i64)),
                    _ => Err(type_error(key, "an integer")),
                }
            }
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| type_error(key, "an integer")),
            Some(_) => Err(type_error(key, "an integer")),
        }
    }

    /// A boolean field.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a boolean.
    pub fn bool(&self, key: &str) -> Result<Option<bool>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(type_error(key, "a boolean")),
            },
            Some(_) => Err(type_error(key, "a boolean")),
        }
    }

    /// A boolean field with a default.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not a boolean.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ApiError> {
        Ok(self.bool(key)?.unwrap_or(default))
    }

    // -----------------------------------------------------------------------
    // Structured fields
    // -----------------------------------------------------------------------

    /// A nested object.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not an object.
    pub fn object(&self, key: &str) -> Result<Option<Self>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Self { map: map.clone() })),
            Some(_) => Err(type_error(key, "an object")),
        }
    }

    /// A nested array.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] when the field is not an array.
    pub fn array(&self, key: &str) -> Result<Option<&[Value]>, ApiError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.as_slice())),
            Some(_) => Err(type_error(key, "an array")),
        }
    }

    /// `{x, y, z}` under `key`; absent axes stay `None`.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for a non-object or a non-numeric axis.
    pub fn partial_vec3(&self, key: &str) -> Result<PartialVec3, ApiError> {
        let Some(obj) = self.object(key)? else {
            return Ok(PartialVec3::default());
        };
        obj.axes(["x", "y", "z"])
    }

    /// Top-level `x`, `y`, `z` fields as a partial vector.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for a non-numeric axis.
    pub fn axes(&self, [x, y, z]: [&str; 3]) -> Result<PartialVec3, ApiError> {
        Ok(PartialVec3 {
            x: self.f64(x)?,
            y: self.f64(y)?,
            z: self.f64(z)?,
        })
    }

    /// `{pitch, yaw, roll}` under `key`; absent axes stay `None`.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for a non-object or a non-numeric axis.
    pub fn partial_rotator(&self, key: &str) -> Result<PartialRotator, ApiError> {
        let Some(obj) = self.object(key)? else {
            return Ok(PartialRotator::default());
        };
        Ok(PartialRotator {
            pitch: obj.f64("pitch")?,
            yaw: obj.f64("yaw")?,
            roll: obj.f64("roll")?,
        })
    }

    /// `{r, g, b, a?}` under `key`; alpha defaults to 1.
    ///
    /// # Errors
    ///
    /// [`ApiError::BadRequest`] for a non-object or a non-numeric channel.
    pub fn color(&self, key: &str) -> Result<Option<LinearColor>, ApiError> {
        let Some(obj) = self.object(key)? else {
            return Ok(None);
        };
        Ok(Some(LinearColor::new(
            obj.f64_or("r", 0.0)?,
            obj.f64_or("g", 0.0)?,
            obj.f64_or("b", 0.0)?,
            obj.f64_or("a", 1.0)?,
        )))
    }
}

impl<S: Send + Sync> FromRequest<S> for Fields {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
        Self::parse(&body)
    }
}
