use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::encoding::scalar_to_string;
use crate::request::{Meta, RenderRequest};
use crate::scheme::{MetaKeys, Scheme};

/// Query key of the cache-bust stamp
pub const STAMP_KEY: &str = "__v";

/// `""`, `false` and `null` count as "not provided".
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Meta hints renamed through `keys`, absent ones left out.
pub fn meta_defaults(meta: &Meta, keys: &MetaKeys) -> Map<String, Value> {
    let fields = [
        (keys.id, &meta.id),
        (keys.width, &meta.width),
        (keys.height, &meta.height),
        (keys.resolution, &meta.resolution),
        (keys.agent, &meta.agent),
    ];

    fields
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .filter(|v| !is_absent(v))
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect()
}

/// `meta.v` when provided as a scalar, the clock's Unix seconds otherwise.
pub fn cache_stamp(meta: &Meta, clock: &dyn Clock) -> Value {
    match &meta.v {
        Some(v) if !is_absent(v) && scalar_to_string(v).is_some() => v.clone(),
        _ => Value::from(clock.now()),
    }
}

/// Request fields resolved for one scheme
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub defaults: Map<String, Value>,
    pub stamp: Value,
    pub variables: Map<String, Value>,
    /// Strip falsy values from the merged params
    pub drop_absent: bool,
}

impl Normalized {
    pub fn new(request: &RenderRequest, scheme: Scheme, clock: &dyn Clock) -> Self {
        let defaults = scheme
            .meta_keys()
            .map(|keys| meta_defaults(&request.meta, keys))
            .unwrap_or_default();

        Self {
            defaults,
            stamp: cache_stamp(&request.meta, clock),
            variables: request.variables.clone(),
            drop_absent: scheme.filters_variables(),
        }
    }

    /// Meta defaults, then the stamp, then variables. Later keys win in place.
    pub fn params(&self, with_stamp: bool) -> Map<String, Value> {
        let mut params = self.defaults.clone();
        if with_stamp {
            params.insert(STAMP_KEY.to_string(), self.stamp.clone());
        }
        for (key, value) in &self.variables {
            params.insert(key.clone(), value.clone());
        }
        if self.drop_absent {
            params.retain(|_, v| !is_absent(v));
        }
        params
    }

    pub fn stamp_text(&self) -> String {
        scalar_to_string(&self.stamp).unwrap_or_default()
    }
}
