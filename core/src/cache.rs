//! Normalized in-memory result cache.
//!
//! Objects carrying an `id` are stored once under `Typename:id` and root
//! results hold `{"__ref": key}` pointers to them, so a mutation result that
//! touches an entity is visible through every cached query that references
//! it. Reads resolve the pointers back into plain JSON.
//!
//! Only query results become roots. Mutation results are merged into the
//! entities they touch, and every write drops entities no root can reach,
//! so the cache is bounded by what the cached queries reference.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::graphql::Operation;

const REF: &str = "__ref";

#[derive(Debug, Default)]
struct CacheState {
    entities: HashMap<String, Map<String, Value>>,
    roots: HashMap<String, Value>,
}

impl CacheState {
    fn collect_garbage(&mut self) {
        let mut live = HashSet::new();
        for root in self.roots.values() {
            mark(root, &self.entities, &mut live);
        }
        self.entities.retain(|key, _| live.contains(key));
    }
}

fn mark(value: &Value, entities: &HashMap<String, Map<String, Value>>, live: &mut HashSet<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| mark(v, entities, live)),
        Value::Object(object) => {
            if let Some(Value::String(key)) = object.get(REF) {
                if live.insert(key.clone()) {
                    if let Some(fields) = entities.get(key) {
                        fields.values().for_each(|v| mark(v, entities, live));
                    }
                }
                return;
            }
            object.values().for_each(|v| mark(v, entities, live));
        }
        _ => {}
    }
}

/// Thread-safe normalized store of query results keyed by operation name
/// and variables.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    state: Mutex<CacheState>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` as the result of `operation`, merging entities.
    pub fn write(&self, operation: &Operation, data: &Value) {
        let mut state = self.lock();
        let root = normalize(data, &mut state.entities);
        state.roots.insert(operation.cache_key(), root);
        state.collect_garbage();
    }

    /// Merge the entities in `data` without recording a root for it.
    /// Entities that no cached query references are discarded.
    pub fn merge(&self, data: &Value) {
        let mut state = self.lock();
        normalize(data, &mut state.entities);
        state.collect_garbage();
    }

    /// The cached result of `operation`, if any.
    pub fn read(&self, operation: &Operation) -> Option<Value> {
        let state = self.lock();
        state
            .roots
            .get(&operation.cache_key())
            .map(|root| denormalize(root, &state.entities))
    }

    pub fn entity(&self, typename: &str, id: &str) -> Option<Value> {
        let state = self.lock();
        state
            .entities
            .get(&entity_key(typename, id))
            .map(|fields| denormalize(&Value::Object(fields.clone()), &state.entities))
    }

    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    pub fn root_count(&self) -> usize {
        self.lock().roots.len()
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.entities.clear();
        state.roots.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Writes replace whole entries, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn entity_key(typename: &str, id: &str) -> String {
    format!("{typename}:{id}")
}

fn identify(object: &Map<String, Value>) -> Option<String> {
    let id = match object.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let typename = object
        .get("__typename")
        .and_then(Value::as_str)
        .unwrap_or("Object");
    Some(entity_key(typename, &id))
}

fn normalize(value: &Value, entities: &mut HashMap<String, Map<String, Value>>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| normalize(v, entities)).collect()),
        Value::Object(object) => {
            let fields: Map<String, Value> = object
                .iter()
                .map(|(k, v)| (k.clone(), normalize(v, entities)))
                .collect();
            match identify(object) {
                Some(key) => {
                    entities.entry(key.clone()).or_default().extend(fields);
                    let mut reference = Map::new();
                    reference.insert(REF.to_string(), Value::String(key));
                    Value::Object(reference)
                }
                None => Value::Object(fields),
            }
        }
        other => other.clone(),
    }
}

fn denormalize(value: &Value, entities: &HashMap<String, Map<String, Value>>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| denormalize(v, entities)).collect()),
        Value::Object(object) => {
            if let Some(Value::String(key)) = object.get(REF) {
                if let Some(fields) = entities.get(key) {
                    return denormalize(&Value::Object(fields.clone()), entities);
                }
                return Value::Null;
            }
            Value::Object(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), denormalize(v, entities)))
                    .collect(),
            )
        }
        other => other.clone(),
    }
}
