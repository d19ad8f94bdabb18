// File: silcrow-nav/src/scope.rs
// Purpose: The live per-navigation scope handed to controllers and binding

use serde::Serialize;
use serde_json::Value;
use silcrow_router::RouteParam;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::lock;

/// A named model contributed by a controller
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub value: Value,
}

/// Runtime state of one page visit
///
/// Created fresh for every transition and shared by all of its controllers,
/// which may bind models concurrently.
#[derive(Debug)]
pub struct Scope {
    page_id: String,
    params: Vec<RouteParam>,
    param_map: HashMap<String, String>,
    models: Mutex<Vec<Model>>,
}

impl Scope {
    pub fn new(page_id: impl Into<String>, params: Vec<RouteParam>) -> Self {
        let param_map = params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();

        Self {
            page_id: page_id.into(),
            params,
            param_map,
            models: Mutex::new(Vec::new()),
        }
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Route parameters in pattern declaration order
    pub fn params(&self) -> &[RouteParam] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.param_map.get(name).map(String::as_str)
    }

    pub fn param_map(&self) -> &HashMap<String, String> {
        &self.param_map
    }

    /// Serializes `value` and binds it under `name`, replacing any earlier
    /// model with the same name
    pub fn bind<T: Serialize>(&self, name: impl Into<String>, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.bind_value(name, value);
        Ok(())
    }

    pub fn bind_value(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut models = lock(&self.models);
        match models.iter_mut().find(|m| m.name == name) {
            Some(model) => model.value = value,
            None => models.push(Model { name, value }),
        }
    }

    pub fn model(&self, name: &str) -> Option<Value> {
        lock(&self.models)
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.value.clone())
    }

    /// Snapshot of the bound models in binding order
    pub fn models(&self) -> Vec<Model> {
        lock(&self.models).clone()
    }
}
