// File: silcrow-nav/src/custom_tags.rs
// Purpose: Models for custom tags, referenced from markup by opaque index

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{NavError, NavResult};
use crate::markup::{Element, Fragment};

/// Tag of the element declaring a custom tag in the template
pub const ELEMENT_TAG: &str = "sc-element";
/// Attribute holding the index of an instance's model
pub const MODEL_ID_ATTR: &str = "data-sc-model-id";

/// Builds the model of one custom tag instance from its element
pub type TagFactory = Arc<dyn Fn(&Element) -> anyhow::Result<Value> + Send + Sync>;

/// A model built for one instance of a custom tag
#[derive(Debug, Clone, PartialEq)]
pub struct TagModel {
    pub tag: String,
    pub value: Value,
}

#[derive(Default)]
pub struct CustomTagRegistry {
    factories: HashMap<String, TagFactory>,
    models: Vec<TagModel>,
}

impl CustomTagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for `tag_id`; tag ids are case-insensitive and
    /// a later registration replaces an earlier one
    pub fn register<F>(&mut self, tag_id: &str, factory: F)
    where
        F: Fn(&Element) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        tracing::trace!(tag = %tag_id, "register custom tag");
        self.factories
            .insert(tag_id.to_ascii_uppercase(), Arc::new(factory));
    }

    pub fn is_registered(&self, tag_id: &str) -> bool {
        self.factories.contains_key(&tag_id.to_ascii_uppercase())
    }

    /// Checks every registered tag is declared in `template`, then builds a
    /// model for every instance and stamps its index on the element
    pub fn prepare(&mut self, template: &mut Fragment) -> NavResult<usize> {
        for tag_id in self.factories.keys() {
            let same_id = |element: &Element| {
                element
                    .id()
                    .map(|id| id.eq_ignore_ascii_case(tag_id))
                    .unwrap_or(false)
            };
            match template.find(same_id) {
                Some(def) if def.is(ELEMENT_TAG) => {}
                Some(_) => return Err(NavError::NotACustomTagDefinition(tag_id.clone())),
                None => return Err(NavError::UnknownCustomTag(tag_id.clone())),
            }
        }

        let factories = &self.factories;
        let models = &mut self.models;
        let before = models.len();

        template.try_for_each_element_mut(&mut |element: &mut Element| -> NavResult<()> {
            let key = element.tag().to_ascii_uppercase();
            let Some(factory) = factories.get(&key) else {
                return Ok(());
            };

            let value = (**factory)(&*element).map_err(|source| NavError::CustomTagModel {
                tag: key.clone(),
                source,
            })?;
            element.set_attr(MODEL_ID_ATTR, models.len().to_string());
            models.push(TagModel { tag: key, value });
            Ok(())
        })?;

        let built = self.models.len() - before;
        tracing::debug!(tags = self.factories.len(), models = built, "custom tags prepared");
        Ok(built)
    }

    /// The model of an instance element, via its model id attribute
    pub fn model_for(&self, element: &Element) -> NavResult<&TagModel> {
        element
            .attr(MODEL_ID_ATTR)
            .and_then(|id| id.parse::<usize>().ok())
            .and_then(|index| self.models.get(index))
            .ok_or(NavError::MissingModelId {
                attr: MODEL_ID_ATTR,
            })
    }

    pub fn models(&self) -> &[TagModel] {
        &self.models
    }
}

impl fmt::Debug for CustomTagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTagRegistry")
            .field("tags", &self.factories.keys().collect::<Vec<_>>())
            .field("models", &self.models)
            .finish()
    }
}
