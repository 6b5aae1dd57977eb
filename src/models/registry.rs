// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lookup of model classes by tag.

use super::{FileInfo, ModelClass, NexsysRecord, SalesRecord, TableInfo};
use std::collections::BTreeMap;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Maps lowercase tags to model classes.
///
/// Lookups are case-insensitive and unknown tags resolve to the generic
/// class, so a lookup never fails.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelClass>,
}

impl ModelRegistry {
    /// A registry holding only the built-in tags.
    pub fn new() -> Self {
        let models = [
            ("nexsys", ModelClass::of::<NexsysRecord>()),
            ("sales", ModelClass::of::<SalesRecord>()),
            ("file_info", ModelClass::of::<FileInfo>()),
            ("table_info", ModelClass::of::<TableInfo>()),
            ("generic", ModelClass::generic()),
        ]
        .into_iter()
        .map(|(tag, class)| (tag.to_string(), class))
        .collect();
        Self { models }
    }

    pub fn get(&self, tag: &str) -> ModelClass {
        self.models
            .get(&tag.to_lowercase())
            .copied()
            .unwrap_or_else(ModelClass::generic)
    }

    /// A copy of the process-wide registry as it stands now.
    pub fn from_global() -> Self {
        read().clone()
    }

    /// Registers or replaces the class for `tag`.
    pub fn register(&mut self, tag: &str, class: ModelClass) {
        let tag = tag.to_lowercase();
        debug!("Registering model {} as '{}'", class.name(), tag);
        self.models.insert(tag, class);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.models.contains_key(&tag.to_lowercase())
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn global() -> &'static RwLock<ModelRegistry> {
    static REGISTRY: OnceLock<RwLock<ModelRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(ModelRegistry::new()))
}

// The table holds plain data, so a panicked writer cannot leave it torn.
fn read() -> RwLockReadGuard<'static, ModelRegistry> {
    global().read().unwrap_or_else(|e| e.into_inner())
}

fn write() -> RwLockWriteGuard<'static, ModelRegistry> {
    global().write().unwrap_or_else(|e| e.into_inner())
}

/// Looks up `tag` in the process-wide registry.
pub fn get_model_class(tag: &str) -> ModelClass {
    read().get(tag)
}

/// Registers a model in the process-wide registry.
pub fn register_model(tag: &str, class: ModelClass) {
    write().register(tag, class);
}

/// Tags known to the process-wide registry.
pub fn list_available_models() -> Vec<String> {
    read().tags()
}

/// A copy of the process-wide registry that can be put back later.
#[derive(Debug)]
pub struct RegistrySnapshot {
    saved: ModelRegistry,
}

impl RegistrySnapshot {
    pub fn take() -> Self {
        Self {
            saved: read().clone(),
        }
    }

    pub fn restore(self) {
        *write() = self.saved;
    }
}
