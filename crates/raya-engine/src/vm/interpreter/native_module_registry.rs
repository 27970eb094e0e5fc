// Native module registry for tracking loaded native modules
//
// The NativeModuleRegistry maintains a mapping of loaded native modules by name,
// enabling efficient module lookups and preventing duplicate loading.

use std::collections::HashMap;
use std::sync::Arc;

// Re-export SDK types for convenience
pub use crate::vm::ffi::{NativeFn, NativeModule};

/// Registry for tracking loaded native modules
#[derive(Debug)]
pub struct NativeModuleRegistry {
    /// Native modules indexed by name
    by_name: HashMap<String, Arc<NativeModule>>,
}

impl NativeModuleRegistry {
    /// Create a new empty native module registry
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Register a native module in the registry
    ///
    /// If a module with the same name is already loaded, this returns an error.
    ///
    /// # Arguments
    /// * `module` - The native module to register
    ///
    /// # Returns
    /// * `Ok(())` - Module registered successfully
    /// * `Err(String)` - Registration failed (e.g., duplicate name)
    pub fn register(&mut self, module: Arc<NativeModule>) -> Result<(), String> {
        let name = module.name().to_string();

        // Check for duplicate
        if self.by_name.contains_key(&name) {
            return Err(format!("Native module '{}' is already registered", name));
        }

        // Register by name
        self.by_name.insert(name, module);

        Ok(())
    }

    /// Register a native module by name and Arc
    ///
    /// Convenience method for registering with explicit name.
    ///
    /// # Arguments
    /// * `name` - The module name (e.g., "std:json")
    /// * `module` - The native module
    ///
    /// # Returns
    /// * `Ok(())` - Module registered successfully
    /// * `Err(String)` - Registration failed
    pub fn register_as(&mut self, name: impl Into<String>, module: Arc<NativeModule>) -> Result<(), String> {
        let name_str = name.into();

        if self.by_name.contains_key(&name_str) {
            return Err(format!("Native module '{}' is already registered", name_str));
        }

        self.by_name.insert(name_str, module);
        Ok(())
    }

    /// Get a native module by name
    ///
    /// # Arguments
    /// * `name` - The module name to look up
    ///
    /// # Returns
    /// * `Some(&Arc<NativeModule>)` - Module found
    /// * `None` - Module not found
    pub fn get(&self, name: &str) -> Option<&Arc<NativeModule>> {
        self.by_name.get(name)
    }

    /// Check if a native module is loaded
    ///
    /// # Arguments
    /// * `name` - The module name
    ///
    /// # Returns
    /// * `true` - Module is loaded
    /// * `false` - Module is not loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Get all loaded native modules
    ///
    /// # Returns
    /// A vector of all loaded native modules
    pub fn all_modules(&self) -> Vec<Arc<NativeModule>> {
        self.by_name.values().cloned().collect()
    }

    /// Get all module names
    ///
    /// # Returns
    /// A vector of all registered module names
    pub fn module_names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    /// Get the number of loaded native modules
    pub fn module_count(&self) -> usize {
        self.by_name.len()
    }

    /// Remove a native module from the registry
    ///
    /// # Arguments
    /// * `name` - The module name to remove
    ///
    /// # Returns
    /// * `Some(Arc<NativeModule>)` - The removed module
    /// * `None` - Module not found
    pub fn remove(&mut self, name: &str) -> Option<Arc<NativeModule>> {
        self.by_name.remove(name)
    }

    /// Clear all native modules from the registry
    pub fn clear(&mut self) {
        self.by_name.clear();
    }
}

impl Default for NativeModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
