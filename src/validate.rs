use serde_json::Value;

use crate::types::{Prompt, Tool};

impl Tool {
    /// Validate arguments against the tool's input schema metadata.
    pub fn validate_arguments(&self, args: &Value) -> Result<(), String> {
        let empty = serde_json::Map::new();
        let obj = args.as_object().unwrap_or(&empty);
        let meta = &self.schema_meta;

        for field in &meta.required {
            if !obj.contains_key(field) {
                return Err(format!("missing required field \"{}\"", field));
            }
        }

        // oneOf: at least one set of required fields must be satisfied.
        if !meta.one_of.is_empty() {
            let satisfied = meta
                .one_of
                .iter()
                .any(|set| set.required.iter().all(|f| obj.contains_key(f)));
            if !satisfied {
                return Err("arguments must satisfy oneOf requirements".into());
            }
        }

        for (field, deps) in &meta.dependencies {
            if !obj.contains_key(field) {
                continue;
            }
            if let Some(dep) = deps.iter().find(|d| !obj.contains_key(*d)) {
                return Err(format!(
                    "field \"{}\" requires \"{}\" to also be present",
                    field, dep
                ));
            }
        }

        Ok(())
    }
}

impl Prompt {
    /// Check that every required prompt argument is present.
    pub fn validate_arguments(&self, args: &Value) -> Result<(), String> {
        let missing = self
            .arguments
            .iter()
            .filter(|a| a.required)
            .find(|a| args.get(&a.name).map_or(true, Value::is_null));

        match missing {
            Some(arg) => Err(format!("missing required argument \"{}\"", arg.name)),
            None => Ok(()),
        }
    }
}
