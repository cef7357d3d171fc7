use mlua::{Function, Lua, RegistryKey};

use crate::error::EngineError;

/// A layout element's attached script, compiled into the host's registry.
#[derive(Debug)]
pub struct CompiledScript {
    name: String,
    key: RegistryKey,
}

impl CompiledScript {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Embedded Lua runtime used to compile scripts attached to scene-interface
/// elements. Layout construction treats the host as optional: without one,
/// elements simply carry no script.
pub struct ScriptHost {
    lua: Lua,
}

impl ScriptHost {
    pub fn new() -> Self {
        ScriptHost { lua: Lua::new() }
    }

    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript, EngineError> {
        let function: Function = self
            .lua
            .load(source)
            .set_name(name)
            .into_function()
            .map_err(|err| EngineError::ScriptCompilation {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        let key = self
            .lua
            .create_registry_value(function)
            .map_err(|err| EngineError::ScriptCompilation {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        Ok(CompiledScript {
            name: name.to_string(),
            key,
        })
    }

    pub fn run(&self, script: &CompiledScript) -> Result<(), EngineError> {
        let function: Function =
            self.lua
                .registry_value(&script.key)
                .map_err(|err| EngineError::ScriptRuntime {
                    name: script.name.clone(),
                    message: err.to_string(),
                })?;
        function
            .call::<_, ()>(())
            .map_err(|err| EngineError::ScriptRuntime {
                name: script.name.clone(),
                message: err.to_string(),
            })
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}
