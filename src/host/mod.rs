pub mod builtins;
pub mod func;

pub use func::{IntoHostFunc, WasmResults, WasmTy};

use crate::{
    binary::types::{FuncType, ImportRef},
    error::Error,
    Value,
};
use anyhow::{bail, Result};
use log::trace;
use std::{collections::HashMap, fmt, sync::Arc};

pub type HostCallable = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>> + Send + Sync>;

/// A native function with the signature it has on the WASM side.
#[derive(Clone)]
pub struct HostFunction {
    pub name: String,
    pub signature: FuncType,
    callable: HostCallable,
}

impl HostFunction {
    pub fn new(name: impl Into<String>, signature: FuncType, callable: HostCallable) -> Self {
        Self {
            name: name.into(),
            signature,
            callable,
        }
    }

    /// Calls the native function. The argument count is checked against the
    /// signature before the call, the result count after it.
    pub fn call(&self, args: &[Value]) -> Result<Vec<Value>> {
        if args.len() != self.signature.params.len() {
            bail!(Error::ArgumentCount {
                expected: self.signature.params.len(),
                actual: args.len(),
            });
        }
        trace!("call host function: {}", self.name);
        let results = (self.callable)(args)?;
        if results.len() != self.signature.results.len() {
            bail!(
                "host function '{}' returned {} values, but its signature is {}",
                self.name,
                results.len(),
                self.signature
            );
        }
        Ok(results)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// The fixed set of host functions available to one run.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    funcs: Vec<HostFunction>,
    names: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        signature: FuncType,
        callable: HostCallable,
    ) -> Result<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            bail!(Error::DuplicateName(name));
        }
        trace!("register host function: {name} {signature}");
        self.names.insert(name.clone(), self.funcs.len());
        self.funcs.push(HostFunction::new(name, signature, callable));
        Ok(())
    }

    /// Registers a typed Rust function. The declared signature must match the
    /// parameter and result types of `func`.
    pub fn register_func<Params, Results, F>(
        &mut self,
        name: impl Into<String>,
        signature: FuncType,
        func: F,
    ) -> Result<()>
    where
        F: IntoHostFunc<Params, Results>,
    {
        let name = name.into();
        let native = F::func_type();
        if native != signature {
            bail!(Error::SignatureMismatch {
                name,
                declared: signature,
                native,
            });
        }
        self.register(name, signature, func.into_callable())
    }

    /// Finds the host function bound to `import`. Only the field is matched;
    /// every module name sees the same registry.
    pub fn lookup(&self, import: &ImportRef) -> Result<&HostFunction> {
        match self.names.get(&import.field) {
            Some(idx) => Ok(&self.funcs[*idx]),
            None => bail!(Error::UnknownImport {
                module: import.module.clone(),
                field: import.field.clone(),
            }),
        }
    }

    /// Host functions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HostFunction> {
        self.funcs.iter()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}
