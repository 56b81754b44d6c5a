use super::{engine::Vm, value::Value};
use crate::{
    binary::{
        module::Module,
        types::{ExportDesc, ValueType},
    },
    error::Error,
};
use anyhow::{bail, Result};
use log::{error, trace, warn};
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum Status {
    /// Rejected by the arity policy or for an unsupported signature, never
    /// invoked.
    Skipped(Error),
    /// The returned value and its kind, if the function has a result.
    Succeeded(Option<(Value, ValueType)>),
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub status: Status,
}

impl Outcome {
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, Status::Succeeded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, Status::Skipped(_))
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        match &self.status {
            Status::Skipped(reason) => write!(f, "{name}() skipped: {reason}"),
            Status::Succeeded(None) => write!(f, "{name}() =>"),
            Status::Succeeded(Some((value, ty))) => write!(f, "{name}() {ty} => {value} ({ty})"),
            Status::Failed(cause) => write!(f, "{name}() => error: {cause}"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}

#[derive(Debug)]
pub struct Report {
    pub module: String,
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in &self.outcomes {
            match outcome.status {
                Status::Skipped(_) => summary.skipped += 1,
                Status::Succeeded(_) => summary.succeeded += 1,
                Status::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        Ok(())
    }
}

/// Invokes every zero-argument function export of `module`, in the order of
/// the export section. Only a missing export section fails the whole run.
pub fn run_exports(module: &Module, vm: &mut dyn Vm) -> Result<Report> {
    let Some(ref exports) = module.export_section else {
        bail!(Error::NoExports);
    };

    let mut outcomes = vec![];
    for export in exports {
        let idx = match export.desc {
            ExportDesc::Func(idx) => idx,
            ExportDesc::Table(_) | ExportDesc::Memory(_) | ExportDesc::Global(_) => continue,
        };
        trace!("discovered export: {}", export.name);

        let status = run_export(module, vm, &export.name, idx);
        outcomes.push(Outcome {
            name: export.name.clone(),
            status,
        });
    }

    Ok(Report {
        module: module.name.clone(),
        outcomes,
    })
}

fn run_export(module: &Module, vm: &mut dyn Vm, name: &str, idx: u32) -> Status {
    let func_type = match module.func_type(idx) {
        Ok(func_type) => func_type,
        Err(e) => {
            if let Some(Error::UnsupportedFuncType(type_idx)) = e.downcast_ref::<Error>() {
                let reason = Error::UnsupportedFuncType(*type_idx);
                warn!("{}: {name}: {reason}", module.name);
                return Status::Skipped(reason);
            }
            error!("{}: {name}: {e:#}", module.name);
            return Status::Failed(e);
        }
    };

    if func_type.results.len() > 1 {
        let reason = Error::UnsupportedReturnArity(func_type.results.len());
        warn!("{}: {name}: {reason}", module.name);
        return Status::Skipped(reason);
    }
    if !func_type.params.is_empty() {
        let reason = Error::UnsupportedParameterArity(func_type.params.len());
        warn!("{}: {name}: {reason}", module.name);
        return Status::Skipped(reason);
    }

    trace!("invoke export: {name} {func_type}");
    let values = match vm.invoke(idx, &[]) {
        Ok(values) => values,
        Err(e) => {
            error!("{}: {name}: {e:#}", module.name);
            return Status::Failed(e);
        }
    };

    match (func_type.results.first(), values.as_slice()) {
        (None, []) => Status::Succeeded(None),
        (Some(ty), [value]) if value.value_type() == *ty => {
            Status::Succeeded(Some((*value, value.value_type())))
        }
        (Some(ty), [value]) => {
            let e = anyhow::anyhow!(
                "expected {ty} result, but the engine returned {value} ({})",
                value.value_type()
            );
            error!("{}: {name}: {e}", module.name);
            Status::Failed(e)
        }
        (_, values) => {
            let e = anyhow::anyhow!(
                "expected {} results, but the engine returned {}",
                func_type.results.len(),
                values.len()
            );
            error!("{}: {name}: {e}", module.name);
            Status::Failed(e)
        }
    }
}
