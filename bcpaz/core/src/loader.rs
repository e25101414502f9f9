use std::sync::Arc;

use crate::error::{Error, Result};
use crate::process::{ProcessOutput, ProcessRunner, SystemRunner};

/// Entry point for all loads.
///
/// Holds the [`ProcessRunner`] used to invoke `bcp` and `sqlcmd`; the load
/// operations live in the `bcp`, `sqlcmd` and `staged` modules.
#[derive(Clone)]
pub struct BulkLoader {
    runner: Arc<dyn ProcessRunner>,
}

impl BulkLoader {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Run `program`, mapping spawn failures to [`Error::Spawn`]
    pub(crate) async fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        self.runner
            .run(program, args)
            .await
            .map_err(|e| Error::Spawn {
                program: program.to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for BulkLoader {
    fn default() -> Self {
        Self::new(Arc::new(SystemRunner))
    }
}

impl std::fmt::Debug for BulkLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkLoader").finish_non_exhaustive()
    }
}
