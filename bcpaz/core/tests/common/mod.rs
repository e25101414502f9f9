//! Test doubles shared by the integration tests.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bcpaz_core::prelude::*;

pub const PASSWORD: &str = "S3cr3t-P@ss";

/// A recorded invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
}

/// [`ProcessRunner`] replaying canned outputs and recording every call.
///
/// Once the canned outputs run out every call succeeds with empty output.
#[derive(Default)]
pub struct FakeRunner {
    responses: Mutex<VecDeque<(i32, String, String)>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.lock().unwrap().push_back((
            exit_code,
            stdout.to_string(),
            stderr.to_string(),
        ));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
        });

        let (exit_code, stdout, stderr) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((0, String::new(), String::new()));

        Ok(ProcessOutput {
            program: program.to_string(),
            args: args.to_vec(),
            exit_code: Some(exit_code),
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        })
    }
}

/// [`ProcessRunner`] whose programs can never be found
pub struct MissingProgramRunner;

#[async_trait]
impl ProcessRunner for MissingProgramRunner {
    async fn run(&self, _program: &str, _args: &[String]) -> std::io::Result<ProcessOutput> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "No such file or directory",
        ))
    }
}

pub fn table(auth: Auth) -> SqlTable {
    SqlTable::new(
        "pool.sql.azuresynapse.net".to_string(),
        "warehouse".to_string(),
        "stage".to_string(),
        "orders".to_string(),
        auth,
    )
}

pub fn table_with_password() -> SqlTable {
    table(Auth::credentials("loader", PASSWORD))
}

/// Write a small orders CSV with a header line and return its path
pub fn write_orders_csv<P: AsRef<Path>>(dir: P) -> PathBuf {
    let path = dir.as_ref().join("orders.csv");
    fs::write(&path, "id,customer,amount\n1,alice,10.5\n2,bob,3.25\n").unwrap();
    path
}

/// Value of `flag` in an argument list
pub fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}
