//! Prelude module that exports commonly used types and functions.
//!
//! This module provides a convenient way to import all the necessary
//! components with a single `use bcpaz_core::prelude::*;` statement.

pub use crate::{
    error::{Error, Result},
    loader::BulkLoader,
    model::{Auth, FlatFile, SqlTable},
    process::{ProcessOutput, ProcessRunner, SystemRunner},
    redact::{sha512, Redactor},
    sqlcmd::parse_output,
    staged::{BlobStaging, CopyIntoStatement, SAS_VALIDITY_HOURS},
};

pub use bcpaz_storage::{ContainerSas, SasPermissions, StorageAccount};
