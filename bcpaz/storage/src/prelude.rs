//! Prelude module that exports commonly used types and functions.
//!
//! This module provides a convenient way to import all the necessary
//! components with a single `use bcpaz_storage::prelude::*;` statement.

pub use crate::{azure_store, Error, Result};

pub use crate::account::StorageAccount;
pub use crate::connection::parse_connection_string;
pub use crate::sas::{generate_container_sas, ContainerSas, SasPermissions, SAS_VERSION};
