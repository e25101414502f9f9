//! # bcpaz
//!
//! Loads delimited flat files into SQL Server and Azure Synapse tables by
//! driving the Microsoft command line clients.
//!
//! Three operations are exposed on [`BulkLoader`]:
//!
//! - [`BulkLoader::bcp`]: direct bulk copy with the `bcp` utility
//! - [`BulkLoader::copy_into`]: upload the file to Azure Blob Storage, hand the
//!   server a short lived container SAS and run `COPY INTO`, then delete the
//!   staged blob
//! - [`BulkLoader::sqlcmd`]: run a command with `sqlcmd` and read its output
//!   back as an Arrow [`RecordBatch`](datafusion::arrow::array::RecordBatch)
//!
//! Processes are spawned through the [`ProcessRunner`] trait so they can be
//! replaced in tests. Passwords never appear in returned errors, they are
//! replaced by their SHA-512 digest (see [`Redactor`]).
//!
//! ```rust,ignore
//! use std::num::NonZeroUsize;
//! use bcpaz_core::prelude::*;
//!
//! let table = SqlTable::new(
//!     "myserver.database.windows.net".into(),
//!     "warehouse".into(),
//!     "dbo".into(),
//!     "orders".into(),
//!     Auth::credentials("loader", "secret"),
//! );
//! let file = FlatFile::new("/data/orders.csv".into(), true);
//!
//! let loader = BulkLoader::default();
//! loader.bcp(&table, &file, NonZeroUsize::new(10_000).unwrap()).await?;
//!
//! let staging = BlobStaging::from_connection_string(&conn_str, "staging")?;
//! loader.copy_into(&table, &file, &staging).await?;
//! ```

pub mod bcp;
pub mod error;
pub mod format_file;
pub mod loader;
pub mod model;
pub mod process;
pub mod redact;
pub mod sqlcmd;
pub mod staged;

pub use error::{Error, Result};
pub use loader::BulkLoader;
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
pub use redact::{sha512, Redactor};

/// Prelude module with commonly used types and functions
pub mod prelude;
