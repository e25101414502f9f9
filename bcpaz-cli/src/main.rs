use std::num::NonZeroUsize;
use std::str::FromStr;

use anyhow::Context;
use bcpaz_core::prelude::*;
use clap::{Parser, Subcommand};
use datafusion::arrow::util::pretty::pretty_format_batches;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{ConnectionArgs, FileArgs, StagingArgs, TargetArgs};

/// Bulk load flat files into SQL Server and Azure Synapse
#[derive(Debug, Parser)]
#[command(name = "bcpaz", version, about, long_about = None)]
struct Cli {
    /// Logging level (info, debug, trace)
    #[arg(long, env = "BCPAZ_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a flat file with bcp
    Bcp {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        file: FileArgs,

        /// Rows sent per batch
        #[arg(short, long, default_value = "10000")]
        batch_size: NonZeroUsize,
    },

    /// Stage a flat file in blob storage and load it with COPY INTO
    CopyInto {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        file: FileArgs,

        #[command(flatten)]
        staging: StagingArgs,
    },

    /// Run a command with sqlcmd and print its result
    Query {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// T-SQL to execute
        #[arg(short = 'Q', long)]
        command: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = Level::from_str(cli.log_level.to_lowercase().as_str()).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    let loader = BulkLoader::default();

    match cli.command {
        Commands::Bcp {
            target,
            file,
            batch_size,
        } => {
            let table = target.try_into_table()?;
            loader
                .bcp(&table, &file.to_flat_file(), batch_size)
                .await
                .context("bcp load failed")?;
            info!(table = %table.qualified_name(), "Load finished");
        }
        Commands::CopyInto {
            target,
            file,
            staging,
        } => {
            staging.validate()?;
            let table = target.try_into_table()?;
            let blob_staging =
                BlobStaging::from_connection_string(&staging.connection_string, &staging.container)
                    .context("failed to configure blob staging")?;
            loader
                .copy_into(&table, &file.to_flat_file(), &blob_staging)
                .await
                .context("COPY INTO load failed")?;
            info!(table = %table.qualified_name(), "Load finished");
        }
        Commands::Query {
            connection,
            command,
        } => {
            let auth = connection.try_into_auth()?;
            let result = loader
                .sqlcmd(&connection.server, &connection.database, &command, &auth)
                .await
                .context("sqlcmd failed")?;

            match result {
                Some(batch) => println!("{}", pretty_format_batches(&[batch])?),
                None => println!("(no rows)"),
            }
        }
    }

    Ok(())
}
