use std::path::PathBuf;

use bcpaz_core::prelude::{Auth, FlatFile, SqlTable};
use clap::Args;
use thiserror::Error;

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("A username was given without a password")]
    MissingPassword,

    #[error("A password was given without a username")]
    MissingUsername,

    #[error("Container name cannot be empty")]
    EmptyContainer,
}

/// Server connection shared by every subcommand
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// SQL Server or Synapse address
    #[arg(short = 'S', long, env = "BCPAZ_SERVER")]
    pub server: String,

    /// Database name
    #[arg(short, long, env = "BCPAZ_DATABASE")]
    pub database: String,

    /// SQL login, integrated (Kerberos) authentication is used when omitted
    #[arg(short = 'U', long, env = "BCPAZ_USERNAME")]
    pub username: Option<String>,

    /// Password of the SQL login
    #[arg(short = 'P', long, env = "BCPAZ_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn try_into_auth(&self) -> Result<Auth, ConfigError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Auth::credentials(username, password)),
            (None, None) => Ok(Auth::Integrated),
            (Some(_), None) => Err(ConfigError::MissingPassword),
            (None, Some(_)) => Err(ConfigError::MissingUsername),
        }
    }
}

/// Destination table of a load
#[derive(Debug, Args)]
pub struct TargetArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Schema of the destination table
    #[arg(long, env = "BCPAZ_SCHEMA", default_value = "dbo")]
    pub schema: String,

    /// Destination table
    #[arg(short, long)]
    pub table: String,
}

impl TargetArgs {
    pub fn try_into_table(&self) -> Result<SqlTable, ConfigError> {
        Ok(SqlTable::new(
            self.connection.server.clone(),
            self.connection.database.clone(),
            self.schema.clone(),
            self.table.clone(),
            self.connection.try_into_auth()?,
        ))
    }
}

/// Source flat file of a load
#[derive(Debug, Args)]
pub struct FileArgs {
    /// Delimited file to load
    #[arg(short, long)]
    pub file: PathBuf,

    /// bcp format file, generated from the first line when omitted
    #[arg(long)]
    pub format_file: Option<PathBuf>,

    /// The first line of the file holds column names
    #[arg(long)]
    pub header: bool,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    pub delimiter: char,
}

impl FileArgs {
    pub fn to_flat_file(&self) -> FlatFile {
        let file = FlatFile::new(self.file.clone(), self.header).with_delimiter(self.delimiter);
        match &self.format_file {
            Some(format_file) => file.with_format_file(format_file.clone()),
            None => file,
        }
    }
}

/// Blob staging for `copy-into`
#[derive(Debug, Args)]
pub struct StagingArgs {
    /// Storage account connection string (`AccountName=...;AccountKey=...`)
    #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
    pub connection_string: String,

    /// Container used to stage the file
    #[arg(long, env = "BCPAZ_CONTAINER")]
    pub container: String,
}

impl StagingArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container.trim().is_empty() {
            return Err(ConfigError::EmptyContainer);
        }
        Ok(())
    }
}
