//! Running commands through `sqlcmd` and reading back their output

use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use datafusion::arrow::array::RecordBatch;
use datafusion::arrow::compute::concat_batches;
use datafusion::arrow::csv::{reader::Format, ReaderBuilder};
use datafusion::arrow::error::ArrowError;
use regex::Regex;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::loader::BulkLoader;
use crate::model::Auth;

pub const SQLCMD_PROGRAM: &str = "sqlcmd";

/// Keeps `(N rows affected)` out of the captured output
const NOCOUNT_PREFIX: &str = "set nocount on;";

fn rows_affected() -> &'static Regex {
    static ROWS_AFFECTED: OnceLock<Regex> = OnceLock::new();
    ROWS_AFFECTED.get_or_init(|| {
        Regex::new(r"^\(\d+ rows? affected\)$").expect("rows affected pattern is valid")
    })
}

/// Arguments for `sqlcmd -S <server> -d <database> ... -Q <command>`.
///
/// Falls back to integrated authentication when either half of the
/// credentials is empty.
pub(crate) fn sqlcmd_args(server: &str, database: &str, command: &str, auth: &Auth) -> Vec<String> {
    let mut args = vec![
        "-S".to_string(),
        server.to_string(),
        "-d".to_string(),
        database.to_string(),
        "-b".to_string(),
    ];

    match auth {
        Auth::Credentials { username, password } if !username.is_empty() && !password.is_empty() => {
            args.extend(["-U".to_string(), username.clone()]);
            args.extend(["-P".to_string(), password.clone()]);
        }
        _ => args.push("-E".to_string()),
    }

    // comma separated, trailing spaces trimmed, quoted identifiers on
    args.extend(["-I", "-s,", "-W", "-Q"].map(String::from));
    args.push(format!("{NOCOUNT_PREFIX}{command}"));

    args
}

/// Parse the captured stdout of `sqlcmd -s, -W`.
///
/// Returns `None` when there is nothing but blank lines and row count
/// messages. A non-blank first line is treated as the header. The line right
/// after it is the dash separator sqlcmd prints and is skipped. Column types
/// are inferred from the values.
pub fn parse_output(stdout: &[u8]) -> Result<Option<RecordBatch>> {
    let text = String::from_utf8_lossy(stdout);
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !rows_affected().is_match(line.trim()))
        .collect();

    let Some(first) = lines.first() else {
        return Ok(None);
    };
    let has_header = !first.trim().is_empty();

    let body: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(idx, line)| *idx != 1 && !line.trim().is_empty())
        .map(|(_, line)| *line)
        .collect();
    if body.is_empty() {
        return Ok(None);
    }
    let csv = body.join("\n");

    let format = Format::default().with_header(has_header);
    let (schema, _) = format.infer_schema(Cursor::new(csv.as_bytes()), None)?;
    let schema = Arc::new(schema);

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(has_header)
        .build(Cursor::new(csv.as_bytes()))?;
    let batches = reader.collect::<std::result::Result<Vec<RecordBatch>, ArrowError>>()?;

    Ok(Some(concat_batches(&schema, &batches)?))
}

impl BulkLoader {
    /// Execute `command` against `database` and return its tabular output.
    ///
    /// Returns `Ok(None)` when the command printed no rows. Errors have the
    /// password replaced by its SHA-512 digest.
    #[instrument(skip(self, command, auth), err)]
    pub async fn sqlcmd(
        &self,
        server: &str,
        database: &str,
        command: &str,
        auth: &Auth,
    ) -> Result<Option<RecordBatch>> {
        self.run_sqlcmd(server, database, command, auth)
            .await
            .map_err(|error| auth.redactor().redact_error(error))
    }

    async fn run_sqlcmd(
        &self,
        server: &str,
        database: &str,
        command: &str,
        auth: &Auth,
    ) -> Result<Option<RecordBatch>> {
        let args = sqlcmd_args(server, database, command, auth);

        let output = self.run(SQLCMD_PROGRAM, &args).await?;
        if !output.success() {
            return Err(Error::Command(output.to_string()));
        }

        let result = parse_output(&output.stdout)?;
        debug!(
            rows = result.as_ref().map(RecordBatch::num_rows),
            "sqlcmd finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::datatypes::DataType;
    use datafusion::assert_batches_eq;
    use rstest::rstest;

    #[test]
    fn test_args_with_credentials() {
        let args = sqlcmd_args(
            "sql.example.com",
            "warehouse",
            "select 1",
            &Auth::credentials("loader", "pwd"),
        );

        assert_eq!(
            args,
            [
                "-S",
                "sql.example.com",
                "-d",
                "warehouse",
                "-b",
                "-U",
                "loader",
                "-P",
                "pwd",
                "-I",
                "-s,",
                "-W",
                "-Q",
                "set nocount on;select 1",
            ]
        );
    }

    #[rstest]
    #[case::integrated(Auth::Integrated)]
    #[case::empty_password(Auth::credentials("loader", ""))]
    #[case::empty_username(Auth::credentials("", "pwd"))]
    fn test_args_fall_back_to_integrated(#[case] auth: Auth) {
        let args = sqlcmd_args("srv", "db", "select 1", &auth);

        assert!(args.contains(&"-E".to_string()));
        assert!(!args.contains(&"-U".to_string()));
        assert!(!args.contains(&"-P".to_string()));
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank_lines("\n\n  \n")]
    #[case::rows_affected_only("\n(3 rows affected)\n")]
    #[case::single_row_affected("(1 row affected)\r\n")]
    fn test_parse_no_output(#[case] stdout: &str) {
        assert!(parse_output(stdout.as_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_parse_header_separator_and_rows() {
        let batch = parse_output(b"colA,colB\n-,-\n1,x\n2,y\n").unwrap().unwrap();

        assert_batches_eq!(
            &[
                "+------+------+",
                "| colA | colB |",
                "+------+------+",
                "| 1    | x    |",
                "| 2    | y    |",
                "+------+------+",
            ],
            &[batch]
        );
    }

    #[test]
    fn test_parse_infers_types() {
        let batch = parse_output(b"id,name,score\r\n--,----,-----\r\n1,alice,1.5\r\n2,bob,2.25\r\n")
            .unwrap()
            .unwrap();

        let schema = batch.schema();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn test_parse_blank_header() {
        let batch = parse_output(b"\n-----------\n42\n").unwrap().unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.schema().field(0).name(), "column_1");
    }

    #[test]
    fn test_parse_header_without_rows() {
        let batch = parse_output(b"colA,colB\n----,----\n").unwrap().unwrap();

        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_parse_drops_trailing_rows_affected() {
        let batch = parse_output(b"n\n-\n7\n\n(1 row affected)\n").unwrap().unwrap();

        assert_eq!(batch.num_rows(), 1);
    }

    #[test]
    fn test_parse_ragged_rows_fail() {
        let result = parse_output(b"a,b\n-,-\n1,2\n3,4,5\n");

        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
