//! Command-line interface.
//!
//! `list`, `describe <name>`, `run <name> --params <json>` and `serve`. The
//! envelope goes to stdout; diagnostics go to stderr so the output stays
//! machine-readable.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::{AppState, create_router};
use crate::config::ServerConfig;
use crate::engine::Dispatcher;
use crate::error::EngineError;
use crate::models::{CalculationResponse, RequestContext};

/// Exit code for success.
pub const EXIT_OK: i32 = 0;

/// Exit code for an unknown calculator or a failed calculation.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for malformed `--params` or invalid parameters.
pub const EXIT_USAGE: i32 = 2;

/// Clinical calculators
#[derive(Debug, Parser)]
#[command(name = "calc")]
#[command(about = "Run clinical calculators from the command line or over HTTP")]
#[command(version)]
pub struct Cli {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the available calculators
    List,

    /// Show a calculator's full spec
    Describe {
        /// Calculator name
        name: String,
    },

    /// Run a calculator
    Run {
        /// Calculator name
        name: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// Caller language copied into the response metadata
        #[arg(long)]
        language: Option<String>,

        /// Caller identifier copied into the response metadata
        #[arg(long)]
        client: Option<String>,
    },

    /// Start the HTTP API
    Serve {
        /// Interface to bind (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// How `run` prints the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON
    Pretty,
    /// Single-line JSON
    Json,
    /// Labelled plain text
    Text,
}

impl Cli {
    /// Executes the command and returns the process exit code.
    pub async fn execute(self, dispatcher: Dispatcher, server: &ServerConfig) -> io::Result<i32> {
        let stdout = io::stdout();
        let stderr = io::stderr();
        let (mut out, mut err) = (stdout.lock(), stderr.lock());

        match self.command {
            Command::List => list(&dispatcher, &mut out, &mut err),
            Command::Describe { name } => describe(&dispatcher, &name, &mut out, &mut err),
            Command::Run {
                name,
                params,
                format,
                language,
                client,
            } => {
                let context = RequestContext { language, client };
                run(&dispatcher, &name, &params, format, &context, &mut out, &mut err)
            }
            Command::Serve { host, port } => {
                drop((out, err));
                let server = ServerConfig {
                    host: host.unwrap_or_else(|| server.host.clone()),
                    port: port.unwrap_or(server.port),
                };
                serve(dispatcher, &server).await?;
                Ok(EXIT_OK)
            }
        }
    }
}

/// Prints the calculator listing as JSON.
pub fn list(dispatcher: &Dispatcher, out: &mut dyn Write, err: &mut dyn Write) -> io::Result<i32> {
    match dispatcher.list() {
        Ok(calculators) => {
            writeln!(out, "{}", to_pretty(&calculators)?)?;
            Ok(EXIT_OK)
        }
        Err(e) => report(e, err),
    }
}

/// Prints one calculator's spec as JSON.
pub fn describe(
    dispatcher: &Dispatcher,
    name: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<i32> {
    match dispatcher.describe(name) {
        Ok(spec) => {
            writeln!(out, "{}", to_pretty(&spec)?)?;
            Ok(EXIT_OK)
        }
        Err(e) => report(e, err),
    }
}

/// Runs a calculator and prints the envelope.
pub fn run(
    dispatcher: &Dispatcher,
    name: &str,
    params: &str,
    format: OutputFormat,
    context: &RequestContext,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<i32> {
    let params: Value = match serde_json::from_str(params) {
        Ok(params) => params,
        Err(e) => {
            writeln!(err, "error: --params is not valid JSON: {}", e)?;
            return Ok(EXIT_USAGE);
        }
    };

    match dispatcher.dispatch_with_context(name, &params, context) {
        Ok(response) => {
            let rendered = match format {
                OutputFormat::Pretty => to_pretty(&response)?,
                OutputFormat::Json => serde_json::to_string(&response).map_err(io::Error::other)?,
                OutputFormat::Text => render_text(&response),
            };
            writeln!(out, "{}", rendered)?;
            Ok(EXIT_OK)
        }
        Err(e) => report(e, err),
    }
}

/// Binds the configured address and serves the HTTP API until shutdown.
pub async fn serve(dispatcher: Dispatcher, server: &ServerConfig) -> io::Result<()> {
    let address = server.address();
    let listener = TcpListener::bind(&address).await?;
    info!(address = %address, "Clinical calculators API listening");
    axum::serve(listener, create_router(AppState::new(dispatcher))).await
}

/// Maps an engine error to its exit code.
pub fn exit_code(error: &EngineError) -> i32 {
    match error {
        EngineError::ValidationError { .. } => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

fn report(error: EngineError, err: &mut dyn Write) -> io::Result<i32> {
    match &error {
        EngineError::ValidationError { violations } => {
            writeln!(err, "error: parameter validation failed")?;
            for violation in violations {
                writeln!(err, "  - {}", violation)?;
            }
        }
        other => writeln!(err, "error: {}", other)?,
    }
    Ok(exit_code(&error))
}

fn to_pretty<T: serde::Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

fn render_text(response: &CalculationResponse) -> String {
    let mut lines = vec![
        format!(
            "Calculator:     {} (v{})",
            response.metadata.calculator_name, response.metadata.version
        ),
        format!("Result:         {}", plain(&response.result)),
    ];

    match &response.working {
        Value::Object(map) => {
            lines.push("Working:".to_string());
            for (key, value) in map {
                lines.push(format!("  {}: {}", key, plain(value)));
            }
        }
        other => lines.push(format!("Working:        {}", plain(other))),
    }
    if let Some(interpretation) = &response.interpretation {
        lines.push(format!("Interpretation: {}", interpretation));
    }
    if let Some(reference) = &response.reference {
        lines.push(format!("Reference:      {}", reference));
    }
    if let Some(tags) = &response.tags {
        lines.push(format!("Tags:           {}", tags.join(", ")));
    }
    lines.push(format!(
        "Timestamp:      {}",
        response.metadata.timestamp.to_rfc3339()
    ));
    lines.join("\n")
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::from_config(&EngineConfig::default()).unwrap()
    }

    fn run_capture(name: &str, params: &str, format: OutputFormat) -> (i32, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run(
            &dispatcher(),
            name,
            params,
            format,
            &RequestContext::default(),
            &mut out,
            &mut err,
        )
        .unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::parse_from([
            "calc",
            "run",
            "bmi",
            "--params",
            r#"{"weight": 70}"#,
            "--format",
            "text",
            "--language",
            "en",
        ]);
        match cli.command {
            Command::Run {
                name,
                format,
                language,
                ..
            } => {
                assert_eq!(name, "bmi");
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(language.as_deref(), Some("en"));
            }
            other => panic!("Expected Run, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_with_global_config() {
        let cli = Cli::parse_from(["calc", "serve", "--port", "9000", "--config", "engine.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("engine.yaml")));
        assert!(matches!(cli.command, Command::Serve { port: Some(9000), .. }));
    }

    #[test]
    fn test_run_prints_envelope() {
        let (code, out, err) = run_capture(
            "bmi",
            r#"{"weight": 70, "height": 1.75, "unit_system": "metric"}"#,
            OutputFormat::Pretty,
        );

        assert_eq!(code, EXIT_OK);
        assert!(err.is_empty());
        let envelope: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(envelope["result"], json!(22.86));
        assert_eq!(envelope["interpretation"], "Normal");
    }

    #[test]
    fn test_run_compact_json_is_one_line() {
        let (code, out, _) = run_capture(
            "dcct_ifcc",
            r#"{"input_unit": "dcct", "value": 7.0}"#,
            OutputFormat::Json,
        );
        assert_eq!(code, EXIT_OK);
        assert_eq!(out.trim_end().lines().count(), 1);
    }

    #[test]
    fn test_run_text_format() {
        let (code, out, _) = run_capture(
            "dcct_ifcc",
            r#"{"input_unit": "dcct", "value": 7.0}"#,
            OutputFormat::Text,
        );
        assert_eq!(code, EXIT_OK);
        assert!(out.contains("Result:         53.01"));
        assert!(out.contains("  formula: IFCC = (DCCT - 2.15) × 10.929"));
        assert!(out.contains("Tags:           dcct, ifcc, hba1c, conversion"));
    }

    #[test]
    fn test_malformed_params_exit_code() {
        let (code, out, err) = run_capture("bmi", "{weight: 70", OutputFormat::Pretty);
        assert_eq!(code, EXIT_USAGE);
        assert!(out.is_empty());
        assert!(err.contains("--params is not valid JSON"));
    }

    #[test]
    fn test_validation_failure_lists_violations() {
        let (code, _, err) = run_capture(
            "bmi",
            r#"{"weight": -5, "height": 1.75, "unit_system": "metric"}"#,
            OutputFormat::Pretty,
        );
        assert_eq!(code, EXIT_USAGE);
        assert!(err.contains("weight: out_of_range"));
    }

    #[test]
    fn test_unknown_calculator_exit_code() {
        let (code, _, err) = run_capture("nonexistent_calc", "{}", OutputFormat::Pretty);
        assert_eq!(code, EXIT_FAILURE);
        assert!(err.contains("Calculator not found: nonexistent_calc"));
    }

    #[test]
    fn test_list_and_describe() {
        let dispatcher = dispatcher();
        let mut out = Vec::new();
        let mut err = Vec::new();

        assert_eq!(list(&dispatcher, &mut out, &mut err).unwrap(), EXIT_OK);
        let listing: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(listing[0]["name"], "bmi");

        out.clear();
        assert_eq!(describe(&dispatcher, "dcct_ifcc", &mut out, &mut err).unwrap(), EXIT_OK);
        let spec: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(spec["inputs"][0]["name"], "value");

        assert_eq!(describe(&dispatcher, "nope", &mut out, &mut err).unwrap(), EXIT_FAILURE);
    }
}
