mod config;

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::CliConfig;
use form_spec::{
    FormInstance, FormSchema, FormState, Mode, RuleSetValidator, SubmissionError,
    SubmissionPayload, SubmitError, build_submission, catalog, compute_effective_fields, render,
    render_json_ui, render_text,
};
use serde_json::{Map, Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Entity form helper",
    long_about = "Describes, renders, validates and submits schema-driven entity forms"
)]
struct Cli {
    /// JSON configuration file (defaults to FORMKIT_CONFIG when set).
    #[arg(long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SchemaSource {
    /// Built-in entity schema.
    #[arg(long, conflicts_with = "schema", required_unless_present = "schema")]
    entity: Option<String>,
    /// Path to a schema JSON document.
    #[arg(long, value_name = "SCHEMA")]
    schema: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in entity schemas.
    Entities,
    /// Print a schema document.
    Describe {
        #[command(flatten)]
        source: SchemaSource,
        /// Print the JSON Schema of the submission payload instead.
        #[arg(long, conflicts_with = "document_schema")]
        json_schema: bool,
        /// Print the JSON Schema of the schema document format.
        #[arg(long)]
        document_schema: bool,
    },
    /// Render the form controls for a mode and set of values.
    Render {
        #[command(flatten)]
        source: SchemaSource,
        /// create, edit or view (defaults to the configured mode).
        #[arg(long)]
        mode: Option<Mode>,
        /// JSON object merged over the schema defaults.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = RenderFormat::Text)]
        format: RenderFormat,
    },
    /// Validate values without submitting them.
    Validate {
        #[command(flatten)]
        source: SchemaSource,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        #[arg(long)]
        mode: Option<Mode>,
    },
    /// Build the submission payload and hand it to the stdout transport.
    Submit {
        #[command(flatten)]
        source: SchemaSource,
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
        #[arg(long)]
        mode: Option<Mode>,
        /// Emit the payload as CBOR hex instead of JSON.
        #[arg(long)]
        cbor: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(&config);
    debug!(mode = %config.default_mode, "configuration loaded");

    match cli.command {
        Command::Entities => run_entities(),
        Command::Describe {
            source,
            json_schema,
            document_schema,
        } => run_describe(&source, json_schema, document_schema),
        Command::Render {
            source,
            mode,
            values,
            format,
        } => run_render(&config, &source, mode, values.as_deref(), format),
        Command::Validate {
            source,
            values,
            mode,
        } => run_validate(&config, &source, mode, &values),
        Command::Submit {
            source,
            values,
            mode,
            cbor,
        } => run_submit(&config, &source, mode, &values, cbor),
    }
}

fn init_tracing(config: &CliConfig) {
    let directive = env::var("FORMKIT_LOG")
        .ok()
        .or_else(|| config.log_filter.clone())
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_entities() -> CliResult<()> {
    for entity in catalog::entities() {
        let schema = catalog::get(entity)?;
        println!("{}\t{}", entity, schema.title());
    }
    Ok(())
}

fn run_describe(source: &SchemaSource, json_schema: bool, document_schema: bool) -> CliResult<()> {
    let document = if document_schema {
        FormSchema::document_json_schema()
    } else {
        let schema = load_schema(source)?;
        if json_schema {
            schema.json_schema()
        } else {
            serde_json::to_value(&schema)?
        }
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn run_render(
    config: &CliConfig,
    source: &SchemaSource,
    mode: Option<Mode>,
    values_path: Option<&Path>,
    format: RenderFormat,
) -> CliResult<()> {
    let schema = load_schema(source)?;
    let mode = mode.unwrap_or(config.default_mode);
    let overrides = collect_overrides(config, values_path)?;
    let state = FormState::from_schema(&schema, &overrides);
    let effective = compute_effective_fields(schema.fields(), mode, state.values());
    let rendered = render(&effective, state.values());

    match format {
        RenderFormat::Text => println!("{}", render_text(schema.title(), &rendered)),
        RenderFormat::Json => {
            let ui = render_json_ui(schema.id(), schema.title(), &rendered);
            println!("{}", serde_json::to_string_pretty(&ui)?);
        }
    }
    Ok(())
}

fn run_validate(
    config: &CliConfig,
    source: &SchemaSource,
    mode: Option<Mode>,
    values_path: &Path,
) -> CliResult<()> {
    let schema = load_schema(source)?;
    let mode = mode.unwrap_or(config.default_mode);
    let overrides = collect_overrides(config, Some(values_path))?;
    let state = FormState::from_schema(&schema, &overrides);

    match build_submission(&state, &schema, mode, &RuleSetValidator) {
        Ok(_) => {
            println!("Validation result: valid");
            Ok(())
        }
        Err(err) => {
            println!("Validation result: invalid");
            describe_submit_error(&err);
            Err("validation failed".into())
        }
    }
}

fn run_submit(
    config: &CliConfig,
    source: &SchemaSource,
    mode: Option<Mode>,
    values_path: &Path,
    cbor: bool,
) -> CliResult<()> {
    let schema = load_schema(source)?;
    let mode = mode.unwrap_or(config.default_mode);
    let overrides = collect_overrides(config, Some(values_path))?;
    let mut form = FormInstance::with_overrides(&schema, mode, &overrides);

    let transport = |payload: &SubmissionPayload| -> Result<Value, SubmissionError> {
        if cbor {
            let bytes = payload
                .to_cbor()
                .map_err(|err| SubmissionError::new(format!("cbor encode: {}", err)))?;
            println!("{}", encode_hex(&bytes));
        } else {
            let pretty = payload
                .to_json_pretty()
                .map_err(|err| SubmissionError::new(format!("json encode: {}", err)))?;
            println!("{}", pretty);
        }
        Ok(json!({ "accepted": payload.values.len() }))
    };

    match form.submit(&transport).cloned() {
        Ok(response) => {
            info!(form = schema.id(), %response, "submission accepted");
            Ok(())
        }
        Err(err) => {
            describe_submit_error(&err);
            Err(format!("submission failed ({})", form.status().as_str()).into())
        }
    }
}

fn describe_submit_error(err: &SubmitError) {
    match err {
        SubmitError::Validation(validation) => {
            eprintln!("Validation errors:");
            for field in &validation.fields {
                eprintln!("  {}: {} ({})", field.key, field.message, field.code);
            }
        }
        other => eprintln!("{}", other),
    }
}

fn load_schema(source: &SchemaSource) -> CliResult<FormSchema> {
    match (&source.entity, &source.schema) {
        (Some(entity), _) => Ok(catalog::get(entity)?.clone()),
        (None, Some(path)) => {
            let contents = fs::read_to_string(path)
                .map_err(|err| format!("failed to read schema {}: {}", path.display(), err))?;
            Ok(serde_json::from_str(&contents)?)
        }
        (None, None) => Err("either --entity or --schema is required".into()),
    }
}

/// Config prefill first, then the values file on top.
fn collect_overrides(config: &CliConfig, values_path: Option<&Path>) -> CliResult<Map<String, Value>> {
    let mut overrides = config.prefill.clone();
    if let Some(path) = values_path {
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("failed to read values {}: {}", path.display(), err))?;
        let values: Value = serde_json::from_str(&contents)?;
        let Value::Object(values) = values else {
            return Err(format!("values file {} must hold a JSON object", path.display()).into());
        };
        overrides.extend(values);
    }
    Ok(overrides)
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}
