use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use hookflow_api::{AuthenticatedBackend, ClientOptions, WebhookClient, WorkflowBackend};
use hookflow_tui::TuiOptions;
use hookflow_types::{
    BearerToken, FieldErrors, FieldValue, FileAttachment, FormValues, SubmitRequest, WebhookConfig, WebhookModel, apply_inline_arguments,
    collect_files, collect_form_data, matches_accept, parse_inline_arguments, seed_form_values, submission_mode, validate_form_schema,
    validate_required,
};
use hookflow_util::{ClientConfig, default_config_path, delete_stored_token, expand_tilde, redact_sensitive, render_plain, resolve_token, store_token, stored_token};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_PATH_ENV: &str = "HOOKFLOW_LOG_PATH";

#[derive(Parser, Debug)]
#[command(name = "hookflow", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// API token (overrides HOOKFLOW_API_TOKEN and the keyring)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API base URL, e.g. https://chat.example.com/api/v1
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Allow plain http:// for hosts other than localhost
    #[arg(long, global = true)]
    insecure: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the interactive terminal UI (default)
    Tui(TuiArgs),
    /// List models with an enabled webhook
    Models {
        /// Print the raw JSON listing
        #[arg(long)]
        json: bool,
    },
    /// Print a model's webhook configuration
    Config {
        model_id: String,
    },
    /// Submit a workflow form without the UI
    Invoke(InvokeArgs),
    /// Manage the API token stored in the OS keyring
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },
}

#[derive(Args, Debug, Default)]
struct TuiArgs {
    /// Model to route at startup (workflow-only models open their form)
    #[arg(long)]
    model: Option<String>,
    /// Chat to attach workflow results to
    #[arg(long)]
    chat_id: Option<String>,
    /// Directory for downloaded response files
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InvokeArgs {
    model_id: String,
    /// Inline arguments as typed after a slash command: name=value pairs and
    /// date shortcuts (this_month, last_month, this_year, last_year, q1-q4)
    #[arg(value_name = "ARGS")]
    arguments: Vec<String>,
    /// Form value as name=value (repeatable)
    #[arg(long = "field", value_name = "NAME=VALUE")]
    fields: Vec<String>,
    /// File attachment as name=path (repeatable)
    #[arg(long = "file", value_name = "NAME=PATH")]
    files: Vec<String>,
    /// Chat to attach the result to
    #[arg(long)]
    chat_id: Option<String>,
    /// Print the raw JSON response
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Store the token given with --token in the keyring; --base-url and
    /// --insecure are saved to the config file
    Login,
    /// Remove the stored token
    Logout,
    /// Show where the active token comes from
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let launches_tui = matches!(cli.command, None | Some(Command::Tui(_)));
    if let Err(error) = init_tracing(launches_tui) {
        eprintln!("warning: logging disabled: {error:#}");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{}", redact_sensitive(&format!("{error:#}")));
            eprintln!("error: {}", redact_sensitive(&format!("{error:#}")));
            ExitCode::FAILURE
        }
    }
}

/// CLI subcommands log to stderr. The TUI owns the terminal, so it logs to a
/// file instead.
fn init_tracing(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if !to_file {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
        return Ok(());
    }

    let path = log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

fn log_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }
    dirs_next::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hookflow")
        .join("hookflow.log")
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        command,
        token,
        base_url,
        insecure,
    } = cli;

    if let Some(Command::Auth { action }) = &command {
        return run_auth(action, token.as_deref(), base_url.as_deref(), insecure);
    }

    let mut config = ClientConfig::load().context("load configuration")?;
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    config.allow_insecure |= insecure;
    let token = resolve_token(token.as_deref())?;
    let client = WebhookClient::with_options(
        &config.base_url,
        ClientOptions {
            allow_insecure: config.allow_insecure,
        },
    )?;
    let backend = AuthenticatedBackend::new(client, token);
    debug!(base_url = %config.base_url, "configured webhook client");

    match command.unwrap_or(Command::Tui(TuiArgs::default())) {
        Command::Tui(args) => {
            let options = TuiOptions {
                chat_id: args.chat_id.or(config.chat_id),
                startup_model: args.model,
                base_url: config.base_url,
                download_dir: args.download_dir,
            };
            hookflow_tui::run(Arc::new(backend), options).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Models { json } => {
            let models = backend.webhook_models().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                print!("{}", models_table(&models));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { model_id } => {
            let config = backend.webhook_config(&model_id).await?;
            if let Err(problems) = validate_form_schema(&config.form_fields) {
                for problem in problems {
                    warn!(%model_id, "form schema problem: {problem}");
                }
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Invoke(args) => {
            let chat_id = args.chat_id.clone().or(config.chat_id);
            invoke(&backend, args, chat_id).await
        }
        Command::Auth { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn run_auth(action: &AuthCommand, flag_token: Option<&str>, base_url: Option<&str>, insecure: bool) -> Result<ExitCode> {
    match action {
        AuthCommand::Login => {
            let token = BearerToken::new(flag_token.unwrap_or_default());
            if token.is_empty() {
                bail!("pass the token to store with --token");
            }
            store_token(&token)?;
            println!("Token stored in the OS keyring.");
            let path = default_config_path();
            if remember_server(&path, base_url, insecure)? {
                println!("Server settings saved to {}.", path.display());
            }
        }
        AuthCommand::Logout => {
            if delete_stored_token()? {
                println!("Stored token removed.");
            } else {
                println!("No stored token.");
            }
        }
        AuthCommand::Status => {
            let source = if flag_token.is_some_and(|token| !token.trim().is_empty()) {
                Some("--token flag")
            } else if std::env::var(hookflow_util::config::API_TOKEN_ENV).is_ok_and(|token| !token.trim().is_empty()) {
                Some(hookflow_util::config::API_TOKEN_ENV)
            } else if stored_token()?.is_some() {
                Some("OS keyring")
            } else {
                None
            };
            match source {
                Some(source) => println!("Authenticated via {source}."),
                None => {
                    println!("Not authenticated. Run `hookflow auth login --token <TOKEN>`.");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Persist the server flags given at login so later runs pick them up.
/// Returns whether anything was written.
fn remember_server(path: &Path, base_url: Option<&str>, insecure: bool) -> Result<bool> {
    let base_url = base_url.map(str::trim).filter(|url| !url.is_empty());
    if base_url.is_none() && !insecure {
        return Ok(false);
    }
    let mut config = ClientConfig::load_from(path)?;
    if let Some(base_url) = base_url {
        config.base_url = base_url.to_string();
    }
    config.allow_insecure |= insecure;
    config.save_to(path).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

async fn invoke(backend: &AuthenticatedBackend, args: InvokeArgs, chat_id: Option<String>) -> Result<ExitCode> {
    let config = backend.webhook_config(&args.model_id).await?;
    if !config.enabled {
        bail!("webhook is not enabled for model {}", args.model_id);
    }

    let values = build_form_values(&config, &args.arguments, &args.fields, &args.files)?;
    let errors = validate_required(&config.form_fields, &values);
    if !errors.is_empty() {
        print_field_errors(&errors);
        return Ok(ExitCode::from(2));
    }

    let fields = &config.form_fields;
    let request = SubmitRequest {
        session: 0,
        model_id: args.model_id.clone(),
        title: config.display_title(&args.model_id).to_string(),
        mode: submission_mode(fields),
        form_data: collect_form_data(fields, &values),
        files: collect_files(fields, &values),
        chat_id,
    };
    info!(model_id = %request.model_id, mode = ?request.mode, "invoking workflow");
    let response = backend.submit(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let rendered = render_plain(&response);
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }
    if response.success {
        Ok(ExitCode::SUCCESS)
    } else {
        if !args.json {
            eprintln!("workflow reported failure");
        }
        Ok(ExitCode::FAILURE)
    }
}

/// Seed defaults and apply `--field`/`--file` arguments.
/// Seed defaults, then apply inline arguments, `--field` and `--file` in
/// that order; later sources win.
fn build_form_values(config: &WebhookConfig, inline: &[String], fields: &[String], files: &[String]) -> Result<FormValues> {
    let mut values = seed_form_values(&config.form_fields);

    let arguments = parse_inline_arguments(&inline.join(" "), Local::now().date_naive());
    if let Some(token) = arguments.unrecognized.first() {
        bail!("unrecognized argument '{token}' (expected NAME=VALUE or a date shortcut)");
    }
    let skipped = apply_inline_arguments(&config.form_fields, &mut values, &arguments);
    if !skipped.is_empty() {
        bail!("arguments do not match any usable field: {}", skipped.join(", "));
    }

    for argument in fields {
        let (name, value) = split_assignment(argument, "--field")?;
        let field = config.field(name).ok_or_else(|| anyhow!("unknown field '{name}'"))?;
        if field.is_file() {
            bail!("'{name}' is a file field; use --file {name}=PATH");
        }
        if !field.options.is_empty() && !field.options.iter().any(|option| option == value) {
            bail!("'{value}' is not an option of '{name}' (expected one of: {})", field.options.join(", "));
        }
        values.insert(name.to_string(), FieldValue::Text(value.to_string()));
    }

    for argument in files {
        let (name, path) = split_assignment(argument, "--file")?;
        let field = config.field(name).ok_or_else(|| anyhow!("unknown field '{name}'"))?;
        if !field.is_file() {
            bail!("'{name}' is not a file field; use --field {name}=VALUE");
        }
        let attachment = FileAttachment::from_path(&expand_tilde(path))?;
        if let Some(accept) = field.accept_filter()
            && !matches_accept(&attachment.file_name, &attachment.content_type, accept)
        {
            bail!("{} is not an accepted file type for '{name}' ({accept})", attachment.file_name);
        }
        let slot = values.entry(name.to_string()).or_insert_with(|| FieldValue::Files(Vec::new()));
        match slot {
            FieldValue::Files(list) => {
                if !list.is_empty() && !field.allows_multiple() {
                    bail!("'{name}' accepts a single file");
                }
                list.push(attachment);
            }
            FieldValue::Text(_) => *slot = FieldValue::Files(vec![attachment]),
        }
    }
    Ok(values)
}

fn split_assignment<'a>(argument: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    argument
        .split_once('=')
        .map(|(name, value)| (name.trim(), value))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| anyhow!("{flag} expects NAME=VALUE, got '{argument}'"))
}

fn print_field_errors(errors: &FieldErrors) {
    for message in errors.values() {
        eprintln!("error: {message}");
    }
}

fn models_table(models: &[WebhookModel]) -> String {
    if models.is_empty() {
        return "No workflow models available.\n".to_string();
    }
    let rows: Vec<[String; 4]> = models
        .iter()
        .map(|model| {
            [
                model.id.clone(),
                model.name.clone(),
                model.command_keyword().map(|command| format!("/{command}")).unwrap_or_default(),
                model.form_title.clone().unwrap_or_default(),
            ]
        })
        .collect();
    let headers = ["ID", "NAME", "COMMAND", "TITLE"];
    let widths: Vec<usize> = (0..4)
        .map(|index| {
            rows.iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(headers[index].len()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let format_row = |cells: [&str; 4]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        format!("{}\n", line.join("  ").trim_end())
    };
    let mut out = format_row(headers);
    for row in &rows {
        out.push_str(&format_row([&row[0], &row[1], &row[2], &row[3]]));
    }
    out
}
