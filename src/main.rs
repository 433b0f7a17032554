//! jade-assist command-line entry point.
//!
//! Runs one request from the command line, serves line-delimited JSON on
//! stdio, or serves the HTTP API.

use clap::Parser;
use serde_json::Value;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use jade_assist::config::{Args, Config, LogFormat, Mode};
use jade_assist::dispatcher::Dispatcher;
use jade_assist::error::{Error, Result};
use jade_assist::transport::stdio;
use jade_assist::types::{FormatKind, HandlerArgs, Request};
use jade_assist::VERSION;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {}", e);
        }
    }

    let args = Args::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.root_cause().kind(), e);
            if e.root_cause().kind().is_caller_error() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}

/// Logs go to stderr so stdout carries only payloads.
fn init_tracing(args: &Args) {
    let default_level = match (args.debug, args.mode) {
        (true, _) => "debug",
        (false, Mode::Once) => "warn",
        (false, _) => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match args.log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::try_from(&args)?;

    info!("jade-assist v{}", VERSION);
    info!("Workspace: {:?}", config.workspace);
    debug!("Mode: {:?}", config.mode);

    match config.mode {
        Mode::Once => {
            // Reject bad caller input before touching the workspace.
            let format: FormatKind = args.format.parse()?;
            let request = if args.list_handlers {
                None
            } else {
                Some(build_request(&args)?)
            };

            let dispatcher = Dispatcher::from_config(&config).await?;
            match request {
                None => {
                    for handler in dispatcher.handlers() {
                        println!("{:<20} {}", handler.name, handler.description);
                    }
                    Ok(())
                }
                Some(request) => run_once(&dispatcher, request, format).await,
            }
        }
        Mode::Stdio => {
            let dispatcher = Dispatcher::from_config(&config).await?;
            info!("Serving line-delimited JSON on stdio");
            stdio::serve(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await
        }
        Mode::Http => {
            let dispatcher = Dispatcher::from_config(&config).await?;
            jade_assist::http::start_server(&config, dispatcher).await
        }
    }
}

/// Build the request from `TYPE`, `--args` and `--query`.
fn build_request(args: &Args) -> Result<Request> {
    let request_type = args.request_type.clone().ok_or_else(|| {
        Error::InvalidArguments("missing request TYPE (see --list-handlers)".to_string())
    })?;

    let mut request = Request::new(request_type);
    if let Some(raw) = &args.args {
        request.args = serde_json::from_str::<HandlerArgs>(raw).map_err(|e| {
            Error::InvalidArguments(format!("--args must be a JSON object: {}", e))
        })?;
    }
    if let Some(query) = &args.query {
        request
            .args
            .insert("query".to_string(), Value::String(query.clone()));
    }
    Ok(request)
}

/// Dispatch one request; Ctrl-C cancels it.
async fn run_once(dispatcher: &Dispatcher, request: Request, format: FormatKind) -> Result<()> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let output = dispatcher
        .dispatch_with_cancel(request, format, cancel)
        .await?;

    print!("{}", output.payload);
    if !output.payload.ends_with('\n') {
        println!();
    }
    Ok(())
}
