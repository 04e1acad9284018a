// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use datatrax::config::{load_and_build, StaticTransformerRegistry};
use datatrax::engine::WorkflowController;
use datatrax::errors::WorkflowError;
use datatrax::model::{DataValue, ValueType};
use datatrax::traits::{ResultsCollector, WorkflowResult};

/// Prints each delivered output as one JSON line on stdout.
#[derive(Default)]
struct PrintingCollector {
    errors: AtomicUsize,
}

impl ResultsCollector for PrintingCollector {
    fn handle_result(&self, result: WorkflowResult) {
        let line = serde_json::json!({
            "run_id": result.run_id,
            "output": result.key.to_string(),
            "source": result.source,
            "value": result.value,
        });
        println!("{}", line);
    }

    fn handle_error(&self, error: WorkflowError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        eprintln!("error: {}", error);
    }

    fn finished(&self) {}
}

/// Interprets a command line argument as a value of the workflow's source type.
fn parse_input(raw: &str, source_type: &ValueType) -> anyhow::Result<DataValue> {
    let value = match source_type {
        ValueType::Any | ValueType::Text => DataValue::from(raw),
        ValueType::Integer => DataValue::Integer(raw.parse().with_context(|| format!("'{}' is not an integer", raw))?),
        ValueType::Float => DataValue::Float(raw.parse().with_context(|| format!("'{}' is not a float", raw))?),
        ValueType::Number => match raw.parse::<i64>() {
            Ok(integer) => DataValue::Integer(integer),
            Err(_) => DataValue::Float(raw.parse().with_context(|| format!("'{}' is not a number", raw))?),
        },
        ValueType::Boolean => DataValue::Boolean(raw.parse().with_context(|| format!("'{}' is not a boolean", raw))?),
        other => bail!("inputs of type {} cannot be given on the command line", other),
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <workflow.yaml> <input>...", args[0]);
        eprintln!("Example: {} configs/greeting.yaml Hello Goodbye", args[0]);
        std::process::exit(2);
    }

    let registry = StaticTransformerRegistry::with_builtins();
    let (definition, options) = load_and_build(&args[1], &registry)
        .with_context(|| format!("failed to load workflow from {}", args[1]))?;
    let source_type = definition.source_type().clone();
    let controller = WorkflowController::create(Arc::new(definition), &registry, options)?;

    let collector = Arc::new(PrintingCollector::default());
    for raw in &args[2..] {
        let input = parse_input(raw, &source_type)?;
        controller.process_value(input, collector.clone())?;
    }

    let options = controller.options();
    let wait = options.get_run_timeout() + options.get_shutdown_grace();
    if !controller.join(wait).await {
        tracing::warn!("runs still in flight after {:?}; shutting down", wait);
    }
    controller.close().await;

    let errors = collector.errors.load(Ordering::SeqCst);
    if errors > 0 {
        bail!("{} error(s) reported", errors);
    }
    Ok(())
}
