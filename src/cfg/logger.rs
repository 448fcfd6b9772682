// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Event, Subscriber};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{
        self, FmtContext, FormatEvent, FormatFields, FormattedFields,
        format::{JsonFields, Writer},
    },
    layer::SubscriberExt,
};

use crate::cfg::{
    config::{LogFileConfig, LoggerConfig},
    enums::{LogFormat, LogOutput, RotationFrequency},
};

/// Environment variable whose `EnvFilter` directive overrides the
/// configured level.
pub const LOG_ENV: &str = "WDLED_LOG";

// Define custom layer for reading tracing events in json format
struct JsonFormatter {
    config: Arc<LoggerConfig>,
}

impl JsonFormatter {
    fn new(config: Arc<LoggerConfig>) -> Self {
        Self { config }
    }
}

#[derive(Serialize)]
struct LogEntry {
    timestamp: String,
    level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl LogEntry {
    fn new(
        config: &LoggerConfig,
        event: &Event,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let meta = event.metadata();
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: meta.level().to_string(),
            target: config.is_show_target.then(|| meta.target().to_string()),
            module_path: config
                .is_show_module_path
                .then(|| meta.module_path().unwrap_or("").to_string()),
            line: if config.is_show_line { meta.line() } else { None },
            fields,
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.fields;

        if let Some(scope) = ctx.event_scope() {
            let mut span_names = vec![];
            for span in scope.from_root() {
                span_names.push(span.name().to_string());
                if let Some(ext) = span.extensions().get::<FormattedFields<JsonFields>>()
                {
                    let v: HashMap<String, Value> =
                        serde_json::from_str(&ext.fields).unwrap_or_default();
                    fields.extend(v);
                }
            }
            fields.insert("span_names".to_string(), json!(span_names));
        }

        let log_entry = LogEntry::new(&self.config, event, fields);
        writeln!(
            writer,
            "{}",
            serde_json::to_string(&log_entry).map_err(|_| std::fmt::Error)?
        )
    }
}

#[derive(Default)]
struct JsonVisitor {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl tracing::field::Visit for JsonVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_debug(
        &mut self,
        field: &tracing::field::Field,
        value: &dyn std::fmt::Debug,
    ) {
        self.fields
            .insert(field.name().to_string(), json!(format!("{value:?}")));
    }
}

/// Level directive in effect: `WDLED_LOG` if set, the configured one
/// otherwise.
pub fn effective_level(config: &LoggerConfig, env: Option<String>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}

fn is_off(directive: &str) -> bool {
    directive.trim().eq_ignore_ascii_case("off")
}

/// Split a log file path into the directory and file name expected by
/// `RollingFileAppender`.
fn split_path(path: &str) -> (String, String) {
    let path = Path::new(path);
    let directory = path
        .parent()
        .and_then(Path::to_str)
        .unwrap_or("")
        .to_string();
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();
    (directory, file_name)
}

fn file_appender(cfg: &LogFileConfig) -> RollingFileAppender {
    let rotation = match cfg.rotation_frequency {
        RotationFrequency::Minutely => Rotation::MINUTELY,
        RotationFrequency::Hourly => Rotation::HOURLY,
        RotationFrequency::Daily => Rotation::DAILY,
        RotationFrequency::Never => Rotation::NEVER,
    };
    let (directory, file_name) = split_path(&cfg.path);
    RollingFileAppender::new(rotation, directory, file_name)
}

/// Install the global subscriber.
///
/// Returns `None` without installing anything when the effective level is
/// `off`, so the operator-facing output stays untouched. The guard must be
/// held until exit to flush the non-blocking writer.
pub fn init_logger(config: &LoggerConfig) -> Result<Option<WorkerGuard>> {
    let level = effective_level(config, std::env::var(LOG_ENV).ok());
    if is_off(&level) {
        return Ok(None);
    }

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File => {
            let file = config
                .file
                .as_ref()
                .context("Failed to find log file config")?;
            tracing_appender::non_blocking(file_appender(file))
        },
    };

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .json()
            .event_format(JsonFormatter::new(Arc::new(config.clone())))
            .fmt_fields(JsonFields::default())
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(config.is_show_target)
            .with_line_number(config.is_show_line)
            .boxed(),
    };

    let env_filter = EnvFilter::try_new(&level).context("Failed to parse log level")?;

    let subscriber = tracing_subscriber::registry().with(env_filter).with(layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    Ok(Some(guard))
}
