//! Structured output: table, JSON, CSV, YAML, id-list and count shapes.

use std::io::Write;

use comfy_table::{presets::UTF8_BORDERS_ONLY, Cell, Table};
use itertools::Itertools;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cli::{CliError, CliResult};
use crate::domain::{format_date, Message, Signup};

/// Selectable output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    Yaml,
    Ids,
    Count,
}

impl OutputFormat {
    /// Parse a format name; unknown names fall back to a table.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Self::Table,
            "json" => Self::Json,
            "csv" => Self::Csv,
            "yaml" => Self::Yaml,
            "ids" => Self::Ids,
            "count" => Self::Count,
            other => {
                debug!("unknown format '{}', using table", other);
                Self::default()
            }
        }
    }
}

/// A record that can be rendered field by field.
pub trait Tabular {
    /// Fields shown in listings when `--fields` is not given.
    const DEFAULT_FIELDS: &'static [&'static str];

    fn id(&self) -> u64;

    /// All fields in display order.
    fn record(&self) -> Vec<(&'static str, Value)>;
}

impl Tabular for Signup {
    const DEFAULT_FIELDS: &'static [&'static str] =
        &["id", "user_login", "user_email", "activation_key", "registered"];

    fn id(&self) -> u64 {
        self.id
    }

    fn record(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::from(self.id)),
            ("user_login", Value::from(self.user_login.clone())),
            ("user_email", Value::from(self.user_email.clone())),
            ("activation_key", Value::from(self.activation_key.clone())),
            ("registered", Value::from(format_date(&self.registered))),
            ("active", Value::from(self.active)),
            (
                "date_activated",
                self.date_activated
                    .as_ref()
                    .map(|d| Value::from(format_date(d)))
                    .unwrap_or(Value::Null),
            ),
        ]
    }
}

impl Tabular for Message {
    const DEFAULT_FIELDS: &'static [&'static str] =
        &["id", "thread_id", "sender_id", "subject", "message", "date_sent"];

    fn id(&self) -> u64 {
        self.id
    }

    fn record(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::from(self.id)),
            ("thread_id", Value::from(self.thread_id)),
            ("sender_id", Value::from(self.sender_id)),
            ("subject", Value::from(self.subject.clone())),
            ("message", Value::from(self.message.clone())),
            ("date_sent", Value::from(format_date(&self.date_sent))),
        ]
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn yaml_err(e: serde_yaml::Error) -> CliError {
    CliError::Usage(format!("cannot render yaml: {}", e))
}

fn json_err(e: serde_json::Error) -> CliError {
    CliError::Usage(format!("cannot render json: {}", e))
}

/// Renders records in the requested shape.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    format: OutputFormat,
    fields: Option<Vec<String>>,
}

impl Formatter {
    pub fn new(format: &str, fields: Option<&str>) -> Self {
        let fields = fields
            .map(|f| {
                f.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .filter(|f| !f.is_empty());
        Self {
            format: OutputFormat::parse_or_default(format),
            fields,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Pick the requested fields out of a record, in request order.
    fn select(
        &self,
        record: Vec<(&'static str, Value)>,
        defaults: Option<&[&str]>,
    ) -> CliResult<Vec<(String, Value)>> {
        let wanted: Vec<String> = match (&self.fields, defaults) {
            (Some(fields), _) => fields.clone(),
            (None, Some(defaults)) => defaults.iter().map(|s| s.to_string()).collect(),
            (None, None) => {
                return Ok(record
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect())
            }
        };
        wanted
            .into_iter()
            .map(|name| {
                record
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (name.clone(), v.clone()))
                    .ok_or_else(|| CliError::InvalidArgs(format!("Invalid field: {}", name)))
            })
            .collect()
    }

    /// Render a list of records.
    pub fn write_list<T: Tabular>(&self, out: &mut dyn Write, items: &[T]) -> CliResult<()> {
        match self.format {
            OutputFormat::Count => writeln!(out, "{}", items.len())?,
            OutputFormat::Ids => writeln!(out, "{}", items.iter().map(|i| i.id()).join(" "))?,
            format => {
                let rows = items
                    .iter()
                    .map(|item| self.select(item.record(), Some(T::DEFAULT_FIELDS)))
                    .collect::<CliResult<Vec<_>>>()?;
                let headers: Vec<String> = match rows.first() {
                    Some(row) => row.iter().map(|(k, _)| k.clone()).collect(),
                    None => self.fields.clone().unwrap_or_else(|| {
                        T::DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect()
                    }),
                };
                self.write_rows(out, format, &headers, rows)?;
            }
        }
        Ok(())
    }

    /// Render a single record; tables show one field per row.
    pub fn write_one<T: Tabular>(&self, out: &mut dyn Write, item: &T) -> CliResult<()> {
        let row = self.select(item.record(), None)?;
        match self.format {
            OutputFormat::Count => writeln!(out, "1")?,
            OutputFormat::Ids => writeln!(out, "{}", item.id())?,
            OutputFormat::Json => {
                let map: Map<String, Value> = row.into_iter().collect();
                writeln!(out, "{}", serde_json::to_string(&map).map_err(json_err)?)?;
            }
            OutputFormat::Yaml => {
                let map: Map<String, Value> = row.into_iter().collect();
                write!(out, "{}", serde_yaml::to_string(&map).map_err(yaml_err)?)?;
            }
            OutputFormat::Csv => {
                writeln!(out, "Field,Value")?;
                for (k, v) in &row {
                    writeln!(out, "{},{}", csv_field(k), csv_field(&display(v)))?;
                }
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
                for (k, v) in &row {
                    table.add_row(vec![Cell::new(k), Cell::new(display(v))]);
                }
                writeln!(out, "{table}")?;
            }
        }
        Ok(())
    }

    fn write_rows(
        &self,
        out: &mut dyn Write,
        format: OutputFormat,
        headers: &[String],
        rows: Vec<Vec<(String, Value)>>,
    ) -> CliResult<()> {
        match format {
            OutputFormat::Json => {
                let maps: Vec<Map<String, Value>> =
                    rows.into_iter().map(|r| r.into_iter().collect()).collect();
                writeln!(out, "{}", serde_json::to_string(&maps).map_err(json_err)?)?;
            }
            OutputFormat::Yaml => {
                let maps: Vec<Map<String, Value>> =
                    rows.into_iter().map(|r| r.into_iter().collect()).collect();
                write!(out, "{}", serde_yaml::to_string(&maps).map_err(yaml_err)?)?;
            }
            OutputFormat::Csv => {
                writeln!(out, "{}", headers.iter().map(|h| csv_field(h)).join(","))?;
                for row in &rows {
                    let line = row.iter().map(|(_, v)| csv_field(&display(v))).join(",");
                    writeln!(out, "{}", line)?;
                }
            }
            _ => {
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(headers.iter().map(Cell::new).collect::<Vec<_>>());
                for row in &rows {
                    let cells: Vec<Cell> = row.iter().map(|(_, v)| Cell::new(display(v))).collect();
                    table.add_row(cells);
                }
                writeln!(out, "{table}")?;
            }
        }
        Ok(())
    }
}
