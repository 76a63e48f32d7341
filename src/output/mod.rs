//! @acp:module "Output"
//! @acp:summary "Output sinks and rendering formats"
//! @acp:domain cli
//! @acp:layer output
//!
//! Output sinks
//!
//! Projected values are written to the caller one at a time, as soon as the
//! page that produced them arrives.

use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Rendering of emitted values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON document per value
    #[default]
    Json,
    /// One compact JSON document per line
    Jsonl,
    /// YAML documents separated by `---`
    Yaml,
    /// Strings raw, everything else as compact JSON
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(format!("Unknown output format: {}. Use json, jsonl, yaml or text", s)),
        }
    }
}

/// Destination for projected values
pub trait OutputSink {
    fn emit(&mut self, value: &Value) -> Result<()>;
}

/// Renders values to any writer
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    emitted: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            emitted: 0,
        }
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn emit(&mut self, value: &Value) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut self.writer, value)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.writer, value)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Yaml => {
                if self.emitted > 0 {
                    writeln!(self.writer, "---")?;
                }
                serde_yaml::to_writer(&mut self.writer, value)?;
            }
            OutputFormat::Text => match value {
                Value::String(s) => writeln!(self.writer, "{}", s)?,
                other => writeln!(self.writer, "{}", other)?,
            },
        }
        self.writer.flush()?;
        self.emitted += 1;
        Ok(())
    }
}

/// Collects values in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    pub values: Vec<Value>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for CollectSink {
    fn emit(&mut self, value: &Value) -> Result<()> {
        self.values.push(value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(format: OutputFormat, values: &[Value]) -> String {
        let mut sink = WriterSink::new(Vec::new(), format);
        for value in values {
            sink.emit(value).unwrap();
        }
        assert_eq!(sink.emitted(), values.len());
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_jsonl_one_value_per_line() {
        let out = render(OutputFormat::Jsonl, &[json!({"a": 1}), json!("x")]);
        assert_eq!(out, "{\"a\":1}\n\"x\"\n");
    }

    #[test]
    fn test_text_prints_strings_raw() {
        let out = render(OutputFormat::Text, &[json!("vol-1"), json!(3)]);
        assert_eq!(out, "vol-1\n3\n");
    }

    #[test]
    fn test_yaml_separates_documents() {
        let out = render(OutputFormat::Yaml, &[json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(out, "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
