//! Rendering of orchestration configuration documents.
//!
//! A [`ConfigDocument`] is rendered as HCL text in a fixed block order:
//! includes, optional `terraform` source, dependency blocks, then `inputs`.

use std::fmt::{self, Write};

use serde_json::Value;
use thiserror::Error;

/// Rendering failure.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A name used in a traversal expression is not a valid identifier.
    #[error("{context} name \"{name}\" is not a valid identifier")]
    InvalidIdentifier {
        /// Where the name appears.
        context: &'static str,
        /// Offending name.
        name: String,
    },
    /// Writing to the output buffer failed.
    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

/// An `include` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Block label.
    pub label: String,
    /// File located with `find_in_parent_folders`.
    pub file: String,
    /// Whether the included configuration is exposed to this one.
    pub expose: bool,
}

/// A `dependency` block with mock outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyBlock {
    /// Dependency name (component address).
    pub name: String,
    /// Relative path to the dependency's configuration.
    pub config_path: String,
    /// Mock outputs in first-reference order.
    pub mock_outputs: Vec<(String, Value)>,
    /// Commands allowed to run against mock outputs.
    pub allowed_commands: Vec<String>,
}

/// The right-hand side of an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value.
    Literal(Value),
    /// `dependency.<dependency>.outputs.<output>`
    DependencyOutput {
        /// Dependency block name.
        dependency: String,
        /// Output name.
        output: String,
    },
}

/// A complete per-component configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    /// Include blocks, rendered first.
    pub includes: Vec<Include>,
    /// Module source address for a `terraform` block.
    pub source: Option<String>,
    /// Dependency blocks.
    pub dependencies: Vec<DependencyBlock>,
    /// Inputs in declaration order.
    pub inputs: Vec<(String, Expression)>,
}

/// Whether `name` is a valid HCL identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn require_identifier(context: &'static str, name: &str) -> Result<(), RenderError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(RenderError::InvalidIdentifier {
            context,
            name: name.to_string(),
        })
    }
}

/// Quotes `s` as an HCL string literal, escaping template sequences.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn write_value(out: &mut String, value: &Value, indent: usize) -> fmt::Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::Number(n) => write!(out, "{n}"),
        Value::String(s) => out.write_str(&quote(s)),
        Value::Array(items) if items.iter().all(is_scalar) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(", ")?;
                }
                write_value(out, item, indent)?;
            }
            out.write_char(']')
        }
        Value::Array(items) => {
            out.write_str("[\n")?;
            for item in items {
                write!(out, "{:width$}", "", width = indent + 2)?;
                write_value(out, item, indent + 2)?;
                out.write_str(",\n")?;
            }
            write!(out, "{:width$}]", "", width = indent)
        }
        Value::Object(map) if map.is_empty() => out.write_str("{}"),
        Value::Object(map) => {
            out.write_str("{\n")?;
            for (k, v) in map {
                write!(out, "{:width$}{} = ", "", object_key(k), width = indent + 2)?;
                write_value(out, v, indent + 2)?;
                out.write_char('\n')?;
            }
            write!(out, "{:width$}}}", "", width = indent)
        }
    }
}

/// Renders `value` as an HCL expression at the given indentation.
///
/// # Errors
///
/// Returns an error if writing to the buffer fails.
pub fn render_value(value: &Value, indent: usize) -> Result<String, RenderError> {
    let mut out = String::new();
    write_value(&mut out, value, indent)?;
    Ok(out)
}

fn render_include(out: &mut String, include: &Include) -> Result<(), RenderError> {
    writeln!(out, "include {} {{", quote(&include.label))?;
    if include.expose {
        writeln!(out, "  path   = find_in_parent_folders({})", quote(&include.file))?;
        writeln!(out, "  expose = true")?;
    } else {
        writeln!(out, "  path = find_in_parent_folders({})", quote(&include.file))?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

fn render_dependency(out: &mut String, dep: &DependencyBlock) -> Result<(), RenderError> {
    require_identifier("dependency", &dep.name)?;
    writeln!(out, "dependency {} {{", quote(&dep.name))?;
    writeln!(out, "  config_path = {}", quote(&dep.config_path))?;
    writeln!(out)?;
    if dep.mock_outputs.is_empty() {
        writeln!(out, "  mock_outputs = {{}}")?;
    } else {
        writeln!(out, "  mock_outputs = {{")?;
        for (name, value) in &dep.mock_outputs {
            require_identifier("output", name)?;
            write!(out, "    {name} = ")?;
            write_value(out, value, 4)?;
            writeln!(out)?;
        }
        writeln!(out, "  }}")?;
    }
    let commands = Value::Array(dep.allowed_commands.iter().cloned().map(Value::String).collect());
    write!(out, "  mock_outputs_allowed_terraform_commands = ")?;
    write_value(out, &commands, 2)?;
    writeln!(out)?;
    writeln!(out, "}}")?;
    Ok(())
}

fn render_inputs(out: &mut String, inputs: &[(String, Expression)]) -> Result<(), RenderError> {
    if inputs.is_empty() {
        writeln!(out, "inputs = {{}}")?;
        return Ok(());
    }
    writeln!(out, "inputs = {{")?;
    for (name, expr) in inputs {
        write!(out, "  {} = ", object_key(name))?;
        match expr {
            Expression::Literal(value) => write_value(out, value, 2)?,
            Expression::DependencyOutput { dependency, output } => {
                require_identifier("dependency", dependency)?;
                require_identifier("output", output)?;
                write!(out, "dependency.{dependency}.outputs.{output}")?;
            }
        }
        writeln!(out)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Renders a configuration document.
///
/// # Errors
///
/// Returns `RenderError::InvalidIdentifier` if a dependency or output name
/// cannot appear in a traversal expression.
pub fn render(doc: &ConfigDocument) -> Result<String, RenderError> {
    let mut sections = Vec::new();
    for include in &doc.includes {
        let mut s = String::new();
        render_include(&mut s, include)?;
        sections.push(s);
    }
    if let Some(source) = &doc.source {
        sections.push(format!("terraform {{\n  source = {}\n}}\n", quote(source)));
    }
    for dep in &doc.dependencies {
        let mut s = String::new();
        render_dependency(&mut s, dep)?;
        sections.push(s);
    }
    let mut s = String::new();
    render_inputs(&mut s, &doc.inputs)?;
    sections.push(s);
    Ok(sections.join("\n"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("vpc_id"));
        assert!(is_identifier("web-sg"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn quote_escapes_templates_and_specials() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a \"b\""), "\"a \\\"b\\\"\"");
        assert_eq!(quote("${var.x}"), "\"$${var.x}\"");
        assert_eq!(quote("%{if}"), "\"%%{if}\"");
        assert_eq!(quote("cost $5"), "\"cost $5\"");
    }

    #[test]
    fn renders_nested_values() {
        let value = json!({"Name": "web", "needs quote": [1, 2], "nested": {"k": true}});
        let text = render_value(&value, 0).expect("render");
        assert!(text.contains("Name = \"web\""));
        assert!(text.contains("\"needs quote\" = [1, 2]"));
        assert!(text.contains("nested = {\n    k = true\n  }"));
    }

    #[test]
    fn empty_document_renders_empty_inputs() {
        let text = render(&ConfigDocument::default()).expect("render");
        assert_eq!(text, "inputs = {}\n");
    }

    #[test]
    fn invalid_dependency_name_fails() {
        let doc = ConfigDocument {
            inputs: vec![(
                "vpc_id".into(),
                Expression::DependencyOutput {
                    dependency: "my vpc".into(),
                    output: "vpc_id".into(),
                },
            )],
            ..ConfigDocument::default()
        };
        let err = render(&doc).unwrap_err();
        assert!(err.to_string().contains("my vpc"), "got: {err}");
    }
}
