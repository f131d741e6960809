use std::fmt;

use serde::Serialize;

use busbind_contracts::BUSBINDC_REPORT_SCHEMA_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Signature,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl Diagnostic {
    pub fn error(code: &str, stage: Stage, message: impl Into<String>, line: Option<u64>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            stage,
            message: message.into(),
            line,
        }
    }

    pub fn warning(code: &str, stage: Stage, message: impl Into<String>, line: Option<u64>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Warning,
            stage,
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}: {} [{}] (line {line})",
                self.severity, self.message, self.code
            ),
            None => write!(f, "{}: {} [{}]", self.severity, self.message, self.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub schema_version: String,
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn ok() -> Self {
        Self {
            schema_version: BUSBINDC_REPORT_SCHEMA_VERSION.to_string(),
            ok: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            a.line
                .cmp(&b.line)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.ok = diagnostics.iter().all(|d| d.severity != Severity::Error);
        self.diagnostics = diagnostics;
        self
    }
}
