//! Newline-delimited JSON invocation stream.
//!
//! Each input line is `{"function": "...", "args": [...]}`. Arguments are
//! strings; bare JSON numbers are accepted and passed on in decimal form.
//! Each line produces exactly one output line, a [`ResultLine`].

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use assetledger_contracts::{ContractError, Invocation};

use crate::executor::{Execution, Executor};

/// One input line.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    /// Turn the raw positional arguments into a typed invocation.
    pub fn into_invocation(self) -> Result<Invocation, ContractError> {
        let args = self
            .args
            .into_iter()
            .map(|arg| match arg {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(ContractError::InvalidArguments(format!(
                    "arguments must be strings or numbers, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Invocation::parse(&self.function, &args)
    }
}

/// The published form of an event: payload decoded back into JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLine {
    pub name: String,
    pub payload: Value,
}

/// Why an invocation did not commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLine {
    pub code: String,
    pub message: String,
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultLine {
    pub function: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorLine>,
}

impl ResultLine {
    pub fn from_result(function: &str, result: &Result<Execution, ContractError>) -> Self {
        match result {
            Ok(execution) => Self {
                function: function.to_string(),
                ok: true,
                tx_id: Some(execution.receipt.tx_id.clone()),
                payload: execution.payload.as_deref().map(as_json),
                event: execution.receipt.event.as_ref().map(|e| EventLine {
                    name: e.name.clone(),
                    payload: as_json(&e.payload),
                }),
                error: None,
            },
            Err(e) => Self::failed(function, e.code(), e.to_string()),
        }
    }

    pub fn failed(function: &str, code: &str, message: String) -> Self {
        Self {
            function: function.to_string(),
            ok: false,
            tx_id: None,
            payload: None,
            event: None,
            error: Some(ErrorLine {
                code: code.to_string(),
                message,
            }),
        }
    }
}

/// Contract payloads are JSON; anything else is passed through as text.
fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Totals for one drained stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub committed: usize,
    pub failed: usize,
}

/// Execute every line of `input`, writing one result line per invocation
/// to `output`. Blank lines are skipped.
pub fn process<R: BufRead, W: Write>(
    executor: &Executor,
    input: R,
    mut output: W,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read input line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let result_line = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let function = request.function.clone();
                match request.into_invocation() {
                    Ok(invocation) => {
                        ResultLine::from_result(&function, &executor.execute(&invocation))
                    }
                    Err(e) => ResultLine::from_result(&function, &Err(e)),
                }
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "malformed request");
                ResultLine::failed("", "MalformedRequest", e.to_string())
            }
        };

        if result_line.ok {
            summary.committed += 1;
        } else {
            summary.failed += 1;
        }

        serde_json::to_writer(&mut output, &result_line).context("failed to encode result")?;
        writeln!(output).context("failed to write result")?;
    }

    output.flush().context("failed to flush output")?;
    info!(committed = summary.committed, failed = summary.failed, "input drained");
    Ok(summary)
}
