//! Variable specs and the checks run against them.

use std::fmt;
use std::str::FromStr;

use lib_env::{Env, EnvSource};
use serde::Serialize;
use thiserror::Error;

/// How a variable is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Required string (`must_get`)
    Str,
    /// Optional string (`get`)
    Opt,
    /// Boolean, default `false`
    Bool,
    /// Unsigned integer, default `0`
    Uint,
    /// Required comma separated list
    List,
}

impl FromStr for Kind {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "str" | "string" => Ok(Kind::Str),
            "opt" => Ok(Kind::Opt),
            "bool" => Ok(Kind::Bool),
            "uint" | "u32" => Ok(Kind::Uint),
            "list" | "array" => Ok(Kind::List),
            _ => Err(SpecError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Kind::Str => "str",
            Kind::Opt => "opt",
            Kind::Bool => "bool",
            Kind::Uint => "uint",
            Kind::List => "list",
        };
        f.write_str(label)
    }
}

/// `NAME` or `NAME:KIND` from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarSpec {
    pub name: String,
    pub kind: Kind,
}

impl FromStr for VarSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, kind) = match s.split_once(':') {
            Some((name, kind)) => (name.trim(), kind.trim().parse()?),
            None => (s.trim(), Kind::Str),
        };

        if name.is_empty() {
            return Err(SpecError::EmptyName(s.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }
}

/// Value parser for clap.
pub fn parse_var_spec(s: &str) -> Result<VarSpec, SpecError> {
    s.parse()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Bool(bool),
    Uint(u32),
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => write!(f, "{text:?}"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Uint(number) => write!(f, "{number}"),
            Value::List(items) => write!(f, "{items:?}"),
        }
    }
}

/// Outcome of resolving one variable.
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Check {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub checks: Vec<Check>,
    pub failed: usize,
}

pub fn check_var<S: EnvSource>(env: &Env<S>, spec: &VarSpec, redact: bool) -> Check {
    let name = spec.name.as_str();
    let resolved = match spec.kind {
        Kind::Str => env.must_get(name).map(Value::Text),
        Kind::Opt => Ok(Value::Text(env.get(name))),
        Kind::Bool => Ok(Value::Bool(env.get_bool_or(name, false))),
        Kind::Uint => env.get_uint_or(name, 0).map(Value::Uint),
        Kind::List => env.must_get_array(name, ",", false, true).map(Value::List),
    };

    let (value, error) = match resolved {
        Ok(value) if redact => (Some(redacted(value)), None),
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err.to_string())),
    };

    Check {
        name: spec.name.clone(),
        kind: spec.kind,
        value,
        error,
    }
}

pub fn run_checks<S: EnvSource>(env: &Env<S>, specs: &[VarSpec], redact: bool) -> Report {
    let checks: Vec<Check> = specs
        .iter()
        .map(|spec| check_var(env, spec, redact))
        .collect();
    let failed = checks.iter().filter(|check| !check.is_ok()).count();

    Report { checks, failed }
}

/// Strings and list elements are masked; numbers and flags are kept.
fn redacted(value: Value) -> Value {
    const MASK: &str = "***";

    match value {
        Value::Text(text) if text.is_empty() => Value::Text(text),
        Value::Text(_) => Value::Text(MASK.to_string()),
        Value::List(items) => Value::List(items.iter().map(|_| MASK.to_string()).collect()),
        other => other,
    }
}

// region:    --- Error
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("empty variable name in spec {0:?}")]
    EmptyName(String),

    #[error("unknown kind {0:?} (expected str, opt, bool, uint or list)")]
    UnknownKind(String),
}
// endregion: --- Error
