//! # Environment Variables
//!
//! Typed accessors over an [`EnvSource`], in two tiers:
//!
//! - **Silent default**: [`Env::get`], [`Env::get_or`], [`Env::get_bool_or`] and
//!   [`Env::get_array`] never fail. Absence degrades to an empty string, the
//!   supplied default or an empty list.
//! - **Fail fast**: [`Env::must_get`], [`Env::must_get_array`] and the integer
//!   parse inside [`Env::get_uint_or`] return an [`Error`] naming the variable.
//!   Callers decide whether that terminates the process.
//!
//! An unset variable and a variable set to `""` are treated the same everywhere.
//!
//! ```rust
//! use lib_env::{Env, MapEnv};
//!
//! let env = Env::new(MapEnv::from_pairs([("PEERS", "[a, b, c,]")]));
//! assert_eq!(env.get_array("PEERS", ",", false, false), vec!["a", "b", "c"]);
//! assert!(env.must_get("API_KEY").is_err());
//! ```
//!
//! The `*_env` free functions do the same against the process environment.

use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::source::{EnvSource, SystemEnv};

/// Outer quote layers removed by [`Env::must_get`].
const MUST_GET_QUOTE_PASSES: usize = 3;

const DEFAULT_SEPARATOR: &str = ",";

pub type Result<T> = std::result::Result<T, Error>;

// region:    --- Env

/// Accessor over an environment source.
#[derive(Debug, Clone, Default)]
pub struct Env<S = SystemEnv> {
    source: S,
}

impl Env<SystemEnv> {
    /// Accessor over the process environment.
    pub fn system() -> Self {
        Self { source: SystemEnv }
    }
}

impl<S: EnvSource> Env<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Raw value of `name`, or `""` when unset.
    pub fn get(&self, name: &str) -> String {
        self.source.var(name).unwrap_or_default()
    }

    /// Value of a required variable.
    ///
    /// Surrounding `"` and `'` characters are stripped in a fixed number of
    /// passes, which unwraps values quoted more than once by config templating.
    pub fn must_get(&self, name: &str) -> Result<String> {
        let value = self.get(name);
        if value.is_empty() {
            debug!(var = name, "required env var is missing");
            return Err(Error::MissingEnv(name.to_string()));
        }

        let mut trimmed = value.as_str();
        for _ in 0..MUST_GET_QUOTE_PASSES {
            trimmed = trim_quotes(trimmed);
        }

        Ok(trimmed.to_string())
    }

    pub fn exists(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// Value of `name`, or `default` when unset. Surrounding `"` characters are
    /// stripped from whichever one is returned.
    pub fn get_or(&self, name: &str, default: &str) -> String {
        let value = self.get(name);
        let value = if value.is_empty() {
            debug!(var = name, "env var not set, using default");
            default
        } else {
            value.as_str()
        };

        value.trim_matches('"').to_string()
    }

    /// `true` only when the value is `"true"`, ignoring case. Anything else,
    /// including `"1"` and `"yes"`, is `false`.
    pub fn get_bool_or(&self, name: &str, default: bool) -> bool {
        self.get_or(name, &default.to_string()).to_lowercase() == "true"
    }

    /// Base-10 `u32` value of `name`.
    ///
    /// `default` is used only when the variable is unset. A set but malformed
    /// value is an error, never replaced by the default.
    pub fn get_uint_or(&self, name: &str, default: u32) -> Result<u32> {
        let value = self.get_or(name, &default.to_string());
        // digits only, like a strict base-10 parse: no `+` prefix
        if value.starts_with('+') {
            warn!(var = name, "env var has a sign prefix, expected an unsigned integer");
            return Err(Error::SignPrefix {
                name: name.to_string(),
                value,
            });
        }

        match value.parse::<u32>() {
            Ok(parsed) => Ok(parsed),
            Err(source) => {
                warn!(var = name, %source, "env var is not a valid unsigned integer");
                Err(Error::WrongFormat {
                    name: name.to_string(),
                    value,
                    source,
                })
            }
        }
    }

    /// Split a list-valued variable.
    ///
    /// Accepts `a,b,c` as well as a bracketed `[a, b, c,]` form. An empty
    /// `sep` means `,`. Elements are whitespace-trimmed and empty ones dropped.
    /// Unless `allow_quotes` is set, `"` is stripped from both ends of every
    /// element; `trim_quoted` then trims whitespace exposed by that stripping.
    pub fn get_array(
        &self,
        name: &str,
        sep: &str,
        allow_quotes: bool,
        trim_quoted: bool,
    ) -> Vec<String> {
        let value = self.get_or(name, "");
        split_list(&value, sep, allow_quotes, trim_quoted)
    }

    /// [`get_array`](Self::get_array) for a list that must have at least one element.
    pub fn must_get_array(
        &self,
        name: &str,
        sep: &str,
        allow_quotes: bool,
        trim_quoted: bool,
    ) -> Result<Vec<String>> {
        let items = self.get_array(name, sep, allow_quotes, trim_quoted);
        if items.is_empty() {
            debug!(var = name, "required env list is empty");
            return Err(Error::EmptyArray(name.to_string()));
        }

        Ok(items)
    }
}

fn trim_quotes(value: &str) -> &str {
    value.trim_matches(|c: char| c == '"' || c == '\'')
}

fn split_list(value: &str, sep: &str, allow_quotes: bool, trim_quoted: bool) -> Vec<String> {
    let mut value = value.trim();
    if value.is_empty() {
        return Vec::new();
    }

    let sep = if sep.is_empty() { DEFAULT_SEPARATOR } else { sep };

    if value.starts_with('[') && value.ends_with(']') {
        value = value
            .trim_matches(|c: char| c == '[' || c == ']')
            .trim()
            .trim_end_matches(|c: char| sep.contains(c))
            .trim();
    }

    value
        .split(sep)
        .map(str::trim)
        .map(|item| {
            if allow_quotes {
                return item;
            }
            let item = item.trim_matches('"');
            if trim_quoted {
                item.trim()
            } else {
                item
            }
        })
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

// endregion: --- Env

// region:    --- Process Environment

/// [`Env::get`] against the process environment.
pub fn get_env(name: &str) -> String {
    Env::system().get(name)
}

/// [`Env::must_get`] against the process environment.
pub fn must_get_env(name: &str) -> Result<String> {
    Env::system().must_get(name)
}

pub fn env_exists(name: &str) -> bool {
    Env::system().exists(name)
}

pub fn get_env_or(name: &str, default: &str) -> String {
    Env::system().get_or(name, default)
}

pub fn get_env_bool_or(name: &str, default: bool) -> bool {
    Env::system().get_bool_or(name, default)
}

pub fn get_env_uint_or(name: &str, default: u32) -> Result<u32> {
    Env::system().get_uint_or(name, default)
}

pub fn get_env_array(name: &str, sep: &str, allow_quotes: bool, trim_quoted: bool) -> Vec<String> {
    Env::system().get_array(name, sep, allow_quotes, trim_quoted)
}

pub fn must_get_env_array(
    name: &str,
    sep: &str,
    allow_quotes: bool,
    trim_quoted: bool,
) -> Result<Vec<String>> {
    Env::system().must_get_array(name, sep, allow_quotes, trim_quoted)
}

/// Load `.env` from the current directory or one of its parents.
///
/// Variables already present in the process environment win. Returns the path
/// that was loaded, or `None` when no file was found or it could not be read.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Load a specific dotenv file. Existing variables are not overridden.
pub fn load_dotenv_from(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    dotenvy::from_path(path).map_err(|source| Error::DotEnv {
        path: path.to_path_buf(),
        source,
    })
}

// endregion: --- Process Environment

// region:    --- Error
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing env var - {0}")]
    MissingEnv(String),

    #[error("missing env var (empty array) - {0}")]
    EmptyArray(String),

    #[error("invalid unsigned integer in env var - {name}: {value:?} ({source})")]
    WrongFormat {
        name: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid unsigned integer in env var - {name}: {value:?} (sign prefix is not allowed)")]
    SignPrefix { name: String, value: String },

    #[error("failed to load env file {}: {source}", path.display())]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl Error {
    /// Name of the variable the error is about, if any.
    pub fn var_name(&self) -> Option<&str> {
        match self {
            Error::MissingEnv(name) | Error::EmptyArray(name) => Some(name.as_str()),
            Error::WrongFormat { name, .. } | Error::SignPrefix { name, .. } => {
                Some(name.as_str())
            }
            Error::DotEnv { .. } => None,
        }
    }
}
// endregion: --- Error
