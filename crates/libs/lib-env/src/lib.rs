//! # Environment Library
//!
//! Typed access to environment variables and UTC time helpers.
//!
//! - [`envs`] - string, bool, `u32` and list accessors with required variants
//! - [`source`] - where variable values come from (process environment or in-memory)
//! - [`time`] - UTC clock readings and RFC3339 nanosecond text

pub mod envs;
pub mod source;
pub mod time;

// Re-export commonly used items
pub use envs::{
    env_exists, get_env, get_env_array, get_env_bool_or, get_env_or, get_env_uint_or,
    load_dotenv, load_dotenv_from, must_get_env, must_get_env_array, Env,
};
pub use source::{EnvSource, MapEnv, SystemEnv};
pub use time::{
    format_nanos_string, from_epoch_text, millis_from, millis_since_epoch, nanos_from,
    nanos_since_epoch, now, secs_since_epoch, to_epoch_text,
};
