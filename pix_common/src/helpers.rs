use std::{env, fmt::Display, str::FromStr};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses the environment variable `name`.
///
/// Returns `Err` with a human-readable reason if the variable is set but cannot be parsed, so that the caller can log
/// it and fall back to `default`. An unset variable silently yields `default`.
pub fn parse_env_or_default<T>(name: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().map_err(|e| format!("{s} is not a valid value for {name}. {e}")),
        Err(_) => Ok(default),
    }
}
