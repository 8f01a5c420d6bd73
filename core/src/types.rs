use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProtocolError;

/// Earliest year the demographics endpoint is queried for
pub const MIN_YEAR: i64 = 1950;
/// Latest year the demographics endpoint is queried for
pub const MAX_YEAR: i64 = 2025;
/// Row limit used when the caller does not pass one
pub const DEFAULT_LIMIT: i64 = 100;

/// Validated arguments of the `get_demographics` tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicsArguments {
    pub year: i64,
    /// Country of origin, ISO3, uppercased
    pub coo: Option<String>,
    /// Country of asylum, ISO3, uppercased
    pub coa: Option<String>,
    /// Forwarded as given, sign included
    pub limit: i64,
}

impl DemographicsArguments {
    pub fn new(year: i64) -> Self {
        Self {
            year,
            coo: None,
            coa: None,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Validate raw tool arguments.
    ///
    /// `year` must be an integer in `MIN_YEAR..=MAX_YEAR`. Empty country codes
    /// count as absent.
    pub fn from_value(args: &Value, default_limit: i64) -> Result<Self, ProtocolError> {
        let obj = args.as_object().ok_or_else(|| {
            ProtocolError::invalid_arguments(format!("arguments must be an object, got: {}", args))
        })?;

        let raw_year = obj.get("year").unwrap_or(&Value::Null);
        let year = match raw_year.as_i64() {
            Some(y) if (MIN_YEAR..=MAX_YEAR).contains(&y) => y,
            _ => {
                return Err(ProtocolError::invalid_arguments(format!(
                    "Invalid year: {}",
                    raw_year
                )))
            }
        };

        let limit = match obj.get("limit") {
            None | Some(Value::Null) => default_limit,
            Some(v) => v.as_i64().ok_or_else(|| {
                ProtocolError::invalid_arguments(format!("Invalid limit: {}", v))
            })?,
        };

        Ok(Self {
            year,
            coo: country_code(obj.get("coo"), "coo")?,
            coa: country_code(obj.get("coa"), "coa")?,
            limit,
        })
    }

    /// Query string pairs for the upstream request; absent filters are left out
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("year", self.year.to_string())];
        if let Some(coo) = &self.coo {
            pairs.push(("coo", coo.clone()));
        }
        if let Some(coa) = &self.coa {
            pairs.push(("coa", coa.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

fn country_code(value: Option<&Value>, key: &str) -> Result<Option<String>, ProtocolError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_uppercase())),
        Some(other) => Err(ProtocolError::invalid_arguments(format!(
            "Invalid {}: {}",
            key, other
        ))),
    }
}
