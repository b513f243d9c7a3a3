//! Integer in/out matcher for pickup gesture subtypes.
//!
//! Some pickup sensors already run their own proximity check for certain
//! gesture subtypes. Device config describes which ones with a short spec:
//! `N` marks a subtype in, `!N` marks it out, and `*` / `!*` set the
//! default for everything not listed.

use crate::error::{DozeError, Result};
use std::collections::HashMap;
use std::str::FromStr;

/// Parsed subtype spec, e.g. `"1,!2,*"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeMatcher {
    entries: HashMap<i32, bool>,
    default_in: bool,
}

impl SubtypeMatcher {
    pub fn parse(spec: &str) -> Result<Self> {
        if spec.trim().is_empty() {
            return Err(DozeError::InvalidSubtypeSpec(
                "spec must not be empty".to_string(),
            ));
        }

        let mut entries = HashMap::new();
        let mut default_in = None;

        for item in spec.split(',').map(str::trim) {
            let (is_in, body) = match item.strip_prefix('!') {
                Some(rest) => (false, rest),
                None => (true, item),
            };

            if body == "*" {
                if default_in.replace(is_in).is_some() {
                    return Err(DozeError::InvalidSubtypeSpec(format!(
                        "duplicate default in \"{spec}\""
                    )));
                }
                continue;
            }

            let value: i32 = body.parse().map_err(|_| {
                DozeError::InvalidSubtypeSpec(format!("bad item \"{item}\" in \"{spec}\""))
            })?;
            if entries.insert(value, is_in).is_some() {
                return Err(DozeError::InvalidSubtypeSpec(format!(
                    "duplicate key {value} in \"{spec}\""
                )));
            }
        }

        let default_in = default_in.ok_or_else(|| {
            DozeError::InvalidSubtypeSpec(format!("no default (* or !*) in \"{spec}\""))
        })?;

        Ok(Self {
            entries,
            default_in,
        })
    }

    /// Matcher that rejects every subtype.
    pub fn none() -> Self {
        Self {
            entries: HashMap::new(),
            default_in: false,
        }
    }

    pub fn matches(&self, subtype: i32) -> bool {
        self.entries.get(&subtype).copied().unwrap_or(self.default_in)
    }
}

impl Default for SubtypeMatcher {
    fn default() -> Self {
        Self::none()
    }
}

impl FromStr for SubtypeMatcher {
    type Err = DozeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
