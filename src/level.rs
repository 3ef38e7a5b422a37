// Copyright (C) 2025-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of gelf-udp.
//
// gelf-udp is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// gelf-udp is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
// even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with gelf-udp.  If not,
// see <http://www.gnu.org/licenses/>.

//! GELF severity level definitions & resolution.
//!
//! GELF inherits the eight syslog severity classes (RFC [5424] calls them, somewhat loftily,
//! "severities"); each has a numeric code and a lower-case name. The table here is total &
//! injective in both directions and never mutated after process start.
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! Callers, however, rarely hand us a member of the table. They hand us a number, a name in
//! arbitrary case, or some level-shaped value of their own devising. [`LevelSpec`] models that
//! heterogeneous request and [`resolve`] turns it into whatever subset of `{code, name}` can
//! actually be recovered. Resolution degrades gracefully: an unrecognized code keeps the code &
//! drops the name, an unrecognized name keeps the name & drops the code, and the document goes
//! out either way.

/// One of the eight syslog-derived severity classes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SeverityLevel {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// system is unusable
pub const EMERGENCY: SeverityLevel = SeverityLevel {
    code: 0,
    name: "emergency",
    description: "system is unusable",
};
/// action must be taken immediately
pub const ALERT: SeverityLevel = SeverityLevel {
    code: 1,
    name: "alert",
    description: "action must be taken immediately",
};
/// critical conditions
pub const CRITICAL: SeverityLevel = SeverityLevel {
    code: 2,
    name: "critical",
    description: "critical conditions",
};
/// error conditions
pub const ERROR: SeverityLevel = SeverityLevel {
    code: 3,
    name: "error",
    description: "error conditions",
};
/// warning conditions
pub const WARNING: SeverityLevel = SeverityLevel {
    code: 4,
    name: "warning",
    description: "warning conditions",
};
/// normal, but significant, condition
pub const NOTICE: SeverityLevel = SeverityLevel {
    code: 5,
    name: "notice",
    description: "normal, but significant, condition",
};
/// informational message
pub const INFO: SeverityLevel = SeverityLevel {
    code: 6,
    name: "info",
    description: "informational message",
};
/// debug level message
pub const DEBUG: SeverityLevel = SeverityLevel {
    code: 7,
    name: "debug",
    description: "debug level message",
};

/// The canonical table, EMERGENCY (0) through DEBUG (7).
pub const LEVELS: [SeverityLevel; 8] = [
    EMERGENCY, ALERT, CRITICAL, ERROR, WARNING, NOTICE, INFO, DEBUG,
];

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "{}", self.name)
    }
}

/// A caller-supplied, level-shaped value: a numeric code, a name, or a custom code/name pair.
///
/// `Custom` is accepted verbatim with no validation against the canonical table; callers may
/// pass a pair whose code & name disagree and we will ship it as-is.
#[derive(Clone, Debug, PartialEq)]
pub enum LevelSpec {
    Code(i64),
    Name(String),
    Custom {
        code: Option<i64>,
        name: Option<String>,
    },
}

impl From<SeverityLevel> for LevelSpec {
    fn from(level: SeverityLevel) -> Self {
        LevelSpec::Custom {
            code: Some(level.code as i64),
            name: Some(level.name.to_string()),
        }
    }
}

impl From<&SeverityLevel> for LevelSpec {
    fn from(level: &SeverityLevel) -> Self {
        LevelSpec::from(*level)
    }
}

impl From<i64> for LevelSpec {
    fn from(code: i64) -> Self {
        LevelSpec::Code(code)
    }
}

impl From<&str> for LevelSpec {
    fn from(name: &str) -> Self {
        LevelSpec::Name(name.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(name: String) -> Self {
        LevelSpec::Name(name)
    }
}

/// Whatever subset of `{code, name}` resolution could recover.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedLevel {
    pub code: Option<i64>,
    pub name: Option<String>,
}

impl From<SeverityLevel> for ResolvedLevel {
    fn from(level: SeverityLevel) -> Self {
        ResolvedLevel {
            code: Some(level.code as i64),
            name: Some(level.name.to_string()),
        }
    }
}

/// Look up a canonical level by code.
pub fn by_code(code: i64) -> Option<SeverityLevel> {
    LEVELS.iter().find(|l| l.code as i64 == code).copied()
}

/// Look up a canonical level by (exact, lower-case) name.
pub fn by_name(name: &str) -> Option<SeverityLevel> {
    LEVELS.iter().find(|l| l.name == name).copied()
}

/// Resolve a requested level against the configured fallback.
///
/// - absent request: substitute `fallback` & resolve that
/// - `Custom`: code & name taken verbatim, no validation
/// - `Code`: canonical lookup; an unknown code yields `{code, no name}`
/// - `Name`: trimmed, lower-cased canonical lookup; an unknown name yields `{name, no code}`
pub fn resolve(requested: Option<&LevelSpec>, fallback: &LevelSpec) -> ResolvedLevel {
    let spec = requested.unwrap_or(fallback);
    match spec {
        LevelSpec::Custom { code, name } => ResolvedLevel {
            code: *code,
            name: name.clone(),
        },
        LevelSpec::Code(code) => match by_code(*code) {
            Some(level) => level.into(),
            None => ResolvedLevel {
                code: Some(*code),
                name: None,
            },
        },
        LevelSpec::Name(name) => {
            let name = name.trim().to_lowercase();
            match by_name(&name) {
                Some(level) => level.into(),
                None => ResolvedLevel {
                    code: None,
                    name: Some(name),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_and_injective() {
        for (i, level) in LEVELS.iter().enumerate() {
            assert_eq!(level.code as usize, i);
            assert_eq!(by_code(level.code as i64), Some(*level));
            assert_eq!(by_name(level.name), Some(*level));
        }
        assert_eq!(format!("{}", NOTICE), "notice");
    }

    #[test]
    fn resolve_by_code() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(Some(&LevelSpec::Code(6)), &fallback);
        assert_eq!(r.code, Some(6));
        assert_eq!(r.name.as_deref(), Some("info"));
    }

    #[test]
    fn resolve_by_name_is_case_insensitive() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(Some(&LevelSpec::Name("  ERROR ".to_string())), &fallback);
        assert_eq!(r.code, Some(3));
        assert_eq!(r.name.as_deref(), Some("error"));
    }

    #[test]
    fn unknown_code_keeps_code_drops_name() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(Some(&LevelSpec::Code(999)), &fallback);
        assert_eq!(r.code, Some(999));
        assert_eq!(r.name, None);
    }

    #[test]
    fn unknown_name_keeps_name_drops_code() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(Some(&LevelSpec::Name("Catastrophic".to_string())), &fallback);
        assert_eq!(r.code, None);
        assert_eq!(r.name.as_deref(), Some("catastrophic"));
    }

    #[test]
    fn absent_request_uses_fallback() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(None, &fallback);
        assert_eq!(r.code, Some(6));
        assert_eq!(r.name.as_deref(), Some("info"));

        // A fallback expressed as a bare name goes through the same arms.
        let r = resolve(None, &LevelSpec::Name("WARNING".to_string()));
        assert_eq!(r.code, Some(4));
        assert_eq!(r.name.as_deref(), Some("warning"));
    }

    #[test]
    fn custom_pair_is_taken_verbatim() {
        let fallback = LevelSpec::from(INFO);
        let r = resolve(
            Some(&LevelSpec::Custom {
                code: Some(42),
                name: Some("shiny".to_string()),
            }),
            &fallback,
        );
        assert_eq!(r.code, Some(42));
        assert_eq!(r.name.as_deref(), Some("shiny"));
    }
}
