//! Fixture loading and argument lowering.

use std::path::Path;

use frankenfmt_core::Mode;
use frankenfmt_core::stdio::{Arg, ArgCursor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Buffer size used when a case does not name one.
pub const DEFAULT_CAPACITY: usize = 512;

/// Errors raised while loading or lowering fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid float_bits literal '{0}'")]
    FloatBits(String),
    #[error("unknown fixture mode '{0}', expected strict|legacy|both")]
    UnknownMode(String),
    #[error("argument lowering finished without reaching the callback")]
    Unlowered,
}

/// One printf argument as written in fixture JSON.
///
/// Externally tagged: `{"int": -3}`, `{"str": "abc"}`, `{"args": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureArg {
    Int(i64),
    Uint(u64),
    Float(f64),
    /// Exact IEEE-754 bits as a hex string, for NaN payloads and `-0.0`.
    FloatBits(String),
    Str(String),
    Ptr(u64),
    /// An argument list captured as a cursor, consumed by `%r`.
    Args(Vec<FixtureArg>),
}

/// A single fixture test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// C standard or extension section the case exercises.
    #[serde(default)]
    pub section: String,
    /// Format string.
    pub format: String,
    /// Arguments, in directive order.
    #[serde(default)]
    pub args: Vec<FixtureArg>,
    /// Destination buffer size, terminator included.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Bytes stored in the buffer before the terminator.
    pub expected_output: String,
    /// What the C-shaped wrapper returns: logical length or `-1`.
    pub expected_return: i64,
    /// `strict`, `legacy` or `both`.
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_mode() -> String {
    String::from("both")
}

impl FixtureCase {
    /// Returns true if the case applies to `mode`.
    pub fn applies_to(&self, mode: Mode) -> Result<bool, FixtureError> {
        match self.mode.to_ascii_lowercase().as_str() {
            "both" => Ok(true),
            "strict" => Ok(mode == Mode::Strict),
            "legacy" => Ok(mode == Mode::Legacy),
            _ => Err(FixtureError::UnknownMode(self.mode.clone())),
        }
    }
}

/// A collection of fixture cases for one conversion family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Conversion family name.
    pub family: String,
    /// UTC timestamp of capture.
    pub captured_at: String,
    /// Individual test cases.
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, FixtureError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Load every `*.json` file in `dir`, sorted by path.
    ///
    /// Files that fail to parse are returned alongside the loaded sets.
    pub fn load_dir(dir: &Path) -> Result<(Vec<Self>, Vec<FixtureError>), FixtureError> {
        let entries = std::fs::read_dir(dir).map_err(|source| FixtureError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut sets = Vec::new();
        let mut errors = Vec::new();
        for path in paths {
            match Self::from_file(&path) {
                Ok(set) => sets.push(set),
                Err(err) => errors.push(err),
            }
        }
        Ok((sets, errors))
    }
}

// ---------------------------------------------------------------------------
// Lowering to engine arguments
// ---------------------------------------------------------------------------

/// Lower `args` to engine arguments and hand them to `f`.
///
/// Nested `args` lists become [`ArgCursor`]s that borrow storage living on
/// this call's stack, which is why the result is passed to a callback.
pub fn with_lowered<R>(
    args: &[FixtureArg],
    f: impl FnOnce(&[Arg<'_>]) -> R,
) -> Result<R, FixtureError> {
    let mut f = Some(f);
    let mut out = None;
    lower_into(args, Vec::new(), &mut |lowered: &[Arg<'_>]| {
        if let Some(f) = f.take() {
            out = Some(f(lowered));
        }
    })?;
    out.ok_or(FixtureError::Unlowered)
}

fn lower_into<'a>(
    rest: &'a [FixtureArg],
    mut done: Vec<Arg<'a>>,
    f: &mut dyn FnMut(&[Arg<'_>]),
) -> Result<(), FixtureError> {
    let Some((first, tail)) = rest.split_first() else {
        f(&done);
        return Ok(());
    };
    let scalar = match first {
        FixtureArg::Args(inner) => {
            let mut outcome = Ok(());
            lower_into(inner, Vec::new(), &mut |nested: &[Arg<'_>]| {
                let mut merged: Vec<Arg<'_>> = done.clone();
                merged.push(Arg::from(ArgCursor::new(nested)));
                outcome = lower_into(tail, merged, &mut *f);
            })?;
            return outcome;
        }
        FixtureArg::Int(v) => Arg::Int(*v),
        FixtureArg::Uint(v) => Arg::Uint(*v),
        FixtureArg::Float(v) => Arg::Float(*v),
        FixtureArg::FloatBits(bits) => Arg::Float(parse_float_bits(bits)?),
        FixtureArg::Str(s) => Arg::Str(s.as_bytes()),
        FixtureArg::Ptr(p) => Arg::Ptr(*p as usize),
    };
    done.push(scalar);
    lower_into(tail, done, f)
}

fn parse_float_bits(text: &str) -> Result<f64, FixtureError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
        .replace('_', "");
    u64::from_str_radix(&digits, 16)
        .map(f64::from_bits)
        .map_err(|_| FixtureError::FloatBits(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_defaults_apply() {
        let set = FixtureSet::from_json(
            r#"{
                "version":"v1",
                "family":"printf/integer",
                "captured_at":"2026-10-01T00:00:00Z",
                "cases":[
                    {"name":"plain","format":"%d","args":[{"int":7}],"expected_output":"7","expected_return":1}
                ]
            }"#,
        )
        .expect("valid fixture json");
        let case = &set.cases[0];
        assert_eq!(case.capacity, DEFAULT_CAPACITY);
        assert_eq!(case.mode, "both");
        assert!(case.applies_to(Mode::Strict).unwrap());
        assert!(case.applies_to(Mode::Legacy).unwrap());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let case = FixtureCase {
            name: String::from("x"),
            section: String::new(),
            format: String::from("x"),
            args: Vec::new(),
            capacity: 8,
            expected_output: String::from("x"),
            expected_return: 1,
            mode: String::from("hardened"),
        };
        assert!(matches!(
            case.applies_to(Mode::Strict),
            Err(FixtureError::UnknownMode(_))
        ));
    }

    #[test]
    fn args_parse_as_tagged_objects() {
        let args: Vec<FixtureArg> = serde_json::from_str(
            r#"[{"int":-1},{"uint":18446744073709551615},{"float":0.5},
                {"float_bits":"0x8000000000000000"},{"str":"hi"},{"ptr":4660},
                {"args":[{"int":2}]}]"#,
        )
        .unwrap();
        assert_eq!(args.len(), 7);
        assert_eq!(args[1], FixtureArg::Uint(u64::MAX));
        assert_eq!(args[6], FixtureArg::Args(vec![FixtureArg::Int(2)]));
    }

    #[test]
    fn lowering_preserves_order_and_bits() {
        let args = vec![
            FixtureArg::Str(String::from("s")),
            FixtureArg::FloatBits(String::from("0x8000_0000_0000_0000")),
            FixtureArg::Ptr(0x1234),
        ];
        let kinds = with_lowered(&args, |lowered| {
            lowered
                .iter()
                .map(|arg| match arg {
                    Arg::Str(s) => format!("str:{}", String::from_utf8_lossy(s)),
                    Arg::Float(v) => format!("float:{}", v.is_sign_negative()),
                    Arg::Ptr(p) => format!("ptr:{p:x}"),
                    other => format!("{other:?}"),
                })
                .collect::<Vec<_>>()
        })
        .unwrap();
        assert_eq!(kinds, ["str:s", "float:true", "ptr:1234"]);
    }

    #[test]
    fn nested_lists_become_cursors() {
        let args = vec![
            FixtureArg::Str(String::from("%d")),
            FixtureArg::Args(vec![FixtureArg::Int(5), FixtureArg::Int(6)]),
            FixtureArg::Int(9),
        ];
        let (len, remaining) = with_lowered(&args, |lowered| {
            let remaining = match lowered[1] {
                Arg::Cursor(cursor) => cursor.remaining(),
                _ => 0,
            };
            (lowered.len(), remaining)
        })
        .unwrap();
        assert_eq!(len, 3);
        assert_eq!(remaining, 2);
    }

    #[test]
    fn bad_float_bits_are_reported() {
        let args = vec![FixtureArg::FloatBits(String::from("0xnothex"))];
        assert!(matches!(
            with_lowered(&args, |_| ()),
            Err(FixtureError::FloatBits(_))
        ));
    }
}
