//! Formatting mode configuration.
//!
//! The process-wide mode is set via the `FRANKENFMT_MODE` environment variable
//! (or [`set_mode`] on targets without an environment):
//! - `strict` (default): an unknown conversion character stops formatting.
//!   The directive text is echoed followed by `<invalid>` and the call fails
//!   with [`FormatError::InvalidConversion`](crate::FormatError::InvalidConversion).
//! - `legacy`: an unknown conversion character is echoed as a literal and
//!   formatting continues. This matches the older embedded printf family
//!   that many firmware logs were written against.
//!
//! Overflow and missing-argument errors are fatal in both modes.

use core::sync::atomic::{AtomicU8, Ordering};

/// How the driver treats conversion characters it does not recognize.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Unknown conversions are reported and terminate formatting.
    #[default]
    Strict,
    /// Unknown conversions are echoed literally and formatting continues.
    Legacy,
}

impl Mode {
    /// Parse from string (case-insensitive). Unrecognized input maps to `Strict`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        const LEGACY: [&str; 3] = ["legacy", "compat", "echo"];
        if LEGACY.iter().any(|name| s.eq_ignore_ascii_case(name)) {
            Self::Legacy
        } else {
            Self::Strict
        }
    }

    /// Canonical lowercase name, as accepted by [`Mode::from_str_loose`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Legacy => "legacy",
        }
    }

    /// Returns true if unknown conversion characters are echoed instead of rejected.
    #[must_use]
    pub const fn echoes_unknown_conversions(self) -> bool {
        matches!(self, Self::Legacy)
    }
}

// Cache states: 0=unresolved, 1=Strict, 2=Legacy.
static CACHED_MODE: AtomicU8 = AtomicU8::new(MODE_UNRESOLVED);

const MODE_UNRESOLVED: u8 = 0;
const MODE_STRICT: u8 = 1;
const MODE_LEGACY: u8 = 2;

fn mode_to_u8(mode: Mode) -> u8 {
    match mode {
        Mode::Strict => MODE_STRICT,
        Mode::Legacy => MODE_LEGACY,
    }
}

fn u8_to_mode(v: u8) -> Mode {
    match v {
        MODE_LEGACY => Mode::Legacy,
        _ => Mode::Strict,
    }
}

#[cfg(feature = "std")]
fn resolve_from_env() -> Mode {
    std::env::var("FRANKENFMT_MODE")
        .map(|v| Mode::from_str_loose(&v))
        .unwrap_or_default()
}

#[cfg(not(feature = "std"))]
fn resolve_from_env() -> Mode {
    Mode::Strict
}

/// Get the process-wide mode (reads `FRANKENFMT_MODE` on first call, caches thereafter).
#[must_use]
pub fn mode() -> Mode {
    let cached = CACHED_MODE.load(Ordering::Acquire);
    if cached != MODE_UNRESOLVED {
        return u8_to_mode(cached);
    }
    let resolved = resolve_from_env();
    // A concurrent set_mode wins over the environment.
    match CACHED_MODE.compare_exchange(
        MODE_UNRESOLVED,
        mode_to_u8(resolved),
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => resolved,
        Err(current) => u8_to_mode(current),
    }
}

/// Override the process-wide mode. Later calls to [`mode`] return `mode`.
pub fn set_mode(mode: Mode) {
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
}
