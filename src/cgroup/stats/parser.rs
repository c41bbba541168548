//! Generic, lossy parsing of Linux cgroup and procfs statistics files.
//!
//! Files such as `cpu.stat`, `memory.stat`, `io.stat` or `/proc/meminfo` are read in a
//! single pass: every line is tokenized into key/value pairs, each known key is dispatched
//! to its handler by lookup, and unknown keys are skipped. Parsing never fails. A malformed
//! value leaves its field at zero and is reported back as a [`StatParseError`] diagnostic,
//! so callers can log it and keep the rest of the record.
//!
//! # Traits
//!
//! - [`KeyValueStat`]: multi-line key/value files, whitespace- or `=`-separated.
//! - [`SingleLineStat`]: files holding one number, like `memory.current`.
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use docker_sysinfo::cgroup::stats::KeyValueStat;
//! use std::sync::LazyLock;
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//!     bar: u64,
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut MyStat, u64)>> =
//!     LazyLock::new(|| {
//!         let mut map: HashMap<&'static str, fn(&mut MyStat, u64)> = HashMap::new();
//!         map.insert("foo", |s, v| s.foo = v);
//!         map.insert("bar", |s, v| s.bar = v);
//!         map
//!     });
//!
//! impl KeyValueStat for MyStat {
//!     const SPLIT_CHAR: Option<char> = Some('=');
//!     const SKIP_VALUES: usize = 0;
//!     const ALLOW_DUPLICATE_KEYS: bool = false;
//!     const ALLOW_MULTIPLE_KV_PER_LINE: bool = true;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let (stat, errors) = MyStat::parse("foo=1 bar=oops\n");
//! assert_eq!(stat.foo, 1);
//! assert_eq!(stat.bar, 0);
//! assert_eq!(errors.len(), 1);
//! ```

use std::collections::{HashMap, HashSet};

use super::StatParseError;

/// A stat value together with the diagnostics collected while parsing it.
pub type Parsed<T> = (T, Vec<StatParseError>);

/// A trait for parsing structured key-value style `*.stat` files.
///
/// Implementors define a set of known keys and how to apply values for them.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// If set to `Some(char)`, each key-value pair is expected to be joined by that character
    /// (`rbytes=1024`). If `None`, keys and values alternate as whitespace-separated tokens
    /// (`usage_usec 1024`).
    const SPLIT_CHAR: Option<char>;

    /// The number of whitespace-separated tokens to skip at the start of *each line*, e.g.
    /// the `major:minor` device column of `io.stat`.
    const SKIP_VALUES: usize;

    /// If `true`, a key may appear several times (its handler is typically accumulating).
    /// If `false`, a repeated key is reported as [`StatParseError::DuplicateField`] and the
    /// later value wins.
    const ALLOW_DUPLICATE_KEYS: bool;

    /// If `true`, every pair on a line is parsed, otherwise only the first.
    const ALLOW_MULTIPLE_KV_PER_LINE: bool;

    /// Returns a map of known field names to the functions that apply a parsed value.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)>;

    /// Parses `content` in a single pass.
    ///
    /// Always returns a value; fields that are absent or malformed stay at their default.
    fn parse(content: &str) -> Parsed<Self> {
        let mut stat = Self::default();
        let mut errors = Vec::new();
        let handlers = Self::field_handlers();
        let mut seen_keys = HashSet::with_capacity(handlers.len());

        for (idx, line) in content.lines().enumerate() {
            let lineno = idx + 1;
            for (key, val) in Self::tokenize(line) {
                let Some((&known, handler)) = handlers.get_key_value(key) else {
                    continue;
                };
                if !seen_keys.insert(known) && !Self::ALLOW_DUPLICATE_KEYS {
                    errors.push(StatParseError::DuplicateField {
                        field: key.to_owned(),
                        line: lineno,
                    });
                }
                match val.parse::<u64>() {
                    Ok(parsed) => handler(&mut stat, parsed),
                    Err(source) => errors.push(StatParseError::InvalidKeyValue {
                        key: key.to_owned(),
                        value: val.to_owned(),
                        line: lineno,
                        source,
                    }),
                }
            }
        }

        (stat, errors)
    }

    /// Splits one line into its key/value pairs according to the trait configuration.
    ///
    /// Tokens without a value (a dangling key, or a token missing `SPLIT_CHAR`) are dropped.
    fn tokenize(line: &str) -> Vec<(&str, &str)> {
        let mut parts = line.split_whitespace().skip(Self::SKIP_VALUES);
        let mut pairs = Vec::new();

        match Self::SPLIT_CHAR {
            Some(split_char) => {
                for part in parts {
                    if let Some(pair) = part.split_once(split_char) {
                        pairs.push(pair);
                        if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                            break;
                        }
                    }
                }
            }
            None => {
                while let (Some(key), Some(val)) = (parts.next(), parts.next()) {
                    pairs.push((key, val));
                    if !Self::ALLOW_MULTIPLE_KV_PER_LINE {
                        break;
                    }
                }
            }
        }

        pairs
    }
}

/// A trait for single-value statistics files such as `memory.current`.
pub trait SingleLineStat: Sized + Default {
    /// Parses the first line of `content`.
    ///
    /// An empty or malformed value yields `Self::default()` plus a diagnostic.
    fn parse(content: &str) -> Parsed<Self>;
}

/// Parses the first line of `content` as a base-10 `u64`, for [`SingleLineStat`]
/// implementors.
pub(super) fn parse_single_u64(content: &str) -> Result<u64, StatParseError> {
    let value = content.lines().next().unwrap_or_default().trim();
    value
        .parse::<u64>()
        .map_err(|source| StatParseError::InvalidValue {
            value: value.to_owned(),
            line: 1,
            source,
        })
}
