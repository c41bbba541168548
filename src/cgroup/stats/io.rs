//! Parsing of the cgroup v2 `io.stat` file.
//!
//! Each line describes one block device: a `major:minor` column followed by
//! `key=value` tokens. Counters are summed across devices into one [`IoStat`]. Unknown
//! keys and tokens without `=` are skipped, and a malformed value only zeroes its own
//! contribution.
//!
//! # Example
//!
//! ```rust
//! use docker_sysinfo::cgroup::stats::{IoStat, KeyValueStat};
//!
//! let data = "\
//! 8:0 rbytes=1024 wbytes=2048 rios=12 wios=24
//! 254:0 rbytes=1024 wbytes=2048 rios=12 wios=24
//! ";
//! let (io_stat, _) = IoStat::parse(data);
//!
//! assert_eq!(io_stat.rbytes, 2048);
//! assert_eq!(io_stat.wbytes, 4096);
//! assert_eq!(io_stat.rios, 24);
//! assert_eq!(io_stat.wios, 48);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parser::KeyValueStat;

/// Aggregated I/O counters from `io.stat`, summed across all devices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IoStat {
    /// Total number of bytes read.
    pub rbytes: u64,
    /// Total number of bytes written.
    pub wbytes: u64,
    /// Total number of read operations.
    pub rios: u64,
    /// Total number of write operations.
    pub wios: u64,
}

impl IoStat {
    fn add_rbytes(&mut self, rbytes: u64) {
        self.rbytes = self.rbytes.saturating_add(rbytes);
    }

    fn add_wbytes(&mut self, wbytes: u64) {
        self.wbytes = self.wbytes.saturating_add(wbytes);
    }

    fn add_rios(&mut self, rios: u64) {
        self.rios = self.rios.saturating_add(rios);
    }

    fn add_wios(&mut self, wios: u64) {
        self.wios = self.wios.saturating_add(wios);
    }
}

type Accumulator = fn(&mut IoStat, u64);

static ACCUMULATORS: LazyLock<HashMap<&'static str, Accumulator>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Accumulator> = HashMap::with_capacity(4);

    m.insert("rbytes", IoStat::add_rbytes);
    m.insert("wbytes", IoStat::add_wbytes);
    m.insert("rios", IoStat::add_rios);
    m.insert("wios", IoStat::add_wios);

    m
});

impl KeyValueStat for IoStat {
    const SPLIT_CHAR: Option<char> = Some('=');
    const SKIP_VALUES: usize = 1;
    const ALLOW_DUPLICATE_KEYS: bool = true;
    const ALLOW_MULTIPLE_KV_PER_LINE: bool = true;

    #[inline]
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &ACCUMULATORS
    }
}

#[cfg(test)]
mod tests {
    use crate::cgroup::stats::StatParseError;

    use super::*;

    #[test]
    fn test_parse_empty_io_stat() {
        let (stat, errors) = IoStat::parse("");
        assert_eq!(stat, IoStat::default());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parse_complete_io_stat() {
        let data = "\
8:0 rbytes=1024 wbytes=2048 rios=12 wios=24 dbytes=0 dios=0
254:0 rbytes=1024 wbytes=2048 rios=12 wios=24 dbytes=0 dios=0
";
        let (stat, errors) = IoStat::parse(data);
        assert!(errors.is_empty());
        assert_eq!(stat.rbytes, 2048);
        assert_eq!(stat.wbytes, 4096);
        assert_eq!(stat.rios, 24);
        assert_eq!(stat.wios, 48);
    }

    #[test]
    fn test_missing_wios_leaves_reads_intact() {
        let data = "8:0 rbytes=4096 wbytes=8192 rios=7\n";
        let (stat, errors) = IoStat::parse(data);
        assert!(errors.is_empty());
        assert_eq!(stat.wios, 0);
        assert_eq!(stat.rios, 7);
        assert_eq!(stat.rbytes, 4096);
    }

    #[test]
    fn test_invalid_value_only_zeroes_itself() {
        let data = "\
8:0 rbytes=abc wbytes=100
254:0 rios=12 wios=24
";
        let (stat, errors) = IoStat::parse(data);
        assert_eq!(stat.rbytes, 0);
        assert_eq!(stat.wbytes, 100);
        assert_eq!(stat.rios, 12);
        assert_eq!(stat.wios, 24);

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            StatParseError::InvalidKeyValue {
                key, value, line, ..
            } => {
                assert_eq!(key, "rbytes");
                assert_eq!(value, "abc");
                assert_eq!(*line, 1);
            }
            other => panic!("Expected InvalidKeyValue error, got {other}"),
        }
    }

    #[test]
    fn test_ignore_unknown_and_malformed_tokens() {
        let data = "8:0 foo=100 rbytes=1024 malformedpair wios=24\n";
        let (stat, errors) = IoStat::parse(data);
        assert!(errors.is_empty());
        assert_eq!(stat.rbytes, 1024);
        assert_eq!(stat.wios, 24);
        assert_eq!(stat.wbytes, 0);
        assert_eq!(stat.rios, 0);
    }

    #[test]
    fn test_parse_with_extra_whitespace() {
        let data = "\
8:0    rbytes=1000    wbytes=2000
    ";
        let (stat, _) = IoStat::parse(data);
        assert_eq!(stat.rbytes, 1000);
        assert_eq!(stat.wbytes, 2000);
    }
}
