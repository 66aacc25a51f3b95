//! Test case definitions

use crate::{defaults, error::AppError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the test table: read `gap` samples per call, `iterations` times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub gap: u64,
    pub iterations: u32,
}

impl TestCase {
    pub const fn new(gap: u64, iterations: u32) -> Self {
        Self { gap, iterations }
    }

    /// Timestamp advance expected between two consecutive reads
    pub fn expected_step(&self, ticks_per_sample: u64) -> u64 {
        self.gap.wrapping_mul(ticks_per_sample)
    }

    /// Total samples the case reads, counting the initial read
    pub fn total_samples(&self) -> u64 {
        self.gap.saturating_mul(self.iterations as u64 + 1)
    }

    /// The standard three-case table
    pub fn default_cases() -> Vec<Self> {
        Self::from_table(defaults::DEFAULT_CASES)
    }

    /// The long soak table
    pub fn extended_cases() -> Vec<Self> {
        Self::from_table(defaults::EXTENDED_CASES)
    }

    fn from_table(table: &[(u64, u32)]) -> Vec<Self> {
        table.iter().map(|&(gap, iterations)| Self::new(gap, iterations)).collect()
    }

    /// Parse a comma-separated list such as `1023:10000,1024:10000`
    pub fn parse_list(value: &str) -> Result<Vec<Self>, AppError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.gap, self.iterations)
    }
}

impl FromStr for TestCase {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (gap, iterations) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| AppError::parse(format!("Invalid test case '{}': expected GAP:ITERATIONS", s)))?;

        let gap: u64 = gap
            .trim()
            .parse()
            .map_err(|e| AppError::parse(format!("Invalid read size in '{}': {}", s, e)))?;
        let iterations: u32 = iterations
            .trim()
            .parse()
            .map_err(|e| AppError::parse(format!("Invalid iteration count in '{}': {}", s, e)))?;

        if gap == 0 {
            return Err(AppError::parse(format!("Read size must be at least 1 sample in '{}'", s)));
        }

        Ok(Self { gap, iterations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case() {
        assert_eq!("1024:10000".parse::<TestCase>().unwrap(), TestCase::new(1024, 10_000));
        assert_eq!(" 1 : 5 ".parse::<TestCase>().unwrap(), TestCase::new(1, 5));

        assert!("1024".parse::<TestCase>().is_err());
        assert!("0:10".parse::<TestCase>().is_err());
        assert!("abc:10".parse::<TestCase>().is_err());
        assert!("10:-1".parse::<TestCase>().is_err());
    }

    #[test]
    fn test_parse_list() {
        let cases = TestCase::parse_list("1023:100, 1024:200,,").unwrap();
        assert_eq!(cases, vec![TestCase::new(1023, 100), TestCase::new(1024, 200)]);
        assert!(TestCase::parse_list("1023:100,bogus").is_err());
    }

    #[test]
    fn test_tables() {
        let defaults = TestCase::default_cases();
        assert_eq!(defaults, vec![
            TestCase::new(1023, 10_000),
            TestCase::new(1024, 10_000),
            TestCase::new(1025, 10_000),
        ]);

        let extended = TestCase::extended_cases();
        assert_eq!(extended.len(), 15);
        assert!(defaults.iter().all(|c| extended.contains(c)));
        assert_eq!(extended.last().unwrap().gap, 64 * 1024);
    }

    #[test]
    fn test_expected_step() {
        let case = TestCase::new(1025, 3);
        assert_eq!(case.expected_step(2), 2050);
        assert_eq!(case.expected_step(1), 1025);
        assert_eq!(case.total_samples(), 4100);
        assert_eq!(case.to_string(), "1025:3");
    }
}
