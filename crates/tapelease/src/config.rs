//! Application configuration from CLI flags and environment.

use std::time::Duration;

use clap::Parser;

/// tapelease — evaluate a recorded tape over a grid using a pool of leased copies.
#[derive(Parser, Debug)]
#[command(name = "tapelease", version, about)]
pub struct AppConfig {
    /// Number of tape copies in the pool.
    #[arg(short, long, default_value = "4", env = "TAPELEASE_INSTANCES")]
    pub instances: usize,

    /// Number of grid points (x = 0, 1, ..., points - 1).
    #[arg(short, long, default_value = "100")]
    pub points: usize,

    /// Coefficient of the recorded function y = coef * x^2.
    #[arg(long, default_value = "3.0", allow_negative_numbers = true)]
    pub coef: f64,

    /// Worker threads (0 = one per CPU).
    #[arg(long, default_value = "0", env = "TAPELEASE_THREADS")]
    pub threads: usize,

    /// How long a worker waits for a free copy (e.g., "500ms", "5s"; "0" waits forever).
    #[arg(long, default_value = "0")]
    pub timeout: String,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (only print the outcome).
    #[arg(short, long)]
    pub quiet: bool,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Acquire timeout, or `None` to block until a copy is free.
    pub fn acquire_timeout(&self) -> Result<Option<Duration>, String> {
        match parse_duration(&self.timeout) {
            Some(d) if d.is_zero() => Ok(None),
            Some(d) => Ok(Some(d)),
            None => Err(format!("invalid timeout: {:?}", self.timeout)),
        }
    }
}

/// Parse a duration string like "5m", "1h", "30s", "250ms".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n * 60))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n * 3600))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("tapelease").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("7"), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.points, 100);
        assert_eq!(cfg.threads, 0);
        assert!((cfg.coef - 3.0).abs() < f64::EPSILON);
        assert_eq!(cfg.acquire_timeout(), Ok(None));
    }

    #[test]
    fn timeout_flag() {
        let cfg = config(&["--timeout", "500ms"]);
        assert_eq!(cfg.acquire_timeout(), Ok(Some(Duration::from_millis(500))));
        let cfg = config(&["--timeout", "later"]);
        assert!(cfg.acquire_timeout().is_err());
    }

    #[test]
    fn short_flags() {
        let cfg = config(&["-i", "2", "-p", "10", "-q", "--coef", "-1.5"]);
        assert_eq!(cfg.instances, 2);
        assert_eq!(cfg.points, 10);
        assert!(cfg.quiet);
        assert!((cfg.coef + 1.5).abs() < f64::EPSILON);
    }
}
