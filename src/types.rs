use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Lifecycle phase of a single run.
///
/// Phases only move forward:
/// `AwaitingLogCreation -> AwaitingStart -> AwaitingCompletion -> terminal`.
/// `Detached` is the terminal phase used when the completion policy says not
/// to wait for MATLAB to finish. `Cancelled` is entered when the caller stops
/// the run from outside (Ctrl-C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    AwaitingLogCreation,
    AwaitingStart,
    AwaitingCompletion,
    Succeeded,
    Detached,
    Failed,
    TimedOut,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Phase::Succeeded
                | Phase::Detached
                | Phase::Failed
                | Phase::TimedOut
                | Phase::Cancelled
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::AwaitingLogCreation => "awaiting-log-creation",
            Phase::AwaitingStart => "awaiting-start",
            Phase::AwaitingCompletion => "awaiting-completion",
            Phase::Succeeded => "succeeded",
            Phase::Detached => "detached",
            Phase::Failed => "failed",
            Phase::TimedOut => "timed-out",
            Phase::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// What to do once MATLAB has confirmed it started the script.
///
/// - `Wait(d)`: keep polling for `Finished` / `Failed` for at most `d`,
///   measured from the moment the `Started` sentinel was observed.
/// - `Detach`: return immediately; the process is left running (used for
///   interactive sessions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    Wait(Duration),
    Detach,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        CompletionPolicy::Wait(Duration::from_secs(720))
    }
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "detach" => Ok(CompletionPolicy::Detach),
            other => parse_duration(other).map(CompletionPolicy::Wait),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
