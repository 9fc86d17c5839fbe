//! Send/expect scripts for dialogues the built-in sequences don't cover.
//!
//! Switch consoles ask for confirmations in places no profile knows about:
//! - `copy running-config startup-config` asks for a filename
//! - `boot system flash secondary` asks "Are you sure?"
//! - `format flash` wants a bare `y`
//!
//! A script is an ordered list of steps, each sending one input and waiting
//! for one landmark before the next step starts.

use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use super::session::Session;
use crate::channel::Landmark;
use crate::error::{ChannelError, Error, Result};

/// One step of a script.
///
/// # Example
///
/// ```rust
/// use ferrocon::driver::ScriptStep;
///
/// let steps = vec![
///     ScriptStep::new("format flash", "are you sure"),
///     ScriptStep::raw("y", "format complete"),
/// ];
/// ```
#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Text to send.
    pub input: String,

    /// Landmark to wait for after sending.
    pub landmark: Landmark,

    /// Send without the line terminator (single keystrokes).
    pub raw: bool,

    /// Wait bound for this step; falls back to the session default.
    pub timeout: Option<Duration>,
}

impl ScriptStep {
    /// A step sending `input` as a command line.
    pub fn new(input: impl Into<String>, landmark: impl Into<Landmark>) -> Self {
        Self {
            input: input.into(),
            landmark: landmark.into(),
            raw: false,
            timeout: None,
        }
    }

    /// A step sending `input` with no terminator.
    pub fn raw(input: impl Into<String>, landmark: impl Into<Landmark>) -> Self {
        Self {
            raw: true,
            ..Self::new(input, landmark)
        }
    }

    /// Bound the wait of this step.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of one executed step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The input that was sent.
    pub input: String,

    /// The line that satisfied the landmark, if any.
    pub matched: Option<String>,

    /// Time from send to match (or to failure).
    pub elapsed: Duration,

    /// Failure message if the wait timed out.
    pub failure: Option<String>,
}

/// Result of a whole script.
#[derive(Debug, Clone)]
pub struct ScriptResult {
    /// Outcomes of the steps that ran, in order.
    pub steps: Vec<StepOutcome>,

    /// Total time for the script.
    pub elapsed: Duration,

    /// Whether a step failed. Steps after a failure are not run.
    pub failed: bool,
}

impl ScriptResult {
    fn new(steps: Vec<StepOutcome>, elapsed: Duration) -> Self {
        let failed = steps.iter().any(|s| s.failure.is_some());
        Self {
            steps,
            elapsed,
            failed,
        }
    }

    /// Line matched by the last step.
    pub fn last_match(&self) -> Option<&str> {
        self.steps.last().and_then(|s| s.matched.as_deref())
    }

    /// Every matched line, in step order.
    pub fn matches(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| s.matched.as_deref())
    }
}

/// Builder for scripts.
///
/// # Example
///
/// ```rust
/// use ferrocon::driver::ScriptBuilder;
/// use std::time::Duration;
///
/// let steps = ScriptBuilder::new()
///     .send("copy running-config startup-config")
///     .expect("destination filename")
///     .send("")
///     .expect("copy done")
///     .with_timeout(Duration::from_secs(60))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    steps: Vec<ScriptStep>,
    default_timeout: Option<Duration>,
}

impl ScriptBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command line to send. Must be followed by `expect()`.
    pub fn send(self, input: impl Into<String>) -> PendingStep {
        PendingStep {
            builder: self,
            input: input.into(),
            raw: false,
            timeout: None,
        }
    }

    /// Add a bare keystroke to send. Must be followed by `expect()`.
    pub fn send_raw(self, input: impl Into<String>) -> PendingStep {
        PendingStep {
            raw: true,
            ..self.send(input)
        }
    }

    /// Wait bound for steps that don't set their own.
    ///
    /// Applies to every step, including ones added before this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Finish the script.
    pub fn build(self) -> Vec<ScriptStep> {
        let default_timeout = self.default_timeout;
        self.steps
            .into_iter()
            .map(|mut step| {
                step.timeout = step.timeout.or(default_timeout);
                step
            })
            .collect()
    }
}

/// Builder state after `send()`: the step still needs a landmark.
#[derive(Debug)]
pub struct PendingStep {
    builder: ScriptBuilder,
    input: String,
    raw: bool,
    timeout: Option<Duration>,
}

impl PendingStep {
    /// Landmark to wait for after the input is sent.
    pub fn expect(mut self, landmark: impl Into<Landmark>) -> ScriptBuilder {
        self.builder.steps.push(ScriptStep {
            input: self.input,
            landmark: landmark.into(),
            raw: self.raw,
            timeout: self.timeout,
        });
        self.builder
    }

    /// Wait bound for this step only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Session {
    /// Run `steps` in order.
    ///
    /// Each step discards stale output, sends its input and waits for its
    /// landmark. A step that times out ends the script and is reported in
    /// the result; any other error is returned.
    pub async fn run_script(&self, steps: &[ScriptStep]) -> Result<ScriptResult> {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(steps.len());

        for step in steps {
            let step_start = Instant::now();
            self.discard_pending()?;
            if step.raw {
                self.send_raw(&step.input)?;
            } else {
                self.send(&step.input)?;
            }

            let timeout = step.timeout.or(self.config().wait_timeout);
            match self.wait_for_within(step.landmark.clone(), timeout).await {
                Ok(line) => {
                    debug!("script: {:?} -> {}", step.input, line);
                    outcomes.push(StepOutcome {
                        input: step.input.clone(),
                        matched: Some(line),
                        elapsed: step_start.elapsed(),
                        failure: None,
                    });
                }
                Err(e @ Error::Channel(ChannelError::Timeout(_))) => {
                    warn!(
                        "script: {:?} failed waiting for {}: {}",
                        step.input, step.landmark, e
                    );
                    outcomes.push(StepOutcome {
                        input: step.input.clone(),
                        matched: None,
                        elapsed: step_start.elapsed(),
                        failure: Some(e.to_string()),
                    });
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(ScriptResult::new(outcomes, start.elapsed()))
    }
}
