// Physkeys Replay Scripts
// Timed key scripts played against a router and an in-memory editor
//
// ```toml
// focus = "text"
// settle_ms = 1000
//
// [[step]]
// at_ms = 0
// press = "q"
//
// [[step]]
// at_ms = 600
// release = "q"
// ```

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::event::{FieldContext, KeyEvent};
use crate::key::key_from_name;
use crate::output::TextBuffer;
use crate::transform::{InputEventRouter, Notification, RouterDecision};
use crate::Key;

/// Default press length of a `tap` step
const DEFAULT_TAP_HOLD_MS: u64 = 30;

/// Default time timers get to fire after the last step
const DEFAULT_SETTLE_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key in step {step}: {name}")]
    InvalidKey { step: usize, name: String },

    #[error("Invalid step {step}: {reason}")]
    InvalidStep { step: usize, reason: String },

    #[error("Step {step} at {at_ms}ms comes before the previous step")]
    OutOfOrder { step: usize, at_ms: u64 },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptToml {
    #[serde(default)]
    focus: Option<String>,
    #[serde(default)]
    settle_ms: Option<u64>,
    /// Keys the launcher treats as app shortcuts
    #[serde(default)]
    shortcuts: Vec<String>,
    #[serde(default)]
    step: Vec<StepToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepToml {
    at_ms: u64,
    press: Option<String>,
    release: Option<String>,
    repeat: Option<String>,
    tap: Option<String>,
    hold_ms: Option<u64>,
    focus: Option<String>,
    /// "suspend", "restore", "window_hidden" or "reset"
    lifecycle: Option<String>,
}

/// What a step does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Press(Key),
    Release(Key),
    Repeat(Key),
    Tap { key: Key, hold: Duration },
    Focus(FieldContext),
    Suspend,
    Restore,
    WindowHidden,
    Reset,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Press(key) => write!(f, "press {}", key),
            StepKind::Release(key) => write!(f, "release {}", key),
            StepKind::Repeat(key) => write!(f, "repeat {}", key),
            StepKind::Tap { key, .. } => write!(f, "tap {}", key),
            StepKind::Focus(context) => write!(f, "focus {}", focus_name(*context)),
            StepKind::Suspend => write!(f, "suspend"),
            StepKind::Restore => write!(f, "restore"),
            StepKind::WindowHidden => write!(f, "window hidden"),
            StepKind::Reset => write!(f, "reset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Offset from the start of the script
    pub at: Duration,
    pub kind: StepKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayScript {
    pub focus: FieldContext,
    pub settle: Duration,
    pub shortcuts: Vec<Key>,
    pub steps: Vec<Step>,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    pub at_ms: u64,
    pub step: StepKind,
    /// Key-down decision for key steps
    pub decision: Option<RouterDecision>,
    /// Buffer contents after the step and any timers it let fire
    pub text: String,
    pub notifications: Vec<Notification>,
}

impl ReplayScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ScriptError> {
        let raw: ScriptToml =
            toml::from_str(content).map_err(|e| ScriptError::TomlParse(e.to_string()))?;

        let focus = match raw.focus.as_deref() {
            Some(name) => parse_focus(name).ok_or_else(|| ScriptError::InvalidStep {
                step: 0,
                reason: format!("unknown focus '{}'", name),
            })?,
            None => FieldContext::text(),
        };

        let shortcuts = raw
            .shortcuts
            .iter()
            .map(|name| {
                key_from_name(name).ok_or_else(|| ScriptError::InvalidKey {
                    step: 0,
                    name: name.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut steps = Vec::with_capacity(raw.step.len());
        let mut last_at = 0;
        for (i, step) in raw.step.iter().enumerate() {
            let index = i + 1;
            if step.at_ms < last_at {
                return Err(ScriptError::OutOfOrder {
                    step: index,
                    at_ms: step.at_ms,
                });
            }
            last_at = step.at_ms;
            steps.push(Step {
                at: Duration::from_millis(step.at_ms),
                kind: parse_step(index, step)?,
            });
        }

        Ok(Self {
            focus,
            settle: Duration::from_millis(raw.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)),
            shortcuts,
            steps,
        })
    }
}

fn parse_step(index: usize, step: &StepToml) -> Result<StepKind, ScriptError> {
    let key = |name: &String| {
        key_from_name(name).ok_or_else(|| ScriptError::InvalidKey {
            step: index,
            name: name.clone(),
        })
    };

    let mut kinds = Vec::new();
    if let Some(name) = &step.press {
        kinds.push(StepKind::Press(key(name)?));
    }
    if let Some(name) = &step.release {
        kinds.push(StepKind::Release(key(name)?));
    }
    if let Some(name) = &step.repeat {
        kinds.push(StepKind::Repeat(key(name)?));
    }
    if let Some(name) = &step.tap {
        let hold = Duration::from_millis(step.hold_ms.unwrap_or(DEFAULT_TAP_HOLD_MS));
        kinds.push(StepKind::Tap { key: key(name)?, hold });
    }
    if let Some(name) = &step.focus {
        let context = parse_focus(name).ok_or_else(|| ScriptError::InvalidStep {
            step: index,
            reason: format!("unknown focus '{}'", name),
        })?;
        kinds.push(StepKind::Focus(context));
    }
    if let Some(name) = &step.lifecycle {
        kinds.push(match name.to_ascii_lowercase().as_str() {
            "suspend" => StepKind::Suspend,
            "restore" => StepKind::Restore,
            "window_hidden" | "hide" => StepKind::WindowHidden,
            "reset" => StepKind::Reset,
            other => {
                return Err(ScriptError::InvalidStep {
                    step: index,
                    reason: format!("unknown lifecycle event '{}'", other),
                })
            }
        });
    }
    if step.hold_ms.is_some() && step.tap.is_none() {
        return Err(ScriptError::InvalidStep {
            step: index,
            reason: "hold_ms only applies to tap".to_string(),
        });
    }

    match kinds.len() {
        1 => Ok(kinds[0]),
        0 => Err(ScriptError::InvalidStep {
            step: index,
            reason: "no action".to_string(),
        }),
        _ => Err(ScriptError::InvalidStep {
            step: index,
            reason: "more than one action".to_string(),
        }),
    }
}

fn parse_focus(name: &str) -> Option<FieldContext> {
    match name.to_ascii_lowercase().as_str() {
        "text" => Some(FieldContext::text()),
        "password" => Some(FieldContext::password()),
        "none" => Some(FieldContext::none()),
        "launcher" => Some(FieldContext::launcher()),
        _ => None,
    }
}

fn focus_name(context: FieldContext) -> &'static str {
    match (context.editable, context.smart_features_disabled, context.launcher) {
        (true, true, _) => "password",
        (true, false, _) => "text",
        (false, _, true) => "launcher",
        (false, _, false) => "none",
    }
}

/// Play `script` from `start`, firing timers as the clock passes them.
/// Yields one record per step, focus and lifecycle steps included.
pub fn replay(
    router: &mut InputEventRouter,
    buffer: &mut TextBuffer,
    script: &ReplayScript,
    start: Instant,
) -> Vec<ReplayRecord> {
    for key in &script.shortcuts {
        buffer.register_shortcut(*key);
    }
    router.on_focus_changed(script.focus);
    router.take_notifications();

    let mut records = Vec::with_capacity(script.steps.len() + 1);
    let mut clock = start;
    for step in &script.steps {
        let at = start + step.at;
        router.advance_to(at, buffer);
        clock = at;

        let decision = match step.kind {
            StepKind::Press(key) => Some(router.process_event(&KeyEvent::press(key, at), buffer)),
            StepKind::Release(key) => Some(router.process_event(&KeyEvent::release(key, at), buffer)),
            StepKind::Repeat(key) => Some(router.process_event(&KeyEvent::repeat(key, at), buffer)),
            StepKind::Tap { key, hold } => {
                let down = router.process_event(&KeyEvent::press(key, at), buffer);
                clock = at + hold;
                router.advance_to(clock, buffer);
                router.process_event(&KeyEvent::release(key, clock), buffer);
                Some(down)
            }
            StepKind::Focus(context) => {
                router.on_focus_changed(context);
                None
            }
            StepKind::Suspend => {
                router.suspend_for_interruption();
                None
            }
            StepKind::Restore => {
                router.restore_sym_page();
                None
            }
            StepKind::WindowHidden => {
                router.on_window_hidden();
                None
            }
            StepKind::Reset => {
                router.reset_context(false);
                None
            }
        };

        records.push(ReplayRecord {
            at_ms: step.at.as_millis() as u64,
            step: step.kind,
            decision,
            text: buffer.text(),
            notifications: router.take_notifications(),
        });
    }

    // let trailing timers fire
    let settle_at = clock + script.settle;
    if router.advance_to(settle_at, buffer) > 0 {
        let notifications = router.take_notifications();
        log::debug!("{} notifications while settling", notifications.len());
    }
    log::debug!("replay finished: {:?}", buffer.text());
    records
}
