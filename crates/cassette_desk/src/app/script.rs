use deck_engine::{tokenize_line, CommandRegistry, ConsoleError, TouchId};
use glam::Vec2;
use thiserror::Error;

use super::desk::DeskCommand;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScriptStep {
    Touch { id: TouchId, position: Vec2 },
    Lift { id: TouchId },
    Tick { count: u32 },
    Command(DeskCommand),
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read script {source_name}: {source}")]
    Read {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {reason}")]
    Invalid { line: usize, reason: String },
    #[error("line {line}: {source}")]
    Command {
        line: usize,
        #[source]
        source: ConsoleError,
    },
}

/// Parses a headless session script.
///
/// Besides console commands a script may contain `touch <id> <x> <y>`,
/// `lift <id>` and `tick [n]`. Blank lines and `#` comments are skipped.
pub(crate) fn parse_script(
    raw: &str,
    registry: &CommandRegistry<DeskCommand>,
) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(step) = parse_contact_step(trimmed, line_number)? {
            steps.push(step);
            continue;
        }
        let command = registry
            .parse_line(trimmed)
            .map_err(|source| ScriptError::Command {
                line: line_number,
                source,
            })?;
        if let Some(command) = command {
            steps.push(ScriptStep::Command(command));
        }
    }
    Ok(steps)
}

fn parse_contact_step(line: &str, line_number: usize) -> Result<Option<ScriptStep>, ScriptError> {
    let invalid = |reason: String| ScriptError::Invalid {
        line: line_number,
        reason,
    };
    let tokens = tokenize_line(line).map_err(|source| ScriptError::Command {
        line: line_number,
        source,
    })?;
    let Some((keyword, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let step = match keyword.to_ascii_lowercase().as_str() {
        "touch" => {
            let [id, x, y] = args else {
                return Err(invalid("usage: touch <id> <x> <y>".to_string()));
            };
            ScriptStep::Touch {
                id: parse_touch_id(id).map_err(invalid)?,
                position: Vec2::new(
                    parse_number(x, "x").map_err(invalid)?,
                    parse_number(y, "y").map_err(invalid)?,
                ),
            }
        }
        "lift" => {
            let [id] = args else {
                return Err(invalid("usage: lift <id>".to_string()));
            };
            ScriptStep::Lift {
                id: parse_touch_id(id).map_err(invalid)?,
            }
        }
        "tick" => match args {
            [] => ScriptStep::Tick { count: 1 },
            [count] => ScriptStep::Tick {
                count: count
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("invalid tick count '{count}'")))?,
            },
            _ => return Err(invalid("usage: tick [n]".to_string())),
        },
        _ => return Ok(None),
    };
    Ok(Some(step))
}

fn parse_touch_id(raw: &str) -> Result<TouchId, String> {
    raw.parse::<u64>()
        .map(TouchId)
        .map_err(|_| format!("invalid touch id '{raw}'"))
}

fn parse_number(raw: &str, label: &str) -> Result<f32, String> {
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("invalid {label} coordinate '{raw}'")),
    }
}
