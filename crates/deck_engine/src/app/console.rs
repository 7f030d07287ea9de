use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}. usage: {usage}")]
pub struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    pub fn new(reason: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("unterminated quoted string. usage: help")]
    UnterminatedQuote,
    #[error("unknown command '{name}'. try: help")]
    UnknownCommand { name: String },
    #[error(transparent)]
    Parse(#[from] CommandParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("command name cannot be empty")]
    EmptyName,
    #[error("duplicate command registration: {name}")]
    Duplicate { name: String },
}

type ParseFn<C> = dyn Fn(&[String]) -> Result<C, CommandParseError> + Send + Sync;

struct CommandSpec<C> {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn<C>>,
}

/// Named command parsers keyed case-insensitively, listed in registration order.
pub struct CommandRegistry<C> {
    specs: Vec<CommandSpec<C>>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[String]) -> Result<C, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(RegistryError::Duplicate { name });
        }

        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub fn contains(&self, input_name: &str) -> bool {
        self.lookup_by_lower_name
            .contains_key(&input_name.to_ascii_lowercase())
    }

    pub fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| {
                if spec.arg_schema.is_empty() {
                    format!("{} - {}", spec.name, spec.help)
                } else {
                    format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
                }
            })
            .collect()
    }

    /// Parses one console line. Blank lines yield `Ok(None)`.
    pub fn parse_line(&self, line: &str) -> Result<Option<C>, ConsoleError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let tokens = tokenize_line(trimmed)?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let index = self
            .lookup_by_lower_name
            .get(&command_name.to_ascii_lowercase())
            .ok_or_else(|| ConsoleError::UnknownCommand {
                name: command_name.clone(),
            })?;
        let spec = &self.specs[*index];
        let command = (spec.parse)(args)?;
        Ok(Some(command))
    }
}

pub fn tokenize_line(line: &str) -> Result<Vec<String>, ConsoleError> {
    let mut tokens = Vec::new();
    // A quote opens a token even when nothing follows it, so `""` is an empty argument.
    let mut current: Option<String> = None;
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            current.get_or_insert_with(String::new);
        } else if ch.is_whitespace() && !in_quotes {
            tokens.extend(current.take());
        } else {
            current.get_or_insert_with(String::new).push(ch);
        }
    }

    if in_quotes {
        return Err(ConsoleError::UnterminatedQuote);
    }
    tokens.extend(current);
    Ok(tokens)
}

pub fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}

pub fn require_single_arg<'a>(args: &'a [String], usage: &str) -> Result<&'a str, CommandParseError> {
    match args {
        [only] => Ok(only.as_str()),
        _ => Err(CommandParseError::new(
            "expected exactly one argument",
            usage,
        )),
    }
}
