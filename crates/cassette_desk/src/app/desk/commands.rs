use deck_engine::{
    require_no_args, require_single_arg, CommandParseError, CommandRegistry, RegistryError,
};

use super::buttons::DeckButton;

const BUTTON_USAGE: &str = "record|rewind|play|pause|ff|eject|0..5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeskCommand {
    Help,
    Deploy,
    Stow,
    Door { open: bool },
    Press(DeckButton),
    Release(DeckButton),
    Tap(DeckButton),
    Status,
}

fn parse_button(args: &[String], usage: &str) -> Result<DeckButton, CommandParseError> {
    let raw = require_single_arg(args, usage)?;
    DeckButton::parse(raw).ok_or_else(|| {
        CommandParseError::new(
            format!("unknown button '{raw}' (expected {BUTTON_USAGE})"),
            usage,
        )
    })
}

/// Registers the desk's debug and test commands in help order.
pub(crate) fn desk_command_registry() -> Result<CommandRegistry<DeskCommand>, RegistryError> {
    let mut registry = CommandRegistry::new();
    registry.register("help", "List available commands", "", |args| {
        require_no_args(args, "help")?;
        Ok(DeskCommand::Help)
    })?;
    registry.register("deploy", "Bring the cassette player onto the desk", "", |args| {
        require_no_args(args, "deploy")?;
        Ok(DeskCommand::Deploy)
    })?;
    registry.register("stow", "Put the cassette player away", "", |args| {
        require_no_args(args, "stow")?;
        Ok(DeskCommand::Stow)
    })?;
    registry.register("door", "Open or close the cassette door", "<open|close>", |args| {
        let usage = "door <open|close>";
        match require_single_arg(args, usage)?.to_ascii_lowercase().as_str() {
            "open" => Ok(DeskCommand::Door { open: true }),
            "close" => Ok(DeskCommand::Door { open: false }),
            other => Err(CommandParseError::new(
                format!("invalid door state '{other}'"),
                usage,
            )),
        }
    })?;
    registry.register("press", "Hold a player button down", "<button>", |args| {
        parse_button(args, "press <button>").map(DeskCommand::Press)
    })?;
    registry.register("release", "Let go of a player button", "<button>", |args| {
        parse_button(args, "release <button>").map(DeskCommand::Release)
    })?;
    registry.register(
        "tap",
        "Press a button and let go once it bottoms out",
        "<button>",
        |args| parse_button(args, "tap <button>").map(DeskCommand::Tap),
    )?;
    registry.register("status", "Print player and transport state", "", |args| {
        require_no_args(args, "status")?;
        Ok(DeskCommand::Status)
    })?;
    Ok(registry)
}
