use std::process::ExitCode;

use deck_engine::{CommandRegistry, TickDriver};
use tracing::info;

use super::bootstrap::AppWiring;
use super::desk::{DeskCommand, DeskScene, TracingAudio, TracingUi};
use super::script::ScriptStep;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut scene = DeskScene::new(
        &app.config,
        Box::new(TracingAudio),
        Box::new(TracingUi::default()),
    );
    let mut driver = TickDriver::new(&app.config.tick);
    run_script(&mut scene, &mut driver, &app.registry, &app.script);
    info!(
        ticks = driver.ticks_run(),
        status = %scene.status_line(),
        "script_finished"
    );
    ExitCode::SUCCESS
}

pub(crate) fn run_script(
    scene: &mut DeskScene,
    driver: &mut TickDriver,
    registry: &CommandRegistry<DeskCommand>,
    script: &[ScriptStep],
) {
    for step in script {
        match step {
            ScriptStep::Touch { id, position } => driver.contacts_mut().press(*id, *position),
            ScriptStep::Lift { id } => {
                if !driver.contacts_mut().lift(*id) {
                    info!(touch = id.0, "lift_ignored_unknown_touch");
                }
            }
            ScriptStep::Tick { count } => driver.run(scene, *count),
            ScriptStep::Command(DeskCommand::Help) => {
                for line in registry.help_lines() {
                    info!("{line}");
                }
            }
            ScriptStep::Command(DeskCommand::Status) => {
                info!(tick = scene.ticks(), status = %scene.status_line(), "desk_status");
            }
            ScriptStep::Command(command) => {
                scene.execute(*command);
            }
        }
    }
}
