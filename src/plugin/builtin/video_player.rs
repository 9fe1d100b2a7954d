use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::keybindings::Keybinding;
use crate::plugin::{Plugin, PluginContext};

pub const PLAY: &str = "video_player.play";
pub const PAUSE: &str = "video_player.pause";
pub const TOGGLE: &str = "video_player.toggle";
pub const NEXT_FRAME: &str = "video_player.next_frame";
pub const PREVIOUS_FRAME: &str = "video_player.previous_frame";

/// Playback controls for the open video.
pub struct VideoPlayerPlugin;

impl Plugin for VideoPlayerPlugin {
    fn name(&self) -> &'static str {
        "video_player"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        ctx.register_command(PLAY, |core| {
            core.video_mut()?.play();
            Ok(())
        });
        ctx.register_command(PAUSE, |core| {
            core.video_mut()?.pause();
            Ok(())
        });
        ctx.register_command(TOGGLE, |core| {
            core.video_mut()?.toggle();
            Ok(())
        });
        ctx.register_command(NEXT_FRAME, next_frame);
        ctx.register_command(PREVIOUS_FRAME, previous_frame);

        ctx.register_keybinding(Keybinding::press("space", TOGGLE)?);
        ctx.register_keybinding(Keybinding::press("right", NEXT_FRAME)?);
        ctx.register_keybinding(Keybinding::press("left", PREVIOUS_FRAME)?);
        Ok(())
    }
}

fn next_frame(core: &mut EditorCore) -> Result<(), EngineError> {
    let frame = core.video_mut()?.next_frame();
    core.set_frame(frame)?;
    Ok(())
}

fn previous_frame(core: &mut EditorCore) -> Result<(), EngineError> {
    let frame = core.video_mut()?.previous_frame();
    core.set_frame(frame)?;
    Ok(())
}
