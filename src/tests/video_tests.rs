//! Tools across frame changes in a video session.

use annotator_geometry::Point;

use super::{editor, key};
use crate::tool::PointerEvent;
use crate::video::VideoSession;
use crate::Editor;

fn video_editor(class_id: u32) -> Editor {
    let mut editor = editor();
    editor
        .core_mut()
        .open_video(VideoSession::new(10, 100, 100, 25.0))
        .unwrap();
    editor.core_mut().set_active_class(Some(class_id));
    editor
}

fn click(editor: &mut Editor, x: f64, y: f64) -> bool {
    let handled = editor.handle_pointer(&PointerEvent::down(Point::new(x, y))).unwrap();
    editor.handle_pointer(&PointerEvent::up(Point::new(x, y))).unwrap();
    handled
}

#[test]
fn test_active_tool_survives_frame_steps() {
    let mut editor = video_editor(2);
    editor.activate_tool("keypoint").unwrap();

    editor.run_command("video_player.next_frame").unwrap();
    assert_eq!(editor.core().tools().active_name(), Some("keypoint"));
    assert!(click(&mut editor, 10.0, 10.0));
    assert_eq!(editor.view().unwrap().collection().len(), 1);

    // Committed to frame 1 only
    editor.handle_key(&key("left")).unwrap();
    assert!(editor.view().unwrap().collection().is_empty());
    editor.handle_key(&key("right")).unwrap();
    assert_eq!(editor.view().unwrap().collection().len(), 1);

    editor.core_mut().video_mut().unwrap().play();
    assert_eq!(editor.core_mut().step_playback().unwrap(), Some(2));
    assert_eq!(editor.core().tools().active_name(), Some("keypoint"));
    assert!(click(&mut editor, 20.0, 20.0));
}

#[test]
fn test_frame_change_drops_unfinished_gesture() {
    let mut editor = video_editor(1);
    editor.handle_key(&key("p")).unwrap();
    click(&mut editor, 10.0, 10.0);
    click(&mut editor, 40.0, 10.0);

    editor.handle_key(&key("right")).unwrap();
    assert_eq!(editor.core().tools().active_name(), Some("polygon"));
    click(&mut editor, 40.0, 40.0);
    // Only the vertex placed on this frame remains, too few to close
    assert!(editor.handle_key(&key("enter")).is_err());
    assert!(editor.view().unwrap().collection().is_empty());
}
