//! Plugin lifecycle and tool switching at the editor level.

use std::cell::RefCell;
use std::rc::Rc;

use annotator_geometry::Point;

use super::{classes, editor, key, rect};
use crate::config::EngineConfig;
use crate::error::{EngineError, SerializationError};
use crate::model::{AnnotationCollection, AnnotationData, MeasureUnit, MeasuresData};
use crate::plugin::{Plugin, PluginContext};
use crate::tool::{PointerEvent, RegisteredTool, Tool, ToolContext, ToolDescriptor, ToolKind};
use crate::Editor;

type Log = Rc<RefCell<Vec<String>>>;

struct Recording {
    name: &'static str,
    log: Log,
}

impl Tool for Recording {
    fn name(&self) -> &str {
        self.name
    }

    fn activate(&mut self) {
        self.log.borrow_mut().push(format!("{} on", self.name));
    }

    fn deactivate(&mut self) {
        self.log.borrow_mut().push(format!("{} off", self.name));
    }

    fn on_pointer(&mut self, _event: &PointerEvent, _ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        self.log.borrow_mut().push(format!("{} pointer", self.name));
        Ok(())
    }
}

struct RecordingTools {
    log: Log,
}

impl Plugin for RecordingTools {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn activate(&mut self, ctx: &mut PluginContext<'_>) -> Result<(), EngineError> {
        for name in ["first", "second"] {
            ctx.register_tool(
                ToolDescriptor::new(name, ToolKind::Base),
                RegisteredTool::Base(Box::new(Recording {
                    name,
                    log: Rc::clone(&self.log),
                })),
            );
        }
        Ok(())
    }
}

#[test]
fn test_switching_tools_deactivates_previous_once() {
    let log: Log = Rc::default();
    let mut editor = Editor::new(EngineConfig::default(), classes()).unwrap();
    editor.register_plugin(Box::new(RecordingTools { log: Rc::clone(&log) }));
    editor.activate_plugin("recording").unwrap();
    editor.core_mut().open_image(10, 10, AnnotationCollection::new());

    editor.activate_tool("first").unwrap();
    editor.activate_tool("second").unwrap();
    editor.activate_tool("second").unwrap();
    assert_eq!(*log.borrow(), vec!["first on", "first off", "second on"]);

    // Only the active tool sees pointer events
    log.borrow_mut().clear();
    assert!(editor.handle_pointer(&PointerEvent::down(Point::new(1.0, 1.0))).unwrap());
    assert_eq!(*log.borrow(), vec!["second pointer"]);

    // Unknown names leave the active tool in place
    assert!(matches!(editor.activate_tool("third"), Err(EngineError::UnknownTool(_))));
    assert_eq!(editor.core().tools().active_name(), Some("second"));
}

#[test]
fn test_builtin_tool_keys_switch_tools() {
    let mut editor = editor();
    editor.core_mut().open_image(100, 100, AnnotationCollection::new());
    editor.core_mut().set_active_class(Some(1));

    editor.handle_key(&key("p")).unwrap();
    for (x, y) in [(10.0, 10.0), (40.0, 10.0)] {
        editor.handle_pointer(&PointerEvent::down(Point::new(x, y))).unwrap();
    }
    editor.handle_key(&key("k")).unwrap();
    assert_eq!(editor.core().tools().active_name(), Some("keypoint"));

    // The abandoned polygon gesture does not resume: one vertex cannot close
    editor.handle_key(&key("p")).unwrap();
    editor.handle_pointer(&PointerEvent::down(Point::new(40.0, 40.0))).unwrap();
    assert!(editor.handle_key(&key("enter")).is_err());
    assert!(editor.view().unwrap().collection().is_empty());
}

#[test]
fn test_deactivating_builtins_restores_registries() {
    let bare = Editor::new(EngineConfig::default(), classes()).unwrap();
    let mut editor = editor();
    assert_eq!(editor.core().tools().len(), 9);

    let names = editor.plugins().names();
    for name in names.into_iter().rev() {
        editor.deactivate_plugin(name).unwrap();
    }
    assert_eq!(editor.commands().ids(), bare.commands().ids());
    assert_eq!(editor.core().keybindings().len(), bare.core().keybindings().len());
    assert!(editor.core().tools().is_empty());
    assert!(editor.core().serializers().is_empty());

    editor.activate_plugin("polygon").unwrap();
    assert_eq!(editor.core().tools().names(), vec!["polygon"]);
    assert!(editor.commands().contains("tool.polygon"));
}

#[test]
fn test_deactivated_plugin_stops_serving() {
    let mut editor = editor();
    let annotation = rect("p", 0.0, 0.0, 2.0, 2.0).with_sub(AnnotationData::Measures(MeasuresData {
        delta: Point::new(2.0, 2.0),
        unit: MeasureUnit {
            x: "mm".to_string(),
            y: "mm".to_string(),
        },
    }));
    editor
        .core_mut()
        .open_image(10, 10, AnnotationCollection::from_vec(vec![annotation]));
    assert!(editor.core().export_view().is_ok());

    editor.deactivate_plugin("measures").unwrap();
    assert!(matches!(
        editor.run_command("measures.attach"),
        Err(EngineError::UnknownCommand(_))
    ));
    assert!(!editor.handle_key(&key("ctrl+m")).unwrap());
    assert!(matches!(
        editor.core().export_view(),
        Err(EngineError::Serialization(SerializationError::NotRegistered(_)))
    ));
}

#[test]
fn test_drawing_tools_and_clipboard_by_key() {
    let mut editor = editor();
    editor.core_mut().open_image(100, 100, AnnotationCollection::new());

    editor.core_mut().set_active_class(Some(3));
    editor.handle_key(&key("l")).unwrap();
    for (x, y) in [(10.0, 10.0), (60.0, 10.0)] {
        editor.handle_pointer(&PointerEvent::down(Point::new(x, y))).unwrap();
    }
    editor.handle_key(&key("enter")).unwrap();

    editor.core_mut().set_active_class(Some(4));
    editor.handle_key(&key("j")).unwrap();
    editor.handle_pointer(&PointerEvent::down(Point::new(20.0, 20.0))).unwrap();
    editor.handle_pointer(&PointerEvent::up(Point::new(40.0, 60.0))).unwrap();

    let view = editor.view().unwrap();
    let types: Vec<&str> = view.collection().iter().map(|a| a.ty().name()).collect();
    assert_eq!(types, vec!["line", "skeleton"]);
    let skeleton = view.selected().unwrap().id.clone();

    assert!(editor.handle_key(&key("ctrl+c")).unwrap());
    assert!(editor.handle_key(&key("ctrl+v")).unwrap());
    let view = editor.view().unwrap();
    assert_eq!(view.collection().len(), 3);
    let pasted = view.selected().unwrap();
    assert_ne!(pasted.id, skeleton);
    assert_eq!(pasted.data, view.collection().get(&skeleton).unwrap().data);
}
