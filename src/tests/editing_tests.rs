//! Polygon operations and vertex editing through commands and key bindings.

use annotator_geometry::{Point, path};

use super::{editor, key, polygon, rect};
use crate::error::{CreationError, EngineError};
use crate::model::{AnnotationCollection, AnnotationData, AnnotationId, AnnotationType};
use crate::tool::PointerEvent;
use crate::Editor;

fn open(annotations: Vec<crate::model::Annotation>) -> Editor {
    let mut editor = editor();
    editor
        .core_mut()
        .open_image(100, 100, AnnotationCollection::from_vec(annotations));
    editor
}

fn select(editor: &mut Editor, ids: &[&str]) {
    let view = editor.view_mut().unwrap();
    view.clear_selection();
    for id in ids {
        view.toggle_selection((*id).into());
    }
}

fn polygon_area(editor: &Editor, id: &AnnotationId) -> f64 {
    match &editor.view().unwrap().collection().get(id).unwrap().data {
        AnnotationData::Polygon(p) => p.rings().iter().map(|r| path::area(r)).sum(),
        other => panic!("expected polygon, got {:?}", other),
    }
}

#[test]
fn test_merge_adjacent_squares_and_undo() {
    let original = vec![rect("a", 0.0, 0.0, 1.0, 1.0), rect("b", 2.0, 0.0, 3.0, 1.0)];
    let mut editor = open(original.clone());
    select(&mut editor, &["a", "b"]);
    assert!(editor.handle_key(&key("shift+m")).unwrap());

    let view = editor.view().unwrap();
    assert_eq!(view.collection().len(), 1);
    let merged = view.selected().unwrap().id.clone();
    assert_ne!(merged, AnnotationId::from("a"));
    assert!((polygon_area(&editor, &merged) - 2.0).abs() < 1e-9);

    editor.core_mut().undo().unwrap();
    assert_eq!(editor.view().unwrap().collection().as_slice(), original.as_slice());
}

#[test]
fn test_subtract_leaves_l_shape() {
    let mut editor = open(vec![rect("a", 0.0, 0.0, 2.0, 2.0), rect("b", 1.0, 1.0, 3.0, 3.0)]);
    select(&mut editor, &["a", "b"]);
    editor.run_command("edit.subtract").unwrap();

    let collection = editor.view().unwrap().collection();
    assert_eq!(collection.len(), 2);
    assert!((polygon_area(&editor, &"a".into()) - 3.0).abs() < 1e-9);
    assert!((polygon_area(&editor, &"b".into()) - 4.0).abs() < 1e-9);

    // Orientation and start vertex are free, so compare as a set
    let AnnotationData::Polygon(l_shape) = &editor.view().unwrap().collection().get(&"a".into()).unwrap().data else {
        panic!("expected polygon");
    };
    assert!(l_shape.additional_paths.is_empty());
    let mut vertices: Vec<(i64, i64)> = l_shape
        .path
        .iter()
        .map(|p| (p.x.round() as i64, p.y.round() as i64))
        .collect();
    vertices.sort();
    assert_eq!(vertices, vec![(0, 0), (0, 2), (1, 1), (1, 2), (2, 0), (2, 1)]);
}

#[test]
fn test_corner_touching_merge_merges_again() {
    let mut editor = open(vec![
        rect("a", 0.0, 0.0, 1.0, 1.0),
        rect("b", 1.0, 1.0, 2.0, 2.0),
        rect("c", 5.0, 5.0, 6.0, 6.0),
    ]);
    select(&mut editor, &["a", "b"]);
    editor.run_command("edit.merge").unwrap();
    let touching = editor.view().unwrap().selected().unwrap().id.clone();

    editor.view_mut().unwrap().toggle_selection("c".into());
    editor.run_command("edit.merge").unwrap();
    let view = editor.view().unwrap();
    assert_eq!(view.collection().len(), 1);
    let merged = view.selected().unwrap().id.clone();
    assert_ne!(merged, touching);
    assert!((polygon_area(&editor, &merged) - 3.0).abs() < 1e-9);
}

#[test]
fn test_notched_subtract_result_merges_again() {
    let notch = polygon("n", vec![Point::new(0.0, 2.0), Point::new(2.0, 1.0), Point::new(2.0, 3.0)]);
    let mut editor = open(vec![rect("a", 0.0, 0.0, 4.0, 4.0), notch, rect("c", 3.0, 3.0, 6.0, 6.0)]);
    select(&mut editor, &["a", "n"]);
    editor.run_command("edit.subtract").unwrap();

    select(&mut editor, &["a", "c"]);
    editor.run_command("edit.merge").unwrap();
    let merged = editor.view().unwrap().selected().unwrap().id.clone();
    let AnnotationData::Polygon(polygon) = &editor.view().unwrap().collection().get(&merged).unwrap().data else {
        panic!("expected polygon");
    };
    // 16 - 2 for the notch, plus 9 - 1 for the overlap
    let signed: f64 = polygon.rings().iter().map(|r| path::signed_area(r)).sum();
    assert!((signed.abs() - 22.0).abs() < 1e-9);
    assert!(!path::contains_point_in_rings(&polygon.rings(), &Point::new(1.5, 2.0)));
}

#[test]
fn test_subtract_full_cover_is_rejected() {
    let original = vec![rect("a", 1.0, 1.0, 2.0, 2.0), rect("b", 0.0, 0.0, 3.0, 3.0)];
    let mut editor = open(original.clone());
    select(&mut editor, &["a", "b"]);
    assert!(matches!(
        editor.run_command("edit.subtract"),
        Err(EngineError::Creation(CreationError::Geometry(_)))
    ));
    assert_eq!(editor.view().unwrap().collection().as_slice(), original.as_slice());
    assert!(!editor.view().unwrap().can_undo());
}

#[test]
fn test_merge_needs_two_selected() {
    let mut editor = open(vec![rect("a", 0.0, 0.0, 1.0, 1.0)]);
    select(&mut editor, &["a"]);
    assert!(matches!(editor.run_command("edit.merge"), Err(EngineError::NothingSelected)));
}

#[test]
fn test_insert_midpoint_of_middle_segment() {
    let mut editor = open(vec![rect("p", 0.0, 0.0, 2.0, 2.0)]);
    select(&mut editor, &["p"]);
    assert!(editor.handle_key(&key("shift+i")).unwrap());

    let annotation = editor.view().unwrap().collection().get(&"p".into()).cloned().unwrap();
    let points = annotation.data.path().unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(points[2], Point::new(2.0, 1.0));
}

#[test]
fn test_drag_vertex_with_edit_tool() {
    let square = vec![
        Point::new(10.0, 10.0),
        Point::new(50.0, 10.0),
        Point::new(50.0, 50.0),
        Point::new(10.0, 50.0),
    ];
    let mut editor = open(vec![polygon("p", square.clone())]);
    assert!(editor.handle_key(&key("e")).unwrap());
    assert_eq!(editor.core().tools().active_name(), Some("edit"));

    editor.handle_pointer(&PointerEvent::moved(Point::new(50.0, 10.0))).unwrap();
    editor.handle_pointer(&PointerEvent::down(Point::new(50.0, 10.0))).unwrap();
    editor.handle_pointer(&PointerEvent::moved(Point::new(60.0, 5.0))).unwrap();
    editor.handle_pointer(&PointerEvent::up(Point::new(60.0, 5.0))).unwrap();

    let moved = editor.view().unwrap().collection().get(&"p".into()).cloned().unwrap();
    assert_eq!(moved.data.path().unwrap()[1], Point::new(60.0, 5.0));

    editor.core_mut().undo().unwrap();
    let restored = editor.view().unwrap().collection().get(&"p".into()).cloned().unwrap();
    assert_eq!(restored.data.path().unwrap(), &square);
}

#[test]
fn test_z_order_commands() {
    let mut editor = open(vec![
        rect("a", 0.0, 0.0, 1.0, 1.0),
        rect("b", 2.0, 0.0, 3.0, 1.0),
        rect("c", 4.0, 0.0, 5.0, 1.0),
    ]);
    let order = |editor: &Editor| -> Vec<String> {
        editor.view().unwrap().collection().ids().map(|id| id.to_string()).collect()
    };

    select(&mut editor, &["a"]);
    editor.run_command("edit.bring_to_front").unwrap();
    assert_eq!(order(&editor), vec!["b", "c", "a"]);

    select(&mut editor, &["c"]);
    editor.run_command("edit.send_to_back").unwrap();
    assert_eq!(order(&editor), vec!["c", "b", "a"]);

    editor.core_mut().undo().unwrap();
    assert_eq!(order(&editor), vec!["b", "c", "a"]);
}

#[test]
fn test_measures_on_polygon() {
    let mut editor = open(vec![rect("p", 0.0, 0.0, 4.0, 3.0)]);
    select(&mut editor, &["p"]);
    assert!(editor.handle_key(&key("ctrl+m")).unwrap());

    let annotation = editor.view().unwrap().collection().get(&"p".into()).cloned().unwrap();
    match annotation.sub(AnnotationType::Measures) {
        Some(AnnotationData::Measures(m)) => assert_eq!(m.delta, Point::new(4.0, 3.0)),
        other => panic!("expected measures, got {:?}", other),
    }

    let exported = editor.core().export_view().unwrap();
    assert!(exported[0].get("measures").is_some());
}
