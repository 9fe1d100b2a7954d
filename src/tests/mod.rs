//! End-to-end scenarios driven through the [`Editor`](crate::Editor) with the
//! built-in plugins active.

mod editing_tests;
mod plugin_tests;
mod video_tests;

use annotator_geometry::Point;

use crate::config::EngineConfig;
use crate::editor::Editor;
use crate::model::{Annotation, AnnotationClass, AnnotationData, AnnotationType, ClassCatalog, PolygonData};

fn classes() -> ClassCatalog {
    ClassCatalog::new(vec![
        AnnotationClass::new(1, "region", [255, 0, 0], AnnotationType::Polygon)
            .with_sub_types(&[AnnotationType::Measures]),
        AnnotationClass::new(2, "landmark", [0, 255, 0], AnnotationType::Keypoint),
        AnnotationClass::new(3, "lane", [255, 255, 0], AnnotationType::Line),
        AnnotationClass::new(4, "person", [0, 0, 255], AnnotationType::Skeleton)
            .with_skeleton(&[("head", 0.5, 0.0), ("hip", 0.5, 0.5)]),
    ])
}

fn editor() -> Editor {
    Editor::with_builtin_plugins(EngineConfig::default(), classes()).unwrap()
}

fn rect(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Annotation {
    polygon(
        id,
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ],
    )
}

fn polygon(id: &str, path: Vec<Point>) -> Annotation {
    Annotation::with_id(id.into(), 1, AnnotationData::Polygon(PolygonData::new(path)))
}

fn key(chord: &str) -> crate::tool::KeyEvent {
    crate::tool::KeyEvent::press(chord.parse().unwrap())
}
