//! Drag out a direction arrow on a master annotation.
//!
//! The vector is stored as a `directional_vector` sub-annotation of the
//! master, which defaults to the selected annotation.

use annotator_geometry::Point;

use super::{PointerEvent, PointerEventKind, SubAnnotationTool, Tool, ToolContext};
use crate::action::Action;
use crate::error::{CreationError, EngineError};
use crate::model::{AnnotationData, AnnotationId, AnnotationType, DirectionalVectorData};

#[derive(Debug, Default)]
pub struct DirectionalVectorTool {
    master: Option<AnnotationId>,
    start: Option<Point>,
}

impl DirectionalVectorTool {
    pub const NAME: &'static str = "directional_vector";

    pub fn new() -> Self {
        Self::default()
    }

    fn resolve_master(&self, ctx: &ToolContext<'_>) -> Result<AnnotationId, EngineError> {
        if let Some(master) = &self.master {
            return Ok(master.clone());
        }
        ctx.view
            .selected()
            .map(|a| a.id.clone())
            .ok_or(EngineError::NothingSelected)
    }
}

impl Tool for DirectionalVectorTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn reset(&mut self) {
        self.start = None;
    }

    fn deactivate(&mut self) {
        self.reset();
        self.master = None;
    }

    fn on_pointer(&mut self, event: &PointerEvent, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        match event.kind {
            PointerEventKind::Down if event.is_primary() => {
                self.resolve_master(ctx)?;
                self.start = Some(event.position);
            }
            PointerEventKind::Up => {
                let Some(start) = self.start.take() else {
                    return Ok(());
                };
                let delta = event.position - start;
                if delta.length() == 0.0 {
                    return Ok(());
                }

                let master = self.resolve_master(ctx)?;
                let (_, annotation) = ctx.view.collection().require(&master)?;
                let class = ctx
                    .view
                    .classes()
                    .get(annotation.class_id)
                    .ok_or(CreationError::MissingClass {
                        class_id: Some(annotation.class_id),
                    })?;
                if !class.allows(AnnotationType::DirectionalVector) {
                    return Err(CreationError::TypeNotAllowed {
                        class: class.name.clone(),
                        ty: AnnotationType::DirectionalVector,
                    }
                    .into());
                }

                let data = AnnotationData::DirectionalVector(DirectionalVectorData {
                    angle: delta.angle(),
                    length: delta.length(),
                });
                let action = Action::set_sub(
                    ctx.view.collection(),
                    &master,
                    AnnotationType::DirectionalVector,
                    Some(data),
                )?;
                ctx.view.perform(action)?;
            }
            _ => {}
        }
        Ok(())
    }
}

impl SubAnnotationTool for DirectionalVectorTool {
    fn sub_type(&self) -> AnnotationType {
        AnnotationType::DirectionalVector
    }

    fn master(&self) -> Option<&AnnotationId> {
        self.master.as_ref()
    }

    fn set_master(&mut self, master: Option<AnnotationId>) {
        self.master = master;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditingConfig;
    use crate::model::{Annotation, AnnotationClass, BoundingBoxData, ClassCatalog};
    use crate::view::{FrameContext, View};
    use std::sync::Arc;

    fn view(sub_types: &[AnnotationType]) -> View {
        let classes = ClassCatalog::new(vec![
            AnnotationClass::new(1, "car", [255, 0, 0], AnnotationType::BoundingBox).with_sub_types(sub_types),
        ]);
        let mut view = View::new(Arc::new(classes), 10, FrameContext::image(100, 100));
        let car = Annotation::with_id(
            "car".into(),
            1,
            AnnotationData::BoundingBox(BoundingBoxData { x: 0.0, y: 0.0, w: 10.0, h: 10.0 }),
        );
        let action = Action::append(view.collection(), car);
        view.perform(action).unwrap();
        view
    }

    fn drag(tool: &mut DirectionalVectorTool, ctx: &mut ToolContext<'_>) -> Result<(), EngineError> {
        tool.on_pointer(&PointerEvent::down(Point::new(0.0, 0.0)), ctx)?;
        tool.on_pointer(&PointerEvent::up(Point::new(0.0, 5.0)), ctx)
    }

    #[test]
    fn test_attaches_to_selected_master() {
        let mut view = view(&[AnnotationType::DirectionalVector]);
        view.select("car".into());
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = DirectionalVectorTool::new();
        drag(&mut tool, &mut ctx).unwrap();

        let car = view.collection().get(&"car".into()).unwrap();
        match car.sub(AnnotationType::DirectionalVector) {
            Some(AnnotationData::DirectionalVector(v)) => {
                assert_eq!(v.length, 5.0);
                assert!((v.angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_requires_master() {
        let mut view = view(&[AnnotationType::DirectionalVector]);
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = DirectionalVectorTool::new();
        assert!(matches!(drag(&mut tool, &mut ctx), Err(EngineError::NothingSelected)));
    }

    #[test]
    fn test_class_must_allow_sub_type() {
        let mut view = view(&[]);
        let editing = EditingConfig::default();
        let mut ctx = ToolContext {
            view: &mut view,
            editing: &editing,
            active_class: None,
        };
        let mut tool = DirectionalVectorTool::new();
        tool.set_master(Some("car".into()));
        assert!(matches!(
            drag(&mut tool, &mut ctx),
            Err(EngineError::Creation(CreationError::TypeNotAllowed { .. }))
        ));
        assert_eq!(view.actions().undo_count(), 1);
    }
}
