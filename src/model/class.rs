//! Annotation class metadata.
//!
//! Classes are supplied by the host and are read-only inside the engine.

use serde::{Deserialize, Serialize};

use super::annotation::AnnotationType;
use crate::error::CreationError;

/// An annotation class with a name, color and permitted types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationClass {
    /// Unique identifier for the class
    pub id: u32,
    /// Display name of the class
    pub name: String,
    /// RGB color for the class
    pub color: [u8; 3],
    /// Type of the main annotation this class produces
    pub main_type: AnnotationType,
    /// Sub-annotation types that may be attached
    #[serde(default)]
    pub sub_types: Vec<AnnotationType>,
    /// Node layout for skeleton classes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skeleton: Vec<SkeletonTemplateNode>,
}

/// A named skeleton node placed relative to the drawn box, `0..=1` on each axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonTemplateNode {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl AnnotationClass {
    /// Create a new class with no sub-annotation types.
    pub fn new(id: u32, name: &str, color: [u8; 3], main_type: AnnotationType) -> Self {
        Self {
            id,
            name: name.to_string(),
            color,
            main_type,
            sub_types: Vec::new(),
            skeleton: Vec::new(),
        }
    }

    pub fn with_sub_types(mut self, sub_types: &[AnnotationType]) -> Self {
        self.sub_types = sub_types.to_vec();
        self
    }

    /// Attach a skeleton layout given as `(name, x, y)` triples.
    pub fn with_skeleton(mut self, nodes: &[(&str, f64, f64)]) -> Self {
        self.skeleton = nodes
            .iter()
            .map(|&(name, x, y)| SkeletonTemplateNode {
                name: name.to_string(),
                x,
                y,
            })
            .collect();
        self
    }

    /// Whether annotations of `ty` may be created under this class.
    pub fn allows(&self, ty: AnnotationType) -> bool {
        self.main_type == ty || self.sub_types.contains(&ty)
    }
}

/// Read-only set of classes available to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassCatalog {
    classes: Vec<AnnotationClass>,
}

impl ClassCatalog {
    pub fn new(classes: Vec<AnnotationClass>) -> Self {
        Self { classes }
    }

    pub fn get(&self, id: u32) -> Option<&AnnotationClass> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationClass> {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolve a class and check that it allows `ty`.
    pub fn require(&self, class_id: Option<u32>, ty: AnnotationType) -> Result<&AnnotationClass, CreationError> {
        let class = class_id
            .and_then(|id| self.get(id))
            .ok_or(CreationError::MissingClass { class_id })?;
        if !class.allows(ty) {
            return Err(CreationError::TypeNotAllowed {
                class: class.name.clone(),
                ty,
            });
        }
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ClassCatalog {
        ClassCatalog::new(vec![
            AnnotationClass::new(1, "car", [255, 0, 0], AnnotationType::Polygon)
                .with_sub_types(&[AnnotationType::Attributes]),
            AnnotationClass::new(2, "eye", [0, 255, 0], AnnotationType::Keypoint),
        ])
    }

    #[test]
    fn test_require_checks_type() {
        let catalog = catalog();
        assert!(catalog.require(Some(1), AnnotationType::Polygon).is_ok());
        assert!(catalog.require(Some(1), AnnotationType::Attributes).is_ok());
        assert_eq!(
            catalog.require(Some(2), AnnotationType::Polygon),
            Err(CreationError::TypeNotAllowed {
                class: "eye".to_string(),
                ty: AnnotationType::Polygon
            })
        );
    }

    #[test]
    fn test_require_missing_class() {
        let catalog = catalog();
        assert_eq!(
            catalog.require(None, AnnotationType::Polygon),
            Err(CreationError::MissingClass { class_id: None })
        );
        assert_eq!(
            catalog.require(Some(9), AnnotationType::Polygon),
            Err(CreationError::MissingClass { class_id: Some(9) })
        );
    }

    #[test]
    fn test_catalog_deserializes_from_list() {
        let json = r#"[{"id": 3, "name": "tree", "color": [0, 128, 0], "main_type": "bounding_box"}]"#;
        let catalog: ClassCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(3).map(|c| c.main_type), Some(AnnotationType::BoundingBox));
    }
}
