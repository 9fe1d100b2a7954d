//! Keyframed annotations spanning several video frames.

use std::collections::BTreeMap;
use std::ops::Bound;

use annotator_geometry::{GeometryError, InterpolationAlgorithm, InterpolationParams};

use super::annotation::{Annotation, AnnotationData, AnnotationId, AnnotationType};
use super::interpolation::interpolate_data;

/// Data snapshot stored at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub data: AnnotationData,
    pub sub_annotations: BTreeMap<AnnotationType, AnnotationData>,
}

impl Keyframe {
    pub fn new(data: AnnotationData) -> Self {
        Self {
            data,
            sub_annotations: BTreeMap::new(),
        }
    }
}

/// Half-open frame range `[start, end)` in which an annotation is visible.
pub type Segment = (u32, u32);

/// An annotation tracked across video frames.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoAnnotation {
    pub id: AnnotationId,
    pub class_id: u32,
    /// Keyframes by frame index
    pub frames: BTreeMap<u32, Keyframe>,
    /// Visibility ranges
    pub segments: Vec<Segment>,
    /// Whether frames between keyframes are blended
    pub interpolated: bool,
    pub algorithm: InterpolationAlgorithm,
}

impl VideoAnnotation {
    /// Start tracking from a single keyframe.
    pub fn new(class_id: u32, frame: u32, keyframe: Keyframe) -> Self {
        Self::with_id(AnnotationId::generate(), class_id, frame, keyframe)
    }

    pub fn with_id(id: AnnotationId, class_id: u32, frame: u32, keyframe: Keyframe) -> Self {
        let mut frames = BTreeMap::new();
        frames.insert(frame, keyframe);
        Self {
            id,
            class_id,
            frames,
            segments: vec![(frame, frame.saturating_add(1))],
            interpolated: true,
            algorithm: InterpolationAlgorithm::default(),
        }
    }

    /// Build from an image-space annotation placed at `frame`.
    pub fn from_annotation(annotation: &Annotation, frame: u32) -> Self {
        let keyframe = Keyframe {
            data: annotation.data.clone(),
            sub_annotations: annotation.sub_annotations.clone(),
        };
        Self::with_id(annotation.id.clone(), annotation.class_id, frame, keyframe)
    }

    pub fn is_visible(&self, frame: u32) -> bool {
        self.segments.iter().any(|&(start, end)| start <= frame && frame < end)
    }

    /// Snapshot at `frame`.
    ///
    /// An exact keyframe wins. With a keyframe on one side only, that one is
    /// held. Between two keyframes the data is interpolated, or the previous
    /// keyframe is held when interpolation is off or the type does not blend.
    pub fn data_at(&self, frame: u32) -> Result<Option<Keyframe>, GeometryError> {
        if !self.is_visible(frame) {
            return Ok(None);
        }
        if let Some(keyframe) = self.frames.get(&frame) {
            return Ok(Some(keyframe.clone()));
        }

        let previous = self.frames.range(..frame).next_back();
        let next = self
            .frames
            .range((Bound::Excluded(frame), Bound::Unbounded))
            .next();

        match (previous, next) {
            (None, None) => Ok(None),
            (Some((_, only)), None) | (None, Some((_, only))) => Ok(Some(only.clone())),
            (Some((&prev_frame, prev)), Some((&next_frame, next))) => {
                if !self.interpolated {
                    return Ok(Some(prev.clone()));
                }
                let params =
                    InterpolationParams::between_frames(self.algorithm, prev_frame, next_frame, frame)?;
                let data = interpolate_data(&prev.data, &next.data, params)?
                    .unwrap_or_else(|| prev.data.clone());
                Ok(Some(Keyframe {
                    data,
                    sub_annotations: prev.sub_annotations.clone(),
                }))
            }
        }
    }

    /// Materialize the annotation as it appears at `frame`.
    pub fn annotation_at(&self, frame: u32) -> Result<Option<Annotation>, GeometryError> {
        Ok(self.data_at(frame)?.map(|keyframe| Annotation {
            id: self.id.clone(),
            class_id: self.class_id,
            data: keyframe.data,
            sub_annotations: keyframe.sub_annotations,
        }))
    }

    /// Insert or replace a keyframe and make sure the frame is visible.
    pub fn set_keyframe(&mut self, frame: u32, keyframe: Keyframe) {
        self.frames.insert(frame, keyframe);
        self.cover(frame);
    }

    /// Extend the nearest segment so that it covers `frame`.
    fn cover(&mut self, frame: u32) {
        if self.is_visible(frame) {
            return;
        }
        let before = self
            .segments
            .iter_mut()
            .filter(|(_, end)| *end <= frame)
            .max_by_key(|(_, end)| *end);
        if let Some(segment) = before {
            segment.1 = frame.saturating_add(1);
            return;
        }
        match self.segments.iter_mut().min_by_key(|(start, _)| *start) {
            Some(segment) => segment.0 = frame,
            None => self.segments.push((frame, frame.saturating_add(1))),
        }
    }

    /// Hide the annotation from `frame` onwards, dropping later keyframes.
    ///
    /// Returns `false` when nothing visible remains.
    pub fn truncate_at(&mut self, frame: u32) -> bool {
        self.frames.retain(|&f, _| f < frame);
        self.segments = self
            .segments
            .iter()
            .filter(|(start, _)| *start < frame)
            .map(|&(start, end)| (start, end.min(frame)))
            .collect();
        !self.frames.is_empty() && !self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBoxData, KeypointData};

    fn keypoint(x: f64, y: f64) -> Keyframe {
        Keyframe::new(AnnotationData::Keypoint(KeypointData { x, y }))
    }

    fn tracked() -> VideoAnnotation {
        let mut video = VideoAnnotation::with_id("v".into(), 1, 0, keypoint(0.0, 0.0));
        video.set_keyframe(10, keypoint(10.0, 20.0));
        video
    }

    #[test]
    fn test_set_keyframe_extends_segment() {
        let video = tracked();
        assert_eq!(video.segments, vec![(0, 11)]);
        assert!(video.is_visible(5));
        assert!(!video.is_visible(11));
    }

    #[test]
    fn test_data_at_interpolates_between_keyframes() {
        let video = tracked();
        assert_eq!(video.data_at(0).unwrap(), Some(keypoint(0.0, 0.0)));
        assert_eq!(video.data_at(5).unwrap(), Some(keypoint(5.0, 10.0)));
        assert_eq!(video.data_at(10).unwrap(), Some(keypoint(10.0, 20.0)));
        assert_eq!(video.data_at(20).unwrap(), None);
    }

    #[test]
    fn test_data_at_holds_previous_when_not_interpolated() {
        let mut video = tracked();
        video.interpolated = false;
        assert_eq!(video.data_at(5).unwrap(), Some(keypoint(0.0, 0.0)));
    }

    #[test]
    fn test_data_at_holds_single_neighbour() {
        let mut video = VideoAnnotation::with_id("v".into(), 1, 5, keypoint(1.0, 1.0));
        video.segments = vec![(0, 20)];
        assert_eq!(video.data_at(2).unwrap(), Some(keypoint(1.0, 1.0)));
        assert_eq!(video.data_at(15).unwrap(), Some(keypoint(1.0, 1.0)));
    }

    #[test]
    fn test_data_at_mismatched_types_holds_previous() {
        let mut video = tracked();
        let bbox = Keyframe::new(AnnotationData::BoundingBox(BoundingBoxData {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        }));
        video.set_keyframe(10, bbox);
        assert_eq!(video.data_at(5).unwrap(), Some(keypoint(0.0, 0.0)));
    }

    #[test]
    fn test_truncate_at() {
        let mut video = tracked();
        assert!(video.truncate_at(5));
        assert_eq!(video.segments, vec![(0, 5)]);
        assert_eq!(video.frames.len(), 1);
        assert!(!video.truncate_at(0));
    }
}
