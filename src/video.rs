//! Video playback state and frame materialization.
//!
//! A [`VideoSession`] owns the keyframed annotations of a video. The editor
//! shows one frame at a time in its view: [`VideoSession::frame_data`] builds
//! that frame's collection, and [`VideoSession::commit`] folds the edited
//! collection back into keyframes before the frame changes.

use std::time::Duration;

use annotator_geometry::{GeometryError, InterpolationAlgorithm};

use crate::model::{AnnotationCollection, Keyframe, VideoAnnotation};

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSession {
    annotations: Vec<VideoAnnotation>,
    current_frame: u32,
    total_frames: u32,
    playing: bool,
    fps: f64,
    /// Frame size in pixels
    width: usize,
    height: usize,
    /// Algorithm given to annotations first drawn in this session
    algorithm: InterpolationAlgorithm,
}

impl VideoSession {
    pub fn new(total_frames: u32, width: usize, height: usize, fps: f64) -> Self {
        Self {
            annotations: Vec::new(),
            current_frame: 0,
            total_frames: total_frames.max(1),
            playing: false,
            fps,
            width,
            height,
            algorithm: InterpolationAlgorithm::default(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<VideoAnnotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_algorithm(mut self, algorithm: InterpolationAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn annotations(&self) -> &[VideoAnnotation] {
        &self.annotations
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Time one frame stays on screen during playback.
    pub fn frame_interval(&self) -> Duration {
        if self.fps > 0.0 {
            Duration::from_secs_f64(1.0 / self.fps)
        } else {
            Duration::ZERO
        }
    }

    /// Annotations visible at the current frame, in session order.
    pub fn frame_data(&self) -> Result<AnnotationCollection, GeometryError> {
        let mut items = Vec::new();
        for video in &self.annotations {
            if let Some(annotation) = video.annotation_at(self.current_frame)? {
                items.push(annotation);
            }
        }
        Ok(AnnotationCollection::from_vec(items))
    }

    /// Fold the current frame's edited collection back into the session.
    ///
    /// Changed annotations get a keyframe at the current frame, new ones start
    /// tracking here, and annotations missing from `collection` are hidden
    /// from this frame on. Returns how many annotations were touched.
    pub fn commit(&mut self, collection: &AnnotationCollection) -> Result<usize, GeometryError> {
        let frame = self.current_frame;
        let mut touched = 0;

        for annotation in collection {
            match self.annotations.iter_mut().find(|v| v.id == annotation.id) {
                Some(video) => {
                    if video.annotation_at(frame)?.as_ref() != Some(annotation) {
                        video.class_id = annotation.class_id;
                        video.set_keyframe(
                            frame,
                            Keyframe {
                                data: annotation.data.clone(),
                                sub_annotations: annotation.sub_annotations.clone(),
                            },
                        );
                        touched += 1;
                    }
                }
                None => {
                    let mut video = VideoAnnotation::from_annotation(annotation, frame);
                    video.algorithm = self.algorithm;
                    self.annotations.push(video);
                    touched += 1;
                }
            }
        }

        let before = self.annotations.len();
        let mut truncated = 0;
        self.annotations.retain_mut(|video| {
            if !video.is_visible(frame) || collection.get(&video.id).is_some() {
                return true;
            }
            truncated += 1;
            video.truncate_at(frame)
        });
        touched += truncated;

        if touched > 0 {
            log::debug!(
                "🎞️ Frame {}: {} annotations committed, {} dropped",
                frame,
                touched,
                before - self.annotations.len()
            );
        }
        Ok(touched)
    }

    /// Move to `frame`, clamped to the last frame. Returns the new frame.
    pub fn seek(&mut self, frame: u32) -> u32 {
        self.current_frame = frame.min(self.total_frames - 1);
        self.current_frame
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    pub fn next_frame(&self) -> u32 {
        (self.current_frame + 1).min(self.total_frames - 1)
    }

    pub fn previous_frame(&self) -> u32 {
        self.current_frame.saturating_sub(1)
    }

    pub fn is_at_end(&self) -> bool {
        self.current_frame + 1 >= self.total_frames
    }
}
