//! Conversion between image space and canvas space.
//!
//! The camera maps an image point to the canvas by scaling with `zoom` and
//! then translating by `offset`:
//!
//! ```text
//! canvas = image * zoom + offset
//! image  = (canvas - offset) / zoom
//! ```

use crate::point::{CanvasPoint, Point};

/// Pan/zoom state of the canvas over an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f64,
    /// Canvas position of the image origin.
    pub offset: CanvasPoint,
}

impl Camera {
    pub fn new(zoom: f64, offset: CanvasPoint) -> Self {
        Self { zoom, offset }
    }

    /// Identity mapping (zoom 1, no offset).
    pub fn identity() -> Self {
        Self::new(1.0, CanvasPoint::default())
    }

    pub fn image_to_canvas(&self, point: Point) -> CanvasPoint {
        CanvasPoint::new(
            point.x * self.zoom + self.offset.x,
            point.y * self.zoom + self.offset.y,
        )
    }

    pub fn canvas_to_image(&self, point: CanvasPoint) -> Point {
        Point::new(
            (point.x - self.offset.x) / self.zoom,
            (point.y - self.offset.y) / self.zoom,
        )
    }

    /// Convert an image-space distance (e.g. a hit radius) to canvas pixels.
    pub fn image_distance_to_canvas(&self, distance: f64) -> f64 {
        distance * self.zoom
    }

    /// Convert a canvas-space distance to image pixels.
    pub fn canvas_distance_to_image(&self, distance: f64) -> f64 {
        distance / self.zoom
    }

    /// Zoom so that the image point under `cursor` stays under it.
    pub fn zoom_to_cursor(&self, new_zoom: f64, cursor: CanvasPoint) -> Camera {
        let anchor = self.canvas_to_image(cursor);
        Camera {
            zoom: new_zoom,
            offset: CanvasPoint::new(
                cursor.x - anchor.x * new_zoom,
                cursor.y - anchor.y * new_zoom,
            ),
        }
    }

    pub fn pan_by(&self, dx: f64, dy: f64) -> Camera {
        Camera {
            zoom: self.zoom,
            offset: CanvasPoint::new(self.offset.x + dx, self.offset.y + dy),
        }
    }

    /// Fit an image of the given size inside a canvas, centered.
    pub fn scale_to_fit(image_width: f64, image_height: f64, canvas_width: f64, canvas_height: f64) -> Camera {
        if image_width <= 0.0 || image_height <= 0.0 {
            return Camera::identity();
        }
        let zoom = (canvas_width / image_width).min(canvas_height / image_height);
        Camera {
            zoom,
            offset: CanvasPoint::new(
                (canvas_width - image_width * zoom) / 2.0,
                (canvas_height - image_height * zoom) / 2.0,
            ),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::identity()
    }
}
