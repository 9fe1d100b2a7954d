//! Label rasters backing mask annotations.
//!
//! Each frame has at most one raster: a `u8` label per pixel where `0` is
//! background and every other value belongs to exactly one mask annotation.
//! The transport form is a dense run-length encoding of `(value, length)`
//! pairs.

use std::collections::BTreeMap;

use annotator_geometry::path::Path;

use super::annotation::{AnnotationId, RasterLayerData};
use crate::error::RasterError;

/// Inclusive pixel bounds of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl PixelBounds {
    fn point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn merge(&mut self, other: &PixelBounds) {
        self.include(other.min_x, other.min_y);
        self.include(other.max_x, other.max_y);
    }
}

/// Result of decoding a dense RLE buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    pub mask: Vec<u8>,
    pub bounds_per_label: BTreeMap<u8, PixelBounds>,
    pub total_bounds: Option<PixelBounds>,
}

/// Encode a label buffer as `(value, run length)` pairs.
pub fn encode_dense_rle(mask: &[u8]) -> Vec<u32> {
    let mut rle = Vec::new();
    let Some(&first) = mask.first() else {
        return rle;
    };

    let mut run_value = first;
    let mut run_start = 0usize;
    for (i, &value) in mask.iter().enumerate() {
        if value != run_value {
            rle.push(u32::from(run_value));
            rle.push((i - run_start) as u32);
            run_value = value;
            run_start = i;
        }
    }
    rle.push(u32::from(run_value));
    rle.push((mask.len() - run_start) as u32);
    rle
}

/// Widen bounds with a run from `start` to `end` (inclusive pixel indices).
///
/// Runs that wrap onto later rows also cover the row ends in between, so the
/// row end of the first row and the row start of the last row are included.
fn update_bounds(bounds: &mut BTreeMap<u8, PixelBounds>, label: u8, start: usize, end: usize, width: usize) {
    let (sx, sy) = (start % width, start / width);
    let (ex, ey) = (end % width, end / width);

    let entry = bounds.entry(label).or_insert_with(|| PixelBounds::point(sx, sy));
    entry.include(sx, sy);
    entry.include(ex, ey);
    if sy != ey {
        entry.include(width - 1, sy);
        entry.include(0, ey);
    }
}

/// Decode a dense RLE buffer of `total_pixels` pixels laid out in rows of `width`.
pub fn decode_dense_rle(rle: &[u32], total_pixels: usize, width: usize) -> Result<DecodedRaster, RasterError> {
    if rle.len() % 2 != 0 {
        return Err(RasterError::OddLength(rle.len()));
    }
    if width == 0 || total_pixels % width != 0 {
        return Err(RasterError::ShapeMismatch {
            total: total_pixels,
            width,
        });
    }

    // Validate the runs before allocating, so a bogus size fails cheaply
    let mut filled = 0usize;
    for pair in rle.chunks_exact(2) {
        u8::try_from(pair[0]).map_err(|_| RasterError::InvalidLabel(pair[0]))?;
        filled = filled
            .checked_add(pair[1] as usize)
            .filter(|end| *end <= total_pixels)
            .ok_or(RasterError::Overflow { total: total_pixels })?;
    }
    if filled != total_pixels {
        return Err(RasterError::Underfilled {
            filled,
            total: total_pixels,
        });
    }

    let mut mask = vec![0u8; total_pixels];
    let mut bounds_per_label = BTreeMap::new();
    let mut pixel = 0usize;

    for pair in rle.chunks_exact(2) {
        let value = pair[0] as u8;
        let run = pair[1] as usize;
        if run == 0 {
            continue;
        }
        let end = pixel + run;
        mask[pixel..end].fill(value);
        if value != 0 {
            update_bounds(&mut bounds_per_label, value, pixel, end - 1, width);
        }
        pixel = end;
    }

    let total_bounds = bounds_per_label.values().fold(None, |acc: Option<PixelBounds>, b| {
        let mut total = acc.unwrap_or(*b);
        total.merge(b);
        Some(total)
    });

    Ok(DecodedRaster {
        mask,
        bounds_per_label,
        total_bounds,
    })
}

/// Pixel indices whose centers fall inside the rings (even-odd rule).
pub fn rasterize_polygon(rings: &[Path], width: usize, height: usize) -> Vec<usize> {
    let mut pixels = Vec::new();
    let mut crossings: Vec<f64> = Vec::new();

    for y in 0..height {
        let sample_y = y as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if (a.y <= sample_y && sample_y < b.y) || (b.y <= sample_y && sample_y < a.y) {
                    crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            // Pixel x is inside when x + 0.5 lies in [span0, span1).
            let first = (span[0] - 0.5).ceil().max(0.0) as usize;
            let last = (span[1] - 0.5).ceil().min(width as f64);
            if last <= 0.0 {
                continue;
            }
            for x in first..(last as usize) {
                pixels.push(y * width + x);
            }
        }
    }
    pixels
}

/// Mutable label buffer for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    buffer: Vec<u8>,
    labels: BTreeMap<AnnotationId, u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width * height],
            labels: BTreeMap::new(),
        }
    }

    pub fn from_layer(data: &RasterLayerData, width: usize) -> Result<Self, RasterError> {
        let decoded = decode_dense_rle(&data.dense_rle, data.total_pixels, width)?;
        Ok(Self {
            width,
            height: data.total_pixels / width,
            buffer: decoded.mask,
            labels: data.mask_annotation_ids_mapping.clone(),
        })
    }

    pub fn to_layer(&self) -> RasterLayerData {
        RasterLayerData {
            dense_rle: encode_dense_rle(&self.buffer),
            mask_annotation_ids_mapping: self.labels.clone(),
            total_pixels: self.buffer.len(),
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn label_for(&self, id: &AnnotationId) -> Option<u8> {
        self.labels.get(id).copied()
    }

    /// Smallest label not yet assigned to an annotation.
    pub fn next_available_label(&self) -> Result<u8, RasterError> {
        (1..=u8::MAX)
            .find(|l| !self.labels.values().any(|used| used == l))
            .ok_or(RasterError::LabelsExhausted)
    }

    /// Assign a label to an annotation, reusing any existing one.
    pub fn assign_label(&mut self, id: &AnnotationId) -> Result<u8, RasterError> {
        if let Some(label) = self.label_for(id) {
            return Ok(label);
        }
        let label = self.next_available_label()?;
        self.labels.insert(id.clone(), label);
        Ok(label)
    }

    /// Paint `label` over the given pixels.
    ///
    /// Returns annotations whose masks became empty because they were fully
    /// overwritten; their label mapping is removed.
    pub fn paint(&mut self, pixels: &[usize], label: u8) -> Vec<AnnotationId> {
        let mut overwritten: Vec<u8> = Vec::new();
        for &index in pixels {
            if let Some(value) = self.buffer.get_mut(index) {
                if *value != 0 && *value != label && !overwritten.contains(value) {
                    overwritten.push(*value);
                }
                *value = label;
            }
        }

        let emptied: Vec<u8> = overwritten
            .into_iter()
            .filter(|l| !self.buffer.contains(l))
            .collect();
        let removed: Vec<AnnotationId> = self
            .labels
            .iter()
            .filter(|(_, l)| emptied.contains(l))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &removed {
            self.labels.remove(id);
        }
        removed
    }

    /// Number of pixels carrying `label`.
    pub fn pixel_count(&self, label: u8) -> usize {
        self.buffer.iter().filter(|&&v| v == label).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotator_geometry::Point;

    fn mock_mask() -> Vec<u8> {
        vec![
            1, 1, 0, 2, //
            2, 2, 1, 0, //
            3, 3, 2, 2, //
            1, 1, 1, 1,
        ]
    }

    const MOCK_RLE: [u32; 16] = [1, 2, 0, 1, 2, 3, 1, 1, 0, 1, 3, 2, 2, 2, 1, 4];

    #[test]
    fn test_encode_dense_rle() {
        assert_eq!(encode_dense_rle(&mock_mask()), MOCK_RLE.to_vec());
        assert!(encode_dense_rle(&[]).is_empty());
    }

    #[test]
    fn test_decode_dense_rle_with_bounds() {
        let decoded = decode_dense_rle(&MOCK_RLE, 16, 4).unwrap();
        assert_eq!(decoded.mask, mock_mask());

        let b1 = decoded.bounds_per_label[&1];
        assert_eq!((b1.min_x, b1.min_y, b1.max_x, b1.max_y), (0, 0, 3, 3));
        let b2 = decoded.bounds_per_label[&2];
        assert_eq!((b2.min_x, b2.min_y, b2.max_x, b2.max_y), (0, 0, 3, 2));
        let b3 = decoded.bounds_per_label[&3];
        assert_eq!((b3.min_x, b3.min_y, b3.max_x, b3.max_y), (0, 2, 1, 2));

        let total = decoded.total_bounds.unwrap();
        assert_eq!((total.min_x, total.min_y, total.max_x, total.max_y), (0, 0, 3, 3));
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert_eq!(decode_dense_rle(&[1, 2, 3], 16, 4), Err(RasterError::OddLength(3)));
        assert_eq!(
            decode_dense_rle(&MOCK_RLE, 16, 5),
            Err(RasterError::ShapeMismatch { total: 16, width: 5 })
        );
        assert_eq!(
            decode_dense_rle(&MOCK_RLE, 12, 4),
            Err(RasterError::Overflow { total: 12 })
        );
        assert_eq!(
            decode_dense_rle(&[1, 4], 8, 4),
            Err(RasterError::Underfilled { filled: 4, total: 8 })
        );

        // Claimed sizes far beyond what the runs cover fail before any allocation
        assert_eq!(
            decode_dense_rle(&[1, 4], usize::MAX / 2 + 1, 1),
            Err(RasterError::Underfilled {
                filled: 4,
                total: usize::MAX / 2 + 1
            })
        );
        assert_eq!(
            decode_dense_rle(&[1, u32::MAX, 0, u32::MAX], 8, 4),
            Err(RasterError::Overflow { total: 8 })
        );
    }

    #[test]
    fn test_rasterize_square() {
        let square = vec![vec![
            Point::new(1.0, 1.0),
            Point::new(3.0, 1.0),
            Point::new(3.0, 3.0),
            Point::new(1.0, 3.0),
        ]];
        let mut pixels = rasterize_polygon(&square, 4, 4);
        pixels.sort_unstable();
        assert_eq!(pixels, vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_paint_reports_emptied_masks() {
        let mut raster = Raster::new(2, 1);
        let a: AnnotationId = "a".into();
        let b: AnnotationId = "b".into();
        let la = raster.assign_label(&a).unwrap();
        raster.paint(&[0], la);
        let lb = raster.assign_label(&b).unwrap();
        assert_eq!(lb, 2);

        let removed = raster.paint(&[0, 1], lb);
        assert_eq!(removed, vec![a]);
        assert_eq!(raster.pixel_count(lb), 2);
        assert_eq!(raster.label_for(&b), Some(2));
    }
}
