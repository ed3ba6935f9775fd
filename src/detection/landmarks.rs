//! Facial landmark types and the extraction model seam.

use super::DetectionError;
use crate::capture::Frame;

/// A normalized 2D landmark (coordinates in `[0, 1]` image space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in normalized coordinates.
    #[inline]
    pub fn distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Landmarks for one face, indexed by the model's fixed anatomical scheme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Overwrites the point at `index`, growing the set if needed.
    pub fn set(&mut self, index: usize, point: Landmark) {
        if index >= self.points.len() {
            self.points.resize(index + 1, Landmark::new(0.0, 0.0));
        }
        self.points[index] = point;
    }
}

impl FromIterator<Landmark> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = Landmark>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Face geometry model: frame in, zero or more landmark sets out.
///
/// Implementations wrap an external face-mesh model. They are shared
/// between sessions, so any internal state must be synchronized.
pub trait LandmarkModel: Send + Sync {
    fn extract(&self, frame: &Frame) -> Result<Vec<LandmarkSet>, DetectionError>;
}

/// Model used when no face-mesh backend is configured. Never finds a face.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLandmarkModel;

impl LandmarkModel for NoLandmarkModel {
    fn extract(&self, _frame: &Frame) -> Result<Vec<LandmarkSet>, DetectionError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ColorSpace;

    #[test]
    fn test_set_grows_to_index() {
        let mut set = LandmarkSet::default();
        set.set(3, Landmark::new(0.5, 0.25));

        assert_eq!(set.len(), 4);
        assert_eq!(set.get(3), Some(&Landmark::new(0.5, 0.25)));
        assert_eq!(set.get(4), None);
    }

    #[test]
    fn test_no_model_finds_nothing() {
        let frame = Frame::new(vec![0; 4], 2, 2, ColorSpace::Gray, 1);
        assert!(NoLandmarkModel.extract(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_distance() {
        let a = Landmark::new(0.0, 0.0);
        let b = Landmark::new(0.3, 0.4);
        assert!((a.distance(&b) - 0.5).abs() < 1e-12);
    }
}
