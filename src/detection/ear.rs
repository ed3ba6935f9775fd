//! Eye Aspect Ratio (EAR) evaluation.
//!
//! EAR compares the vertical opening of an eye contour with its
//! horizontal width. It drops towards zero as the eye closes.

use super::landmarks::LandmarkSet;

/// A named 16-point eye contour within the face-mesh index scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeRegion {
    pub name: &'static str,
    pub indices: [usize; 16],
}

/// Left eye contour (face-mesh indices).
pub const LEFT_EYE: EyeRegion = EyeRegion {
    name: "left",
    indices: [
        362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
    ],
};

/// Right eye contour (face-mesh indices).
pub const RIGHT_EYE: EyeRegion = EyeRegion {
    name: "right",
    indices: [
        33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
    ],
};

/// Computes the EAR of one eye.
///
/// With contour points `p0..p15`: `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`.
/// Returns `None` when a contour index is missing from the set or the
/// horizontal span is zero (duplicate landmarks).
pub fn eye_aspect_ratio(landmarks: &LandmarkSet, eye: &EyeRegion) -> Option<f64> {
    let point = |slot: usize| landmarks.get(eye.indices[slot]);

    let vertical_a = point(1)?.distance(point(5)?);
    let vertical_b = point(2)?.distance(point(4)?);
    let horizontal = point(0)?.distance(point(3)?);

    if horizontal.is_nan() || horizontal <= f64::EPSILON {
        return None;
    }
    Some((vertical_a + vertical_b) / (2.0 * horizontal))
}

/// Average EAR over both eyes, or `None` if either eye is unusable.
pub fn average_ear(landmarks: &LandmarkSet) -> Option<f64> {
    let left = eye_aspect_ratio(landmarks, &LEFT_EYE)?;
    let right = eye_aspect_ratio(landmarks, &RIGHT_EYE)?;
    Some((left + right) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::landmarks::Landmark;
    use proptest::prelude::*;

    fn with_contour(eye: &EyeRegion, contour: &[Landmark; 16]) -> LandmarkSet {
        let mut set = LandmarkSet::default();
        for (slot, point) in contour.iter().enumerate() {
            set.set(eye.indices[slot], *point);
        }
        set
    }

    fn flat_contour() -> [Landmark; 16] {
        // p1 == p5 and p2 == p4 on one horizontal line.
        let xs = [0.0, 0.1, 0.2, 0.3, 0.2, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        xs.map(|x| Landmark::new(0.4 + x, 0.5))
    }

    fn circular_contour(radius: f64) -> [Landmark; 16] {
        std::array::from_fn(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / 16.0;
            Landmark::new(0.5 + radius * angle.cos(), 0.5 + radius * angle.sin())
        })
    }

    #[test]
    fn test_flat_contour_is_fully_closed() {
        let set = with_contour(&LEFT_EYE, &flat_contour());
        let ear = eye_aspect_ratio(&set, &LEFT_EYE).unwrap();
        assert_eq!(ear, 0.0);
    }

    #[test]
    fn test_circular_contour_is_near_one() {
        let set = with_contour(&RIGHT_EYE, &circular_contour(0.05));
        let ear = eye_aspect_ratio(&set, &RIGHT_EYE).unwrap();
        assert!((ear - 1.0).abs() < 0.1, "ear = {ear}");
    }

    #[test]
    fn test_degenerate_contour_has_no_signal() {
        let set = with_contour(&LEFT_EYE, &[Landmark::new(0.5, 0.5); 16]);
        assert_eq!(eye_aspect_ratio(&set, &LEFT_EYE), None);
    }

    #[test]
    fn test_missing_indices_have_no_signal() {
        let set = LandmarkSet::new(vec![Landmark::new(0.1, 0.1); 10]);
        assert_eq!(eye_aspect_ratio(&set, &LEFT_EYE), None);
        assert_eq!(average_ear(&set), None);
    }

    #[test]
    fn test_average_of_both_eyes() {
        let mut set = with_contour(&LEFT_EYE, &flat_contour());
        for (slot, point) in circular_contour(0.05).iter().enumerate() {
            set.set(RIGHT_EYE.indices[slot], *point);
        }

        let right = eye_aspect_ratio(&set, &RIGHT_EYE).unwrap();
        let avg = average_ear(&set).unwrap();
        assert!((avg - right / 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_ear_is_scale_invariant(radius in 0.01f64..0.2, scale in 0.5f64..2.0) {
            let base = with_contour(&LEFT_EYE, &circular_contour(radius));
            let scaled = with_contour(&LEFT_EYE, &circular_contour(radius * scale));

            let a = eye_aspect_ratio(&base, &LEFT_EYE).unwrap();
            let b = eye_aspect_ratio(&scaled, &LEFT_EYE).unwrap();
            prop_assert!((a - b).abs() < 1e-9);
        }

        #[test]
        fn prop_ear_is_non_negative(points in proptest::collection::vec((0.0f64..1.0, 0.0f64..1.0), 16)) {
            let contour: [Landmark; 16] = std::array::from_fn(|k| Landmark::new(points[k].0, points[k].1));
            let set = with_contour(&RIGHT_EYE, &contour);
            if let Some(ear) = eye_aspect_ratio(&set, &RIGHT_EYE) {
                prop_assert!(ear >= 0.0 && ear.is_finite());
            }
        }
    }
}
