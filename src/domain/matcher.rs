use crate::model::face::FaceTemplate;

/// Maximum Euclidean distance accepted as the same person.
pub const MATCH_THRESHOLD: f32 = 0.6;

/// Euclidean distance between two descriptors of equal length.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Display confidence in percent: 100 at distance 0, 0 at or beyond the threshold.
pub fn confidence(distance: f32) -> f32 {
    100.0 * (1.0 - distance / MATCH_THRESHOLD).clamp(0.0, 1.0)
}

/// Closest template found by a scan, before the threshold is applied.
#[derive(Debug, Clone, Copy)]
pub struct Nearest<'a> {
    pub face: &'a FaceTemplate,
    pub distance: f32,
}

impl Nearest<'_> {
    pub fn is_match(&self) -> bool {
        self.distance < MATCH_THRESHOLD
    }
}

/// Result of matching a probe against the gallery.
#[derive(Debug, Clone, Copy)]
pub enum MatchResult<'a> {
    Recognized(Nearest<'a>),
    /// Nothing within the threshold; carries the nearest distance when the gallery had candidates.
    NotRecognized { nearest_distance: Option<f32> },
}

/// Linear scan for the template nearest to `probe`.
///
/// Ties keep the first template in gallery order. Templates whose dimension
/// differs from the probe are skipped.
pub fn nearest<'a>(probe: &[f32], gallery: &'a [FaceTemplate]) -> Option<Nearest<'a>> {
    let mut best: Option<Nearest<'a>> = None;

    for face in gallery {
        if face.descriptor.len() != probe.len() {
            tracing::debug!(
                face_id = face.id,
                stored = face.descriptor.len(),
                probe = probe.len(),
                "Skipping template with mismatched descriptor length"
            );
            continue;
        }

        let distance = euclidean_distance(probe, &face.descriptor);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Nearest { face, distance });
        }
    }

    best
}

pub fn match_face<'a>(probe: &[f32], gallery: &'a [FaceTemplate]) -> MatchResult<'a> {
    match nearest(probe, gallery) {
        Some(n) if n.is_match() => MatchResult::Recognized(n),
        Some(n) => MatchResult::NotRecognized {
            nearest_distance: Some(n.distance),
        },
        None => MatchResult::NotRecognized {
            nearest_distance: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn face(id: i64, label: &str, descriptor: Vec<f32>) -> FaceTemplate {
        FaceTemplate {
            id,
            label: label.to_string(),
            employee_id: None,
            department: None,
            descriptor,
            quality: None,
            registered_at: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_distance_basic() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[0.5, 0.5], &[0.5, 0.5]), 0.0);
    }

    #[test]
    fn test_picks_minimum_distance() {
        let gallery = vec![
            face(1, "far", vec![1.0, 1.0, 1.0]),
            face(2, "near", vec![0.1, 0.0, 0.0]),
            face(3, "mid", vec![0.3, 0.0, 0.0]),
        ];

        match match_face(&[0.0, 0.0, 0.0], &gallery) {
            MatchResult::Recognized(n) => {
                assert_eq!(n.face.label, "near");
                assert!((n.distance - 0.1).abs() < 1e-6);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_ties_resolve_to_first() {
        let gallery = vec![
            face(1, "first", vec![0.2, 0.0]),
            face(2, "second", vec![-0.2, 0.0]),
        ];

        let n = nearest(&[0.0, 0.0], &gallery).unwrap();
        assert_eq!(n.face.id, 1);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let edge = face(1, "edge", vec![0.6, 0.0]);
        let at_threshold = Nearest {
            face: &edge,
            distance: MATCH_THRESHOLD,
        };
        assert!(!at_threshold.is_match());

        let gallery = vec![face(1, "just-outside", vec![0.61, 0.0])];
        match match_face(&[0.0, 0.0], &gallery) {
            MatchResult::NotRecognized { nearest_distance } => {
                assert!((nearest_distance.unwrap() - 0.61).abs() < 1e-6);
            }
            other => panic!("distance past the threshold must not match, got {other:?}"),
        }
    }

    #[test]
    fn test_far_gallery_not_recognized() {
        let gallery = vec![face(1, "a", vec![1.0, 0.0]), face(2, "b", vec![0.0, 0.9])];
        assert!(matches!(
            match_face(&[0.0, 0.0], &gallery),
            MatchResult::NotRecognized {
                nearest_distance: Some(_)
            }
        ));
    }

    #[test]
    fn test_empty_gallery() {
        assert!(matches!(
            match_face(&[0.1, 0.2], &[]),
            MatchResult::NotRecognized {
                nearest_distance: None
            }
        ));
    }

    #[test]
    fn test_mismatched_dimension_skipped() {
        let gallery = vec![face(1, "short", vec![0.0]), face(2, "ok", vec![0.1, 0.1])];
        let n = nearest(&[0.0, 0.0], &gallery).unwrap();
        assert_eq!(n.face.id, 2);
    }

    #[test]
    fn test_confidence_scale() {
        assert_eq!(confidence(0.0), 100.0);
        assert!((confidence(0.3) - 50.0).abs() < 1e-4);
        assert_eq!(confidence(0.6), 0.0);
        assert_eq!(confidence(2.0), 0.0);
    }
}
