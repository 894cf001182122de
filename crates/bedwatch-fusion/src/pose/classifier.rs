//! Rule-based pose classification from bounding-box geometry.

use bedwatch_core::BoundingBox;

use crate::domain::Pose;

/// Classifies a pose from bounding-box shape and placement.
///
/// The rules are evaluated in order and the first match wins; later
/// rules are intentionally unreachable when an earlier one matches.
/// Reordering them changes behavior, so the sequence below must stay
/// fixed:
///
/// 1. wide box low in the frame is a person on the floor
/// 2. any other wide box is a person lying in bed
/// 3. a tall narrow box is standing
/// 4. a roughly square box in the lower half is sitting
/// 5. a moderately narrow box is standing
/// 6. anything else is unclassifiable
#[must_use]
pub fn classify(bounding_box: &BoundingBox) -> Pose {
    let aspect = bounding_box.aspect_ratio();
    let vertical_center = bounding_box.center_y();

    if aspect > 2.0 && vertical_center > 0.7 {
        Pose::Fallen
    } else if aspect > 1.5 {
        Pose::Lying
    } else if aspect < 0.5 {
        Pose::Standing
    } else if aspect < 1.0 && vertical_center > 0.4 {
        Pose::Sitting
    } else if aspect < 0.7 {
        Pose::Standing
    } else {
        Pose::Unknown
    }
}

/// Quick geometric fall screen, usable without a classified pose: a
/// strongly horizontal box whose bottom edge sits near the bottom of
/// the frame.
#[must_use]
pub fn indicates_fall(bounding_box: &BoundingBox) -> bool {
    bounding_box.aspect_ratio() > 2.0 && bounding_box.bottom() > 0.8
}
