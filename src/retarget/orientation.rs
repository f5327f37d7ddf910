//! Per-bone rotation from keypoint geometry.

use glam::{Mat3, Quat, Vec3};

use super::mapping::{BasisRecipe, JointMapping, MappingEntry};
use crate::keypoints::{Joint, KeypointFrame};
use crate::motion::MotionDocument;
use crate::skeleton::Skeleton;

/// Shortest-arc rotation taking `from` onto `to`; identity when either is
/// degenerate.
pub fn rotation_to(from: Vec3, to: Vec3) -> Quat {
    match (from.try_normalize(), to.try_normalize()) {
        (Some(from), Some(to)) => Quat::from_rotation_arc(from, to),
        _ => Quat::IDENTITY,
    }
}

/// Rotation whose local +Z is `direction` and whose local +X is
/// `normalize(up × direction)`.
///
/// A zero direction gives identity; an `up` parallel to `direction` falls
/// back to the shortest arc from +Z.
pub fn basis_rotation(direction: Vec3, up: Vec3) -> Quat {
    let Some(z) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };
    match up.cross(z).try_normalize() {
        Some(x) => {
            let y = z.cross(x);
            Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
        }
        None => Quat::from_rotation_arc(Vec3::Z, z),
    }
}

/// Basis rotation of `recipe` with joint positions read through `position`.
pub fn recipe_rotation<F>(recipe: &BasisRecipe, position: F) -> Quat
where
    F: Fn(Joint) -> Vec3,
{
    let unit = |(from, to): (Joint, Joint)| (position(to) - position(from)).normalize_or_zero();
    match *recipe {
        BasisRecipe::Four { direction, up } => {
            let d = unit(direction);
            basis_rotation(d, d.cross(unit(up)))
        }
        BasisRecipe::Six {
            direction,
            up,
            cross,
        } => basis_rotation(unit(direction), unit(up).cross(unit(cross))),
    }
}

/// Candidate local rotation of `entry`'s bone at `frame`.
///
/// `(∏ ancestor⁻¹, innermost first) × live × rest⁻¹`, where the ancestor
/// rotations are read from `doc` at the same frame. Entries without a recipe
/// give `None`.
pub fn solve_local_rotation(
    entry: &MappingEntry,
    keypoints: &KeypointFrame,
    mapping: &JointMapping,
    skeleton: &Skeleton,
    doc: &MotionDocument,
    frame: u32,
) -> Option<Quat> {
    let recipe = entry.recipe.as_ref()?;
    let live = recipe_rotation(recipe, |j| keypoints.joint(j));
    let rest = recipe_rotation(recipe, |j| mapping.rest_position(skeleton, j));

    let parents = entry
        .ancestors
        .iter()
        .rev()
        .fold(Quat::IDENTITY, |acc, name| {
            acc * doc.bone_at(name, frame).rotation.inverse()
        });

    Some((parents * live * rest.inverse()).normalize())
}

/// Continuity test against the previous keyed rotation:
/// `|dot| ≥ 1 − gap · tolerance`.
pub fn is_continuous(candidate: Quat, previous: Quat, gap: u32, tolerance: f32) -> bool {
    candidate.dot(previous).abs() >= 1.0 - gap as f32 * tolerance
}
