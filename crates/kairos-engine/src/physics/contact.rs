use std::collections::HashMap;

use rapier3d::na::{Point3, Vector3};
use rapier3d::prelude::*;

use super::collidable::CollidableId;

/// One touching pair found during a substep.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactReport {
    pub first: CollidableId,
    pub second: CollidableId,
    /// World-space contact point.
    pub position: Point3<f32>,
    /// World-space normal pointing from `first` towards `second`.
    pub normal: Vector3<f32>,
    /// Penetration depth, `>= 0`.
    pub depth: f32,
}

/// Collects the deepest active contact of every touching pair into `out`.
///
/// Pairs involving a collider the controller does not know are logged and
/// skipped.
pub(crate) fn gather_contacts(
    narrow_phase: &NarrowPhase,
    owners: &HashMap<ColliderHandle, CollidableId>,
    out: &mut Vec<ContactReport>,
) {
    for pair in narrow_phase.contact_pairs() {
        let (Some(&first), Some(&second)) = (owners.get(&pair.collider1), owners.get(&pair.collider2))
        else {
            log::warn!(
                "contact between unregistered colliders {:?} / {:?}, skipped",
                pair.collider1,
                pair.collider2
            );
            continue;
        };

        let mut deepest: Option<(Point3<f32>, Vector3<f32>, f32)> = None;
        for manifold in &pair.manifolds {
            for contact in &manifold.data.solver_contacts {
                let depth = (-contact.dist).max(0.0);
                if deepest.is_none_or(|(_, _, d)| depth > d) {
                    deepest = Some((contact.point, manifold.data.normal, depth));
                }
            }
        }

        if let Some((position, normal, depth)) = deepest {
            out.push(ContactReport {
                first,
                second,
                position,
                normal,
                depth,
            });
        }
    }
}
