//! Ray-cast picking.
//!
//! Each candidate is an axis-aligned box tagged with a `PickKey`. A pick
//! returns the candidate whose entry point is closest to the ray origin,
//! together with the world-space hit point. Picking is a pure query.
//!
//! Callers run two passes per pointer-down: gumball handles first, then
//! parcel bodies only if no handle was hit, so handle manipulation always
//! wins over re-selecting the body underneath it.

use crate::geometry::{Aabb, Axis, Ray};
use crate::scene::ObjectId;
use glam::Vec3;

/// What a pick target stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKey {
    Parcel(ObjectId),
    GizmoAxis(Axis),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickTarget {
    pub key: PickKey,
    pub bounds: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub key: PickKey,
    pub point: Vec3,
    /// Ray parameter of the hit.
    pub distance: f32,
}

/// Nearest candidate along `ray`. Ties go to the earlier candidate.
pub fn pick_nearest<'a, I>(ray: &Ray, candidates: I) -> Option<PickHit>
where
    I: IntoIterator<Item = &'a PickTarget>,
{
    let mut best: Option<PickHit> = None;
    for candidate in candidates {
        let Some(t) = ray.intersect_aabb(&candidate.bounds) else {
            continue;
        };
        match best {
            Some(hit) if t >= hit.distance => {}
            _ => {
                best = Some(PickHit {
                    key: candidate.key,
                    point: ray.at(t),
                    distance: t,
                })
            }
        }
    }
    best
}
