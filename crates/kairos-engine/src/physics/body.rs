//! Schema-agnostic body descriptions and their Rapier builders.
//!
//! Conventions
//! - Units are meters, kilograms and seconds.
//! - The world is Z-up: gravity defaults to -Z and capsules are Z-aligned.
//! - Rotation is a scaled axis (axis * angle in radians).

use rapier3d::geometry::{Group, InteractionGroups, InteractionTestMode};
use rapier3d::na::Vector3;
use rapier3d::prelude::*;

use super::error::PhysicsError;

/// Collision shape of a collidable.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDef {
    Sphere { radius: f32 },

    /// Box with the given half-extents.
    Cuboid { half_extents: Vector3<f32> },

    /// Z-aligned capsule. `half_height` excludes the end caps.
    CapsuleZ { radius: f32, half_height: f32 },

    /// Infinite plane; everything on the side opposite `normal` is solid.
    /// Only valid on static bodies.
    HalfSpace { normal: Vector3<f32> },
}

/// How the body participates in the dynamics world.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BodyKind {
    /// Integrated by the solver: gravity, forces, contacts.
    Dynamic,
    /// Moved only by its owner (through the pre-step hook); pushes dynamics.
    Kinematic,
    /// Never moves.
    Static,
}

/// Everything needed to register one collidable.
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: ShapeDef,
    pub translation: Vector3<f32>,
    pub rotation: Vector3<f32>,
    /// Total mass for dynamic bodies. `None` derives it from unit density.
    pub mass: Option<f32>,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Categories this body belongs to.
    pub collision_category: u32,
    /// Categories this body collides with. A pair collides if either body's
    /// mask contains a category of the other, so a body with no category and
    /// a full mask still touches everything.
    pub collision_mask: u32,
}

impl BodyDesc {
    pub fn new(kind: BodyKind, shape: ShapeDef) -> Self {
        Self {
            kind,
            shape,
            translation: Vector3::zeros(),
            rotation: Vector3::zeros(),
            mass: None,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            collision_category: u32::MAX,
            collision_mask: u32::MAX,
        }
    }

    pub fn dynamic(shape: ShapeDef) -> Self {
        Self::new(BodyKind::Dynamic, shape)
    }

    pub fn kinematic(shape: ShapeDef) -> Self {
        Self::new(BodyKind::Kinematic, shape)
    }

    pub fn fixed(shape: ShapeDef) -> Self {
        Self::new(BodyKind::Static, shape)
    }

    /// Static ground plane at `z = height`.
    pub fn ground(height: f32) -> Self {
        Self::fixed(ShapeDef::HalfSpace { normal: Vector3::z() }).at(Vector3::new(0.0, 0.0, height))
    }

    pub fn at(mut self, translation: Vector3<f32>) -> Self {
        self.translation = translation;
        self
    }

    pub fn rotated(mut self, scaled_axis: Vector3<f32>) -> Self {
        self.rotation = scaled_axis;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_collision_bits(mut self, category: u32, mask: u32) -> Self {
        self.collision_category = category;
        self.collision_mask = mask;
        self
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), PhysicsError> {
        let shape_err = |reason| PhysicsError::InvalidShape {
            name: name.to_string(),
            reason,
        };

        match &self.shape {
            ShapeDef::Sphere { radius } => {
                if !positive(*radius) {
                    return Err(shape_err("sphere radius must be positive"));
                }
            }
            ShapeDef::Cuboid { half_extents } => {
                if !half_extents.iter().all(|v| positive(*v)) {
                    return Err(shape_err("cuboid half-extents must be positive"));
                }
            }
            ShapeDef::CapsuleZ { radius, half_height } => {
                if !positive(*radius) || !(half_height.is_finite() && *half_height >= 0.0) {
                    return Err(shape_err("capsule radius must be positive and half-height non-negative"));
                }
            }
            ShapeDef::HalfSpace { normal } => {
                if !normal.iter().all(|v| v.is_finite()) || normal.norm_squared() <= f32::EPSILON {
                    return Err(shape_err("half-space normal must be non-zero"));
                }
                if self.kind != BodyKind::Static {
                    return Err(shape_err("half-space bodies must be static"));
                }
            }
        }

        if let Some(mass) = self.mass {
            if !positive(mass) {
                return Err(PhysicsError::InvalidMass {
                    name: name.to_string(),
                    mass,
                });
            }
        }

        let pose_finite = self
            .translation
            .iter()
            .chain(self.rotation.iter())
            .all(|v| v.is_finite());
        if !pose_finite {
            return Err(PhysicsError::InvalidPose {
                name: name.to_string(),
            });
        }

        Ok(())
    }

    pub(crate) fn build_body(&self) -> RigidBody {
        let builder = match self.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };

        builder
            .translation(self.translation)
            .rotation(self.rotation)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .build()
    }

    pub(crate) fn build_collider(&self) -> Collider {
        let builder = match &self.shape {
            ShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),
            ShapeDef::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ShapeDef::CapsuleZ { radius, half_height } => {
                ColliderBuilder::capsule_z(*half_height, *radius)
            }
            ShapeDef::HalfSpace { normal } => {
                let halfspace = HalfSpace::new(UnitVector::new_normalize(*normal));
                ColliderBuilder::new(SharedShape::new(halfspace))
            }
        };

        let builder = match (self.kind, self.mass) {
            (BodyKind::Dynamic, Some(mass)) => builder.mass(mass),
            _ => builder,
        };

        builder
            .friction(self.friction)
            .restitution(self.restitution)
            .collision_groups(self.interaction_groups())
            .build()
    }

    pub(crate) fn interaction_groups(&self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.collision_category),
            Group::from_bits_truncate(self.collision_mask),
            InteractionTestMode::Or,
        )
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(r: f32) -> BodyDesc {
        BodyDesc::dynamic(ShapeDef::Sphere { radius: r })
    }

    // ── validate ──────────────────────────────────────────────────────────

    #[test]
    fn validate_accepts_defaults() {
        assert_eq!(sphere(0.5).validate("ball"), Ok(()));
        assert_eq!(BodyDesc::ground(0.0).validate("ground"), Ok(()));
    }

    #[test]
    fn validate_rejects_zero_radius() {
        assert!(matches!(
            sphere(0.0).validate("ball"),
            Err(PhysicsError::InvalidShape { .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_mass() {
        let err = sphere(1.0).with_mass(-2.0).validate("ball").unwrap_err();
        assert_eq!(err, PhysicsError::InvalidMass { name: "ball".into(), mass: -2.0 });
    }

    #[test]
    fn validate_rejects_nan_pose() {
        let desc = sphere(1.0).at(Vector3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(desc.validate("ball"), Err(PhysicsError::InvalidPose { .. })));
    }

    #[test]
    fn validate_rejects_dynamic_half_space() {
        let desc = BodyDesc::dynamic(ShapeDef::HalfSpace { normal: Vector3::z() });
        assert!(desc.validate("plane").is_err());
    }

    #[test]
    fn validate_rejects_flat_cuboid() {
        let desc = BodyDesc::fixed(ShapeDef::Cuboid { half_extents: Vector3::new(1.0, 0.0, 1.0) });
        assert!(desc.validate("slab").is_err());
    }

    // ── collision groups ──────────────────────────────────────────────────

    fn groups(category: u32, mask: u32) -> InteractionGroups {
        sphere(1.0).with_collision_bits(category, mask).interaction_groups()
    }

    #[test]
    fn one_sided_mask_is_enough_to_collide() {
        let a = groups(0b01, 0b10);
        let b = groups(0b10, 0b00);
        assert!(a.test(b));
        assert!(b.test(a));
    }

    #[test]
    fn disjoint_bits_do_not_collide() {
        let a = groups(0b01, 0b01);
        let b = groups(0b10, 0b10);
        assert!(!a.test(b));
    }

    #[test]
    fn no_category_with_full_mask_touches_default_bodies() {
        let walker = groups(0, u32::MAX);
        let ground = BodyDesc::ground(0.0).interaction_groups();
        assert!(walker.test(ground));
    }

    #[test]
    fn build_collider_carries_groups() {
        let collider = sphere(1.0).with_collision_bits(2, 6).build_collider();
        assert_eq!(collider.collision_groups(), groups(2, 6));
    }
}
