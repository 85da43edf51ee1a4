use std::fmt;

/// Rejected collidable registration.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A shape dimension was zero, negative or not finite.
    InvalidShape { name: String, reason: &'static str },
    /// Mass was given but is not a positive finite number.
    InvalidMass { name: String, mass: f32 },
    /// Pose contains NaN or infinity.
    InvalidPose { name: String },
    /// Another collidable is already registered under this name.
    DuplicateName(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::InvalidShape { name, reason } => {
                write!(f, "collidable '{name}' has an invalid shape: {reason}")
            }
            PhysicsError::InvalidMass { name, mass } => {
                write!(f, "collidable '{name}' has an invalid mass {mass}")
            }
            PhysicsError::InvalidPose { name } => {
                write!(f, "collidable '{name}' has a non-finite pose")
            }
            PhysicsError::DuplicateName(name) => {
                write!(f, "a collidable named '{name}' is already registered")
            }
        }
    }
}

impl std::error::Error for PhysicsError {}
