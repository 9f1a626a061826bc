// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::asset::Asset;
use crate::check;

/// Surface response of a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsMaterial {
    restitution: f32,
    friction: f32,
}

impl Asset for PhysicsMaterial {}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.6,
            friction: 0.5,
        }
    }
}

impl PhysicsMaterial {
    /// Creates a material with checked values.
    pub fn new(restitution: f32, friction: f32) -> Self {
        let mut material = Self::default();
        material.set_restitution(restitution);
        material.set_friction(friction);
        material
    }

    /// Fraction of the impact velocity kept after a bounce.
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// # Fatal errors
    /// * `restitution` is outside `[0, 1]`.
    pub fn set_restitution(&mut self, restitution: f32) {
        check!(
            (0.0..=1.0).contains(&restitution),
            "Restitution {} outside [0, 1]",
            restitution
        );
        self.restitution = restitution;
    }

    /// Coulomb friction coefficient.
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// # Fatal errors
    /// * `friction` is negative.
    pub fn set_friction(&mut self, friction: f32) {
        check!(friction >= 0.0, "Friction {} must not be negative", friction);
        self.friction = friction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let material = PhysicsMaterial::default();
        assert_eq!(material.restitution(), 0.6);
        assert_eq!(material.friction(), 0.5);
    }

    #[test]
    fn setters_accept_range_bounds() {
        let material = PhysicsMaterial::new(1.0, 0.0);
        assert_eq!((material.restitution(), material.friction()), (1.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "Restitution 1.5 outside [0, 1]")]
    fn restitution_above_one_is_fatal() {
        PhysicsMaterial::new(1.5, 0.5);
    }

    #[test]
    #[should_panic(expected = "Friction -0.1 must not be negative")]
    fn negative_friction_is_fatal() {
        PhysicsMaterial::default().set_friction(-0.1);
    }
}
