//! Stance and weapon-state enumerations used by the animation planner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::StateEnum;

/// The basic body stance of a character.
///
/// Each stance carries a cost value; the distance between two stances is the
/// absolute difference of their cost values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasicStance {
    Idle,
    Standing,
    Kneeling,
    Prone,
}

impl BasicStance {
    pub const ALL: [BasicStance; 4] = [
        BasicStance::Idle,
        BasicStance::Standing,
        BasicStance::Kneeling,
        BasicStance::Prone,
    ];

    pub fn cost_value(self) -> f32 {
        match self {
            BasicStance::Idle => 1.75,
            BasicStance::Standing => 1.75,
            BasicStance::Kneeling => 1.0,
            BasicStance::Prone => 0.0,
        }
    }
}

impl StateEnum for BasicStance {
    const TYPE_NAME: &'static str = "BasicStance";

    fn name(self) -> &'static str {
        match self {
            BasicStance::Idle => "IDLE",
            BasicStance::Standing => "STANDING",
            BasicStance::Kneeling => "KNEELING",
            BasicStance::Prone => "PRONE",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stance| stance.name() == name)
    }
}

impl fmt::Display for BasicStance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the character is holding its weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponState {
    NoWeapon,
    Stowed,
    Deployed,
    FiringPosition,
}

impl WeaponState {
    pub const ALL: [WeaponState; 4] = [
        WeaponState::NoWeapon,
        WeaponState::Stowed,
        WeaponState::Deployed,
        WeaponState::FiringPosition,
    ];

    /// The weapon state the planner actually aims for when `self` is desired.
    ///
    /// Only an explicit firing position is kept; anything else collapses to deployed.
    pub fn effective(self) -> WeaponState {
        match self {
            WeaponState::FiringPosition => WeaponState::FiringPosition,
            _ => WeaponState::Deployed,
        }
    }
}

impl StateEnum for WeaponState {
    const TYPE_NAME: &'static str = "WeaponState";

    fn name(self) -> &'static str {
        match self {
            WeaponState::NoWeapon => "NO_WEAPON",
            WeaponState::Stowed => "STOWED",
            WeaponState::Deployed => "DEPLOYED",
            WeaponState::FiringPosition => "FIRING_POSITION",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.name() == name)
    }
}

impl fmt::Display for WeaponState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
