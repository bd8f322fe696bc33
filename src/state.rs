//! # State Variables
//!
//! A world state is made of named state variables. Each variable holds one of
//! three kinds of value:
//!
//! - **Flag**: a boolean (`dead`, `in transition`, ...)
//! - **Counter**: an unsigned count (`standing actions executed`, ...)
//! - **Enumerated**: one named value out of a closed domain enumeration
//!   (stance, weapon state, ...)
//!
//! Typed access goes through the [`StateKind`] trait, which is implemented for
//! `bool`, `u32` and every domain enumeration implementing [`StateEnum`].
//!
//! ```
//! use transition_planner::{StateKind, StateValue};
//!
//! let value = true.into_value();
//! assert_eq!(value, StateValue::Flag(true));
//! assert_eq!(bool::from_value(&value), Some(true));
//!
//! // Asking for the wrong kind is a query failure, not a crash
//! assert_eq!(u32::from_value(&value), None);
//! ```

use std::fmt;

/// A value of a domain enumeration, tagged with the enumeration it belongs to.
///
/// Two enumerated values only compare equal when both the enumeration and the
/// value name match, so a stance can never be confused with a weapon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumValue {
    type_name: &'static str,
    name: &'static str,
}

impl EnumValue {
    pub const fn new(type_name: &'static str, name: &'static str) -> Self {
        Self { type_name, name }
    }

    /// The enumeration this value belongs to.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The value held by a single state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateValue {
    Flag(bool),
    Counter(u32),
    Enumerated(EnumValue),
}

impl StateValue {
    /// A short description of the kind of value held, used in diagnostics.
    ///
    /// Enumerated values report the name of their enumeration.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StateValue::Flag(_) => "flag",
            StateValue::Counter(_) => "counter",
            StateValue::Enumerated(value) => value.type_name(),
        }
    }

    /// Returns `true` if both values are of the same kind.
    pub fn same_kind(&self, other: &StateValue) -> bool {
        match (self, other) {
            (StateValue::Flag(_), StateValue::Flag(_)) => true,
            (StateValue::Counter(_), StateValue::Counter(_)) => true,
            (StateValue::Enumerated(a), StateValue::Enumerated(b)) => {
                a.type_name() == b.type_name()
            }
            _ => false,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Flag(value) => write!(f, "{}", value),
            StateValue::Counter(value) => write!(f, "{}", value),
            StateValue::Enumerated(value) => write!(f, "{}", value),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Flag(value)
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        StateValue::Counter(value)
    }
}

impl From<EnumValue> for StateValue {
    fn from(value: EnumValue) -> Self {
        StateValue::Enumerated(value)
    }
}

/// Typed access to a [`StateValue`].
pub trait StateKind: Sized {
    /// Name of the kind, as reported by [`StateValue::kind_name`].
    fn kind_name() -> &'static str;

    /// Extracts a typed value, or `None` if the value is of another kind.
    fn from_value(value: &StateValue) -> Option<Self>;

    fn into_value(self) -> StateValue;
}

impl StateKind for bool {
    fn kind_name() -> &'static str {
        "flag"
    }

    fn from_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    fn into_value(self) -> StateValue {
        StateValue::Flag(self)
    }
}

impl StateKind for u32 {
    fn kind_name() -> &'static str {
        "counter"
    }

    fn from_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Counter(count) => Some(*count),
            _ => None,
        }
    }

    fn into_value(self) -> StateValue {
        StateValue::Counter(self)
    }
}

/// A closed domain enumeration that can be stored in a world state.
///
/// Implementors get [`StateKind`] for free.
///
/// ```
/// use transition_planner::{StateEnum, StateKind};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl StateEnum for Door {
///     const TYPE_NAME: &'static str = "Door";
///
///     fn name(self) -> &'static str {
///         match self {
///             Door::Open => "OPEN",
///             Door::Closed => "CLOSED",
///         }
///     }
///
///     fn from_name(name: &str) -> Option<Self> {
///         match name {
///             "OPEN" => Some(Door::Open),
///             "CLOSED" => Some(Door::Closed),
///             _ => None,
///         }
///     }
/// }
///
/// let value = Door::Open.into_value();
/// assert_eq!(Door::from_value(&value), Some(Door::Open));
/// ```
pub trait StateEnum: Copy + 'static {
    const TYPE_NAME: &'static str;

    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self>;

    fn enum_value(self) -> EnumValue {
        EnumValue::new(Self::TYPE_NAME, self.name())
    }
}

impl<E: StateEnum> StateKind for E {
    fn kind_name() -> &'static str {
        E::TYPE_NAME
    }

    fn from_value(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Enumerated(value) if value.type_name() == E::TYPE_NAME => {
                E::from_name(value.name())
            }
            _ => None,
        }
    }

    fn into_value(self) -> StateValue {
        StateValue::Enumerated(self.enum_value())
    }
}
