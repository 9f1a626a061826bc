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

//! Declarative macro for flag sets used by GPU descriptors.

/// Declares a `Copy` flag set type with named constants and the usual set
/// operators (`|`, `&`, `!` and their assigning forms).
#[macro_export]
#[doc(hidden)]
macro_rules! orion_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// The empty set.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Builds a set from raw bits, keeping unknown bits.
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self { bits }
            }

            /// Raw value of the set.
            pub const fn bits(&self) -> $ty {
                self.bits
            }

            /// Whether no flag is set.
            pub const fn is_empty(&self) -> bool {
                self.bits == 0
            }

            /// Whether every flag of `other` is set in `self`.
            pub const fn contains(&self, other: Self) -> bool {
                (self.bits & other.bits) == other.bits
            }

            /// Whether `self` and `other` share at least one flag.
            pub const fn intersects(&self, other: Self) -> bool {
                (self.bits & other.bits) != 0
            }

            /// Sets the flags of `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the flags of `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, other: Self) -> Self {
                Self { bits: self.bits & other.bits }
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, other: Self) {
                self.bits |= other.bits;
            }
        }

        impl core::ops::BitAndAssign for $name {
            fn bitand_assign(&mut self, other: Self) {
                self.bits &= other.bits;
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut remaining = self.bits;
                let mut names = Vec::new();
                $(
                    if $flag_value != 0 && (remaining & $flag_value) == $flag_value {
                        names.push(stringify!($flag_name));
                        remaining &= !$flag_value;
                    }
                )*
                write!(f, "{}(", stringify!($name))?;
                if names.is_empty() && remaining == 0 {
                    write!(f, "EMPTY")?;
                } else {
                    write!(f, "{}", names.join(" | "))?;
                    if remaining != 0 {
                        if !names.is_empty() {
                            write!(f, " | ")?;
                        }
                        write!(f, "{:#x}", remaining)?;
                    }
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::orion_bitflags;

    orion_bitflags! {
        /// Flags used to exercise the macro.
        pub struct StageFlags: u32 {
            const VERTEX = 1 << 0;
            const FRAGMENT = 1 << 1;
            const ALL = (1 << 0) | (1 << 1);
        }
    }

    #[test]
    fn set_operations() {
        let mut flags = StageFlags::VERTEX;
        assert!(!flags.contains(StageFlags::ALL));
        flags |= StageFlags::FRAGMENT;
        assert!(flags.contains(StageFlags::ALL));
        assert_eq!(flags, StageFlags::ALL);

        flags.remove(StageFlags::VERTEX);
        assert_eq!(flags, StageFlags::FRAGMENT);
        assert!(flags.intersects(StageFlags::ALL));
        assert!(!flags.intersects(StageFlags::VERTEX));
        assert!(StageFlags::EMPTY.is_empty());
    }

    #[test]
    fn debug_lists_flag_names() {
        assert_eq!(format!("{:?}", StageFlags::EMPTY), "StageFlags(EMPTY)");
        assert_eq!(
            format!("{:?}", StageFlags::VERTEX),
            "StageFlags(VERTEX)"
        );
        assert_eq!(
            format!("{:?}", StageFlags::from_bits_truncate(0b101)),
            "StageFlags(VERTEX | 0x4)"
        );
    }
}
