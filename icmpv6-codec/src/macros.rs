// An open registry of integer codes.
//
// Unlike a Rust enum, any raw value is representable, so unknown codes read
// from the wire survive a decode/encode cycle untouched.
macro_rules! enum_sim {
    (
        $(#[$enum_attr: meta])*
        pub struct $tname:ident ($size_t:ty) {
            $(
                $(#[$arm_attr: meta])*
                $enum_arm:ident = $num_exp:expr
            ),+ $(,)?
        }
    ) => {
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        $(#[$enum_attr])*
        pub struct $tname($size_t);

        impl $tname {
            $(
                #[doc = concat!("Raw value `", stringify!($num_exp), "`.")]
                $(#[$arm_attr])*
                pub const $enum_arm: Self = Self($num_exp);
            )+

            /// Get the raw value.
            #[inline]
            pub fn raw(&self) -> $size_t {
                self.0
            }

            /// Get the registered name of the value, if it has one.
            pub fn name(&self) -> Option<&'static str> {
                $(
                    if *self == Self::$enum_arm {
                        return Some(stringify!($enum_arm));
                    }
                )+
                None
            }
        }

        impl ::core::convert::From<$size_t> for $tname {
            #[inline]
            fn from(value: $size_t) -> $tname {
                $tname(value)
            }
        }

        impl ::core::convert::From<$tname> for $size_t {
            #[inline]
            fn from(value: $tname) -> $size_t {
                value.0
            }
        }

        impl ::core::fmt::Display for $tname {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "{}({})", stringify!($tname), self.0),
                }
            }
        }
    };
}
