use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// The wire representation is the literal string, so serde impls are
/// generated alongside.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(ClaimStatus {
    Pending => "pending",
    InProgress => "in-progress",
    Urgent => "urgent",
    Appealed => "appealed",
});

str_enum!(AppealStatus {
    Pending => "pending",
    InReview => "in-review",
    Approved => "approved",
    Denied => "denied",
});

impl AppealStatus {
    /// Approved and denied are terminal: they carry a decided date.
    pub fn is_decided(&self) -> bool {
        match self {
            Self::Approved | Self::Denied => true,
            Self::Pending | Self::InReview => false,
        }
    }
}

str_enum!(TokenPurpose {
    Session => "session",
    PasswordReset => "password-reset",
});

str_enum!(LetterSource {
    Template => "template",
    Anthropic => "anthropic",
});
