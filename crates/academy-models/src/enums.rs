//! Choice fields stored as TEXT columns.
//!
//! Every enum here maps to a `TEXT` column guarded by a `CHECK` constraint in
//! the migrations. The wire form and the column value are the same lowercase
//! string.

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::PgTypeInfo;
use sqlx::{Database, Decode, Encode, Postgres, Type};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Unknown value for a choice field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChoiceError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseChoiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.value, self.kind)
    }
}

impl std::error::Error for ParseChoiceError {}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident default $default:ident {
            $($variant:ident => $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(ParseChoiceError {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<IsNull, BoxDynError> {
                <&str as Encode<'q, Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: <Postgres as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
                let raw = <&str as Decode<'r, Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }
    };
}

text_enum!(
    /// Account type. Admins are only created through the CLI.
    UserRole default Student {
        Student => "student",
        Parent => "parent",
        Admin => "admin",
    }
);

text_enum!(
    Gender default Other {
        Male => "male",
        Female => "female",
        Other => "other",
    }
);

text_enum!(
    /// A parent's relationship to the student they link.
    Relationship default Guardian {
        Father => "father",
        Mother => "mother",
        Guardian => "guardian",
    }
);

text_enum!(
    OtpPurpose default Verification {
        Verification => "verification",
        PasswordReset => "password_reset",
    }
);

text_enum!(
    CourseStatus default Inactive {
        Active => "active",
        Inactive => "inactive",
    }
);

text_enum!(
    CourseLevel default Beginner {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
);

text_enum!(
    EnrollmentStatus default Active {
        Active => "active",
        Completed => "completed",
        Dropped => "dropped",
        Suspended => "suspended",
    }
);

text_enum!(
    RecipientType default Student {
        Student => "student",
        Parent => "parent",
        Admin => "admin",
    }
);

text_enum!(
    NotificationType default System {
        Enrollment => "enrollment",
        Payment => "payment",
        CourseUpdate => "course_update",
        Assignment => "assignment",
        Quiz => "quiz",
        Certificate => "certificate",
        Reminder => "reminder",
        Message => "message",
        System => "system",
    }
);

text_enum!(
    PaymentStatus default Pending {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
);

impl From<UserRole> for RecipientType {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Student => RecipientType::Student,
            UserRole::Parent => RecipientType::Parent,
            UserRole::Admin => RecipientType::Admin,
        }
    }
}
