//! Typed ids for every table.
//!
//! Each id wraps a `Uuid` so a `CourseId` cannot be passed where a `LessonId`
//! is expected. They bind and decode like `Uuid` in sqlx and serialize as a
//! plain UUID string.

use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::{Database, Decode, Encode, Postgres, Type};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Uuid newtype with serde, sqlx and OpenAPI support.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            #[inline]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            #[inline]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            #[inline]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Type<Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <Uuid as Type<Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <Uuid as Type<Postgres>>::compatible(ty)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <Uuid as PgHasArrayType>::array_type_info()
            }
        }

        impl<'q> Encode<'q, Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<IsNull, BoxDynError> {
                <Uuid as Encode<'q, Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: <Postgres as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
                <Uuid as Decode<'r, Postgres>>::decode(value).map(Self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id!(UserId);
define_id!(ProfileId);
define_id!(StudentId);
define_id!(ParentId);
define_id!(OtpId);
define_id!(CategoryId);
define_id!(CourseId);
define_id!(LessonId);
define_id!(QuizId);
define_id!(QuizAttemptId);
define_id!(EnrollmentId);
define_id!(CertificateId);
define_id!(BookmarkId);
define_id!(ReviewId);
define_id!(NotificationId);
define_id!(NotificationPreferenceId);
define_id!(PaymentId);
define_id!(MessageId);

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "12345678-1234-1234-1234-123456789abc";

    #[test]
    fn new_ids_are_random() {
        let a = CourseId::new();
        let b = CourseId::new();
        assert!(!a.is_nil());
        assert_ne!(a, b);
    }

    #[test]
    fn parses_and_displays() {
        let id: UserId = SAMPLE.parse().unwrap();
        assert_eq!(id.to_string(), SAMPLE);
        assert_eq!(format!("{:?}", id), format!("UserId({})", SAMPLE));
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id: EnrollmentId = SAMPLE.parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", SAMPLE));

        let back: EnrollmentId = serde_json::from_str(&format!("\"{}\"", SAMPLE)).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn converts_to_and_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = PaymentId::from(uuid);
        assert_eq!(id.as_uuid(), &uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(PaymentId::nil().into_inner(), Uuid::nil());
    }
}
