//! Typed integer id wrappers for compile-time type safety.
//!
//! Every table in this service uses a `BIGSERIAL` primary key. `Id<T>` wraps the
//! raw `i64` so that a `PageId` can never be passed where a `UserId` was
//! expected, while encoding transparently to Postgres `BIGINT` and to JSON
//! numbers.
//!
//! # Example
//!
//! ```rust
//! use affiliation_core::common::id::Id;
//!
//! pub struct User;
//! pub struct Page;
//!
//! pub type UserId = Id<User>;
//! pub type PageId = Id<Page>;
//!
//! let user_id = UserId::new(7);
//! let page_id = PageId::new(3);
//! assert_eq!(user_id.get(), 7);
//! assert_eq!(page_id.get(), 3);
//!
//! // This would be a compile error:
//! // let wrong: PageId = user_id;
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::ParseIntError;
use std::str::FromStr;

/// A typed wrapper around a `BIGINT` primary key.
///
/// The type parameter `T` represents the entity type this id belongs to.
///
/// ```compile_fail
/// use affiliation_core::common::id::Id;
///
/// struct User;
/// struct Page;
///
/// let user_id: Id<User> = Id::new(1);
/// let page_id: Id<Page> = user_id; // Compile error!
/// ```
#[repr(transparent)]
pub struct Id<T>(i64, PhantomData<fn() -> T>);

// ============================================================================
// Core implementations
// ============================================================================

impl<T> Id<T> {
    /// Wraps a raw key.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw, PhantomData)
    }

    /// Returns the raw key.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Reinterprets the key as an id of another entity.
    ///
    /// Used where one column may point at either table, e.g. a membership
    /// subject that is a user or a page.
    #[inline]
    pub const fn cast<U>(self) -> Id<U> {
        Id(self.0, PhantomData)
    }

    /// Parses an `Id` from a string (path segments, form fields).
    #[inline]
    pub fn parse(s: &str) -> Result<Self, ParseIntError> {
        Ok(Self::new(s.trim().parse()?))
    }
}

// ============================================================================
// Standard trait implementations
// ============================================================================

impl<T> Clone for Id<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or("?");
        write!(f, "Id<{}>({})", name, self.0)
    }
}

impl<T> Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for Id<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Id<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> From<i64> for Id<T> {
    #[inline]
    fn from(raw: i64) -> Self {
        Self::new(raw)
    }
}

impl<T> From<Id<T>> for i64 {
    #[inline]
    fn from(id: Id<T>) -> Self {
        id.0
    }
}

impl<T> FromStr for Id<T> {
    type Err = ParseIntError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Serde support
// ============================================================================

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

// ============================================================================
// sqlx support
// ============================================================================

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

impl<T> Type<Postgres> for Id<T> {
    fn type_info() -> PgTypeInfo {
        <i64 as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <i64 as Type<Postgres>>::compatible(ty)
    }
}

impl<T> PgHasArrayType for Id<T> {
    fn array_type_info() -> PgTypeInfo {
        <i64 as PgHasArrayType>::array_type_info()
    }
}

impl<T> Encode<'_, Postgres> for Id<T> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<T> Decode<'_, Postgres> for Id<T> {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        <i64 as Decode<Postgres>>::decode(value).map(Self::new)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct User;
    struct Page;

    type UserId = Id<User>;
    type PageId = Id<Page>;

    #[test]
    fn test_parse_and_display() {
        let id = UserId::parse(" 42 ").unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(UserId::parse("abc").is_err());
    }

    #[test]
    fn test_serde_is_a_plain_number() {
        let id = PageId::new(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
        let back: PageId = serde_json::from_str("3").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_cast_keeps_raw_value() {
        let user = UserId::new(9);
        let page: PageId = user.cast();
        assert_eq!(page.get(), 9);
    }

    #[test]
    fn test_debug_includes_entity_name() {
        assert_eq!(format!("{:?}", UserId::new(5)), "Id<User>(5)");
    }

    #[test]
    fn test_ordering_follows_raw_key() {
        let mut ids = vec![UserId::new(3), UserId::new(1), UserId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![UserId::new(1), UserId::new(2), UserId::new(3)]);
    }
}
