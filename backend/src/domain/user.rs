//! User data model.
//!
//! Users are owned by the authentication subsystem; this crate only reads
//! their identity and the cached `points` total maintained by the award
//! pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The display name was blank.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// The display name was shorter than the minimum length.
    #[error("display name must be at least {min} characters")]
    DisplayNameTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// The display name exceeded the maximum length.
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 2;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 150;

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }

        let length = display_name.chars().count();
        if length < DISPLAY_NAME_MIN {
            return Err(UserValidationError::DisplayNameTooShort {
                min: DISPLAY_NAME_MIN,
            });
        }
        if length > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }

        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Application user as seen by the rewards subsystem.
///
/// ## Invariants
/// - `points` equals the sum of the user's ledger entry deltas. It is only
///   ever written by the award pipeline's recompute step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    display_name: DisplayName,
    points: i64,
}

impl User {
    /// Build a new [`User`] with a zero points balance.
    pub fn new(id: UserId, display_name: DisplayName) -> Self {
        Self {
            id,
            display_name,
            points: 0,
        }
    }

    /// Rehydrate a user loaded from storage with its cached total.
    pub fn with_points(id: UserId, display_name: DisplayName, points: i64) -> Self {
        Self {
            id,
            display_name,
            points,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name shown on leaderboards.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Cached points total.
    pub fn points(&self) -> i64 {
        self.points
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for user identifiers and display names.
    use super::*;
    use rstest::rstest;

    const VALID_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[rstest]
    fn user_id_accepts_canonical_uuid() {
        let id = UserId::new(VALID_ID).expect("valid id");
        assert_eq!(id.as_ref(), VALID_ID);
        assert_eq!(id.as_uuid().to_string(), VALID_ID);
    }

    #[rstest]
    #[case::empty("", UserValidationError::EmptyId)]
    #[case::padded(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    #[case::garbage("not-a-uuid", UserValidationError::InvalidId)]
    fn user_id_rejects_invalid_input(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    #[case::blank("   ", UserValidationError::EmptyDisplayName)]
    #[case::short("a", UserValidationError::DisplayNameTooShort { min: DISPLAY_NAME_MIN })]
    fn display_name_rejects_invalid_input(
        #[case] raw: &str,
        #[case] expected: UserValidationError,
    ) {
        assert_eq!(DisplayName::new(raw), Err(expected));
    }

    #[rstest]
    fn display_name_rejects_overlong_input() {
        let raw = "a".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(raw),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }

    #[rstest]
    fn new_users_start_with_zero_points() {
        let name = DisplayName::new("Wanjiru").expect("valid name");
        let user = User::new(UserId::random(), name);
        assert_eq!(user.points(), 0);
    }

    #[rstest]
    fn user_id_round_trips_through_serde_as_string() {
        let id = UserId::new(VALID_ID).expect("valid id");
        let value = serde_json::to_value(&id).expect("serialise");
        assert_eq!(value, serde_json::json!(VALID_ID));
    }
}
