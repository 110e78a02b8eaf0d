//! Booking user identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`UserId::new`] and [`User::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    EmptyName,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::EmptyName => write!(f, "user name must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque identifier issued by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A person who books seats for their children.
///
/// Two users are equal when their ids match; the name is a display label
/// that may drift between snapshots.
///
/// # Examples
/// ```
/// use booking::domain::User;
///
/// let before = User::new("U123", "Ada")?;
/// let after = User::new("U123", "Ada L.")?;
/// assert_eq!(before, after);
/// # Ok::<(), booking::domain::UserValidationError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = UserId::new(id)?;
        Self::with_id(id, name)
    }

    /// Build a user from an already validated identifier.
    pub fn with_id(id: UserId, name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(Self { id, name })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDto {
    id: String,
    name: String,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        Self {
            id: value.id.into(),
            name: value.name,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        Self::new(value.id, value.name)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "Ada", UserValidationError::EmptyId)]
    #[case("  ", "Ada", UserValidationError::EmptyId)]
    #[case("U1", "", UserValidationError::EmptyName)]
    #[case("U1", " \t", UserValidationError::EmptyName)]
    fn rejects_blank_fields(
        #[case] id: &str,
        #[case] name: &str,
        #[case] expected: UserValidationError,
    ) {
        assert_eq!(User::new(id, name), Err(expected));
    }

    #[rstest]
    fn equality_ignores_name() {
        let a = User::new("U1", "Ada").expect("valid user");
        let b = User::new("U1", "Grace").expect("valid user");
        let c = User::new("U2", "Ada").expect("valid user");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[rstest]
    fn serde_round_trip_revalidates() {
        let payload = serde_json::json!({ "id": "", "name": "Ada" });
        let result: Result<User, _> = serde_json::from_value(payload);
        assert!(result.is_err());
    }
}
