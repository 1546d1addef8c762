//! Closed status-code taxonomy shared by repositories, internal calls and
//! the public wire. Serialized as plain integers at the boundary only.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Domain status code. The numeric values line up with HTTP on purpose so
/// the gateway can pass them through, but inside the process this is a
/// closed enum, not an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    // General
    Ok,
    BadRequest,
    NotFound,
    InternalError,
    // Create
    Created,
    Conflict,
    // Update
    NoContent,
    // Auth
    Unauthorized,
    Forbidden,
    Locked,
    // Verification
    Expired,
    Invalid,
}

/// Category a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    General,
    Create,
    Update,
    Auth,
    Verification,
}

impl StatusCode {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Expired => 410,
            Self::Invalid => 422,
            Self::Locked => 423,
            Self::InternalError => 500,
        }
    }

    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(Self::Ok),
            201 => Some(Self::Created),
            204 => Some(Self::NoContent),
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            409 => Some(Self::Conflict),
            410 => Some(Self::Expired),
            422 => Some(Self::Invalid),
            423 => Some(Self::Locked),
            500 => Some(Self::InternalError),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Created | Self::NoContent)
    }

    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Ok | Self::BadRequest | Self::NotFound | Self::InternalError => Category::General,
            Self::Created | Self::Conflict => Category::Create,
            Self::NoContent => Category::Update,
            Self::Unauthorized | Self::Forbidden | Self::Locked => Category::Auth,
            Self::Expired | Self::Invalid => Category::Verification,
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u16::deserialize(deserializer)?;
        Self::from_u16(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown status code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_integers() {
        for code in [
            StatusCode::Ok,
            StatusCode::Created,
            StatusCode::NoContent,
            StatusCode::BadRequest,
            StatusCode::Unauthorized,
            StatusCode::Forbidden,
            StatusCode::NotFound,
            StatusCode::Conflict,
            StatusCode::Expired,
            StatusCode::Invalid,
            StatusCode::Locked,
            StatusCode::InternalError,
        ] {
            assert_eq!(StatusCode::from_u16(code.as_u16()), Some(code));
        }
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&StatusCode::Locked).unwrap();
        assert_eq!(json, "423");
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(serde_json::from_str::<StatusCode>("418").is_err());
    }
}
