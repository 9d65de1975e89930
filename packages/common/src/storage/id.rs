use std::fmt;
use std::str::FromStr;

use uuid::Uuid;
use uuid::fmt::Hyphenated;

use super::error::StorageError;

/// A validated upload identifier.
///
/// The only ways to obtain one are [`UploadId::generate`] and parsing the
/// canonical lowercase hyphenated UUID form, so its text form is always safe
/// to use as a single path component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadId(Uuid);

impl UploadId {
    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the canonical text form, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`.
    ///
    /// Braced, URN, simple and uppercase forms are rejected.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.len() != Hyphenated::LENGTH {
            return Err(StorageError::InvalidId(format!(
                "expected {} characters, got {}",
                Hyphenated::LENGTH,
                s.len()
            )));
        }

        let uuid = Uuid::try_parse(s).map_err(|e| StorageError::InvalidId(e.to_string()))?;

        let mut buf = Uuid::encode_buffer();
        if &*uuid.hyphenated().encode_lower(&mut buf) != s {
            return Err(StorageError::InvalidId("not in canonical form".into()));
        }

        Ok(Self(uuid))
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UploadId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for UploadId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UploadId({})", self.0.hyphenated())
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
