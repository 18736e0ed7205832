//! Tagged records for persisting distribution assignments.
//!
//! Every distribution serializes to a JSON object whose `type` field names the
//! variant, followed by its constructor fields:
//!
//! ```json
//! {"type": "UniformIntDistribution", "lower": 1, "upper": 10, "default": null, "log": false}
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const TAG_KEY: &str = "type";

/// A distribution variant with a fixed record tag.
pub trait Record: Serialize + DeserializeOwned + Sized {
    /// The value of the record's `type` field.
    const TAG: &'static str;

    /// Checks the variant's construction invariants.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    fn validate(&self) -> Result<()>;

    /// Serializes into a tagged record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`] if serialization fails.
    fn to_record(&self) -> Result<serde_json::Value> {
        let mut record = serde_json::to_value(self)?;
        match &mut record {
            serde_json::Value::Object(map) => {
                map.insert(TAG_KEY.to_owned(), Self::TAG.into());
                Ok(record)
            }
            _ => Err(Error::Internal("distribution did not serialize to an object")),
        }
    }

    /// Restores from a tagged record, checking the tag and the invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the record's tag is not
    /// [`TAG`](Self::TAG), [`Error::Serde`] for malformed fields, or a
    /// validation error.
    fn from_record(record: &serde_json::Value) -> Result<Self> {
        expect_tag(record, Self::TAG)?;
        let parsed: Self = serde_json::from_value(record.clone())?;
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Reads the `type` field of a record.
pub(crate) fn record_tag(record: &serde_json::Value) -> Option<&str> {
    record.get(TAG_KEY).and_then(serde_json::Value::as_str)
}

pub(super) fn expect_tag(record: &serde_json::Value, expected: &str) -> Result<()> {
    match record_tag(record) {
        Some(found) if found == expected => Ok(()),
        found => Err(Error::SchemaMismatch {
            expected: expected.to_owned(),
            found: found.unwrap_or("<missing>").to_owned(),
        }),
    }
}
