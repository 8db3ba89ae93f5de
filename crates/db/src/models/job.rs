//! Job record as read from the `jobs` collection.

use filesure_core::types::JobId;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// The part of a job document the picker reads.
///
/// `jobStatus` is only used in the query filter; every other field of the
/// stored document is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Store-assigned identifier, usually an ObjectId.
    #[serde(rename = "_id")]
    pub id: Bson,
}

impl Job {
    /// Textual identifier handed to the downloader.
    pub fn job_id(&self) -> JobId {
        render_id(&self.id)
    }
}

/// Render a stored `_id` the way the downloader expects it.
///
/// ObjectIds become their 24-char hex form and strings are passed through
/// without quotes. Scalars follow the existing downloader's conventions
/// (`True`, `None`, `1.0`, `1e+16`); anything else uses its BSON display form.
pub fn render_id(id: &Bson) -> JobId {
    match id {
        Bson::ObjectId(oid) => JobId::new(oid.to_hex()),
        Bson::String(s) => JobId::new(s.clone()),
        Bson::Boolean(true) => JobId::new("True"),
        Bson::Boolean(false) => JobId::new("False"),
        Bson::Null => JobId::new("None"),
        Bson::Double(value) => JobId::new(render_double(*value)),
        other => JobId::new(other.to_string()),
    }
}

/// Shortest round-trip form with a mandatory fractional part, switching to
/// scientific notation below `1e-4` and from `1e16` with a signed two-digit
/// exponent.
fn render_double(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    // `Debug` already uses these thresholds, but writes `1e16` / `1e-5`.
    let rendered = format!("{value:?}");
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// Projection limiting fetched documents to the fields in [`Job`].
pub fn projection() -> Document {
    doc! { "_id": 1 }
}
