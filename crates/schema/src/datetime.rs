//! Text form of `DateTime` leaves.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use castor_core::DateTimeFormat;
use time::format_description::{self, well_known::Rfc3339, OwnedFormatItem};
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Parsed format descriptions, shared by every executor in the process.
static DESCRIPTIONS: OnceLock<RwLock<HashMap<String, Arc<OwnedFormatItem>>>> = OnceLock::new();

/// The parsed form of `source`, parsed once per distinct description.
fn description(source: &str) -> Result<Arc<OwnedFormatItem>, String> {
    let cache = DESCRIPTIONS.get_or_init(Default::default);
    if let Some(items) = cache.read().unwrap_or_else(PoisonError::into_inner).get(source) {
        return Ok(items.clone());
    }
    let items = Arc::new(format_description::parse_owned::<1>(source).map_err(|e| e.to_string())?);
    Ok(cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(source.to_owned())
        .or_insert(items)
        .clone())
}

/// Parse `text` in `format`. Custom formats without an offset are read as
/// UTC, and date-only formats as midnight UTC.
pub(crate) fn parse(text: &str, format: &DateTimeFormat) -> Result<OffsetDateTime, String> {
    match format {
        DateTimeFormat::Rfc3339 => OffsetDateTime::parse(text, &Rfc3339).map_err(|e| e.to_string()),
        DateTimeFormat::Custom(source) => {
            let items = description(source)?;
            let items: &OwnedFormatItem = &items;
            OffsetDateTime::parse(text, items)
                .or_else(|_| PrimitiveDateTime::parse(text, items).map(PrimitiveDateTime::assume_utc))
                .or_else(|_| Date::parse(text, items).map(|d| d.midnight().assume_utc()))
                .map_err(|e| e.to_string())
        }
    }
}

pub(crate) fn format(value: &OffsetDateTime, format: &DateTimeFormat) -> Result<String, String> {
    match format {
        DateTimeFormat::Rfc3339 => value.format(&Rfc3339).map_err(|e| e.to_string()),
        DateTimeFormat::Custom(source) => {
            let items = description(source)?;
            value.format(&*items).map_err(|e| e.to_string())
        }
    }
}
