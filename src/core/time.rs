use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

/// `+05:30` style rendering of an offset.
pub(crate) fn format_utc_offset(offset: UtcOffset) -> String {
    let (hours, minutes, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!("{sign}{:02}:{:02}", hours.unsigned_abs(), minutes.unsigned_abs())
}

/// Turns a stored wall-clock value into an absolute instant.
///
/// `offset_seconds` is the offset recorded alongside the value. When it is
/// absent the value is naive and is read in `fallback`.
pub(crate) fn resolve_local(
    value: PrimitiveDateTime,
    offset_seconds: Option<i32>,
    fallback: UtcOffset,
) -> OffsetDateTime {
    let offset = offset_seconds
        .and_then(|seconds| UtcOffset::from_whole_seconds(seconds).ok())
        .unwrap_or(fallback);
    value.assume_offset(offset)
}
