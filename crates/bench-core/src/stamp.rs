use chrono::NaiveDateTime;

pub const ARCHIVE_TAG_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name given to an archived environment, at second granularity.
pub fn archive_tag(at: NaiveDateTime) -> String {
    at.format(ARCHIVE_TAG_FORMAT).to_string()
}

/// Reverse of [`archive_tag`]. Returns `None` for names the tool did not produce.
pub fn parse_archive_tag(tag: &str) -> Option<NaiveDateTime> {
    let well_formed = tag.len() == 15
        && tag.bytes().enumerate().all(|(index, byte)| match index {
            8 => byte == b'_',
            _ => byte.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDateTime::parse_from_str(tag, ARCHIVE_TAG_FORMAT).ok()
}
