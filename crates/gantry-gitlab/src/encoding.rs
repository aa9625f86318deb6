//! Path segment encoding for GitLab API URLs

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use gantry_core::Repo;

/// Everything except alphanumerics, `-`, `_` and `~`, `.` and `/` included
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Encode a value as one opaque path segment
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Project identifier as it appears in API paths.
///
/// The full `owner/name` path, subgroups included, becomes a single segment.
pub fn project_id(repo: &Repo) -> String {
    encode_segment(&repo.path())
}
