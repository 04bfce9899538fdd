use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Optional http(s) scheme, at least two dot-separated host labels, then an
    /// optional path/query tail that must not end in punctuation like `.` or `,`.
    static ref LINK_SHAPE: Regex = Regex::new(
        r"^(https?://)?([A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)+)([A-Za-z0-9_.,@?^=%&:/~+#-]*[A-Za-z0-9_@?^=%&/~+#-])?$"
    )
    .unwrap();
}

/// Check whether a candidate looks like a submittable link.
///
/// This is a shape check only. Nothing is resolved or fetched.
pub fn is_valid_link(candidate: &str) -> bool {
    LINK_SHAPE.is_match(candidate)
}
