//! Utility functions for path and name handling

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Separator that marks a stage entry as a nested path
pub const PATH_SEPARATOR: char = '/';

/// Bytes escaped in a multi-segment path: everything except ASCII letters,
/// digits, `-_.~` and the sub-delimiters `$&+,/:;=@`
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Bytes escaped in a single path segment: [`PATH`] plus `/`, `;` and `,`
const PATH_SEGMENT: &AsciiSet = &PATH.add(b'/').add(b';').add(b',');

/// Percent-encode a value for use as a single URL path segment
///
/// ASCII letters, digits, `-_.~` and `$&+:=@` are kept; everything else is
/// escaped, including `/`, so the result never spans more than one segment.
///
/// # Examples
///
/// ```
/// use i2_config_export::utils::escape_path_segment;
///
/// assert_eq!(escape_path_segment("my pkg"), "my%20pkg");
/// assert_eq!(escape_path_segment("a/b"), "a%2Fb");
/// assert_eq!(escape_path_segment("a+b@c"), "a+b@c");
/// ```
pub fn escape_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Percent-encode a relative path, keeping its `/` separators
///
/// A literal `%` is escaped as well, so an entry named `a%2Fb` reaches the
/// server as that name and not as `a/b`.
///
/// # Examples
///
/// ```
/// use i2_config_export::utils::escape_path;
///
/// assert_eq!(escape_path("conf.d/my hosts.conf"), "conf.d/my%20hosts.conf");
/// assert_eq!(escape_path("conf.d/a%2Fb.conf"), "conf.d/a%252Fb.conf");
/// ```
pub fn escape_path(value: &str) -> String {
    utf8_percent_encode(value, PATH).to_string()
}

/// Returns `true` if `name` contains a path separator
pub fn has_path_separator(name: &str) -> bool {
    name.contains(PATH_SEPARATOR)
}
