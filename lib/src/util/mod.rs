mod macros;

pub use macros::*;

/// Returns `true` if `input` is likely to contain a template: an expression
/// (`{{`), a statement (`{%`), or a comment (`{#`).
pub fn is_template(input: &str) -> bool {
    let mut slice = input.as_bytes();
    while let Some(i) = memchr::memchr(b'{', slice) {
        match slice.get(i + 1) {
            Some(b'{') | Some(b'%') | Some(b'#') => return true,
            Some(_) => slice = &slice[(i + 1)..],
            None => return false,
        }
    }

    false
}

/// Splits `line` at its first line terminator. Returns the line without its
/// terminator and the remainder after it. A line at the end of `input` with no
/// terminator has an empty remainder.
pub(crate) fn split_line(input: &str) -> (&str, &str) {
    match memchr::memchr(b'\n', input.as_bytes()) {
        Some(i) => (&input[..i], &input[(i + 1)..]),
        None => (input, ""),
    }
}
