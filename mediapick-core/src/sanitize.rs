/// Map a library identifier to a token usable as a file name stem.
///
/// Path separators and colons become underscores; everything else is kept,
/// so the mapping is stable across calls and idempotent.
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier.replace(['/', ':'], "_")
}
