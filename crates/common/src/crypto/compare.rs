/// Compare two byte slices without short-circuiting on the first difference.
///
/// Slices of different length compare unequal immediately; the length of a tag or digest
/// is public anyway. Otherwise every byte pair is visited and the differences are folded
/// into a single accumulator.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
