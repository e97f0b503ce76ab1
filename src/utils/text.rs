/// Width of a string in half-width cells.
///
/// Counted per UTF-16 code unit: printable ASCII and half-width katakana count
/// 1, everything else 2 (so characters outside the BMP count 4).
pub fn display_width(text: &str) -> usize {
    text.encode_utf16()
        .map(|unit| match unit {
            0x0001..=0x007e | 0xff60..=0xff9f => 1,
            _ => 2,
        })
        .sum()
}
