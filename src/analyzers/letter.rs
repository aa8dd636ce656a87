/// Converts an American-scale value (0.0–4.0) into a letter grade.
///
/// | Range       | Grade |
/// |-------------|-------|
/// | >= 3.5      | A     |
/// | >= 2.5      | B     |
/// | >= 1.5      | C     |
/// | >= 0.5      | D     |
/// | < 0.5       | F     |
pub fn letter(value: f64) -> &'static str {
    match value {
        v if v >= 3.5 => "A",
        v if v >= 2.5 => "B",
        v if v >= 1.5 => "C",
        v if v >= 0.5 => "D",
        _ => "F",
    }
}
