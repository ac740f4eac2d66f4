//! Value normalization for staged rows. Raw input is never modified; these
//! return new values.

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// "2025 topps baseball" -> "2025 Topps Baseball"
pub fn normalize_set_name(value: Option<&str>) -> Option<String> {
    non_empty(value).map(title_case)
}

/// "  23a " -> "23A"
pub fn normalize_card_number(value: Option<&str>) -> Option<String> {
    non_empty(value).map(str::to_uppercase)
}

/// "mike   trout" -> "Mike Trout"
pub fn normalize_player(value: Option<&str>) -> Option<String> {
    non_empty(value).map(|v| title_case(&collapse_whitespace(v)))
}

/// Parallels are optional; "rainbow foil" -> "Rainbow Foil"
pub fn normalize_parallel(value: Option<&str>) -> Option<String> {
    non_empty(value).map(title_case)
}

/// "1/1" -> 1, "/500" -> 500, "25/99" -> 99; anything else is absent.
pub fn normalize_print_run(value: &str) -> Option<u32> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if v == "1/1" {
        return Some(1);
    }
    let v = v.strip_prefix('/').unwrap_or(v);
    v.rsplit('/').next()?.trim().parse().ok()
}

/// "2023 – 24" -> "2023-24"
pub fn canonical_set_year(value: &str) -> String {
    collapse_whitespace(value)
        .replace(' ', "")
        .replace('\u{2013}', "-")
}
