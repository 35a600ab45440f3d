//! Cell rewriting for scalar, delimited-list, and JSON-array cells.

use crate::input::JsonList;

/// Replace `from` with `to` in a cell.
///
/// Scalar cells (`delimiter` is `None`) change only when the whole cell
/// equals `from`. List cells are split on the delimiter and every element
/// whose trimmed text equals `from` is replaced in place, keeping the
/// whitespace around it; an empty `to` drops the element. Untouched
/// elements, their order, and the delimiter are preserved exactly.
///
/// A cell holding a JSON array is rewritten element-wise and stays a JSON
/// array, whatever the delimiter.
pub fn rewrite_cell(cell: &str, from: &str, to: &str, delimiter: Option<&str>) -> String {
    if let Some(mut list) = JsonList::parse(cell) {
        if !list.elements().iter().any(|e| e == from) {
            return cell.to_string();
        }
        list.replace(from, to);
        return list.render();
    }

    match delimiter {
        Some(delimiter) if !delimiter.is_empty() => rewrite_list(cell, from, to, delimiter),
        _ if cell == from => to.to_string(),
        _ => cell.to_string(),
    }
}

fn rewrite_list(cell: &str, from: &str, to: &str, delimiter: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    let mut dropped_leading = false;

    for element in cell.split(delimiter) {
        let trimmed = element.trim();
        if trimmed.is_empty() || trimmed != from {
            kept.push(element.to_string());
            continue;
        }

        if to.is_empty() {
            dropped_leading |= kept.is_empty();
            continue;
        }

        let start = element.len() - element.trim_start().len();
        let end = element.trim_end().len();
        kept.push(format!("{}{}{}", &element[..start], to, &element[end..]));
    }

    // The new first element should not keep the padding it had after a delimiter
    if dropped_leading {
        if let Some(first) = kept.first_mut() {
            *first = first.trim_start().to_string();
        }
    }

    kept.join(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_exact_match_only() {
        assert_eq!(rewrite_cell("male", "male", "Male", None), "Male");
        assert_eq!(rewrite_cell("Female", "male", "Male", None), "Female");
        assert_eq!(rewrite_cell("Femle", "Femle", "", None), "");
    }

    #[test]
    fn test_list_element_replaced_in_place() {
        assert_eq!(
            rewrite_cell("Blood; blood ;Skin", "blood", "Blood", Some(";")),
            "Blood; Blood ;Skin"
        );
        assert_eq!(rewrite_cell("a,b,c", "b", "B", Some(",")), "a,B,c");
    }

    #[test]
    fn test_list_untouched_elements_preserved() {
        assert_eq!(
            rewrite_cell("Skin | Bloood |  Bone", "Bloood", "Blood", Some("|")),
            "Skin | Blood |  Bone"
        );
        assert_eq!(rewrite_cell("Skin, ,Bone", "Bloood", "Blood", Some(",")), "Skin, ,Bone");
    }

    #[test]
    fn test_list_element_dropped() {
        assert_eq!(rewrite_cell("Blood, xx, Skin", "xx", "", Some(",")), "Blood, Skin");
        assert_eq!(rewrite_cell("xx, Blood, Skin", "xx", "", Some(",")), "Blood, Skin");
        assert_eq!(rewrite_cell("xx, xx, Skin", "xx", "", Some(",")), "Skin");
        assert_eq!(rewrite_cell("xx", "xx", "", Some(",")), "");
    }

    #[test]
    fn test_json_array_rewritten_as_json() {
        assert_eq!(
            rewrite_cell(r#"["Bloood", "Skin"]"#, "Bloood", "Blood", None),
            r#"["Blood", "Skin"]"#
        );
        assert_eq!(
            rewrite_cell(r#"["Skin","Bloood, whole"]"#, "Bloood, whole", "Blood", Some(",")),
            r#"["Skin","Blood"]"#
        );
        assert_eq!(rewrite_cell(r#"["xx", "Skin"]"#, "xx", "", Some(";")), r#"["Skin"]"#);
    }

    #[test]
    fn test_json_array_without_match_untouched() {
        let cell = r#" ["Skin",  "Bone"] "#;
        assert_eq!(rewrite_cell(cell, "Bloood", "Blood", None), cell);
        assert_eq!(rewrite_cell("[Bloood]", "[Bloood]", "Blood", None), "Blood");
    }

    #[test]
    fn test_list_scalar_cell() {
        assert_eq!(rewrite_cell("Bloood", "Bloood", "Blood", Some(";")), "Blood");
    }
}
