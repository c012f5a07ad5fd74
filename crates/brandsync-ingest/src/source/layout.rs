//! Header normalization
//!
//! Maps a source's header row onto the canonical columns. Named headers are
//! used when all four canonical columns can be found; otherwise the first
//! four positional columns are taken as location, floor, name, category.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SourceError;

/// Accepted header spellings for each canonical column.
///
/// Matching ignores surrounding whitespace and ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderAliases {
    pub location: Vec<String>,
    pub floor: Vec<String>,
    pub name: Vec<String>,
    pub category: Vec<String>,
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self {
            location: vec!["location".to_string()],
            floor: vec!["floor".to_string()],
            name: vec!["name".to_string()],
            category: vec!["category".to_string(), "類別".to_string()],
        }
    }
}

impl HeaderAliases {
    /// Canonical column names paired with their alias lists
    pub fn columns(&self) -> [(&'static str, &[String]); 4] {
        [
            ("location", self.location.as_slice()),
            ("floor", self.floor.as_slice()),
            ("name", self.name.as_slice()),
            ("category", self.category.as_slice()),
        ]
    }
}

/// How the header row was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// All four canonical headers were found by name
    Named,
    /// Headers were not recognised; the first four columns were renamed
    Positional,
}

/// Column indices of the canonical fields plus passthrough extras
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLayout {
    pub kind: LayoutKind,
    pub location: usize,
    pub floor: usize,
    pub name: usize,
    pub category: usize,
    /// `(column index, header)` for every other column, in source order
    pub extras: Vec<(usize, String)>,
}

impl ColumnLayout {
    pub fn resolve(
        path: &Path,
        headers: &[String],
        aliases: &HeaderAliases,
    ) -> Result<Self, SourceError> {
        let [location, floor, name, category] =
            aliases.columns().map(|(_, names)| find_header(headers, names));

        let (kind, location, floor, name, category) = match (location, floor, name, category) {
            (Some(l), Some(f), Some(n), Some(c)) if distinct(&[l, f, n, c]) => {
                (LayoutKind::Named, l, f, n, c)
            },
            _ if headers.len() >= 4 => (LayoutKind::Positional, 0, 1, 2, 3),
            _ => {
                return Err(SourceError::TooFewColumns {
                    path: path.to_path_buf(),
                    found: headers.len(),
                })
            },
        };

        let canonical = [location, floor, name, category];
        let extras = headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !canonical.contains(index))
            .map(|(index, header)| (index, extra_header_name(index, header)))
            .collect();

        Ok(Self {
            kind,
            location,
            floor,
            name,
            category,
            extras,
        })
    }

    /// One-line summary with 1-based column numbers
    pub fn describe(&self) -> String {
        format!(
            "{} layout: location=col{} floor=col{} name=col{} category=col{} (+{} extra)",
            match self.kind {
                LayoutKind::Named => "named",
                LayoutKind::Positional => "positional",
            },
            self.location + 1,
            self.floor + 1,
            self.name + 1,
            self.category + 1,
            self.extras.len()
        )
    }
}

fn find_header(headers: &[String], aliases: &[String]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim();
        aliases
            .iter()
            .any(|alias| header.eq_ignore_ascii_case(alias.trim()))
    })
}

fn distinct(indices: &[usize; 4]) -> bool {
    indices
        .iter()
        .enumerate()
        .all(|(i, a)| indices[i + 1..].iter().all(|b| a != b))
}

fn extra_header_name(index: usize, header: &str) -> String {
    let header = header.trim();
    if header.is_empty() {
        format!("column_{}", index + 1)
    } else {
        header.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(names: &[&str]) -> Result<ColumnLayout, SourceError> {
        ColumnLayout::resolve(Path::new("test.csv"), &headers(names), &HeaderAliases::default())
    }

    #[test]
    fn test_named_headers_in_any_order() {
        let layout = resolve(&["name", "Floor", " LOCATION ", "category"]).unwrap();
        assert_eq!(layout.kind, LayoutKind::Named);
        assert_eq!(layout.location, 2);
        assert_eq!(layout.floor, 1);
        assert_eq!(layout.name, 0);
        assert_eq!(layout.category, 3);
        assert!(layout.extras.is_empty());
    }

    #[test]
    fn test_chinese_category_header() {
        let layout = resolve(&["location", "floor", "name", "類別", "備註"]).unwrap();
        assert_eq!(layout.kind, LayoutKind::Named);
        assert_eq!(layout.category, 3);
        assert_eq!(layout.extras, vec![(4, "備註".to_string())]);
    }

    #[test]
    fn test_named_extras_keep_source_order() {
        let layout = resolve(&["phone", "location", "floor", "url", "name", "category"]).unwrap();
        assert_eq!(
            layout.extras,
            vec![(0, "phone".to_string()), (3, "url".to_string())]
        );
    }

    #[test]
    fn test_unrecognised_headers_fall_back_to_positions() {
        let layout = resolve(&["館別", "樓層", "品牌", "分類", "網址"]).unwrap();
        assert_eq!(layout.kind, LayoutKind::Positional);
        assert_eq!(
            (layout.location, layout.floor, layout.name, layout.category),
            (0, 1, 2, 3)
        );
        assert_eq!(layout.extras, vec![(4, "網址".to_string())]);
    }

    #[test]
    fn test_partial_named_headers_use_positions() {
        // "category" is missing, so names cannot be trusted
        let layout = resolve(&["location", "floor", "name", "type"]).unwrap();
        assert_eq!(layout.kind, LayoutKind::Positional);
    }

    #[test]
    fn test_too_few_columns() {
        let err = resolve(&["location", "floor", "name"]).unwrap_err();
        assert!(matches!(err, SourceError::TooFewColumns { found: 3, .. }));
    }

    #[test]
    fn test_blank_extra_header_gets_generated_name() {
        let layout = resolve(&["a", "b", "c", "d", ""]).unwrap();
        assert_eq!(layout.extras, vec![(4, "column_5".to_string())]);
    }

    #[test]
    fn test_custom_aliases() {
        let aliases = HeaderAliases {
            name: vec!["brand".to_string()],
            ..HeaderAliases::default()
        };
        let layout = ColumnLayout::resolve(
            Path::new("test.csv"),
            &headers(&["brand", "location", "floor", "category"]),
            &aliases,
        )
        .unwrap();
        assert_eq!(layout.kind, LayoutKind::Named);
        assert_eq!(layout.name, 0);
    }

    #[test]
    fn test_describe() {
        let layout = resolve(&["x", "y", "z", "w", "v"]).unwrap();
        assert_eq!(
            layout.describe(),
            "positional layout: location=col1 floor=col2 name=col3 category=col4 (+1 extra)"
        );
    }
}
