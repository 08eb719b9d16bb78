pub mod errors;
pub mod functions;
pub mod models;
pub mod service;
pub mod wrappers;

use std::path::Path;

use oafn_core::GeneratedFile;

/// Suffix every generated C# file carries.
pub const FILE_SUFFIX: &str = ".generated.cs";

/// Build the output file for a generated type.
pub fn output_file(folder: &Path, type_name: &str, content: String) -> GeneratedFile {
    GeneratedFile {
        path: folder.join(format!("{type_name}{FILE_SUFFIX}")),
        content,
    }
}

/// Split a description into doc comment lines, trimming the block as a whole.
pub fn doc_lines(text: Option<&str>) -> Vec<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.lines().map(|l| l.trim_end().to_string()).collect())
        .unwrap_or_default()
}

/// Concatenate import lists, dropping repeats but keeping first-seen order.
pub fn merge_imports<'a>(lists: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for import in lists.into_iter().flatten() {
        if !out.contains(import) {
            out.push(import.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_lines() {
        assert!(doc_lines(None).is_empty());
        assert!(doc_lines(Some("  \n ")).is_empty());
        assert_eq!(doc_lines(Some("First.\nSecond.  \n")), vec!["First.", "Second."]);
    }

    #[test]
    fn test_merge_imports() {
        let a = vec!["System.Linq".to_string(), "Demo".to_string()];
        let b = vec!["Demo".to_string(), "Demo.Model".to_string()];
        assert_eq!(
            merge_imports([a.as_slice(), b.as_slice()]),
            vec!["System.Linq", "Demo", "Demo.Model"]
        );
    }
}
