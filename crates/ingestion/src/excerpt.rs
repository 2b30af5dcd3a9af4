//! Document excerpt handed to the analysis workflow

use crate::loader::DocumentPage;

/// Leading characters of each of the first `pages` pages, joined by newlines
pub fn build_excerpt(loaded: &[DocumentPage], pages: usize, page_chars: usize) -> String {
    loaded
        .iter()
        .take(pages)
        .map(|page| page.text.chars().take(page_chars).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<DocumentPage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| DocumentPage {
                text: text.to_string(),
                source_id: "contract.pdf".to_string(),
                page: i as u32 + 1,
            })
            .collect()
    }

    #[test]
    fn test_takes_leading_pages_and_chars() {
        let loaded = pages(&["aaaaaa", "bbbbbb", "cccccc"]);
        assert_eq!(build_excerpt(&loaded, 2, 3), "aaa\nbbb");
    }

    #[test]
    fn test_short_corpus() {
        let loaded = pages(&["only page"]);
        assert_eq!(build_excerpt(&loaded, 6, 600), "only page");
        assert_eq!(build_excerpt(&[], 6, 600), "");
    }

    #[test]
    fn test_cuts_on_char_boundary() {
        let loaded = pages(&["ééé"]);
        assert_eq!(build_excerpt(&loaded, 1, 2), "éé");
    }
}
