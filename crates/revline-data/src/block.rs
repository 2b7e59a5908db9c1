//! The "records to synthesize" block shared by the markdown endpoints
//!
//! New records are listed as `- @ID` items after a marker comment. Authors
//! move an ID out of the block once it is covered in the text; whatever is
//! still listed there is pending.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

pub const NEW_RECORD_SOURCE: &str = "<!-- NEW_RECORD_SOURCE -->";
const HEADING: &str = "_Records to synthesize_:";

fn citation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([^\s;,\[\]()@]+)").expect("citation pattern"))
}

/// ID of a block item such as `- @Smith2020` or `- [[note.md]] @Smith2020`.
fn item_id(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("- ")?;
    let (_, id) = rest.rsplit_once('@')?;
    let id = id.trim();
    (!id.is_empty()).then_some(id)
}

/// IDs cited anywhere in `text` (`@ID`), trailing periods stripped.
pub fn cited_ids(text: &str) -> BTreeSet<String> {
    citation_re()
        .captures_iter(text)
        .map(|c| c[1].trim_end_matches('.').to_string())
        .collect()
}

/// IDs still listed in the block. Empty when the marker is absent.
pub fn pending_ids(text: &str) -> Vec<String> {
    let mut lines = text.lines().skip_while(|l| !l.contains(NEW_RECORD_SOURCE));
    if lines.next().is_none() {
        return Vec::new();
    }
    let mut ids = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match item_id(line) {
            Some(id) => ids.push(id.to_string()),
            None => break,
        }
    }
    ids
}

/// Insert `items` (full list lines) at the top of the block. Without a
/// marker the block is appended at the end of the document.
pub fn insert_items(text: &str, items: &[String], file_name: &str) -> String {
    let mut out = String::with_capacity(text.len() + items.len() * 24);
    let mut lines = text.lines().peekable();
    let mut inserted = false;

    while let Some(line) = lines.next() {
        if inserted || !line.contains(NEW_RECORD_SOURCE) {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        if !line.contains(HEADING) {
            out.push_str(HEADING);
        }
        out.push_str(line);
        out.push_str("\n\n");
        for item in items {
            out.push_str(item);
            out.push('\n');
        }
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }
        if lines.peek().is_some_and(|l| item_id(l).is_none()) {
            out.push('\n');
        }
        inserted = true;
    }

    if !inserted {
        log::warn!("marker {NEW_RECORD_SOURCE} not found in {file_name}, adding records at the end");
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(HEADING);
        out.push_str(NEW_RECORD_SOURCE);
        out.push_str("\n\n");
        for item in items {
            out.push_str(item);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "# Review\n\n## Results\n\n<!-- NEW_RECORD_SOURCE -->\n\n## Discussion\n";

    #[test]
    fn insert_then_read_pending() {
        let items = vec!["- @A".to_string(), "- @B".to_string()];
        let text = insert_items(PAPER, &items, "paper.md");
        assert!(text.contains("_Records to synthesize_:<!-- NEW_RECORD_SOURCE -->\n\n- @A\n- @B\n\n## Discussion"));
        assert_eq!(pending_ids(&text), vec!["A", "B"]);

        // Second insertion joins the existing list
        let text = insert_items(&text, &["- @C".to_string()], "paper.md");
        assert_eq!(pending_ids(&text), vec!["C", "A", "B"]);
        assert_eq!(text.matches(HEADING).count(), 1);
    }

    #[test]
    fn missing_marker_appends_block() {
        let text = insert_items("# Review\n", &["- @A".to_string()], "paper.md");
        assert!(text.ends_with("<!-- NEW_RECORD_SOURCE -->\n\n- @A\n"));
        assert_eq!(pending_ids(&text), vec!["A"]);
        assert!(pending_ids("# no marker\n- @A\n").is_empty());
    }

    #[test]
    fn zettlr_items_and_citations() {
        let text = "<!-- NEW_RECORD_SOURCE -->\n\n- [[20260101120000.md]] @Smith2020\n";
        assert_eq!(pending_ids(text), vec!["Smith2020"]);
        let cited = cited_ids("As shown by @Smith2020. See [@Lee2019; @Kim2021]");
        assert_eq!(
            cited.into_iter().collect::<Vec<_>>(),
            vec!["Kim2021", "Lee2019", "Smith2020"]
        );
    }
}
