//! Metadata quality checks feeding the preparation status decision

use std::sync::OnceLock;

use regex::Regex;

use crate::record::Record;

/// A single metadata check. Running it sets or clears its defect code on
/// the checked field's masterdata provenance.
pub trait QualityChecker: Send + Sync {
    /// Defect code written to provenance.
    fn code(&self) -> &'static str;
    /// Field the defect is attached to.
    fn field(&self) -> &'static str;
    /// Whether the record currently has the defect.
    fn has_defect(&self, record: &Record) -> bool;

    fn run(&self, record: &mut Record) {
        if self.has_defect(record) {
            record.add_masterdata_provenance_note(self.field(), self.code());
        } else {
            record.remove_masterdata_provenance_note(self.field(), self.code());
        }
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").expect("year pattern"))
}

fn doi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^10\.\d{4,9}/").expect("doi pattern"))
}

fn page_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)--(\d+)$").expect("page range pattern"))
}

pub struct YearFormatChecker;

impl QualityChecker for YearFormatChecker {
    fn code(&self) -> &'static str {
        "year-format"
    }

    fn field(&self) -> &'static str {
        "year"
    }

    fn has_defect(&self, record: &Record) -> bool {
        record.get("year").is_some_and(|y| !year_re().is_match(y.trim()))
    }
}

pub struct DoiFormatChecker;

impl QualityChecker for DoiFormatChecker {
    fn code(&self) -> &'static str {
        "doi-not-matching-pattern"
    }

    fn field(&self) -> &'static str {
        "doi"
    }

    fn has_defect(&self, record: &Record) -> bool {
        record
            .get("doi")
            .is_some_and(|doi| !doi_re().is_match(&doi.trim().to_lowercase()))
    }
}

pub struct PageRangeChecker;

impl QualityChecker for PageRangeChecker {
    fn code(&self) -> &'static str {
        "page-range"
    }

    fn field(&self) -> &'static str {
        "pages"
    }

    fn has_defect(&self, record: &Record) -> bool {
        let Some(caps) = record.get("pages").and_then(|p| page_range_re().captures(p.trim()))
        else {
            return false;
        };
        match (caps[1].parse::<u64>(), caps[2].parse::<u64>()) {
            (Ok(from), Ok(to)) => from > to,
            _ => false,
        }
    }
}

/// Title repeats the journal or booktitle.
pub struct TitleContainerChecker;

fn strip_article(s: &str) -> String {
    s.trim().to_lowercase().replace("the ", "")
}

impl QualityChecker for TitleContainerChecker {
    fn code(&self) -> &'static str {
        "identical-values-between-title-and-container"
    }

    fn field(&self) -> &'static str {
        "title"
    }

    fn has_defect(&self, record: &Record) -> bool {
        let Some(title) = record.get("title").map(strip_article) else {
            return false;
        };
        ["journal", "booktitle"]
            .iter()
            .filter_map(|f| record.get(f))
            .any(|container| strip_article(container) == title)
    }
}

/// All checkers, in run order.
pub fn default_checkers() -> Vec<Box<dyn QualityChecker>> {
    vec![
        Box::new(YearFormatChecker),
        Box::new(DoiFormatChecker),
        Box::new(PageRangeChecker),
        Box::new(TitleContainerChecker),
    ]
}

/// Run every checker on `record`; returns whether any defect remains.
pub fn run_checks(record: &mut Record, checkers: &[Box<dyn QualityChecker>]) -> bool {
    for checker in checkers {
        checker.run(record);
    }
    record.has_masterdata_defects()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::RecordState;

    fn rec() -> Record {
        Record::new("R1", RecordState::MdImported)
    }

    #[test]
    fn year_format() {
        assert!(YearFormatChecker.has_defect(&rec().with_field("year", "20x0")));
        assert!(!YearFormatChecker.has_defect(&rec().with_field("year", "2020")));
        assert!(!YearFormatChecker.has_defect(&rec()));
    }

    #[test]
    fn doi_pattern() {
        assert!(!DoiFormatChecker.has_defect(&rec().with_field("doi", "10.1287/isre.2020.0001")));
        assert!(DoiFormatChecker.has_defect(&rec().with_field("doi", "https://doi.org/10.1/x")));
    }

    #[test]
    fn descending_pages() {
        assert!(PageRangeChecker.has_defect(&rec().with_field("pages", "45--12")));
        assert!(!PageRangeChecker.has_defect(&rec().with_field("pages", "12--45")));
        assert!(!PageRangeChecker.has_defect(&rec().with_field("pages", "e123")));
    }

    #[test]
    fn title_equals_journal() {
        let r = rec()
            .with_field("title", "The Journal of Things")
            .with_field("journal", "Journal of Things");
        assert!(TitleContainerChecker.has_defect(&r));
    }

    #[test]
    fn run_sets_and_clears_notes() {
        let checkers = default_checkers();
        let mut r = rec().with_field("year", "20x0");
        assert!(run_checks(&mut r, &checkers));
        assert!(r.masterdata_provenance["year"].notes.contains("year-format"));

        r.fields.insert("year".into(), "2020".into());
        assert!(!run_checks(&mut r, &checkers));
        assert!(r.masterdata_provenance["year"].notes.is_empty());
    }
}
