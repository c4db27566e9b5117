//! Per-URL outcome reporting for best-effort indexing.

use crate::RetrievalError;

/// Result of indexing a single URL: the number of chunks added, or why the
/// URL was skipped.
#[derive(Debug)]
pub struct UrlOutcome {
    pub url: String,
    pub result: Result<usize, RetrievalError>,
}

/// Aggregated outcome of an indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub outcomes: Vec<UrlOutcome>,
}

impl IndexReport {
    pub fn push(&mut self, url: impl Into<String>, result: Result<usize, RetrievalError>) {
        self.outcomes.push(UrlOutcome {
            url: url.into(),
            result,
        });
    }

    /// URLs that made it into the index.
    #[must_use]
    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.url.as_str())
            .collect()
    }

    /// URLs that were skipped, with the reason.
    #[must_use]
    pub fn failed(&self) -> Vec<(&str, &RetrievalError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.url.as_str(), e)))
            .collect()
    }

    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_splits_successes_and_failures() {
        let mut report = IndexReport::default();
        report.push("https://a.example/doc.pdf", Ok(3));
        report.push(
            "https://b.example/doc.pdf",
            Err(RetrievalError::Download {
                url: "https://b.example/doc.pdf".to_string(),
                reason: "404".to_string(),
            }),
        );
        report.push("https://c.example/doc.pdf", Ok(2));

        assert_eq!(
            report.succeeded(),
            vec!["https://a.example/doc.pdf", "https://c.example/doc.pdf"]
        );
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].0, "https://b.example/doc.pdf");
        assert_eq!(report.total_chunks(), 5);
    }
}
