//! Classify command for looking up the category of a URL.

use std::io::Write;

use anyhow::Result;

use wt_core::{SnapshotStore, Tracker};

pub fn run<W: Write, S: SnapshotStore>(
    writer: &mut W,
    tracker: &Tracker<S>,
    url: &str,
    explain: bool,
) -> Result<()> {
    let classification = tracker.classify(url)?;

    if !explain {
        writeln!(writer, "{}", classification.category)?;
        return Ok(());
    }

    let domain = classification
        .domain
        .as_ref()
        .map_or("(none)", |domain| domain.as_str());
    writeln!(writer, "URL:      {url}")?;
    writeln!(writer, "Domain:   {domain}")?;
    writeln!(writer, "Category: {}", classification.category)?;
    writeln!(writer, "Decided:  {}", classification.source.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::commands::testing::tracker;

    fn classify(tracker: &Tracker<wt_db::Database>, url: &str, explain: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, tracker, url, explain).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn prints_category_only_by_default() {
        let tracker = tracker();
        assert_snapshot!(classify(&tracker, "https://en.wikipedia.org/wiki/Rust", false), @"Education");
    }

    #[test]
    fn explain_shows_each_step() {
        let mut tracker = tracker();
        assert_snapshot!(classify(&tracker, "https://GitHub.com/rust-lang/rust", true), @r"
        URL:      https://GitHub.com/rust-lang/rust
        Domain:   github.com
        Category: Work
        Decided:  rule
        ");

        assert_snapshot!(classify(&tracker, "https://github.com/", true), @r"
        URL:      https://github.com/
        Domain:   github.com
        Category: Work
        Decided:  cache
        ");

        tracker.set_override("github.com", "Social").unwrap();
        assert_snapshot!(classify(&tracker, "https://github.com/", true), @r"
        URL:      https://github.com/
        Domain:   github.com
        Category: Social
        Decided:  override
        ");
    }

    #[test]
    fn unparseable_url_falls_back_to_other() {
        let tracker = tracker();
        assert_snapshot!(classify(&tracker, "not a url", true), @r"
        URL:      not a url
        Domain:   (none)
        Category: Other
        Decided:  invalid-url
        ");
    }
}
