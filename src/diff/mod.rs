//! Unified diff parsing into a structured change set

use crate::core::{ChangeRecord, ChangeSet, ImpactError, LineRange, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref HUNK_HEADER: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap();
}

/// Parse a unified diff into a [`ChangeSet`]
///
/// Recognizes git-style section headers (`diff --git`, rename and binary
/// markers) as well as plain `---`/`+++` file pairs. Fails with
/// [`ImpactError::MalformedDiff`] on an empty diff, an unparseable hunk
/// header, or a file section that carries no hunks and is neither a rename
/// nor binary.
pub fn parse_unified_diff(diff: &str) -> Result<ChangeSet> {
    if diff.trim().is_empty() {
        return Err(ImpactError::malformed_diff(0, "diff is empty"));
    }

    let mut parser = DiffParser::default();
    for (idx, line) in diff.lines().enumerate() {
        parser.feed(idx + 1, line)?;
    }
    parser.finish()
}

#[derive(Debug)]
struct FileSection {
    started_at: usize,
    old_path: Option<String>,
    new_path: Option<String>,
    renamed: bool,
    binary: bool,
    hunk_count: usize,
    lines_added: usize,
    lines_removed: usize,
    ranges: Vec<LineRange>,
}

impl FileSection {
    fn new(started_at: usize) -> Self {
        Self {
            started_at,
            old_path: None,
            new_path: None,
            renamed: false,
            binary: false,
            hunk_count: 0,
            lines_added: 0,
            lines_removed: 0,
            ranges: Vec::new(),
        }
    }

    fn effective_path(&self) -> Option<String> {
        match (&self.new_path, &self.old_path) {
            (Some(new), _) if new != "/dev/null" => Some(new.clone()),
            (_, Some(old)) if old != "/dev/null" => Some(old.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct DiffParser {
    section: Option<FileSection>,
    records: BTreeMap<String, ChangeRecord>,
    // Remaining old/new line budget of the hunk being consumed
    hunk_old_left: usize,
    hunk_new_left: usize,
    new_cursor: usize,
    touched_min: Option<usize>,
    touched_max: usize,
}

impl DiffParser {
    fn feed(&mut self, line_no: usize, line: &str) -> Result<()> {
        if self.in_hunk() {
            return self.consume_hunk_line(line_no, line);
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            self.flush_section()?;
            let mut section = FileSection::new(line_no);
            if let Some((old, new)) = split_git_header_paths(rest) {
                section.old_path = Some(old);
                section.new_path = Some(new);
            }
            self.section = Some(section);
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("rename from ") {
            let section = self.section_mut(line_no);
            section.renamed = true;
            section.old_path = Some(path.trim().to_string());
            return Ok(());
        }
        if let Some(path) = line.strip_prefix("rename to ") {
            let section = self.section_mut(line_no);
            section.renamed = true;
            section.new_path = Some(path.trim().to_string());
            return Ok(());
        }
        if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            self.section_mut(line_no).binary = true;
            return Ok(());
        }

        if let Some(path) = line.strip_prefix("--- ") {
            // A plain unified diff has no `diff --git` marker, so a `---`
            // header may also open a new section.
            if self.section.as_ref().is_some_and(|s| s.hunk_count > 0) {
                self.flush_section()?;
            }
            self.section_mut(line_no).old_path = Some(strip_prefix_marker(path));
            return Ok(());
        }
        if let Some(path) = line.strip_prefix("+++ ") {
            self.section_mut(line_no).new_path = Some(strip_prefix_marker(path));
            return Ok(());
        }

        if line.starts_with("@@") {
            return self.start_hunk(line_no, line);
        }

        // Mode lines, index lines, commit prose: ignored
        Ok(())
    }

    fn in_hunk(&self) -> bool {
        self.hunk_old_left > 0 || self.hunk_new_left > 0
    }

    fn start_hunk(&mut self, line_no: usize, line: &str) -> Result<()> {
        let caps = HUNK_HEADER
            .captures(line)
            .ok_or_else(|| ImpactError::malformed_diff(line_no, format!("bad hunk header: {line}")))?;

        let new_start: usize = caps[3].parse().unwrap_or(0);
        let old_len: usize = caps.get(2).map_or(1, |m| m.as_str().parse().unwrap_or(1));
        let new_len: usize = caps.get(4).map_or(1, |m| m.as_str().parse().unwrap_or(1));

        let section = self
            .section
            .as_mut()
            .ok_or_else(|| ImpactError::malformed_diff(line_no, "hunk outside a file section"))?;
        section.hunk_count += 1;

        self.hunk_old_left = old_len;
        self.hunk_new_left = new_len;
        self.new_cursor = new_start.max(1);
        self.touched_min = None;
        self.touched_max = 0;
        if old_len == 0 && new_len == 0 {
            self.end_hunk();
        }
        Ok(())
    }

    fn consume_hunk_line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let mut chars = line.chars();
        match chars.next() {
            Some('+') => {
                self.touch(self.new_cursor);
                self.new_cursor += 1;
                self.hunk_new_left = self.hunk_new_left.saturating_sub(1);
                if let Some(section) = self.section.as_mut() {
                    section.lines_added += 1;
                }
            }
            Some('-') => {
                self.touch(self.new_cursor);
                self.hunk_old_left = self.hunk_old_left.saturating_sub(1);
                if let Some(section) = self.section.as_mut() {
                    section.lines_removed += 1;
                }
            }
            Some(' ') | None => {
                self.new_cursor += 1;
                self.hunk_old_left = self.hunk_old_left.saturating_sub(1);
                self.hunk_new_left = self.hunk_new_left.saturating_sub(1);
            }
            Some('\\') => {} // "\ No newline at end of file"
            _ => {
                return Err(ImpactError::malformed_diff(
                    line_no,
                    format!("unexpected line inside hunk: {line}"),
                ));
            }
        }

        if !self.in_hunk() {
            self.end_hunk();
        }
        Ok(())
    }

    fn touch(&mut self, line: usize) {
        let line = line.max(1);
        if self.touched_min.map_or(true, |min| line < min) {
            self.touched_min = Some(line);
        }
        self.touched_max = self.touched_max.max(line);
    }

    fn end_hunk(&mut self) {
        if let (Some(min), Some(section)) = (self.touched_min.take(), self.section.as_mut()) {
            section.ranges.push(LineRange::new(min, self.touched_max));
        }
        self.hunk_old_left = 0;
        self.hunk_new_left = 0;
    }

    fn section_mut(&mut self, line_no: usize) -> &mut FileSection {
        self.section.get_or_insert_with(|| FileSection::new(line_no))
    }

    fn flush_section(&mut self) -> Result<()> {
        let Some(section) = self.section.take() else {
            return Ok(());
        };
        if section.hunk_count == 0 && !section.renamed && !section.binary {
            return Err(ImpactError::malformed_diff(
                section.started_at,
                "file section has no hunks",
            ));
        }
        let Some(path) = section.effective_path() else {
            return Err(ImpactError::malformed_diff(
                section.started_at,
                "file section has no usable path",
            ));
        };

        let entry = self.records.entry(path.clone()).or_insert(ChangeRecord {
            path,
            lines_added: 0,
            lines_removed: 0,
            changed_ranges: Vec::new(),
            renamed: false,
        });
        entry.lines_added += section.lines_added;
        entry.lines_removed += section.lines_removed;
        entry.changed_ranges.extend(section.ranges);
        entry.renamed |= section.renamed;
        Ok(())
    }

    fn finish(mut self) -> Result<ChangeSet> {
        if self.in_hunk() {
            self.end_hunk();
        }
        self.flush_section()?;
        if self.records.is_empty() {
            return Err(ImpactError::malformed_diff(0, "diff contains no file sections"));
        }
        Ok(ChangeSet::from_records(self.records.into_values()))
    }
}

/// Strip the `a/` / `b/` marker and any trailing tab metadata from a header path
fn strip_prefix_marker(path: &str) -> String {
    let path = path.split('\t').next().unwrap_or(path).trim();
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

/// Split the `a/old b/new` pair on a `diff --git` line
fn split_git_header_paths(rest: &str) -> Option<(String, String)> {
    let marker = rest.find(" b/")?;
    let old = rest[..marker].strip_prefix("a/")?.to_string();
    let new = rest[marker + 3..].trim().to_string();
    Some((old, new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_diff_is_malformed() {
        let err = parse_unified_diff("  \n\n").unwrap_err();
        assert!(matches!(err, ImpactError::MalformedDiff { line: 0, .. }));
    }

    #[test]
    fn strips_header_markers() {
        assert_eq!(strip_prefix_marker("a/src/app.js"), "src/app.js");
        assert_eq!(strip_prefix_marker("b/src/app.js\t2024-01-01"), "src/app.js");
        assert_eq!(strip_prefix_marker("/dev/null"), "/dev/null");
    }

    #[test]
    fn splits_git_header_paths() {
        let (old, new) = split_git_header_paths("a/src/a.js b/src/b.js").unwrap();
        assert_eq!(old, "src/a.js");
        assert_eq!(new, "src/b.js");
    }

    #[test]
    fn deletion_only_hunk_records_a_range() {
        let diff = "--- a/x.js\n+++ b/x.js\n@@ -3,2 +3,0 @@\n-one\n-two\n";
        let set = parse_unified_diff(diff).unwrap();
        let record = set.get("x.js").unwrap();
        assert_eq!(record.lines_removed, 2);
        assert_eq!(record.lines_added, 0);
        assert_eq!(record.changed_ranges, vec![LineRange::new(3, 3)]);
    }
}
