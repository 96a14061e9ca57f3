use impactmap::core::{ImpactError, LineRange};
use impactmap::diff::parse_unified_diff;
use indoc::indoc;
use pretty_assertions::assert_eq;

const TWO_FILE_DIFF: &str = indoc! {"
    diff --git a/orders/handler.js b/orders/handler.js
    index 1111111..2222222 100644
    --- a/orders/handler.js
    +++ b/orders/handler.js
    @@ -10,4 +10,6 @@
     const total = cart.total();
    -validate(cart);
    +validateCart(cart);
    +logger.info('validated');
     submit(cart);
    +notify(cart.owner);
     done();
    @@ -40,2 +42,2 @@
    -const RETRIES = 2;
    +const RETRIES = 3;
     module.exports = handler;
    diff --git a/payments/charge.js b/payments/charge.js
    index 3333333..4444444 100644
    --- a/payments/charge.js
    +++ b/payments/charge.js
    @@ -1,3 +1,2 @@
     const api = require('./api');
    -const legacy = require('./legacy');
     module.exports = charge;
"};

#[test]
fn added_lines_match_plus_prefixed_content() {
    let set = parse_unified_diff(TWO_FILE_DIFF).unwrap();

    let plus_lines = TWO_FILE_DIFF
        .lines()
        .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
        .count();
    let minus_lines = TWO_FILE_DIFF
        .lines()
        .filter(|l| l.starts_with('-') && !l.starts_with("---"))
        .count();

    let total_added: usize = set.iter().map(|r| r.lines_added).sum();
    let total_removed: usize = set.iter().map(|r| r.lines_removed).sum();
    assert_eq!(total_added, plus_lines);
    assert_eq!(total_removed, minus_lines);
}

#[test]
fn records_are_keyed_by_path() {
    let set = parse_unified_diff(TWO_FILE_DIFF).unwrap();
    assert_eq!(set.len(), 2);

    let handler = set.get("orders/handler.js").unwrap();
    assert_eq!(handler.lines_added, 4);
    assert_eq!(handler.lines_removed, 2);
    assert!(!handler.renamed);

    let charge = set.get("payments/charge.js").unwrap();
    assert_eq!(charge.lines_added, 0);
    assert_eq!(charge.lines_removed, 1);
}

#[test]
fn changed_ranges_track_new_file_lines() {
    let set = parse_unified_diff(TWO_FILE_DIFF).unwrap();
    let handler = set.get("orders/handler.js").unwrap();
    // First hunk touches lines 11-14 of the new file, second touches 42
    assert_eq!(
        handler.changed_ranges,
        vec![LineRange::new(11, 14), LineRange::new(42, 42)]
    );
}

#[test]
fn pure_rename_has_zero_churn() {
    let diff = indoc! {"
        diff --git a/src/old-name.js b/src/new-name.js
        similarity index 100%
        rename from src/old-name.js
        rename to src/new-name.js
    "};
    let set = parse_unified_diff(diff).unwrap();
    let record = set.get("src/new-name.js").unwrap();
    assert!(record.renamed);
    assert_eq!(record.lines_added, 0);
    assert_eq!(record.lines_removed, 0);
}

#[test]
fn rename_with_edits_keeps_churn_and_flag() {
    let diff = indoc! {"
        diff --git a/src/a.js b/src/b.js
        similarity index 90%
        rename from src/a.js
        rename to src/b.js
        --- a/src/a.js
        +++ b/src/b.js
        @@ -1,1 +1,1 @@
        -old line
        +new line
    "};
    let set = parse_unified_diff(diff).unwrap();
    let record = set.get("src/b.js").unwrap();
    assert!(record.renamed);
    assert_eq!(record.lines_added, 1);
    assert_eq!(record.lines_removed, 1);
}

#[test]
fn new_file_uses_post_image_path() {
    let diff = indoc! {"
        --- /dev/null
        +++ b/src/created.js
        @@ -0,0 +1,2 @@
        +const a = 1;
        +module.exports = a;
    "};
    let set = parse_unified_diff(diff).unwrap();
    let record = set.get("src/created.js").unwrap();
    assert_eq!(record.lines_added, 2);
}

#[test]
fn deleted_file_uses_pre_image_path() {
    let diff = indoc! {"
        --- a/src/gone.js
        +++ /dev/null
        @@ -1,2 +0,0 @@
        -const a = 1;
        -module.exports = a;
    "};
    let set = parse_unified_diff(diff).unwrap();
    assert!(set.get("src/gone.js").is_some());
}

#[test]
fn empty_diff_is_malformed() {
    let err = parse_unified_diff("").unwrap_err();
    assert!(matches!(err, ImpactError::MalformedDiff { .. }));
}

#[test]
fn bad_hunk_header_is_malformed() {
    let diff = indoc! {"
        --- a/x.js
        +++ b/x.js
        @@ this is not a hunk header @@
        +const a = 1;
    "};
    let err = parse_unified_diff(diff).unwrap_err();
    match err {
        ImpactError::MalformedDiff { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("hunk header"));
        }
        other => panic!("expected MalformedDiff, got {other:?}"),
    }
}

#[test]
fn file_section_without_hunks_is_malformed() {
    let diff = indoc! {"
        diff --git a/x.js b/x.js
        --- a/x.js
        +++ b/x.js
    "};
    let err = parse_unified_diff(diff).unwrap_err();
    assert!(matches!(err, ImpactError::MalformedDiff { .. }));
}

#[test]
fn binary_section_is_tolerated() {
    let diff = indoc! {"
        diff --git a/logo.png b/logo.png
        Binary files a/logo.png and b/logo.png differ
        diff --git a/x.js b/x.js
        --- a/x.js
        +++ b/x.js
        @@ -1,1 +1,1 @@
        -a
        +b
    "};
    let set = parse_unified_diff(diff).unwrap();
    assert_eq!(set.get("logo.png").unwrap().lines_added, 0);
    assert_eq!(set.get("x.js").unwrap().lines_added, 1);
}
