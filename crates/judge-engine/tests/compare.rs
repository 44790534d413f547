//! Comparator tests for judge-engine
//!
//! Submission against reference under the different strictness options.

use judge_engine::{CompareOptions, Judge, Config, Mismatch, MismatchKind, compare::compare};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn options() -> CompareOptions {
    CompareOptions { css: false, ..CompareOptions::default() }
}

fn kind(reference: &str, submission: &str, options: CompareOptions) -> Option<MismatchKind> {
    init_tracing();
    compare(reference, submission, &options).err().map(|m| m.kind())
}

const TABLE: &str = r#"<html lang="en">
<body>
<table>
<tr><th>Name</th></tr>
<tr><td>Ann</td></tr>
</table>
</body>
</html>"#;

#[test]
fn test_identical_documents() {
    let all = CompareOptions {
        attributes: true,
        minimal_attributes: true,
        contents: true,
        css: true,
        comments: true,
    };
    assert_eq!(kind(TABLE, TABLE, all), None);
}

#[test]
fn test_tags_differ() -> anyhow::Result<()> {
    init_tracing();
    let submission = TABLE.replace("<th>Name</th>", "<td>Name</td>");
    let mismatch = compare(TABLE, &submission, &options()).expect_err("th replaced by td");
    assert_eq!(
        mismatch,
        Mismatch::TagsDiffer { expected: "th".into(), found: "td".into(), line: 3 }
    );
    assert_eq!(mismatch.to_string(), "Expected tag <th> but found <td> at line 4");
    Ok(())
}

#[test]
fn test_empty_submission() {
    assert_eq!(kind(TABLE, "", options()), Some(MismatchKind::EmptySubmission));
    assert_eq!(kind(TABLE, " \n <!-- todo --> ", options()), Some(MismatchKind::EmptySubmission));
}

#[test]
fn test_amount_children_differ() {
    let submission = TABLE.replace("<tr><td>Ann</td></tr>\n", "");
    let mismatch = compare(TABLE, &submission, &options()).expect_err("row removed");
    assert!(matches!(
        mismatch,
        Mismatch::AmountChildrenDiffer { ref tag, expected: 2, found: 1, .. } if tag == "table"
    ));
}

#[test]
fn test_text_and_attributes_ignored_by_default() {
    let submission = TABLE.replace("Ann", "Bob").replace("<table>", "<table id=\"t\">");
    assert_eq!(kind(TABLE, &submission, options()), None);
}

#[test]
fn test_attributes_mode() {
    let strict = CompareOptions { attributes: true, ..options() };
    let extra = TABLE.replace("<table>", "<table id=\"t\">");
    assert_eq!(kind(TABLE, &extra, strict), Some(MismatchKind::AttributesDiffer));

    let wrong_lang = TABLE.replace("lang=\"en\"", "lang=\"nl\"");
    assert_eq!(kind(TABLE, &wrong_lang, strict), Some(MismatchKind::AttributesDiffer));
}

#[test]
fn test_minimal_attributes_mode() {
    let minimal = CompareOptions { minimal_attributes: true, ..options() };
    let reference = r#"<html lang="en"><body><img src="DUMMY" alt="cat"></body></html>"#;

    let superset = r#"<html lang="en" dir="ltr"><body><img src="cat.png" alt="cat" width="5"></body></html>"#;
    assert_eq!(kind(reference, superset, minimal), None);

    let missing = r#"<html lang="en"><body><img alt="cat"></body></html>"#;
    assert_eq!(kind(reference, missing, minimal), Some(MismatchKind::NotAllAttributesPresent));

    let wrong_value = r#"<html lang="en"><body><img src="x.png" alt="dog"></body></html>"#;
    assert_eq!(kind(reference, wrong_value, minimal), Some(MismatchKind::NotAllAttributesPresent));
}

#[test]
fn test_contents_mode() {
    let contents = CompareOptions { contents: true, ..options() };
    let other_text = TABLE.replace("Ann", "Bob");
    assert_eq!(kind(TABLE, &other_text, contents), Some(MismatchKind::ContentsDiffer));

    let spaced = TABLE.replace("<td>Ann</td>", "<td>\n   Ann  </td>");
    assert_eq!(kind(TABLE, &spaced, contents), None);

    let dummy = TABLE.replace("Ann", "DUMMY");
    assert_eq!(kind(&dummy, &other_text, contents), None);
}

#[test]
fn test_comments_mode() {
    let comments = CompareOptions { comments: true, ..options() };
    let reference = "<html><body><!-- Heading --><h1>x</h1></body></html>";

    assert_eq!(kind(reference, "<html><body><!--heading--><h1>x</h1></body></html>", comments), None);
    assert_eq!(
        kind(reference, "<html><body><!-- Footer --><h1>x</h1></body></html>", comments),
        Some(MismatchKind::CommentsDiffer)
    );
    assert_eq!(
        kind(reference, "<html><body><h1>x</h1><!-- Heading --></body></html>", comments),
        Some(MismatchKind::ExpectedComment)
    );
    assert_eq!(
        kind("<html><body><!-- dummy --><h1>x</h1></body></html>", reference, comments),
        None
    );

    // Without comments mode they are not part of the tree walk
    assert_eq!(kind(reference, "<html><body><h1>x</h1></body></html>", options()), None);
}

#[test]
fn test_css_mode() {
    let css = CompareOptions::default();
    let reference = "<html><head><style>h1 { color: red }</style></head><body><h1>x</h1></body></html>";

    let same = "<html><head><style>h1 { color: #f00; margin: 0 }</style></head><body><h1>x</h1></body></html>";
    assert_eq!(kind(reference, same, css), None);

    let other = "<html><head><style>h1 { color: blue }</style></head><body><h1>x</h1></body></html>";
    let mismatch = compare(reference, other, &css).expect_err("colour differs");
    assert!(matches!(mismatch, Mismatch::StylesDiffer { ref property, .. } if property == "color"));

    let unstyled = "<html><head><style>p { color: red }</style></head><body><h1>x</h1></body></html>";
    assert_eq!(kind(reference, unstyled, css), Some(MismatchKind::StylesDiffer));
}

#[test]
fn test_css_mode_disabled_without_reference_rules() {
    let reference = "<html><head></head><body><h1>x</h1></body></html>";
    let submission = "<html><head><style>h1 { color: blue }</style></head><body><h1>x</h1></body></html>";
    // The <style> element itself is still an extra child of <head>
    assert_eq!(
        kind(reference, submission, CompareOptions::default()),
        Some(MismatchKind::AmountChildrenDiffer)
    );

    let reference = "<html><head><style></style></head><body><h1>x</h1></body></html>";
    assert_eq!(kind(reference, submission, CompareOptions::default()), None);
}

#[test]
fn test_judge_uses_configured_options() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_json(r#"{ "compare": { "contents": true, "css": false } }"#)?;
    let judge = Judge::new(config);
    assert!(judge.compare(TABLE, TABLE).is_ok());
    assert!(judge.compare(TABLE, &TABLE.replace("Ann", "Bob")).is_err());
    Ok(())
}
