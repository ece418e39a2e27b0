//! End-to-end review sessions against a local catalog on disk.

use docmark::catalog::{Catalog, FilterRequest};
use docmark::client::DocmarkClient;
use docmark::mark::Mark;
use docmark::navigator::{Action, Controller, InlineExecutor, NavigationError, Viewer};
use docmark::paths::DocmarkPaths;

type Review = Controller<InlineExecutor<DocmarkClient>>;

fn project(files: &[(&str, &[u8])]) -> (tempfile::TempDir, DocmarkPaths) {
    let tmp = tempfile::TempDir::new().unwrap();
    let paths = DocmarkPaths::new(tmp.path());
    paths.ensure_dirs().unwrap();
    for (name, body) in files {
        std::fs::write(paths.documents_dir.join(name), body).unwrap();
    }
    (tmp, paths)
}

fn review(paths: &DocmarkPaths) -> Review {
    let client = DocmarkClient::local(Catalog::open(paths).unwrap());
    let mut review = Controller::new(InlineExecutor::new(client));
    review.dispatch(Action::Refresh).unwrap();
    review.pump();
    review
}

fn act(review: &mut Review, action: Action) {
    review.dispatch(action).unwrap();
    review.pump();
}

#[test]
fn first_refresh_opens_first_document() {
    let (_tmp, paths) = project(&[("b.txt", b"beta"), ("a.txt", b"alpha")]);
    let review = review(&paths);
    let nav = review.navigator();

    assert_eq!(nav.session().documents(), ["a.txt", "b.txt"]);
    assert_eq!(nav.cursor(), Some(0));
    assert_eq!(
        nav.viewer(),
        &Viewer::Text {
            filename: "a.txt".into(),
            text: "alpha".into(),
        }
    );
    assert!(review.is_idle());
}

#[test]
fn stepping_forward_and_back_returns_to_the_same_document() {
    let (_tmp, paths) = project(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
    let mut review = review(&paths);

    act(&mut review, Action::Open(1));
    act(&mut review, Action::Next);
    assert_eq!(review.navigator().current(), Some("c.txt"));
    act(&mut review, Action::Previous);
    assert_eq!(review.navigator().current(), Some("b.txt"));
    assert_eq!(review.navigator().viewer().filename(), Some("b.txt"));

    // Edges are no-ops.
    act(&mut review, Action::Next);
    act(&mut review, Action::Next);
    assert_eq!(review.navigator().current(), Some("c.txt"));
    act(&mut review, Action::Open(0));
    act(&mut review, Action::Previous);
    assert_eq!(review.navigator().current(), Some("a.txt"));
}

#[test]
fn marking_through_a_mixed_folder() {
    let (_tmp, paths) = project(&[
        ("a.txt", b"first"),
        ("b.pdf", b"not really a pdf"),
        ("c.txt", b"third"),
    ]);
    let mut review = review(&paths);

    act(&mut review, Action::Mark(Mark::A));
    let nav = review.navigator();
    assert_eq!(nav.current(), Some("b.pdf"));
    assert!(matches!(nav.viewer(), Viewer::Unreadable { filename, .. } if filename == "b.pdf"));

    act(&mut review, Action::Mark(Mark::B));
    assert_eq!(review.navigator().current(), Some("c.txt"));

    act(&mut review, Action::Mark(Mark::A));
    let nav = review.navigator();
    assert_eq!(nav.cursor(), None);
    assert_eq!(nav.viewer(), &Viewer::Empty);
    assert_eq!(nav.pending_marks(), 0);
    assert!(!nav.notice().unwrap().is_error());

    // Past the end, stepping does nothing until a document is opened.
    act(&mut review, Action::Next);
    assert_eq!(review.navigator().cursor(), None);
    assert!(matches!(
        review.dispatch(Action::Mark(Mark::B)),
        Err(NavigationError::NothingOpen)
    ));

    let reopened = Catalog::open(&paths).unwrap();
    assert_eq!(reopened.mark_of("a.txt"), Some(Mark::A));
    assert_eq!(reopened.mark_of("b.pdf"), Some(Mark::B));
    assert_eq!(reopened.mark_of("c.txt"), Some(Mark::A));
}

#[test]
fn export_copies_only_selected_marks() {
    let (_tmp, paths) = project(&[("a.txt", b"first"), ("b.txt", b"second")]);
    let mut review = review(&paths);
    act(&mut review, Action::Mark(Mark::A));
    act(&mut review, Action::Mark(Mark::B));

    review.export([Mark::A]).unwrap();
    review.pump();

    let export = review.navigator().last_export().unwrap();
    assert_eq!(export.exported, vec!["a.txt"]);
    assert!(export.removed.is_empty());
    assert_eq!(
        std::fs::read_to_string(paths.exports_dir.join("A").join("a.txt")).unwrap(),
        "first"
    );
    assert!(!paths.exports_dir.join("B").exists());

    let report = std::fs::read_to_string(paths.report_file()).unwrap();
    assert!(report.starts_with("filename,mark,path"));
    assert!(report.contains("a.txt,A,"));
    assert!(paths.exports_dir.join("report.xlsx").is_file());
}

#[test]
fn empty_export_selection_is_rejected_locally() {
    let (_tmp, paths) = project(&[("a.txt", b"first")]);
    let mut review = review(&paths);
    assert!(matches!(
        review.export(Vec::new()),
        Err(NavigationError::NoMarksSelected)
    ));
    assert!(review.is_idle());
    assert!(!paths.exports_dir.exists());
}

#[test]
fn filter_marks_exactly_the_matches_and_refreshes() {
    let (_tmp, paths) = project(&[
        ("inv_1.txt", b"total: 10"),
        ("inv_2.txt", b"nothing here"),
        ("memo.txt", b"total: 3"),
    ]);
    let mut review = review(&paths);
    act(&mut review, Action::Open(2));
    act(&mut review, Action::Mark(Mark::A));

    review
        .filter(FilterRequest {
            file_name_regex: "^inv".into(),
            content_pattern: "total".into(),
            mark_color: Mark::B,
            ..Default::default()
        })
        .unwrap();
    review.pump();

    let nav = review.navigator();
    assert_eq!(nav.last_filter().unwrap().updated_count, 1);
    assert_eq!(nav.session().mark_of("inv_1.txt"), Some(Mark::B));
    assert_eq!(nav.session().mark_of("inv_2.txt"), None);
    assert_eq!(nav.session().mark_of("memo.txt"), Some(Mark::A));
}

#[test]
fn invalid_filter_never_reaches_the_catalog() {
    let (_tmp, paths) = project(&[("a.txt", b"x")]);
    let mut review = review(&paths);
    let err = review
        .filter(FilterRequest {
            content_pattern: "(unclosed".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, NavigationError::InvalidFilter(_)));
    assert!(review.is_idle());
    assert!(review.navigator().last_filter().is_none());
}

#[test]
fn removed_document_is_dropped_on_refresh() {
    let (_tmp, paths) = project(&[("a.txt", b"a"), ("b.txt", b"b"), ("c.txt", b"c")]);
    let mut review = review(&paths);
    act(&mut review, Action::Open(1));

    std::fs::remove_file(paths.documents_dir.join("b.txt")).unwrap();
    act(&mut review, Action::Refresh);

    let nav = review.navigator();
    assert_eq!(nav.session().documents(), ["a.txt", "c.txt"]);
    assert_eq!(nav.current(), Some("c.txt"));
    assert_eq!(nav.viewer().filename(), Some("c.txt"));
}

#[test]
fn save_mark_requires_a_mark() {
    let (_tmp, paths) = project(&[("a.txt", b"a"), ("b.txt", b"b")]);
    let mut review = review(&paths);
    assert!(matches!(
        review.dispatch(Action::SaveMark),
        Err(NavigationError::Unmarked { .. })
    ));

    act(&mut review, Action::Mark(Mark::B));
    act(&mut review, Action::Previous);
    act(&mut review, Action::SaveMark);
    assert_eq!(review.navigator().current(), Some("a.txt"));
    assert_eq!(review.navigator().session().mark_of("a.txt"), Some(Mark::B));
}
