// twincam-core/tests/concat_list_tests.rs

use std::path::{Path, PathBuf};
use twincam_core::CoreError;
use twincam_core::external::ConcatList;

#[test]
fn test_render_quotes_every_entry() {
    let list = ConcatList::from_paths(&[
        PathBuf::from("/uploads/cam a/clip 1.mp4"),
        PathBuf::from("/uploads/it's here.mp4"),
        PathBuf::from("/uploads/$(rm -rf).mp4"),
    ])
    .unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(
        list.render(),
        "ffconcat version 1.0\n\
         file '/uploads/cam a/clip 1.mp4'\n\
         file '/uploads/it'\\''s here.mp4'\n\
         file '/uploads/$(rm -rf).mp4'\n"
    );
}

#[test]
fn test_relative_paths_become_absolute() {
    let list = ConcatList::from_paths(&["clip.mp4"]).unwrap();
    let rendered = list.render();
    let line = rendered.lines().nth(1).unwrap();
    let path = line
        .strip_prefix("file '")
        .and_then(|l| l.strip_suffix('\''))
        .unwrap();
    assert!(Path::new(path).is_absolute());
    assert!(path.ends_with("clip.mp4"));
}

#[test]
fn test_line_breaks_are_rejected() {
    for bad in ["/uploads/a\nfile '/etc/passwd'.mp4", "/uploads/a\r.mp4"] {
        let result = ConcatList::from_paths(&[bad]);
        assert!(matches!(result, Err(CoreError::ConcatList(_))), "{bad:?}");
    }
}

#[test]
fn test_empty_list() {
    let list = ConcatList::from_paths::<PathBuf>(&[]).unwrap();
    assert!(list.is_empty());
    assert_eq!(list.render(), "ffconcat version 1.0\n");
}
