//! End-to-end tests for the build-log classifier: segmentation invariants,
//! catalog priority, report rendering and marker behavior.

use kbuild_ci::analyzer::segment::{is_trigger, segment_lines};
use kbuild_ci::analyzer::{analyze_log, catalog, render_report, touch_marker, MARKER_FILE};
use kbuild_ci::models::ErrorBlock;
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn write_log(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("error.log");
    fs::write(&path, content).unwrap();
    path
}

fn render_to_string(path: &Path) -> String {
    let report = analyze_log(path).unwrap();
    let mut out = Vec::new();
    render_report(path, &report, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn clean_log_yields_zero_count_and_no_summary() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(
        temp_dir.path(),
        "  CC      kernel/fork.o\n  LD      vmlinux\nKernel: arch/arm64/boot/Image is ready\n",
    );

    let report = analyze_log(&path).unwrap();
    assert_eq!(report.error_count, 0);
    assert!(report.entries.is_empty());

    let text = render_to_string(&path);
    assert!(text.contains("No errors found."));
    assert!(!text.contains("Error #"));
    assert!(!text.contains("Total:"));
}

#[test]
fn single_trigger_with_blank_line_is_one_single_line_block() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(temp_dir.path(), "foo.c:10:5: error: something\n\nmake: done\n");

    let report = analyze_log(&path).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(
        report.entries[0].block.lines,
        vec!["foo.c:10:5: error: something"]
    );
}

#[test]
fn undefined_reference_block_is_link_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(
        temp_dir.path(),
        "ld.lld: error: undefined reference to 'foo'\n\n",
    );

    let report = analyze_log(&path).unwrap();
    assert_eq!(
        report.entries[0].classification.category,
        "Link Error: Missing Library or Function"
    );
}

#[test]
fn missing_header_outranks_werror() {
    // Both signatures match; the earlier catalog entry must win.
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(
        temp_dir.path(),
        "foo.c:3:10: fatal error: bar.h: No such file or directory\ncc1: some warnings being treated as errors [-Werror]\n\n",
    );

    let report = analyze_log(&path).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(
        report.entries[0].classification.category,
        "Missing Header or Source File"
    );
}

#[test]
fn unmatched_block_is_uncommon_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(temp_dir.path(), "weird.c:1:1: error: quux exploded\n\n");

    let report = analyze_log(&path).unwrap();
    assert_eq!(report.entries[0].classification.category, "Uncommon Error");
    assert_eq!(
        report.entries[0].classification.suggestion,
        catalog::DEFAULT_SUGGESTION
    );
}

#[test]
fn continuation_notes_and_make_lines_stay_in_block() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(
        temp_dir.path(),
        "drivers/foo.c:5:1: error: implicit declaration of function 'bar'\n\
         drivers/foo.h:2:1: note: declared here\n\
         make[2]: *** [scripts/Makefile.build:250: drivers/foo.o] Error 1\n\
         \n\
         unrelated trailing output\n",
    );

    let report = analyze_log(&path).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].block.lines.len(), 3);
    assert_eq!(report.error_count, 1);
}

#[test]
fn report_is_idempotent_across_runs() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_log(
        temp_dir.path(),
        "a.c:1:1: error: one\n\nb.c:2:2: error: undefined reference to 'x'\n\n",
    );

    let first = render_to_string(&path);
    let second = render_to_string(&path);
    assert_eq!(first, second);
    assert!(first.contains("Total found 2 error(s)."));
    assert!(first.contains("Error Summary"));
    assert!(first.contains("Total: 2 error(s)"));
}

#[test]
fn classification_ignores_unrelated_blocks() {
    // Classification is a pure function of block text: permuting blocks
    // leaves each block's category unchanged.
    let a = ErrorBlock::new("x.c:1:1: error: undefined reference to 'f'".to_string());
    let b = ErrorBlock::new("y.c:2:2: error: division by zero detected".to_string());

    let a_alone = catalog::classify(&a);
    let b_alone = catalog::classify(&b);

    for order in [[&a, &b], [&b, &a]] {
        let classified: Vec<_> = order.iter().map(|blk| catalog::classify(blk)).collect();
        assert!(classified.contains(&a_alone));
        assert!(classified.contains(&b_alone));
    }
}

#[test]
fn marker_is_created_and_retouched() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(!temp_dir.path().join(MARKER_FILE).exists());

    touch_marker(temp_dir.path()).unwrap();
    assert!(temp_dir.path().join(MARKER_FILE).exists());

    // A second run simply re-touches; the marker stays zero bytes.
    touch_marker(temp_dir.path()).unwrap();
    assert_eq!(
        fs::metadata(temp_dir.path().join(MARKER_FILE)).unwrap().len(),
        0
    );
}

#[test]
fn missing_log_file_is_the_only_fatal_path() {
    let result = analyze_log(Path::new("/nonexistent/dir/error.log"));
    assert!(result.is_err());
}

proptest! {
    // Counter equals trigger-line occurrences; block count never exceeds it.
    #[test]
    fn segmentation_counts_triggers_exactly(lines in proptest::collection::vec(
        prop_oneof![
            "[ -~]{0,40}",
            Just("foo.c:10:5: error: something bad".to_string()),
            Just("bar.c:1:2: fatal error: baz.h: No such file or directory".to_string()),
            Just("ld: undefined reference to 'sym'".to_string()),
            Just("   note: expanded from macro".to_string()),
            Just(String::new()),
        ],
        0..60,
    )) {
        let expected_triggers = lines.iter().filter(|l| is_trigger(l)).count();
        let seg = segment_lines(lines.iter());

        prop_assert_eq!(seg.trigger_count, expected_triggers);
        prop_assert!(seg.blocks.len() <= expected_triggers);

        // Every block is non-empty and holds at least its trigger line.
        for block in &seg.blocks {
            prop_assert!(!block.lines.is_empty());
        }
    }

    // With no trigger lines at all, nothing is ever reported.
    #[test]
    fn no_triggers_means_no_blocks(lines in proptest::collection::vec("[a-z ]{0,30}", 0..40)) {
        prop_assume!(lines.iter().all(|l| !is_trigger(l)));
        let seg = segment_lines(lines.iter());
        prop_assert_eq!(seg.trigger_count, 0);
        prop_assert!(seg.blocks.is_empty());
    }
}
