use driftpatch::{
    DiffOptions, apply, create_patch, diff, source_text, target_text, Patch,
};
use proptest::prelude::*;
use rayon::prelude::*;
use snapbox::{assert_data_eq, str};

proptest! {
    #[test]
    fn diff_reconstructs_both_inputs(
        original in "\\PC{0,120}",
        modified in "\\PC{0,120}",
    ) {
        let diffs = diff(&original, &modified);
        prop_assert_eq!(source_text(&diffs), original);
        prop_assert_eq!(target_text(&diffs), modified);
    }

    #[test]
    fn diff_without_line_mode_reconstructs_both_inputs(
        original in "[ab\\n]{0,200}",
        modified in "[ab\\n]{0,200}",
    ) {
        let mut options = DiffOptions::new();
        options.set_check_lines(false);
        let diffs = options.diff(&original, &modified);
        prop_assert_eq!(source_text(&diffs), original);
        prop_assert_eq!(target_text(&diffs), modified);
    }

    #[test]
    fn diff_of_identical_texts_is_a_single_equality(text in "\\PC{1,80}") {
        let diffs = diff(&text, &text);
        prop_assert_eq!(diffs.len(), 1);
        prop_assert_eq!(diffs[0].text(), text);
    }

    #[test]
    fn patches_apply_cleanly_to_their_own_source(
        original in "[a-z \\n]{0,200}",
        modified in "[a-z \\n]{0,200}",
    ) {
        let patch = create_patch(&original, &modified);
        let result = apply(&original, &patch);
        prop_assert!(result.is_complete());
        prop_assert_eq!(result.text(), modified);
    }

    #[test]
    fn patch_serialization_round_trips(
        original in "[a-z \\n%]{0,150}",
        modified in "[a-z \\n%]{0,150}",
    ) {
        let patch = create_patch(&original, &modified);
        let reparsed: Patch = patch.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, patch);
    }
}

#[test]
fn diffing_is_safe_across_threads() {
    let texts: Vec<(String, String)> = (0..64)
        .map(|i| {
            (
                format!("line one\nline two\nshared tail {i}\n"),
                format!("line 1\nline two\nshared tail {i}\n"),
            )
        })
        .collect();

    texts.par_iter().for_each(|(a, b)| {
        let patch = create_patch(a, b);
        let result = apply(a, &patch);
        assert!(result.is_complete());
        assert_eq!(result.text(), b);
    });
}

#[test]
fn patch_serialization_snapshot() {
    let patch = create_patch("abcdefghijklmnop", "abcdefzzzzklmnop");
    assert_data_eq!(
        patch.to_string(),
        str![[r#"
@@ -3,12 +3,12 @@
 cdef
-ghij
+zzzz
 klmn

"#]],
    );
}
