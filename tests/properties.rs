//! Property tests for the positional diff.

mod common;

use proptest::prelude::*;
use spark_fiber::{CommitReport, Element, StepDeadline, create_element};

use common::setup;

fn list(kind: &str, len: usize) -> Element {
    create_element("ul", None, (0..len).map(|_| create_element(kind, None, Vec::<&str>::new())))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same-kind lists: CREATE = max(0, m - n), REMOVE = max(0, n - m).
    #[test]
    fn effect_counts_follow_lengths(n in 0usize..12, m in 0usize..12) {
        let (mut renderer, root) = setup();
        renderer.render(list("li", n), root);
        renderer.flush().unwrap();

        renderer.render(list("li", m), root);
        let report = renderer.flush().unwrap().unwrap();

        prop_assert_eq!(report.created, m.saturating_sub(n));
        prop_assert_eq!(report.removed, n.saturating_sub(m));
        prop_assert_eq!(report.updated, 1 + n.min(m));
        prop_assert_eq!(renderer.host().children(renderer.host().children(root)[0]).len(), m);
    }

    /// Slice size never changes the committed result.
    #[test]
    fn slicing_is_transparent(len in 0usize..10, units in 1u32..6) {
        let (mut sliced, sliced_root) = setup();
        let (mut whole, whole_root) = setup();
        let tree = create_element(
            "ol",
            None,
            (0..len).map(|i| create_element("li", None, [i])),
        );

        sliced.render(tree.clone(), sliced_root);
        let summary = sliced.run_slices(|| StepDeadline::new(units)).unwrap();
        whole.render(tree, whole_root);
        let report = whole.flush().unwrap();

        prop_assert_eq!(summary.report, report);
        prop_assert_eq!(
            sliced.host().to_markup(sliced_root),
            whole.host().to_markup(whole_root)
        );
    }

    /// Re-rendering the same tree touches nothing.
    #[test]
    fn rerender_is_idempotent(len in 0usize..10) {
        let (mut renderer, root) = setup();
        let tree = create_element("div", None, (0..len).map(|i| create_element("p", None, [i])));

        renderer.render(tree.clone(), root);
        renderer.flush().unwrap();
        renderer.host_mut().reset_counts();

        renderer.render(tree, root);
        let report = renderer.flush().unwrap().unwrap();

        prop_assert_eq!(report, CommitReport { created: 0, updated: 1 + 2 * len, removed: 0 });
        prop_assert_eq!(renderer.host().counts().attribute_mutations(), 0);
        prop_assert_eq!(renderer.host().counts().created, 0);
    }
}
