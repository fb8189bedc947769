//! Interdependency detection over declared wiring edges.
//!
//! Runs against a bean right after registration: a depth-first walk over its
//! wiring, reporting every path that loops back onto an ancestor. Category
//! (group) edges expand to every other unready bean of the category and mark
//! the walk "in-group" from that point on; revisiting an ancestor of the
//! walking bean's own category through such a branch is not a cycle, because
//! a group dependency resolves as a unit once the whole group is ready.

use crate::bean::Bean;
use crate::types::BeanIdentifier;

/// All dependency paths starting at `bean` that loop back onto an ancestor.
///
/// Paths are deduplicated by their two endpoints (sorted by identifier) so a
/// mutual pair is reported once regardless of which side is walked first.
pub(crate) fn interdependency_paths<'a>(
    beans: &'a [Bean],
    bean: &'a Bean,
) -> Vec<Vec<BeanIdentifier>> {
    let mut paths = Vec::new();
    walk(beans, bean, Vec::new(), false, &mut paths);

    let mut unique: Vec<Vec<BeanIdentifier>> = Vec::new();
    for path in paths {
        if !unique
            .iter()
            .any(|existing| endpoints(existing) == endpoints(&path))
        {
            unique.push(path);
        }
    }
    unique
}

/// Endpoint pair of a path, sorted so walk direction does not matter.
fn endpoints(path: &[BeanIdentifier]) -> (&str, &str) {
    let first = path.first().map(String::as_str).unwrap_or_default();
    let last = path.last().map(String::as_str).unwrap_or_default();
    if first <= last {
        (first, last)
    } else {
        (last, first)
    }
}

// The ancestor path is owned and copied on recursion so sibling branches
// cannot observe each other's partial paths. Exponential in pathologically
// dense category graphs; fine for the expected tens of beans.
fn walk<'a>(
    beans: &'a [Bean],
    current: &'a Bean,
    ancestors: Vec<&'a Bean>,
    in_group: bool,
    paths: &mut Vec<Vec<BeanIdentifier>>,
) {
    let mut path = ancestors;
    path.push(current);

    for wire in current.wiring() {
        if wire.non_transferable {
            // resolved at initialization time only, guarded there by the
            // on-demand ancestor chain
            continue;
        }
        if wire.is_single() {
            let candidate = beans
                .iter()
                .find(|b| wire.matches(b.identifier(), b.category()));
            if let Some(candidate) = candidate {
                visit(beans, current, candidate, &path, in_group, paths);
            }
        } else if let Some(category) = wire.category.as_deref() {
            let group = beans.iter().filter(|b| {
                b.category() == category
                    && !b.is_ready()
                    && b.identifier() != current.identifier()
                    && !on_path(&path, b)
            });
            for candidate in group {
                visit(beans, current, candidate, &path, true, paths);
            }
        }
    }
}

fn visit<'a>(
    beans: &'a [Bean],
    current: &Bean,
    candidate: &'a Bean,
    path: &[&'a Bean],
    in_group: bool,
    paths: &mut Vec<Vec<BeanIdentifier>>,
) {
    if candidate.is_ready() {
        // satisfied dependency, not a cycle
        return;
    }
    if on_path(path, candidate) {
        if in_group && candidate.category() == current.category() {
            return;
        }
        paths.push(path.iter().map(|b| b.identifier().to_owned()).collect());
        return;
    }
    walk(beans, candidate, path.to_vec(), in_group, paths);
}

fn on_path(path: &[&Bean], bean: &Bean) -> bool {
    path.iter().any(|p| p.identifier() == bean.identifier())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::{BeanContent, BeanOptions};
    use crate::search::BeanSearch;
    use crate::types::{Behaviour, BEAN};

    fn cautious(identifier: &str, category: &str, wiring: Vec<BeanSearch>) -> Bean {
        Bean::new(
            identifier,
            category,
            BeanContent {
                initializer: None,
                value: None,
            },
            BeanOptions {
                behaviour: Behaviour::Cautious,
                wiring,
            },
        )
    }

    #[test]
    fn detects_self_dependency() {
        let beans = vec![cautious("simple-bean-c", BEAN, vec!["simple-bean-c".into()])];
        let paths = interdependency_paths(&beans, &beans[0]);
        assert_eq!(paths, vec![vec!["simple-bean-c".to_owned()]]);
    }

    #[test]
    fn detects_direct_interdependency() {
        let beans = vec![
            cautious("simple-bean-b", BEAN, vec!["simple-bean-a".into()]),
            cautious("simple-bean-a", BEAN, vec!["simple-bean-b".into()]),
        ];
        let paths = interdependency_paths(&beans, &beans[0]);
        assert_eq!(
            paths,
            vec![vec!["simple-bean-b".to_owned(), "simple-bean-a".to_owned()]]
        );
    }

    #[test]
    fn detects_longer_loops_through_exact_edges() {
        let beans = vec![
            cautious("a", BEAN, vec!["b".into()]),
            cautious("b", BEAN, vec!["c".into()]),
            cautious("c", BEAN, vec!["a".into()]),
        ];
        let paths = interdependency_paths(&beans, &beans[0]);
        assert_eq!(
            paths,
            vec![vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]]
        );
    }

    #[test]
    fn ignores_group_including_the_walking_bean() {
        // a(C1) -> (C1)
        let beans = vec![cautious(
            "grouped-bean-d",
            "group1",
            vec![BeanSearch::category("group1")],
        )];
        assert!(interdependency_paths(&beans, &beans[0]).is_empty());
    }

    #[test]
    fn ignores_group_including_a_parent() {
        // a(C1) -> b(C1) -> (C1)
        let beans = vec![
            cautious(
                "grouped-bean-d",
                "group1",
                vec![BeanSearch::category("group1")],
            ),
            cautious("grouped-bean-e", "group1", vec!["grouped-bean-d".into()]),
        ];
        assert!(interdependency_paths(&beans, &beans[1]).is_empty());
    }

    #[test]
    fn ignores_same_category_loop_entered_through_a_group() {
        // a(C1) -> (C1) -> b(C1) ...> a(C1)
        let beans = vec![
            cautious(
                "grouped-bean-d",
                "group1",
                vec![BeanSearch::category("group1")],
            ),
            cautious("grouped-bean-e", "group1", vec!["grouped-bean-d".into()]),
        ];
        assert!(interdependency_paths(&beans, &beans[0]).is_empty());
    }

    // The group exemption is deliberately narrow: an ancestor of a different
    // category revisited through a group expansion is still a loop.
    #[test]
    fn reports_cross_category_loops_entered_through_a_group() {
        let beans = vec![
            cautious("y", "group1", vec!["x".into()]),
            cautious("x", "other", vec![BeanSearch::category("group1")]),
        ];
        let paths = interdependency_paths(&beans, &beans[1]);
        assert_eq!(paths, vec![vec!["x".to_owned(), "y".to_owned()]]);
    }

    #[test]
    fn skips_non_transferable_edges() {
        let beans = vec![
            cautious(
                "a",
                BEAN,
                vec![BeanSearch::identifier("b").non_transferable()],
            ),
            cautious("b", BEAN, vec!["a".into()]),
        ];
        assert!(interdependency_paths(&beans, &beans[0]).is_empty());
        // the other side still sees no loop: its edge back is the skipped one
        assert!(interdependency_paths(&beans, &beans[1]).is_empty());
    }

    #[test]
    fn ready_beans_terminate_a_branch() {
        let ready = Bean::new(
            "ready",
            BEAN,
            BeanContent {
                initializer: None,
                value: Some(crate::types::BeanValue::new(1_i32)),
            },
            BeanOptions {
                behaviour: Behaviour::NoInstance,
                wiring: Vec::new(),
            },
        );
        let beans = vec![cautious("a", BEAN, vec!["ready".into()]), ready];
        assert!(interdependency_paths(&beans, &beans[0]).is_empty());
    }
}
