use egui::{Rect, pos2};

use super::test_util::{assert_tree_ok, pane};
use super::{CompositionTree, FACTOR_EPSILON};
use crate::arrange::arrange;
use crate::options::DockingOptions;
use crate::pane::{DockEdge, PaneId};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed ^ 0xD0C3_D0C3_D0C3_D0C3)
    }

    fn next_u64(&mut self) -> u64 {
        // Simple LCG: deterministic, fast, no dependency.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005u64)
            .wrapping_add(1442695040888963407u64);
        self.0 >> 11
    }

    fn next_usize(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() as usize) % upper
    }

    fn next_edge(&mut self) -> DockEdge {
        DockEdge::ALL[self.next_usize(4)]
    }
}

fn assert_no_single_child_or_nesting(tree: &CompositionTree<()>) {
    for node in tree.node_ids() {
        let Some(split) = tree.split(node) else {
            continue;
        };
        assert!(split.children.len() >= 2, "single-child split {node:?}");
        for child in &split.children {
            assert!(
                tree.split(child.node)
                    .is_none_or(|inner| inner.orientation != split.orientation),
                "same-orientation nesting at {node:?}"
            );
        }
    }
}

/// Random insert/insert-relative/auto-insert/remove sequences, interleaved with arranging and
/// normalizing the way a docking surface does it.
#[test]
fn random_mutations_keep_invariants() {
    let options = DockingOptions::default();
    let area = Rect::from_min_max(pos2(0.0, 0.0), pos2(1600.0, 1000.0));

    for seed in 0..64 {
        let mut rng = Rng::new(seed);
        let mut tree: CompositionTree<()> = CompositionTree::empty();
        let mut next_id = 1u64;
        let mut docked: Vec<PaneId> = Vec::new();

        for step in 0..120 {
            let op = rng.next_usize(10);
            match op {
                0..=2 => {
                    let p = pane(next_id);
                    next_id += 1;
                    docked.push(p.id());
                    tree.insert(p, rng.next_edge());
                }
                3..=5 if !docked.is_empty() => {
                    let relative = docked[rng.next_usize(docked.len())];
                    let p = pane(next_id);
                    next_id += 1;
                    docked.push(p.id());
                    tree.insert_relative(p, relative, rng.next_edge());
                }
                6 => {
                    let p = pane(next_id);
                    next_id += 1;
                    docked.push(p.id());
                    let _placement = tree.auto_insert(p);
                }
                _ if !docked.is_empty() => {
                    let victim = docked.swap_remove(rng.next_usize(docked.len()));
                    let removed = tree.remove(victim);
                    assert_eq!(removed.id(), victim);
                    assert_no_single_child_or_nesting(&tree);
                }
                _ => {}
            }

            assert_tree_ok(&tree);

            if step % 3 == 0 {
                tree.normalize_all(options.min_pane_extent);
                let arrangement = arrange(&tree, area, &options);
                tree.apply_arrangement(&arrangement);
                tree.normalize_all(options.min_pane_extent);
                assert_tree_ok(&tree);
                for node in tree.node_ids() {
                    if let Some(split) = tree.split(node) {
                        assert!((split.factor_sum() - 1.0).abs() <= FACTOR_EPSILON);
                    }
                }
            }

            let mut expected = docked.clone();
            expected.sort();
            let mut actual = tree.pane_ids();
            actual.sort();
            assert_eq!(actual, expected, "seed {seed} step {step}");
        }
    }
}

#[test]
fn removing_everything_leaves_empty_arena() {
    for seed in 0..16 {
        let mut rng = Rng::new(seed);
        let mut tree: CompositionTree<()> = CompositionTree::empty();
        let mut docked = Vec::new();
        for id in 1..=20 {
            let p = pane(id);
            docked.push(p.id());
            if id == 1 || rng.next_usize(2) == 0 {
                tree.insert(p, rng.next_edge());
            } else {
                let relative = docked[rng.next_usize(docked.len() - 1)];
                tree.insert_relative(p, relative, rng.next_edge());
            }
        }
        while !docked.is_empty() {
            let victim = docked.swap_remove(rng.next_usize(docked.len()));
            let _removed = tree.remove(victim);
            assert_tree_ok(&tree);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
    }
}
