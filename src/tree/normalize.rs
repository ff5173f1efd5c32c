use super::{CompositionTree, NodeId, FACTOR_EPSILON};

impl<C> CompositionTree<C> {
    /// Recompute space factors for every split in the tree.
    pub fn normalize_all(&mut self, min_pane_extent: f32) {
        if let Some(root) = self.root() {
            self.normalize(root, min_pane_extent);
        }
    }

    /// Recompute the space factors of `node` and of every split below it.
    ///
    /// 1. Each child's ideal factor is its share of the occupied main-axis extent. A child
    ///    whose slot has not been arranged since the last structural change counts with the
    ///    extent its current factor gives it. With nothing to go on the children split equally.
    /// 2. Factors below `min_pane_extent / total_extent` are raised to that floor.
    /// 3. The amount added is taken evenly from children with slack: each child above
    ///    `floor + deficit / slack_count` gives up `deficit / slack_count`.
    /// 4. The largest factor absorbs whatever is left so the factors sum to exactly one.
    ///
    /// Steps 2 and 3 are skipped when the split is too small to give every child the floor.
    /// Step 3 is not re-clamped: in lopsided distributions step 4 can leave the largest child
    /// under the floor.
    pub fn normalize(&mut self, node: NodeId, min_pane_extent: f32) {
        let Some(split) = self.split(node) else {
            return;
        };
        let orientation = split.orientation;
        let total_extent = f64::from(orientation.main_extent(split.size));
        let children = split.children.clone();
        let count = children.len();
        if count == 0 {
            return;
        }

        let occupied: Vec<f64> = children
            .iter()
            .map(|c| match c.extent {
                Some(extent) if total_extent > 0.0 => f64::from(extent) / total_extent,
                _ => c.factor,
            })
            .collect();
        let occupied_sum: f64 = occupied.iter().sum();
        let mut factors: Vec<f64> = if occupied_sum > 0.0 {
            occupied.iter().map(|o| o / occupied_sum).collect()
        } else {
            vec![1.0 / count as f64; count]
        };

        let min_extent = f64::from(min_pane_extent);
        if total_extent > 0.0 && total_extent >= min_extent * count as f64 {
            clamp_to_floor(&mut factors, min_extent / total_extent);
        } else {
            log::trace!(
                "normalize {node:?}: extent {total_extent} too small for {count} x {min_extent}, leaving factors unclamped"
            );
        }

        absorb_drift(&mut factors);

        if let Some(split) = self.split_mut(node) {
            for (child, factor) in split.children.iter_mut().zip(factors) {
                child.factor = factor;
            }
        }

        for child in children {
            self.normalize(child.node, min_pane_extent);
        }
    }

    /// Move the separator between children `index` and `index + 1` of `split` by `delta` points.
    ///
    /// Neither neighbour shrinks below `min_pane_extent` (when the split has room for that),
    /// and the other children keep their factors. Returns `false` if nothing moved.
    pub fn resize_separator(
        &mut self,
        split: NodeId,
        index: usize,
        delta: f32,
        min_pane_extent: f32,
    ) -> bool {
        let Some(node) = self.split_mut(split) else {
            return false;
        };
        if index + 1 >= node.children.len() {
            return false;
        }
        let total_extent = f64::from(node.orientation.main_extent(node.size));
        if total_extent <= 0.0 {
            return false;
        }

        let before = node.children[index].factor;
        let after = node.children[index + 1].factor;
        let pair = before + after;
        if pair <= 0.0 {
            return false;
        }
        // Arranged extents exclude separators; prefer them so `delta` maps to real points.
        let pair_extent = match (node.children[index].extent, node.children[index + 1].extent) {
            (Some(a), Some(b)) if a + b > 0.0 => f64::from(a + b),
            _ => pair * total_extent,
        };
        let points_per_factor = pair_extent / pair;
        let floor = (f64::from(min_pane_extent) / points_per_factor).min(pair * 0.5);

        let new_before =
            (before + f64::from(delta) / points_per_factor).clamp(floor, pair - floor);
        if (new_before - before).abs() <= f64::EPSILON {
            return false;
        }
        log::debug!("resize separator {index} of {split:?} by {delta}");

        node.children[index].factor = new_before;
        node.children[index + 1].factor = pair - new_before;
        node.clear_extents();
        true
    }
}

fn clamp_to_floor(factors: &mut [f64], min_factor: f64) {
    let mut deficit = 0.0;
    for factor in factors.iter_mut() {
        if *factor < min_factor {
            deficit += min_factor - *factor;
            *factor = min_factor;
        }
    }
    if deficit <= 0.0 {
        return;
    }

    let slack_count = factors.iter().filter(|&&f| f > min_factor).count();
    if slack_count == 0 {
        return;
    }
    let share = deficit / slack_count as f64;
    for factor in factors.iter_mut() {
        if *factor > min_factor + share {
            *factor -= share;
        }
    }
}

fn absorb_drift(factors: &mut [f64]) {
    let sum: f64 = factors.iter().sum();
    let drift = sum - 1.0;
    if drift == 0.0 {
        return;
    }
    let largest = factors
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i);
    if let Some(largest) = largest {
        if drift.abs() > FACTOR_EPSILON {
            log::trace!("normalize: largest factor absorbs drift {drift}");
        }
        factors[largest] -= drift;
    }
}
