use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 8;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        let half_extent = (span_x.max(span_y) * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let min = self.center - vec2(self.half_extent, self.half_extent);
        let max = self.center + vec2(self.half_extent, self.half_extent);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Vec2) -> usize {
        let right = point.x >= self.center.x;
        let upper = point.y >= self.center.y;
        match (right, upper) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn distance_sq_to(self, other: Self) -> f32 {
        let dx = (self.center.x - other.center.x).abs() - (self.half_extent + other.half_extent);
        let dy = (self.center.y - other.center.y).abs() - (self.half_extent + other.half_extent);
        let clamped_dx = dx.max(0.0);
        let clamped_dy = dy.max(0.0);
        (clamped_dx * clamped_dx) + (clamped_dy * clamped_dy)
    }
}

/// One cell of the repulsion quadtree. Internal cells stand in for their
/// contents as an aggregate: total charge plus the charge-weighted centroid.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) charge_center: Vec2,
    pub(super) charge: f32,
    pub(super) count: usize,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2], charges: &[f32]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, charges, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        charges: &[f32],
        depth: usize,
    ) -> Self {
        let mut charge = 0.0_f32;
        let mut charge_center = Vec2::ZERO;
        let mut weight_sum = 0.0_f32;
        for &index in &indices {
            let weight = charges[index].abs();
            charge += charges[index];
            charge_center += positions[index] * weight;
            weight_sum += weight;
        }
        if weight_sum > 0.0 {
            charge_center /= weight_sum;
        } else if let Some(&first) = indices.first() {
            charge_center = positions[first];
        }

        let count = indices.len();
        let mut node = Self {
            bounds,
            charge_center,
            charge,
            count,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let child_bounds = bounds.child(quadrant);
            node.children[quadrant] = Some(Box::new(Self::build_node(
                child_bounds,
                bucket,
                positions,
                charges,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_degenerate_inputs_yield_no_tree() {
        assert!(QuadNode::build(&[], &[]).is_none());
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)], &[-300.0]).is_none());
    }

    #[test]
    fn root_aggregates_total_charge() {
        let positions = (0..20)
            .map(|i| vec2((i % 5) as f32 * 100.0, (i / 5) as f32 * 100.0))
            .collect::<Vec<_>>();
        let charges = vec![-300.0; 20];

        let tree = QuadNode::build(&positions, &charges).unwrap();
        assert_eq!(tree.count, 20);
        assert!((tree.charge - (-300.0 * 20.0)).abs() < 1e-3);
        assert!(!tree.is_leaf());
    }

    #[test]
    fn charge_center_is_weighted_toward_strong_nodes() {
        let positions = vec![vec2(0.0, 0.0), vec2(100.0, 0.0)];
        let charges = vec![-400.0, -100.0];

        let tree = QuadNode::build(&positions, &charges).unwrap();
        // 400:100 weighting puts the centroid a fifth of the way along.
        assert!((tree.charge_center.x - 20.0).abs() < 1e-3);
        assert!((tree.charge - (-500.0)).abs() < 1e-3);
    }

    #[test]
    fn small_sets_stay_in_one_leaf() {
        let positions = vec![vec2(0.0, 0.0), vec2(50.0, 50.0), vec2(-30.0, 10.0)];
        let charges = vec![-300.0; 3];

        let tree = QuadNode::build(&positions, &charges).unwrap();
        assert!(tree.is_leaf());
        assert_eq!(tree.indices.len(), 3);
    }

    #[test]
    fn bounds_distance_is_zero_for_overlap() {
        let a = QuadBounds {
            center: Vec2::ZERO,
            half_extent: 10.0,
        };
        let b = QuadBounds {
            center: vec2(15.0, 0.0),
            half_extent: 10.0,
        };
        assert_eq!(a.distance_sq_to(b), 0.0);

        let far = QuadBounds {
            center: vec2(40.0, 0.0),
            half_extent: 10.0,
        };
        assert!((a.distance_sq_to(far) - 400.0).abs() < 1e-3);
    }
}
