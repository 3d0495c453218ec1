use eframe::egui::{Vec2, vec2};

const QUADTREE_LEAF_CAPACITY: usize = 8;
const QUADTREE_MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBounds {
    pub center: Vec2,
    pub half_extent: f32,
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

    pub fn min(self) -> Vec2 {
        self.center - vec2(self.half_extent, self.half_extent)
    }

    pub fn max(self) -> Vec2 {
        self.center + vec2(self.half_extent, self.half_extent)
    }

    pub fn contains(self, point: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    pub fn disjoint_from(self, min: Vec2, max: Vec2) -> bool {
        let own_min = self.min();
        let own_max = self.max();
        own_min.x > max.x || own_max.x < min.x || own_min.y > max.y || own_max.y < min.y
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

    pub fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }
}

pub struct QuadCell {
    pub bounds: QuadBounds,
    pub centroid: Vec2,
    pub weight: f32,
    indices: Vec<usize>,
    children: [Option<Box<QuadCell>>; 4],
}

impl QuadCell {
    fn build(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Vec2],
        weights: Option<&[f32]>,
        depth: usize,
    ) -> Self {
        let mut weighted_sum = Vec2::ZERO;
        let mut plain_sum = Vec2::ZERO;
        let mut magnitude = 0.0;
        let mut weight = 0.0;
        for &index in &indices {
            let item_weight = weights.map_or(1.0, |weights| weights[index]);
            weighted_sum += positions[index] * item_weight.abs();
            plain_sum += positions[index];
            magnitude += item_weight.abs();
            weight += item_weight;
        }

        let centroid = if magnitude > 0.0 {
            weighted_sum / magnitude
        } else if !indices.is_empty() {
            plain_sum / indices.len() as f32
        } else {
            bounds.center
        };

        let mut cell = Self {
            bounds,
            centroid,
            weight,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || cell.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return cell;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &cell.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            cell.children[quadrant] = Some(Box::new(Self::build(
                bounds.child(quadrant),
                bucket,
                positions,
                weights,
                depth + 1,
            )));
        }
        cell.indices.clear();
        cell
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn children(&self) -> impl Iterator<Item = &QuadCell> {
        self.children.iter().filter_map(|child| child.as_deref())
    }
}

pub struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

pub struct SpatialIndex {
    root: Option<QuadCell>,
}

impl SpatialIndex {
    pub fn build(positions: &[Vec2]) -> Self {
        Self::build_with(positions, None)
    }

    pub fn build_weighted(positions: &[Vec2], weights: &[f32]) -> Self {
        debug_assert_eq!(positions.len(), weights.len());
        Self::build_with(positions, Some(weights))
    }

    fn build_with(positions: &[Vec2], weights: Option<&[f32]>) -> Self {
        let root = QuadBounds::from_points(positions).map(|bounds| {
            let indices = (0..positions.len()).collect::<Vec<_>>();
            QuadCell::build(bounds, indices, positions, weights, 0)
        });
        Self { root }
    }

    pub fn root(&self) -> Option<&QuadCell> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Depth-first walk. `exclude` is asked first for every region; a `true`
    /// answer prunes that region. Surviving leaves are handed to `visitor`.
    pub fn visit<E, V>(&self, mut exclude: E, mut visitor: V)
    where
        E: FnMut(QuadBounds) -> bool,
        V: FnMut(&[usize]),
    {
        let Some(root) = self.root.as_ref() else {
            return;
        };

        let mut stack = vec![root];
        while let Some(cell) = stack.pop() {
            if exclude(cell.bounds) {
                continue;
            }

            if cell.is_leaf() {
                visitor(&cell.indices);
            } else {
                stack.extend(cell.children());
            }
        }
    }

    pub fn query(&self, positions: &[Vec2], min: Vec2, max: Vec2) -> Vec<usize> {
        let mut found = Vec::new();
        self.visit(
            |bounds| bounds.disjoint_from(min, max),
            |indices| {
                found.extend(indices.iter().copied().filter(|&index| {
                    let point = positions[index];
                    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
                }));
            },
        );
        found
    }

    pub fn cells(&self) -> Vec<QuadtreeCell> {
        let mut cells = Vec::new();
        if let Some(root) = self.root.as_ref() {
            collect_quadtree_cells(root, 0, &mut cells);
        }
        cells
    }
}

fn collect_quadtree_cells(cell: &QuadCell, depth: usize, cells: &mut Vec<QuadtreeCell>) {
    cells.push(QuadtreeCell {
        center: cell.bounds.center,
        half_extent: cell.bounds.half_extent,
        depth,
        is_leaf: cell.is_leaf(),
    });

    for child in cell.children() {
        collect_quadtree_cells(child, depth + 1, cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 10) as f32 * 10.0, (index / 10) as f32 * 10.0))
            .collect()
    }

    #[test]
    fn empty_input_builds_empty_index() {
        let index = SpatialIndex::build(&[]);
        assert!(index.is_empty());
        let mut visited = 0;
        index.visit(|_| false, |_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn unpruned_visit_reaches_every_item_once() {
        let positions = grid(100);
        let index = SpatialIndex::build(&positions);
        let mut seen = Vec::new();
        index.visit(|_| false, |indices| seen.extend_from_slice(indices));
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        assert!(index.cells().len() > 1);
    }

    #[test]
    fn range_query_matches_brute_force() {
        let positions = grid(100);
        let index = SpatialIndex::build(&positions);
        let (min, max) = (vec2(15.0, 15.0), vec2(42.0, 31.0));

        let mut found = index.query(&positions, min, max);
        found.sort_unstable();
        let expected = (0..positions.len())
            .filter(|&i| {
                let p = positions[i];
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            })
            .collect::<Vec<_>>();
        assert_eq!(found, expected);
    }

    #[test]
    fn pruning_skips_far_regions() {
        let positions = grid(100);
        let index = SpatialIndex::build(&positions);
        let mut visited = 0usize;
        index.visit(
            |bounds| bounds.disjoint_from(vec2(0.0, 0.0), vec2(5.0, 5.0)),
            |indices| visited += indices.len(),
        );
        assert!(visited < positions.len());
        assert!(visited >= 1);
    }

    #[test]
    fn coincident_points_share_a_leaf() {
        let positions = vec![vec2(3.0, 3.0); 20];
        let index = SpatialIndex::build(&positions);
        let mut leaves = 0;
        let mut total = 0;
        index.visit(
            |_| false,
            |indices| {
                leaves += 1;
                total += indices.len();
            },
        );
        assert_eq!(total, 20);
        assert_eq!(leaves, 1);
    }

    #[test]
    fn weighted_cells_aggregate_weight() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let index = SpatialIndex::build_weighted(&positions, &[-1.0, -3.0]);
        let root = index.root().unwrap();
        assert_eq!(root.weight, -4.0);
        assert!((root.centroid.x - 7.5).abs() < 1e-5);
    }
}
