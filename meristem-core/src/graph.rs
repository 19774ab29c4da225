//! Visibility graph over the placed buds.
//!
//! For each bud the graph stores the other buds it can see across the
//! cylinder surface, nearest first. Two buds can be spatially close yet
//! mutually invisible when a third sits between them, so this is a
//! visibility graph, not a proximity graph.
//!
//! Buds live in a dense arena indexed by [`BudId`]; adjacency is plain
//! id lists, so there are no ownership cycles and snapshots are cheap.

use std::collections::VecDeque;

use crate::bud::Bud;
use crate::config::GraphConfig;
use crate::error::GeometryError;
use crate::geometry;
use crate::helix::Helix;
use crate::occlusion::{PlaneChecker, occlusion_cone};
use crate::types::BudId;

/// Two circles this close (in the scaled plane) count as overlapping.
const OVERLAP_EPS: f32 = 0.0001;

#[derive(Debug, Default)]
pub struct BudGraph {
    buds: Vec<Bud>,
    nodes: Vec<Vec<BudId>>,
    cfg: GraphConfig,
}

impl BudGraph {
    pub fn new(cfg: GraphConfig) -> Self {
        Self {
            buds: Vec::new(),
            nodes: Vec::new(),
            cfg,
        }
    }

    pub fn len(&self) -> usize {
        self.buds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buds.is_empty()
    }

    pub fn buds(&self) -> &[Bud] {
        &self.buds
    }

    pub fn get(&self, id: BudId) -> Option<&Bud> {
        self.buds.get(id)
    }

    /// All other buds, sorted by their proximity to `id`.
    pub fn closest(&self, id: BudId) -> Vec<BudId> {
        let bud = &self.buds[id];
        let mut ids: Vec<BudId> = (0..self.buds.len()).filter(|&i| i != id).collect();
        ids.sort_by(|&a, &b| {
            bud.distance(&self.buds[a])
                .total_cmp(&bud.distance(&self.buds[b]))
        });
        ids
    }

    /// Insert a bud and wire up its neighbour list.
    ///
    /// With [`GraphConfig::refresh_on_insert`] set, the neighbour lists
    /// of every newly adjacent bud are recomputed as well: the new bud
    /// can sit between two previously adjacent buds and sever their
    /// mutual visibility. Without the refresh those lists go slightly
    /// stale, in exchange for O(n) instead of O(n²) inserts.
    pub fn add_bud(&mut self, bud: Bud) -> BudId {
        let id = self.buds.len();
        self.buds.push(bud);
        self.nodes.push(Vec::new());

        let neighbours = self.reachable(id, self.closest(id));
        if self.cfg.refresh_on_insert {
            for &n in &neighbours {
                self.nodes[n] = self.reachable(n, self.closest(n));
            }
        }
        self.nodes[id] = neighbours;
        id
    }

    /// Filter `candidates` (nearest first) down to the buds `selected`
    /// can see without an intervening occluder.
    ///
    /// Walks the candidates in order, taking each as the tested bud.
    /// When the tested circle overlaps `selected`'s, remaining
    /// candidates behind the separating plane through the tested bud
    /// are dropped; when the circles are disjoint, remaining candidates
    /// inside the occlusion cone behind the tested bud are dropped.
    /// Every tested bud that survives contributes to the result in
    /// distance order. `selected` itself never occludes and never
    /// appears in the result.
    pub fn reachable(&self, selected: BudId, candidates: Vec<BudId>) -> Vec<BudId> {
        let mut remaining: VecDeque<BudId> = candidates.into();
        let mut result = Vec::new();

        while let Some(tested) = remaining.pop_front() {
            if tested == selected {
                // no self-occlusion: whatever is left stays visible
                result.extend(remaining.drain(..));
                break;
            }

            let sel = &self.buds[selected];
            let tst = &self.buds[tested];

            if sel.distance(tst) <= sel.scale + tst.scale + OVERLAP_EPS {
                // overlapping circles can't form a clean cone; keep
                // only candidates in front of the separating plane
                let plane = PlaneChecker::new(sel, tst);
                remaining.retain(|&b| plane.in_front(&self.buds[b]));
            } else {
                let cone = occlusion_cone(sel, tst);
                remaining.retain(|&b| !cone.contains(&self.buds[b]));
            }
            result.push(tested);
        }
        result
    }

    /// The buds `id` can reach in direct line of sight, closest first.
    pub fn neighbours(&self, id: BudId) -> &[BudId] {
        &self.nodes[id]
    }

    /// The current top growth ring.
    pub fn front(&self) -> Result<Vec<BudId>, GeometryError> {
        geometry::front(&self.buds)
    }

    /// Pairs of `id`'s neighbours sitting on opposite sides of it.
    ///
    /// Each neighbour is consumed by at most one pair, so the same bud
    /// never contributes to two axes.
    pub fn axis_pairs(&self, id: BudId) -> Vec<(BudId, BudId)> {
        let bud = &self.buds[id];
        let neighbours = &self.nodes[id];
        let mut paired = vec![false; neighbours.len()];
        let mut pairs = Vec::new();

        for i in 0..neighbours.len() {
            if paired[i] {
                continue;
            }
            for j in (i + 1)..neighbours.len() {
                if paired[j] {
                    continue;
                }
                if bud.opposite(&self.buds[neighbours[i]], &self.buds[neighbours[j]]) {
                    paired[i] = true;
                    paired[j] = true;
                    pairs.push((neighbours[i], neighbours[j]));
                    break;
                }
            }
        }
        pairs
    }

    /// Helices through each opposite pair around `id`.
    pub fn axes(&self, id: BudId) -> Vec<Helix> {
        self.axis_pairs(id)
            .into_iter()
            .map(|(a, b)| Helix::through(&self.buds[a], &self.buds[b]))
            .collect()
    }

    /// All buds lying on the given helix.
    pub fn on_line(&self, helix: &Helix) -> Vec<BudId> {
        (0..self.buds.len())
            .filter(|&i| helix.contains(&self.buds[i]))
            .collect()
    }

    /// Replace a bud's position in place, leaving adjacency untouched;
    /// callers batching updates should [`rebuild`](Self::rebuild) after.
    pub fn set_bud(&mut self, id: BudId, bud: Bud) {
        self.buds[id] = bud;
    }

    /// Recompute every neighbour list from scratch.
    pub fn rebuild(&mut self) {
        for id in 0..self.buds.len() {
            self.nodes[id] = self.reachable(id, self.closest(id));
        }
    }

    /// Remove a bud. The arena is re-indexed, so previously handed out
    /// ids no longer apply.
    pub fn remove(&mut self, id: BudId) {
        if id >= self.buds.len() {
            return;
        }
        self.buds.remove(id);
        self.nodes.pop();
        self.rebuild();
    }
}
