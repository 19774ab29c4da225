/// Identifier for a bud in a [`crate::graph::BudGraph`].
///
/// This is an index into the graph's arena, and is only meaningful for
/// a given arena state: removing a bud re-indexes the arena and
/// invalidates previously handed out ids.
pub type BudId = usize;
