//! Node placement for the canvas scene.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::style::{LayoutDirective, LayoutName, RankDir};

const FORCE_STEPS: usize = 300;
const FORCE_DT: f32 = 0.016;

/// Center positions for `sizes.len()` nodes. `edges` index into `sizes`.
pub fn compute(
	layout: &LayoutDirective,
	sizes: &[(f64, f64)],
	edges: &[(usize, usize)],
) -> Vec<(f64, f64)> {
	match layout.name {
		LayoutName::Layered => layered(layout, sizes, edges),
		LayoutName::Force => force(sizes, edges),
	}
}

/// Longest-path rank of every node. Nodes on a cycle are broken out in
/// index order, so this always terminates.
pub fn assign_ranks(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
	let mut indegree = vec![0usize; n];
	let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
	for &(s, t) in edges {
		if s == t || s >= n || t >= n {
			continue;
		}
		indegree[t] += 1;
		outgoing[s].push(t);
	}

	let mut rank = vec![0usize; n];
	let mut done = vec![false; n];
	let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).rev().collect();
	let mut processed = 0;

	while processed < n {
		let next = match queue.pop() {
			Some(i) => i,
			// cycle: force the first node still waiting
			None => match (0..n).find(|&i| !done[i]) {
				Some(i) => i,
				None => break,
			},
		};
		if done[next] {
			continue;
		}
		done[next] = true;
		processed += 1;

		for &t in &outgoing[next] {
			if done[t] {
				continue;
			}
			rank[t] = rank[t].max(rank[next] + 1);
			indegree[t] = indegree[t].saturating_sub(1);
			if indegree[t] == 0 {
				queue.push(t);
			}
		}
	}
	rank
}

fn layered(
	layout: &LayoutDirective,
	sizes: &[(f64, f64)],
	edges: &[(usize, usize)],
) -> Vec<(f64, f64)> {
	let ranks = assign_ranks(sizes.len(), edges);
	let rank_count = ranks.iter().max().map_or(0, |r| r + 1);

	let mut members: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
	for (i, &r) in ranks.iter().enumerate() {
		members[r].push(i);
	}

	// (along rank axis, across rank axis)
	let extent = |i: usize| -> (f64, f64) {
		let (w, h) = sizes[i];
		match layout.rank_dir {
			RankDir::LeftRight => (w, h),
			RankDir::TopBottom => (h, w),
		}
	};

	let mut positions = vec![(0.0, 0.0); sizes.len()];
	let mut rank_start = 0.0;
	for rank in &members {
		let depth = rank.iter().map(|&i| extent(i).0).fold(0.0, f64::max);
		let breadth: f64 = rank.iter().map(|&i| extent(i).1).sum::<f64>()
			+ layout.node_sep * rank.len().saturating_sub(1) as f64;

		let mut cursor = -breadth / 2.0;
		for &i in rank {
			let across = cursor + extent(i).1 / 2.0;
			let along = rank_start + depth / 2.0;
			positions[i] = match layout.rank_dir {
				RankDir::LeftRight => (along, across),
				RankDir::TopBottom => (across, along),
			};
			cursor += extent(i).1 + layout.node_sep;
		}
		rank_start += depth + layout.rank_sep;
	}
	positions
}

fn force(sizes: &[(f64, f64)], edges: &[(usize, usize)]) -> Vec<(f64, f64)> {
	let n = sizes.len();
	let mut graph: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	});

	let radius = 30.0 * n as f64;
	let indices: Vec<_> = (0..n)
		.map(|i| {
			let angle = (i as f64) * 2.0 * PI / n as f64;
			graph.add_node(NodeData {
				x: (radius * angle.cos()) as f32,
				y: (radius * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: i,
			})
		})
		.collect();
	for &(s, t) in edges {
		if s < n && t < n && s != t {
			graph.add_edge(indices[s], indices[t], EdgeData::default());
		}
	}

	for _ in 0..FORCE_STEPS {
		graph.update(FORCE_DT);
	}

	let mut positions = vec![(0.0, 0.0); n];
	graph.visit_nodes(|node| {
		positions[node.data.user_data] = (node.x() as f64, node.y() as f64);
	});
	positions
}

/// Perpendicular offset for every edge so parallel edges between the same
/// pair of nodes fan out `edge_sep` apart. Offsets are relative to each
/// edge's own direction, so reversed edges carry the opposite sign.
pub fn edge_offsets(edges: &[(usize, usize)], edge_sep: f64) -> Vec<f64> {
	let mut groups: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
	for (i, &(s, t)) in edges.iter().enumerate() {
		groups.entry((s.min(t), s.max(t))).or_default().push(i);
	}

	let mut offsets = vec![0.0; edges.len()];
	for members in groups.values() {
		let mid = (members.len() as f64 - 1.0) / 2.0;
		for (slot, &edge) in members.iter().enumerate() {
			let (s, t) = edges[edge];
			let sign = if s > t { -1.0 } else { 1.0 };
			offsets[edge] = sign * (slot as f64 - mid) * edge_sep;
		}
	}
	offsets
}
