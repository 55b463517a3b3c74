use std::collections::BTreeSet;

use leptos::prelude::*;
use serde_json::json;

use crate::components::hierarchy_view::{HierarchyCanvas, HierarchyData};
use crate::lineage::{CONFIG_FILE, LevelCodec, LevelId, RenderedLayers, StepPolicy};

const DEMO_GRAPH: &str = "demo";
const DEMO_TAG: &str = "PM";

/// Levels of the demo run, base first. Each step halves the vertex sets
/// whose depth grows by merging neighbouring ids pairwise.
const DEMO_LEVELS: [LevelId; 4] = [
	LevelId::BASE,
	LevelId::new(1, 1),
	LevelId::new(2, 2),
	LevelId::new(3, 2),
];

fn sizes_at(base: (usize, usize), level: LevelId) -> (usize, usize) {
	let halve = |n: usize, depth: u32| (0..depth).fold(n, |n, _| n.div_ceil(2));
	(halve(base.0, level.depth_a), halve(base.1, level.depth_b))
}

/// The vertex `id` of `finer` was merged into at `coarser`.
fn merged_into(
	id: usize,
	finer: (LevelId, (usize, usize)),
	coarser: (LevelId, (usize, usize)),
) -> usize {
	let ((f, (fa, _)), (c, (ca, _))) = (finer, coarser);
	if id < fa {
		if c.depth_a != f.depth_a { id / 2 } else { id }
	} else {
		let j = id - fa;
		ca + if c.depth_b != f.depth_b { j / 2 } else { j }
	}
}

/// Generate a pairwise-merge coarsening run of a random bipartite graph,
/// laid out as the artifact bundle the pipeline would write.
fn generate_sample_hierarchy(na: usize, nb: usize) -> HierarchyData {
	let codec = LevelCodec::new(DEMO_GRAPH, DEMO_TAG, StepPolicy::Balanced);
	let levels: Vec<(LevelId, (usize, usize))> = DEMO_LEVELS
		.iter()
		.map(|&l| (l, sizes_at((na, nb), l)))
		.collect();

	let mut links: BTreeSet<(usize, usize)> = (0..na * 2)
		.map(|i| {
			let a = (rand_simple(i) * na as f64) as usize;
			let b = (rand_simple(i + 7919) * nb as f64) as usize;
			(a, na + b)
		})
		.collect();

	let mut files = Vec::new();
	for (i, &(level, (a, b))) in levels.iter().enumerate() {
		let n = a + b;
		let successors: Vec<Option<usize>> = (0..n)
			.map(|id| levels.get(i + 1).map(|&next| merged_into(id, levels[i], next)))
			.collect();
		let predecessors: Vec<Vec<usize>> = match i.checked_sub(1).map(|p| levels[p]) {
			Some(prev) => {
				let mut out = vec![Vec::new(); n];
				for id in 0..prev.1.0 + prev.1.1 {
					out[merged_into(id, prev, levels[i])].push(id);
				}
				out
			}
			None => vec![Vec::new(); n],
		};

		let nodes: Vec<_> = (0..n)
			.map(|id| {
				let preds: Vec<String> = predecessors[id].iter().map(usize::to_string).collect();
				json!({
					"id": id,
					"predecessor": preds.join(","),
					"successor": successors[id].map(|s| s.to_string()).unwrap_or_default(),
					"weight": predecessors[id].len().max(1),
				})
			})
			.collect();
		let doc = json!({
			"graphInfo": { "vlayer": format!("{a} {b}") },
			"nodes": nodes,
			"links": links.iter().map(|&(s, t)| json!({ "source": s, "target": t })).collect::<Vec<_>>(),
		});
		files.push((codec.document_name(level), doc.to_string()));

		// Only the sets drawn at this level get a render slot.
		let rendered = RenderedLayers::between(i.checked_sub(1).map(|p| levels[p].0), level);
		let mut order: Vec<usize> = (0..n)
			.filter(|&id| if id < a { rendered.a } else { rendered.b })
			.collect();
		order.sort_by(|x, y| rand_simple(x * 31 + i).total_cmp(&rand_simple(y * 31 + i)));
		let perm: Vec<String> = order.iter().map(usize::to_string).collect();
		files.push((codec.permutation_name(level), perm.join(",")));

		if let Some(next) = levels.get(i + 1) {
			links = links
				.iter()
				.map(|&(s, t)| (merged_into(s, levels[i], *next), merged_into(t, levels[i], *next)))
				.collect();
		}
	}

	files.push((
		CONFIG_FILE.to_string(),
		json!({ "graph_name": DEMO_GRAPH, "reduction_tag": DEMO_TAG }).to_string(),
	));
	HierarchyData { files }
}

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let hierarchy = Signal::derive(move || generate_sample_hierarchy(24, 16));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<HierarchyCanvas data=hierarchy fullscreen=true />
				<div class="graph-overlay">
					<h1>"Coarsening Lineage"</h1>
					<p class="subtitle">
						"Double-click a vertex to trace it across levels. Scroll to zoom. Drag background to pan."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lineage::{BundleStore, CorrespondenceResolver, Direction, LevelStore};

	#[test]
	fn demo_bundle_is_a_consistent_hierarchy() {
		let data = generate_sample_hierarchy(24, 16);
		let config = data.config();
		assert_eq!(config.graph_name, DEMO_GRAPH);
		let store = BundleStore::new(config.codec(), data.files);
		assert_eq!(store.hierarchy().levels(), &DEMO_LEVELS);

		let top = LevelId::new(3, 2);
		assert_eq!(store.load_level(top).unwrap().layer_sizes, (3, 4));
		// B did not change depth at the last step, so only A is drawn.
		assert_eq!(store.load_permutation(top).unwrap().len(), 3);

		let codec = config.codec();
		let resolved = CorrespondenceResolver::new(&store, &codec).resolve(
			LevelId::BASE,
			&[0],
			top,
			Direction::ToDescendant,
		);
		assert!(resolved.is_complete());
		assert_eq!(resolved.ids(), &[0]);
	}
}
