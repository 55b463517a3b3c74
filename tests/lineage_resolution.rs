use lineage_canvas::lineage::{
	BundleStore, CorrespondenceResolver, Direction, LevelArtifact, LevelCodec, LevelId,
	LevelStore, LineageError, MemoryLevelStore, PermutationTable, RenderOrder, RenderSlot,
	RenderedLayers, StepPolicy, VertexRecord,
};
use proptest::prelude::*;
use serde_json::json;

const COARSE: LevelId = LevelId::new(0, 1);

fn codec() -> LevelCodec {
	LevelCodec::new("papers", "R10", StepPolicy::Balanced)
}

/// `papers.json` and `papersCoarsenedR10nl0nr1.json`: set B = {2, 3} merged
/// into a single vertex at the coarser level. Lists are comma strings the
/// way the pipeline writes them.
fn bundle() -> Vec<(String, String)> {
	let base = json!({
		"graphInfo": { "vlayer": "2 2" },
		"nodes": [
			{ "id": 0, "predecessor": "", "successor": "" },
			{ "id": 1, "predecessor": "", "successor": "" },
			{ "id": 2, "predecessor": "", "successor": "0" },
			{ "id": 3, "predecessor": "", "successor": "0," },
		],
		"links": [{ "source": 0, "target": 2 }, { "source": 1, "target": 3 }],
	});
	let coarse = json!({
		"graphInfo": { "vlayer": "0 1" },
		"nodes": [{ "id": 0, "predecessor": "2,3", "successor": "" }],
		"links": [],
	});
	vec![
		("papers.json".into(), base.to_string()),
		("papers.s".into(), "3,1,2,0".into()),
		("papersCoarsenedR10nl0nr1.json".into(), coarse.to_string()),
		("papersCoarsenedR10nl0nr1.s".into(), "0".into()),
		("notes.txt".into(), "ignored".into()),
	]
}

#[test]
fn set_b_merge_resolves_both_ways() {
	let codec = codec();
	let store = BundleStore::new(codec.clone(), bundle());
	assert_eq!(store.hierarchy().levels(), &[LevelId::BASE, COARSE]);

	let resolver = CorrespondenceResolver::new(&store, &codec);
	let up = resolver.resolve(COARSE, &[0], LevelId::BASE, Direction::ToAncestor);
	assert!(up.is_complete());
	assert_eq!(up.ids(), &[2, 3]);

	let down = resolver.resolve(LevelId::BASE, &[2, 3], COARSE, Direction::ToDescendant);
	assert!(down.is_complete());
	assert_eq!(down.ids(), &[0]);
}

#[test]
fn resolving_toward_a_missing_level_degrades_to_empty() {
	let codec = codec();
	let store = BundleStore::new(codec.clone(), bundle());
	let missing = LevelId::new(3, 3);

	let res = CorrespondenceResolver::new(&store, &codec).resolve(
		LevelId::BASE,
		&[0, 1],
		missing,
		Direction::ToDescendant,
	);
	assert!(res.ids().is_empty());
	let partial = res.partial().expect("missing target is reported");
	assert_eq!(partial.cause, LineageError::LevelNotFound(missing));
	assert_eq!(partial.reached, LevelId::BASE);
}

#[test]
fn malformed_documents_surface_as_load_errors() {
	let codec = codec();
	let store = BundleStore::new(
		codec.clone(),
		[("papers.json".to_string(), "{ not json".to_string())],
	);
	assert!(matches!(
		store.load_level(LevelId::BASE),
		Err(LineageError::MalformedDocument { .. })
	));
	assert_eq!(
		store.load_permutation(LevelId::BASE).unwrap_err(),
		LineageError::PermutationNotFound(LevelId::BASE)
	);
}

#[test]
fn unrendered_set_has_no_render_slot() {
	// Set A is carried over unchanged, so only set B is drawn at {0,1}.
	let coarse = json!({
		"graphInfo": { "vlayer": "2 1" },
		"nodes": [
			{ "id": 0, "predecessor": [0], "successor": [] },
			{ "id": 1, "predecessor": [1], "successor": [] },
			{ "id": 2, "predecessor": [2, 3], "successor": [] },
		],
		"links": [{ "source": 0, "target": 2 }],
	});
	let mut files = bundle();
	files.retain(|(name, _)| !name.starts_with("papersCoarsened"));
	files.push(("papersCoarsenedR10nl0nr1.json".into(), coarse.to_string()));
	files.push(("papersCoarsenedR10nl0nr1.s".into(), "2".into()));
	let store = BundleStore::new(codec(), files);
	let mut order = RenderOrder::new();

	let artifact = store.load_level(COARSE).unwrap();
	assert_eq!(artifact.rendered, RenderedLayers { a: false, b: true });
	assert_eq!(order.to_render_index(&store, COARSE, 1), RenderSlot::NotRendered);
	assert_eq!(order.to_render_index(&store, COARSE, 2), RenderSlot::Rendered(0));

	assert_eq!(order.to_render_index(&store, LevelId::BASE, 2), RenderSlot::Rendered(2));
	assert_eq!(order.to_vertex_id(&store, LevelId::BASE, 0), Some(3));
}

/// Two-level store where finer vertex `i` was merged into `merges[i]`.
fn merged_store(merges: &[usize], coarse_len: usize) -> MemoryLevelStore {
	let mut store = MemoryLevelStore::new();
	store.insert_level(LevelArtifact::new(
		LevelId::BASE,
		(0, merges.len()),
		RenderedLayers::BOTH,
		merges
			.iter()
			.enumerate()
			.map(|(i, &c)| VertexRecord::new(i).with_successors([c]))
			.collect(),
		Vec::new(),
	));
	store.insert_level(LevelArtifact::new(
		COARSE,
		(0, coarse_len),
		RenderedLayers::BOTH,
		(0..coarse_len)
			.map(|c| {
				VertexRecord::new(c)
					.with_predecessors((0..merges.len()).filter(|&i| merges[i] == c))
			})
			.collect(),
		Vec::new(),
	));
	store
}

proptest! {
	#[test]
	fn one_level_round_trip_contains_the_start(merges in prop::collection::vec(0usize..5, 1..30)) {
		let codec = codec();
		let store = merged_store(&merges, 5);
		let resolver = CorrespondenceResolver::new(&store, &codec);

		for x in 0..5 {
			let preds = resolver.resolve(COARSE, &[x], LevelId::BASE, Direction::ToAncestor);
			prop_assert!(preds.is_complete());
			if preds.ids().is_empty() {
				continue;
			}
			let back = resolver.resolve(LevelId::BASE, preds.ids(), COARSE, Direction::ToDescendant);
			prop_assert!(back.ids().contains(&x));
		}
	}

	#[test]
	fn render_slots_and_vertex_ids_are_inverse(
		slots in (1usize..40).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle()),
	) {
		let n = slots.len();
		let mut store = MemoryLevelStore::new();
		store.insert_level(LevelArtifact::new(
			LevelId::BASE,
			(n, 0),
			RenderedLayers::BOTH,
			(0..n).map(VertexRecord::new).collect(),
			Vec::new(),
		));
		store.insert_permutation(LevelId::BASE, PermutationTable::from_slots(slots).unwrap());
		let mut order = RenderOrder::new();

		for idx in 0..n {
			let vertex = order.to_vertex_id(&store, LevelId::BASE, idx).unwrap();
			prop_assert_eq!(
				order.to_render_index(&store, LevelId::BASE, vertex),
				RenderSlot::Rendered(idx)
			);
		}
		prop_assert_eq!(order.to_vertex_id(&store, LevelId::BASE, n), None);
	}

	#[test]
	fn identity_chains_keep_ids_at_any_distance(
		a in (0u32..6, 0u32..6),
		b in (0u32..6, 0u32..6),
		ids in prop::collection::vec(0usize..8, 0..6),
	) {
		// Every level between the two exists and maps each vertex to itself.
		let codec = codec();
		let mut store = MemoryLevelStore::new();
		for da in 0..6 {
			for db in 0..6 {
				store.insert_level(LevelArtifact::new(
					LevelId::new(da, db),
					(4, 4),
					RenderedLayers::BOTH,
					(0..8)
						.map(|i| VertexRecord::new(i).with_predecessors([i]).with_successors([i]))
						.collect(),
					Vec::new(),
				));
			}
		}
		let (start, target) = (LevelId::new(a.0, a.1), LevelId::new(b.0, b.1));
		let res = CorrespondenceResolver::new(&store, &codec).resolve(
			start,
			&ids,
			target,
			Direction::ToDescendant,
		);
		prop_assert!(res.is_complete());
		let mut expected = ids.clone();
		if start != target {
			expected.sort_unstable();
			expected.dedup();
		}
		prop_assert_eq!(res.ids(), expected.as_slice());
	}
}
