use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn apply_replaces_in_order() {
	let text = "let x = Atoi(s)";
	let set = EditSet::new(
		text,
		vec![
			Edit::replace(6..7, ":="),
			Edit::delete(0..4),
			Edit::insert(8, "strconv."),
		],
	)
	.unwrap();
	assert_eq!(set.apply(text), "x := strconv.Atoi(s)");
	assert_eq!(set.len_after(), "x := strconv.Atoi(s)".len());
}

#[test]
fn overlapping_edits_are_rejected() {
	let err = EditSet::new("abcdef", vec![Edit::delete(1..4), Edit::replace(3..5, "x")]).unwrap_err();
	assert_eq!(
		err,
		EditError::Overlapping {
			start: 3,
			previous_end: 4
		}
	);
}

#[test]
fn out_of_bounds_and_boundaries_are_rejected() {
	assert!(matches!(
		EditSet::new("abc", vec![Edit::delete(2..9)]),
		Err(EditError::OutOfBounds { .. })
	));
	assert!(matches!(
		EditSet::new("é", vec![Edit::insert(1, "x")]),
		Err(EditError::NotCharBoundary { .. })
	));
}

#[test]
fn render_maps_inserted_lines_to_edit_start() {
	let text = "a\nb\n";
	let set = EditSet::new(text, vec![Edit::insert(2, "x1\nx2\n")]).unwrap();
	let out = set.render(text);
	assert_eq!(out.text, "a\nx1\nx2\nb\n");
	assert_eq!(out.map.lookup(Position::new(2, 2)), Some(Position::new(2, 1)));
	assert_eq!(out.map.lookup(Position::new(3, 1)), Some(Position::new(2, 1)));
	assert_eq!(out.map.lookup(Position::new(4, 1)), Some(Position::new(2, 1)));
	assert_eq!(out.map.lookup(Position::new(5, 1)), Some(Position::new(3, 1)));
	assert_eq!(out.deltas[0].lines, 2);
	assert_eq!(out.deltas[0].columns, 0);
}

#[test]
fn render_tracks_columns_after_same_line_edit() {
	let text = "v := Atoi(x) + 1";
	let set = EditSet::new(text, vec![Edit::insert(5, "strconv.")]).unwrap();
	let out = set.render(text);
	// `+` sits at input column 14 and moves right by eight bytes.
	let plus = Position::new(1, 14);
	let moved = forward_position(&out.deltas, plus);
	assert_eq!(moved, Position::new(1, 22));
	assert_eq!(out.map.lookup(moved), Some(plus));
	assert_eq!(&out.text[21..22], "+");
}

#[test]
fn forward_position_inside_replacement_lands_on_its_start() {
	let text = "abc def";
	let set = EditSet::new(text, vec![Edit::replace(4..7, "xy")]).unwrap();
	let out = set.render(text);
	assert_eq!(forward_position(&out.deltas, Position::new(1, 6)), Position::new(1, 5));
	assert_eq!(forward_position(&out.deltas, Position::new(1, 2)), Position::new(1, 2));
}

fn arb_doc_and_edits() -> impl Strategy<Value = (String, Vec<Edit>)> {
	"[a-c \n]{0,60}".prop_flat_map(|doc| {
		let len = doc.len();
		let raw = prop::collection::vec((0..=len, 0..=3usize, "[xy\n]{0,4}"), 0..6);
		(Just(doc), raw).prop_map(|(doc, raw)| {
			let len = doc.len();
			let mut raw = raw;
			raw.sort_by_key(|(start, _, _)| *start);
			let mut edits = Vec::new();
			let mut previous_end = 0;
			for (start, del, text) in raw {
				if start < previous_end {
					continue;
				}
				let end = (start + del).min(len);
				previous_end = end;
				edits.push(Edit::replace(start..end, text));
			}
			(doc, edits)
		})
	})
}

proptest! {
	#[test]
	fn retained_text_round_trips((doc, edits) in arb_doc_and_edits()) {
		let set = EditSet::new(&doc, edits.clone()).unwrap();
		let out = set.render(&doc);
		prop_assert_eq!(&out.text, &set.apply(&doc));
		prop_assert!(out.map.validate().is_ok());

		let input = LineIndex::new(&doc);
		let output = LineIndex::new(&out.text);
		for offset in 0..doc.len() {
			if edits.iter().any(|e| e.start <= offset && offset < e.end) {
				continue;
			}
			let original = input.position(offset);
			let generated = forward_position(&out.deltas, original);
			prop_assert_eq!(out.map.lookup(generated), Some(original));
			let at = output.offset(generated).unwrap();
			prop_assert_eq!(out.text.as_bytes()[at], doc.as_bytes()[offset]);
		}
	}
}
