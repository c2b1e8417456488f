use std::collections::HashMap;
use btree_slab::BTreeSet;
use btree_range_map::RangeMap;
use crate::charset::{
	range_start,
	range_end
};
use super::{
	Automaton,
	StateId
};

impl Automaton {
	/// Subset construction. The resulting automaton has no two
	/// overlapping intervals out of any state. Does nothing when the
	/// automaton is already deterministic.
	pub fn determinize(&mut self) {
		if self.deterministic || self.singleton.is_some() {
			return;
		}

		let mut initial = BTreeSet::new();
		initial.insert(self.initial);

		let mut result = Automaton::with_initial();
		result.set_accept(0, self.states[self.initial as usize].accept);
		let mut ids: HashMap<BTreeSet<StateId>, StateId> = HashMap::new();
		ids.insert(initial.clone(), 0);
		let mut stack = vec![initial];

		while let Some(set) = stack.pop() {
			let id = ids[&set];

			// split the members' outgoing intervals into disjoint ranges,
			// merging the target sets of overlapping ones
			let mut map: RangeMap<u16, BTreeSet<StateId>> = RangeMap::new();
			for q in &set {
				for t in &self.states[*q as usize].transitions {
					map.update(t.min..=t.max, |targets: Option<&BTreeSet<StateId>>| {
						let mut targets = match targets {
							Some(targets) => targets.clone(),
							None => BTreeSet::new()
						};
						targets.insert(t.to);
						Some(targets)
					})
				}
			}

			for (range, targets) in map {
				let next = match ids.get(&targets) {
					Some(&next) => next,
					None => {
						let next = result.add_state();
						let accept = targets.iter().any(|&q| self.states[q as usize].accept);
						result.set_accept(next, accept);
						ids.insert(targets.clone(), next);
						stack.push(targets);
						next
					}
				};
				result.add_transition(id, range_start(&range), range_end(&range), next)
			}
		}

		self.states = result.states;
		self.initial = result.initial;
		self.deterministic = true;
		self.clear_hash();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn determinization_preserves_the_language_and_removes_overlap() {
		// (a|ab|[a-c]x): overlapping intervals out of the initial state
		let mut a = Automaton::union(vec![
			Automaton::from_string("a"),
			Automaton::from_string("ab"),
			Automaton::char_range(b'a' as u16, b'c' as u16)
				.concat(Automaton::from_char(b'x' as u16))
		]);
		assert!(!a.is_deterministic());
		a.determinize();
		assert!(a.is_deterministic());

		for s in a.reachable_states() {
			let transitions = a.sorted_transitions(s, false);
			for w in transitions.windows(2) {
				assert!(w[0].max < w[1].min, "overlapping intervals out of q{}", s);
			}
		}

		assert!(a.run("a"));
		assert!(a.run("ab"));
		assert!(a.run("ax"));
		assert!(a.run("bx"));
		assert!(a.run("cx"));
		assert!(!a.run("b"));
		assert!(!a.run("abx"));
	}
}
