use std::collections::{
	HashMap,
	HashSet,
	VecDeque
};
use super::{
	Automaton,
	State,
	StateId,
	Transition
};

impl Automaton {
	/// Hopcroft partition-refinement minimization.
	///
	/// The automaton is determinized and totalized first; the input
	/// alphabet is partitioned into the start-point classes, over which
	/// every state has exactly one successor. The result is renumbered in
	/// BFS order with interval-sorted transitions, so minimization is
	/// idempotent down to structural identity. Clears the cached hash.
	pub fn minimize(&mut self) {
		if self.singleton.is_some() {
			// a singleton chain is already minimal
			self.clear_hash();
			return;
		}

		let before = self.number_of_states();
		self.determinize();
		self.totalize();
		self.reduce();
		self.compact();

		let n = self.states.len();
		let sigma = self.start_points();
		let m = sigma.len();

		// successor table over the start-point classes
		let mut succ = vec![0usize; n * m];
		for s in 0..n {
			for (x, &c) in sigma.iter().enumerate() {
				succ[s * m + x] = self.step(s as StateId, c).expect("totalized automaton") as usize
			}
		}
		let mut preds: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); n]; m];
		for s in 0..n {
			for x in 0..m {
				preds[x][succ[s * m + x]].push(s)
			}
		}

		// initial partition: accepting / rejecting
		let mut blocks: Vec<Vec<usize>> = Vec::new();
		let mut block_of = vec![0usize; n];
		let accepting: Vec<usize> = (0..n).filter(|&s| self.states[s].accept).collect();
		let rejecting: Vec<usize> = (0..n).filter(|&s| !self.states[s].accept).collect();
		for group in vec![accepting, rejecting] {
			if !group.is_empty() {
				let b = blocks.len();
				for &s in &group {
					block_of[s] = b
				}
				blocks.push(group)
			}
		}

		let mut worklist: VecDeque<(usize, usize)> = VecDeque::new();
		let mut queued: HashSet<(usize, usize)> = HashSet::new();
		if blocks.len() == 2 {
			let smaller = if blocks[0].len() <= blocks[1].len() { 0 } else { 1 };
			for x in 0..m {
				worklist.push_back((smaller, x));
				queued.insert((smaller, x));
			}
		}

		while let Some((b, x)) = worklist.pop_front() {
			queued.remove(&(b, x));
			let splitter = blocks[b].clone();

			// states with an x-transition into the splitter, grouped by block
			let mut hits: HashMap<usize, Vec<usize>> = HashMap::new();
			for &t in &splitter {
				for &s in &preds[x][t] {
					hits.entry(block_of[s]).or_insert_with(Vec::new).push(s)
				}
			}

			for (y, hit) in hits {
				if hit.len() == blocks[y].len() {
					continue;
				}
				let new_block = blocks.len();
				for &s in &hit {
					block_of[s] = new_block
				}
				blocks[y].retain(|&s| block_of[s] == y);
				blocks.push(hit);
				for c in 0..m {
					let key = if queued.contains(&(y, c)) {
						(new_block, c)
					} else if blocks[y].len() <= blocks[new_block].len() {
						(y, c)
					} else {
						(new_block, c)
					};
					if queued.insert(key) {
						worklist.push_back(key)
					}
				}
			}
		}

		// rebuild from block representatives
		let mut states = vec![State::default(); blocks.len()];
		for (b, members) in blocks.iter().enumerate() {
			let rep = members[0];
			states[b].accept = self.states[rep].accept;
			states[b].transitions = self.states[rep]
				.transitions
				.iter()
				.map(|t| Transition {
					min: t.min,
					max: t.max,
					to: block_of[t.to as usize] as StateId
				})
				.collect()
		}
		self.initial = block_of[self.initial as usize] as StateId;
		self.states = states;
		self.deterministic = true;

		self.reduce();
		self.remove_dead_transitions();
		// canonical form: interval-sorted transitions, BFS numbering
		for s in self.reachable_states() {
			self.states[s as usize].transitions.sort_by_key(|t| t.min)
		}
		self.compact();
		self.clear_hash();

		log::debug!(
			"minimized {} states down to {}",
			before,
			self.states.len()
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn minimization_merges_equivalent_states() {
		// (ab|ac|bb|bc): both first characters lead to equivalent states
		let mut a = Automaton::union(vec![
			Automaton::from_string("ab"),
			Automaton::from_string("ac"),
			Automaton::from_string("bb"),
			Automaton::from_string("bc")
		]);
		a.minimize();
		// [ab][bc] needs an initial state, a middle state and an accept state
		assert_eq!(a.number_of_states(), 3);
		assert!(a.run("ab"));
		assert!(a.run("bc"));
		assert!(!a.run("aa"));
	}

	#[test]
	fn minimization_preserves_the_language() {
		let mut a = Automaton::concatenate(vec![
			Automaton::from_char(b'a' as u16),
			Automaton::from_char(b'b' as u16).star(),
			Automaton::from_char(b'c' as u16)
		]);
		let reference = a.clone();
		a.minimize();
		assert!(a.same_language(&reference));
		assert!(a.is_deterministic());
	}

	#[test]
	fn minimization_is_structurally_idempotent() {
		let mut a = Automaton::union(vec![
			Automaton::from_string("car"),
			Automaton::from_string("cat"),
			Automaton::from_char(b'c' as u16).star()
		]);
		a.minimize();
		let mut again = a.clone();
		again.minimize();
		assert_eq!(a, again);
	}

	#[test]
	fn minimizing_the_empty_language_leaves_one_state() {
		let mut a = Automaton::empty();
		a.minimize();
		assert!(a.is_empty_language());
		assert_eq!(a.number_of_states(), 1);
		assert_eq!(a.hash_code(), 3);
	}

	#[test]
	fn hash_code_is_recomputed_after_minimization() {
		let mut a = Automaton::union(vec![
			Automaton::from_string("x"),
			Automaton::from_string("x")
		]);
		let before = a.hash_code();
		a.minimize();
		// single x-transition into a single accept state
		assert_eq!(a.hash_code(), 3 * 2 + 2 * 1);
		assert!(before != a.hash_code());
	}
}
