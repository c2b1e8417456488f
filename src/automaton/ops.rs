use std::collections::{
	HashMap,
	HashSet
};
use super::{
	Automaton,
	StateId
};

impl Automaton {
	/// Whether this automaton accepts no string at all.
	pub fn is_empty_language(&self) -> bool {
		if self.singleton.is_some() {
			return false;
		}
		let initial = &self.states[self.initial as usize];
		!initial.accept && initial.transitions.is_empty()
	}

	/// Whether this automaton accepts exactly the empty string.
	pub fn is_empty_string(&self) -> bool {
		match &self.singleton {
			Some(s) => s.is_empty(),
			None => {
				let initial = &self.states[self.initial as usize];
				initial.accept && initial.transitions.is_empty()
			}
		}
	}

	/// Whether this automaton accepts `input`.
	pub fn run(&self, input: &str) -> bool {
		if let Some(s) = &self.singleton {
			return s == input;
		}
		if self.deterministic {
			let mut p = self.initial;
			for c in input.encode_utf16() {
				match self.step(p, c) {
					Some(q) => p = q,
					None => return false
				}
			}
			self.states[p as usize].accept
		} else {
			let mut current = vec![self.initial];
			let mut next = Vec::new();
			let mut marked = vec![false; self.states.len()];
			for c in input.encode_utf16() {
				next.clear();
				for m in marked.iter_mut() {
					*m = false
				}
				for &p in &current {
					for t in &self.states[p as usize].transitions {
						if t.min <= c && c <= t.max && !marked[t.to as usize] {
							marked[t.to as usize] = true;
							next.push(t.to)
						}
					}
				}
				std::mem::swap(&mut current, &mut next);
				if current.is_empty() {
					return false;
				}
			}
			current.iter().any(|&p| self.states[p as usize].accept)
		}
	}

	/// Concatenates the given automata left to right. Adjacent singleton
	/// operands fuse into a longer singleton.
	pub fn concatenate(list: Vec<Automaton>) -> Automaton {
		let mut operands: Vec<Automaton> = Vec::new();
		for a in list {
			let fused = match (operands.last_mut(), &a.singleton) {
				(Some(prev), Some(s)) if prev.singleton.is_some() => {
					prev.singleton.as_mut().unwrap().push_str(s);
					prev.clear_hash();
					true
				}
				_ => false
			};
			if !fused {
				operands.push(a)
			}
		}

		if operands.is_empty() {
			return Automaton::empty_string();
		}
		if operands.iter().any(Automaton::is_empty_language) {
			return Automaton::empty();
		}
		if operands.len() == 1 {
			return operands.pop().unwrap();
		}

		let mut iter = operands.into_iter();
		let mut result = iter.next().unwrap();
		result.expand_singleton();
		for mut a in iter {
			if a.is_empty_string() {
				continue;
			}
			a.expand_singleton();
			let accepts = result.accept_states();
			let init = result.splice(&a);
			for p in accepts {
				result.set_accept(p, false);
				result.add_epsilon(p, init)
			}
		}
		result.deterministic = false;
		result.clear_hash();
		result
	}

	pub fn concat(self, other: Automaton) -> Automaton {
		Automaton::concatenate(vec![self, other])
	}

	/// The union of the given automata. Empty-language operands are
	/// dropped.
	pub fn union(list: Vec<Automaton>) -> Automaton {
		let mut operands: Vec<Automaton> = list
			.into_iter()
			.filter(|a| !a.is_empty_language())
			.collect();
		if operands.is_empty() {
			return Automaton::empty();
		}
		if operands.len() == 1 {
			return operands.pop().unwrap();
		}

		let mut result = Automaton::with_initial();
		let initial = result.initial;
		for mut a in operands {
			a.expand_singleton();
			let init = result.splice(&a);
			result.add_epsilon(initial, init)
		}
		result.deterministic = false;
		result.clear_hash();
		result
	}

	/// Product construction over the two automata, sweeping the sorted
	/// transition lists of each state pair for overlapping intervals.
	pub fn intersection(&self, other: &Automaton) -> Automaton {
		if let Some(s) = &self.singleton {
			return if other.run(s) {
				self.clone()
			} else {
				Automaton::empty()
			};
		}
		if let Some(s) = &other.singleton {
			return if self.run(s) {
				other.clone()
			} else {
				Automaton::empty()
			};
		}
		if self.is_empty_language() || other.is_empty_language() {
			return Automaton::empty();
		}

		let mut c = Automaton::with_initial();
		let mut product: HashMap<(StateId, StateId), StateId> = HashMap::new();
		let mut worklist = vec![(c.initial, self.initial, other.initial)];
		product.insert((self.initial, other.initial), c.initial);
		while let Some((s, p1, p2)) = worklist.pop() {
			c.set_accept(s, self.accept(p1) && other.accept(p2));
			let t1 = self.sorted_transitions(p1, false);
			let t2 = other.sorted_transitions(p2, false);
			let mut b2 = 0;
			for t in &t1 {
				while b2 < t2.len() && t2[b2].max < t.min {
					b2 += 1
				}
				let mut n2 = b2;
				while n2 < t2.len() && t.max >= t2[n2].min {
					if t2[n2].max >= t.min {
						let key = (t.to, t2[n2].to);
						let r = match product.get(&key) {
							Some(&r) => r,
							None => {
								let r = c.add_state();
								product.insert(key, r);
								worklist.push((r, key.0, key.1));
								r
							}
						};
						let min = t.min.max(t2[n2].min);
						let max = t.max.min(t2[n2].max);
						c.add_transition(s, min, max, r)
					}
					n2 += 1
				}
			}
		}
		c.deterministic = self.deterministic && other.deterministic;
		c.remove_dead_transitions();
		c
	}

	/// The complement language: determinize, totalize, flip acceptance,
	/// prune dead transitions. The result is deterministic.
	pub fn complement(mut self) -> Automaton {
		self.expand_singleton();
		self.determinize();
		self.totalize();
		for s in self.reachable_states() {
			let accept = self.states[s as usize].accept;
			self.states[s as usize].accept = !accept
		}
		self.remove_dead_transitions();
		self
	}

	/// The language plus the empty string.
	pub fn optional(mut self) -> Automaton {
		self.expand_singleton();
		let old_initial = self.initial;
		let s = self.add_state();
		self.set_accept(s, true);
		self.add_epsilon(s, old_initial);
		self.initial = s;
		self.deterministic = false;
		self.clear_hash();
		self
	}

	/// Kleene star.
	pub fn star(mut self) -> Automaton {
		self.expand_singleton();
		let accepts = self.accept_states();
		let old_initial = self.initial;
		let s = self.add_state();
		self.set_accept(s, true);
		self.add_epsilon(s, old_initial);
		for p in accepts {
			self.add_epsilon(p, s)
		}
		self.initial = s;
		self.deterministic = false;
		self.clear_hash();
		self
	}

	/// At least `min` repetitions.
	pub fn repeat_min(self, min: u32) -> Automaton {
		let mut list = Vec::with_capacity(min as usize + 1);
		for _ in 0..min {
			list.push(self.clone())
		}
		list.push(self.star());
		Automaton::concatenate(list)
	}

	/// Between `min` and `max` repetitions. When `min > max` this is the
	/// empty language; `repeat_range(a, 0, m)` accepts the empty string.
	pub fn repeat_range(mut self, min: u32, max: u32) -> Automaton {
		if min > max {
			return Automaton::empty();
		}
		let count = max - min;
		self.expand_singleton();
		let mut b = match min {
			0 => Automaton::empty_string(),
			1 => self.clone(),
			_ => Automaton::concatenate(vec![self.clone(); min as usize])
		};
		if count > 0 {
			// linear chain of optional copies, every link accepting
			let mut d = self.clone();
			for _ in 1..count {
				let mut c = self.clone();
				let accepts = c.accept_states();
				let init = c.splice(&d);
				for p in accepts {
					c.add_epsilon(p, init)
				}
				d = c
			}
			b.expand_singleton();
			let accepts = b.accept_states();
			let init = b.splice(&d);
			for p in accepts {
				b.add_epsilon(p, init)
			}
			b.deterministic = false;
			b.clear_hash();
		}
		b
	}

	/// Whether this automaton's language is contained in `other`'s.
	pub fn subset_of(&self, other: &Automaton) -> bool {
		if let Some(s) = &self.singleton {
			return match &other.singleton {
				Some(t) => s == t,
				None => other.run(s)
			};
		}

		let determinized;
		let other = if other.singleton.is_none() && other.deterministic {
			other
		} else {
			let mut o = other.clone();
			o.expand_singleton();
			o.determinize();
			determinized = o;
			&determinized
		};

		let mut visited: HashSet<(StateId, StateId)> = HashSet::new();
		let mut worklist = vec![(self.initial, other.initial)];
		visited.insert((self.initial, other.initial));
		while let Some((p1, p2)) = worklist.pop() {
			if self.accept(p1) && !other.accept(p2) {
				return false;
			}
			let t1 = self.sorted_transitions(p1, false);
			let t2 = other.sorted_transitions(p2, false);
			let mut b2 = 0;
			for t in &t1 {
				while b2 < t2.len() && t2[b2].max < t.min {
					b2 += 1
				}
				// check that [t.min, t.max] is fully covered by `other`
				let mut min1 = t.min as u32;
				let max1 = t.max as u32;
				let mut n2 = b2;
				while n2 < t2.len() && t.max >= t2[n2].min {
					if t2[n2].min as u32 > min1 {
						return false;
					}
					min1 = t2[n2].max as u32 + 1;
					let q = (t.to, t2[n2].to);
					if visited.insert(q) {
						worklist.push(q)
					}
					n2 += 1
				}
				if min1 <= max1 {
					return false;
				}
			}
		}
		true
	}

	/// Whether the two automata accept the same language.
	pub fn same_language(&self, other: &Automaton) -> bool {
		self.subset_of(other) && other.subset_of(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ab_star_c() -> Automaton {
		// ab*c
		Automaton::concatenate(vec![
			Automaton::from_char(b'a' as u16),
			Automaton::from_char(b'b' as u16).star(),
			Automaton::from_char(b'c' as u16)
		])
	}

	#[test]
	fn concatenation_with_star() {
		let a = ab_star_c();
		assert!(a.run("ac"));
		assert!(a.run("abc"));
		assert!(a.run("abbbbc"));
		assert!(!a.run("ab"));
		assert!(!a.run("c"));
		assert!(!a.run(""));
	}

	#[test]
	fn singletons_fuse_in_concatenation() {
		let a = Automaton::concatenate(vec![
			Automaton::from_string("foo"),
			Automaton::from_string("bar")
		]);
		assert_eq!(a.singleton(), Some("foobar"));
		assert!(a.run("foobar"));
	}

	#[test]
	fn union_with_itself_is_identity() {
		let a = ab_star_c();
		let u = Automaton::union(vec![a.clone(), a.clone()]);
		assert!(u.same_language(&a));
	}

	#[test]
	fn union_drops_empty_operands() {
		let a = Automaton::union(vec![Automaton::empty(), Automaton::from_string("x")]);
		assert!(a.run("x"));
		assert!(!a.run(""));
	}

	#[test]
	fn intersection_with_complement_is_empty() {
		let a = ab_star_c();
		let c = a.clone().complement();
		let mut i = a.intersection(&c);
		i.minimize();
		assert!(i.is_empty_language());
	}

	#[test]
	fn complement_flips_membership() {
		let c = ab_star_c().complement();
		assert!(!c.run("abc"));
		assert!(!c.run("ac"));
		assert!(c.run("ab"));
		assert!(c.run(""));
		assert!(c.run("zzz"));
	}

	#[test]
	fn empty_string_is_a_concatenation_identity() {
		let a = ab_star_c();
		let left = Automaton::concatenate(vec![Automaton::empty_string(), a.clone()]);
		let right = Automaton::concatenate(vec![a.clone(), Automaton::empty_string()]);
		assert!(left.same_language(&a));
		assert!(right.same_language(&a));
	}

	#[test]
	fn repeat_zero_equals_star() {
		let a = Automaton::from_char(b'x' as u16);
		let star = a.clone().star();
		let repeated = a.repeat_min(0);
		assert!(repeated.same_language(&star));
	}

	#[test]
	fn repeat_once_is_identity() {
		let a = ab_star_c();
		let once = a.clone().repeat_range(1, 1);
		assert!(once.same_language(&a));
	}

	#[test]
	fn bounded_repeat_window() {
		let a = Automaton::from_char(b'a' as u16).repeat_range(3, 5);
		assert!(!a.run("aa"));
		assert!(a.run("aaa"));
		assert!(a.run("aaaa"));
		assert!(a.run("aaaaa"));
		assert!(!a.run("aaaaaa"));
	}

	#[test]
	fn zero_to_max_repeat_accepts_the_empty_string() {
		let a = Automaton::from_char(b'a' as u16).repeat_range(0, 2);
		assert!(a.run(""));
		assert!(a.run("a"));
		assert!(a.run("aa"));
		assert!(!a.run("aaa"));
	}

	#[test]
	fn inverted_repeat_bounds_are_empty() {
		let a = Automaton::from_char(b'a' as u16).repeat_range(3, 1);
		assert!(a.is_empty_language());
	}

	#[test]
	fn optional_accepts_the_empty_string() {
		let a = Automaton::from_string("hm").optional();
		assert!(a.run(""));
		assert!(a.run("hm"));
		assert!(!a.run("h"));
	}

	#[test]
	fn nondeterministic_run_uses_frontier_sets() {
		// (a|ab)(c|bc): nondeterministic by construction
		let a = Automaton::union(vec![
			Automaton::from_string("a"),
			Automaton::from_string("ab")
		]);
		let b = Automaton::union(vec![
			Automaton::from_string("c"),
			Automaton::from_string("bc")
		]);
		let ab = a.concat(b);
		assert!(!ab.is_deterministic());
		assert!(ab.run("abc"));
		assert!(ab.run("abbc"));
		assert!(ab.run("ac"));
		assert!(!ab.run("a"));
		assert!(!ab.run("bc"));
	}

	#[test]
	fn subset_and_equivalence() {
		let abc = Automaton::from_string("abc");
		let a = ab_star_c();
		assert!(abc.subset_of(&a));
		assert!(!a.subset_of(&abc));
		assert!(a.same_language(&a));
	}
}
