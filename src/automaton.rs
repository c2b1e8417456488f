use std::{
	cmp::Reverse,
	collections::{
		BTreeSet,
		HashMap,
		HashSet
	},
	io
};
use once_cell::unsync::OnceCell;
use crate::charset::{
	DisplayCharRange,
	MIN_CHAR,
	MAX_CHAR
};

mod basic;
mod ops;
mod determinize;
mod minimize;
mod dictionary;

pub use dictionary::DictionaryBuilder;

/// Index of a state in the automaton's arena.
///
/// A state's identity is its index: two states are the same state if and
/// only if they have the same index in the same automaton.
pub type StateId = u32;

/// Transition over a closed interval of code units.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
	pub min: u16,
	pub max: u16,
	pub to: StateId
}

impl Transition {
	/// Creates a new transition, normalizing the interval so that `min ≤ max`.
	pub fn new(min: u16, max: u16, to: StateId) -> Transition {
		if max < min {
			Transition { min: max, max: min, to }
		} else {
			Transition { min, max, to }
		}
	}
}

#[derive(Clone, Default, PartialEq, Debug)]
pub(crate) struct State {
	pub(crate) accept: bool,
	pub(crate) transitions: Vec<Transition>
}

/// Finite automaton over code-unit intervals.
///
/// All states live in an arena owned by the automaton; transitions refer
/// to states by index. States that become unreachable after an operation
/// are garbage and are skipped by every traversal.
///
/// The `deterministic` flag is a conservative promise: when it is set, no
/// state has two overlapping outgoing intervals. `false` is always safe.
///
/// An automaton accepting exactly one string may be held in singleton
/// form, as the string itself, with an empty arena; operations expand it
/// on demand.
#[derive(Clone, Debug)]
pub struct Automaton {
	states: Vec<State>,
	initial: StateId,
	deterministic: bool,
	singleton: Option<String>,
	hash: OnceCell<u32>
}

impl Automaton {
	pub(crate) fn with_initial() -> Automaton {
		Automaton {
			states: vec![State::default()],
			initial: 0,
			deterministic: true,
			singleton: None,
			hash: OnceCell::new()
		}
	}

	pub fn initial(&self) -> StateId {
		self.initial
	}

	pub fn is_deterministic(&self) -> bool {
		self.deterministic
	}

	pub fn is_singleton(&self) -> bool {
		self.singleton.is_some()
	}

	/// The accepted string, if this automaton is in singleton form.
	pub fn singleton(&self) -> Option<&str> {
		self.singleton.as_deref()
	}

	pub fn accept(&self, s: StateId) -> bool {
		self.states[s as usize].accept
	}

	pub(crate) fn set_accept(&mut self, s: StateId, accept: bool) {
		self.states[s as usize].accept = accept
	}

	pub fn transitions(&self, s: StateId) -> &[Transition] {
		&self.states[s as usize].transitions
	}

	pub(crate) fn add_state(&mut self) -> StateId {
		let id = self.states.len() as StateId;
		self.states.push(State::default());
		id
	}

	pub(crate) fn add_transition(&mut self, from: StateId, min: u16, max: u16, to: StateId) {
		self.states[from as usize].transitions.push(Transition::new(min, max, to))
	}

	/// Realizes the singleton string as a chain of states.
	pub fn expand_singleton(&mut self) {
		if let Some(string) = self.singleton.take() {
			self.states.clear();
			self.initial = self.add_state();
			let mut p = self.initial;
			for c in string.encode_utf16() {
				let q = self.add_state();
				self.add_transition(p, c, c, q);
				p = q;
			}
			self.states[p as usize].accept = true;
			self.deterministic = true;
		}
	}

	/// The set of states reachable from the initial state, in BFS order.
	pub fn reachable_states(&self) -> Vec<StateId> {
		debug_assert!(self.singleton.is_none(), "singleton automaton must be expanded first");
		let mut visited = vec![false; self.states.len()];
		let mut order = vec![self.initial];
		visited[self.initial as usize] = true;
		let mut i = 0;
		while i < order.len() {
			let s = order[i];
			i += 1;
			for t in &self.states[s as usize].transitions {
				if !visited[t.to as usize] {
					visited[t.to as usize] = true;
					order.push(t.to);
				}
			}
		}
		order
	}

	/// The reachable states that accept.
	pub fn accept_states(&self) -> Vec<StateId> {
		self.reachable_states()
			.into_iter()
			.filter(|&s| self.states[s as usize].accept)
			.collect()
	}

	/// The set of states from which some accept state is reachable.
	pub fn live_states(&self) -> HashSet<StateId> {
		let reachable = self.reachable_states();
		let mut back: HashMap<StateId, Vec<StateId>> = HashMap::new();
		for &s in &reachable {
			for t in &self.states[s as usize].transitions {
				back.entry(t.to).or_insert_with(Vec::new).push(s)
			}
		}

		let mut live: HashSet<StateId> = reachable
			.iter()
			.copied()
			.filter(|&s| self.states[s as usize].accept)
			.collect();
		let mut stack: Vec<StateId> = live.iter().copied().collect();
		while let Some(s) = stack.pop() {
			if let Some(sources) = back.get(&s) {
				for &p in sources {
					if live.insert(p) {
						stack.push(p)
					}
				}
			}
		}
		live
	}

	/// The sorted set of interval boundaries: for every transition
	/// `[min, max]` this contains `min` and `max + 1` (capped), and it
	/// always contains `MIN_CHAR`.
	pub fn start_points(&self) -> Vec<u16> {
		let mut points = BTreeSet::new();
		points.insert(MIN_CHAR);
		for s in self.reachable_states() {
			for t in &self.states[s as usize].transitions {
				points.insert(t.min);
				if t.max < MAX_CHAR {
					points.insert(t.max + 1);
				}
			}
		}
		points.into_iter().collect()
	}

	/// Deterministic lookup: the unique destination for `c`, if any.
	///
	/// On a nondeterministic state this returns the first match.
	pub fn step(&self, s: StateId, c: u16) -> Option<StateId> {
		self.states[s as usize]
			.transitions
			.iter()
			.find(|t| t.min <= c && c <= t.max)
			.map(|t| t.to)
	}

	/// Nondeterministic lookup: appends every destination for `c` to `dest`.
	pub fn step_each(&self, s: StateId, c: u16, dest: &mut Vec<StateId>) {
		for t in &self.states[s as usize].transitions {
			if t.min <= c && c <= t.max {
				dest.push(t.to)
			}
		}
	}

	/// The outgoing transitions of `s`, sorted by `(min, -max, to)`, or by
	/// `(to, min, -max)` when `to_first` is set.
	pub fn sorted_transitions(&self, s: StateId, to_first: bool) -> Vec<Transition> {
		let mut transitions = self.states[s as usize].transitions.clone();
		if to_first {
			transitions.sort_by_key(|t| (t.to, t.min, Reverse(t.max)))
		} else {
			transitions.sort_by_key(|t| (t.min, Reverse(t.max), t.to))
		}
		transitions
	}

	/// Merges the outgoing transitions and the accept bit of `to` into
	/// `from`, absorbing an epsilon transition at the moment of addition.
	pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
		if from == to {
			return;
		}
		let accept = self.states[to as usize].accept;
		let transitions = self.states[to as usize].transitions.clone();
		let state = &mut self.states[from as usize];
		state.transitions.extend(transitions);
		if accept {
			state.accept = true;
		}
	}

	/// Adds the transitive closure of the given epsilon-pair relation: for
	/// every pair `(p, q)` in the closure, `q`'s outgoing transitions and
	/// accept bit are spliced into `p`.
	pub fn add_epsilons(&mut self, pairs: &[(StateId, StateId)]) {
		self.expand_singleton();

		let mut forward: HashMap<StateId, HashSet<StateId>> = HashMap::new();
		let mut back: HashMap<StateId, HashSet<StateId>> = HashMap::new();
		for &(p, q) in pairs {
			forward.entry(p).or_insert_with(HashSet::new).insert(q);
			back.entry(q).or_insert_with(HashSet::new).insert(p);
		}

		let mut closed: Vec<(StateId, StateId)> = pairs.to_vec();
		let mut seen: HashSet<(StateId, StateId)> = closed.iter().copied().collect();
		let mut worklist: Vec<(StateId, StateId)> = closed.clone();
		while let Some((p, q)) = worklist.pop() {
			// chain p -> q -> r
			if let Some(targets) = forward.get(&q).cloned() {
				for r in targets {
					if r != p && seen.insert((p, r)) {
						closed.push((p, r));
						forward.entry(p).or_insert_with(HashSet::new).insert(r);
						back.entry(r).or_insert_with(HashSet::new).insert(p);
						worklist.push((p, r));
					}
				}
			}
			// chain o -> p -> q
			if let Some(sources) = back.get(&p).cloned() {
				for o in sources {
					if o != q && seen.insert((o, q)) {
						closed.push((o, q));
						forward.entry(o).or_insert_with(HashSet::new).insert(q);
						back.entry(q).or_insert_with(HashSet::new).insert(o);
						worklist.push((o, q));
					}
				}
			}
		}

		for (p, q) in closed {
			self.add_epsilon(p, q)
		}
		self.deterministic = false;
		self.clear_hash();
	}

	/// Appends a copy of `other`'s arena, shifting its state indices, and
	/// returns the new index of `other`'s initial state.
	pub(crate) fn splice(&mut self, other: &Automaton) -> StateId {
		debug_assert!(other.singleton.is_none(), "singleton automaton must be expanded first");
		let offset = self.states.len() as StateId;
		for state in &other.states {
			let transitions = state
				.transitions
				.iter()
				.map(|t| Transition {
					min: t.min,
					max: t.max,
					to: t.to + offset
				})
				.collect();
			self.states.push(State {
				accept: state.accept,
				transitions
			})
		}
		other.initial + offset
	}

	/// Adds a trap state with a self-loop over the whole alphabet and
	/// transitions into it over every gap, so that every state has total
	/// interval coverage.
	pub fn totalize(&mut self) {
		self.expand_singleton();
		let reachable = self.reachable_states();
		let trap = self.add_state();
		self.add_transition(trap, MIN_CHAR, MAX_CHAR, trap);
		for s in reachable {
			let mut next = MIN_CHAR as u32;
			for t in self.sorted_transitions(s, false) {
				if t.min as u32 > next {
					self.add_transition(s, next as u16, t.min - 1, trap)
				}
				if t.max as u32 + 1 > next {
					next = t.max as u32 + 1
				}
			}
			if next <= MAX_CHAR as u32 {
				self.add_transition(s, next as u16, MAX_CHAR, trap)
			}
		}
		self.clear_hash();
	}

	/// Coalesces adjacent and overlapping intervals with the same
	/// destination. Afterwards no two transitions out of a state share a
	/// destination and touch.
	pub fn reduce(&mut self) {
		if self.singleton.is_some() {
			return;
		}
		for s in self.reachable_states() {
			let sorted = self.sorted_transitions(s, true);
			let state = &mut self.states[s as usize];
			state.transitions.clear();
			let mut current: Option<Transition> = None;
			for t in sorted {
				match current {
					Some(c) if c.to == t.to && t.min as u32 <= c.max as u32 + 1 => {
						if t.max > c.max {
							current = Some(Transition { max: t.max, ..c })
						}
					}
					Some(c) => {
						state.transitions.push(c);
						current = Some(t)
					}
					None => current = Some(t)
				}
			}
			if let Some(c) = current {
				state.transitions.push(c)
			}
		}
		self.clear_hash();
	}

	/// Deletes transitions whose target cannot reach an accept state,
	/// then reduces.
	pub fn remove_dead_transitions(&mut self) {
		self.clear_hash();
		if self.singleton.is_some() {
			return;
		}
		let live = self.live_states();
		for s in self.reachable_states() {
			self.states[s as usize]
				.transitions
				.retain(|t| live.contains(&t.to))
		}
		self.reduce();
	}

	/// Rebuilds the arena with only the reachable states, renumbered in
	/// BFS order from the initial state.
	pub(crate) fn compact(&mut self) {
		if self.singleton.is_some() {
			return;
		}
		let order = self.reachable_states();
		let mut map = vec![0 as StateId; self.states.len()];
		for (i, &s) in order.iter().enumerate() {
			map[s as usize] = i as StateId
		}
		let mut states = Vec::with_capacity(order.len());
		for &s in &order {
			let old = &self.states[s as usize];
			let transitions = old
				.transitions
				.iter()
				.map(|t| Transition {
					min: t.min,
					max: t.max,
					to: map[t.to as usize]
				})
				.collect();
			states.push(State {
				accept: old.accept,
				transitions
			})
		}
		self.states = states;
		self.initial = 0;
	}

	/// Number of reachable states.
	pub fn number_of_states(&self) -> usize {
		match &self.singleton {
			Some(s) => s.encode_utf16().count() + 1,
			None => self.reachable_states().len()
		}
	}

	/// Number of transitions between reachable states.
	pub fn number_of_transitions(&self) -> usize {
		match &self.singleton {
			Some(s) => s.encode_utf16().count(),
			None => self
				.reachable_states()
				.iter()
				.map(|&s| self.states[s as usize].transitions.len())
				.sum()
		}
	}

	/// The cached structural hash code, `3·states + 2·transitions`,
	/// forced nonzero. Recomputed lazily after structural changes.
	pub fn hash_code(&self) -> u32 {
		*self.hash.get_or_init(|| {
			let h = 3 * self.number_of_states() as u32 + 2 * self.number_of_transitions() as u32;
			if h == 0 {
				1
			} else {
				h
			}
		})
	}

	pub(crate) fn clear_hash(&mut self) {
		self.hash = OnceCell::new()
	}

	/// Writes the automaton in graphviz dot format.
	pub fn write_dot<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
		if self.singleton.is_some() {
			let mut expanded = self.clone();
			expanded.expand_singleton();
			return expanded.write_dot(out);
		}

		write!(out, "digraph automaton {{\n")?;
		write!(out, "\trankdir = LR;\n")?;
		write!(out, "\tinitial [shape = plaintext, label = \"\"];\n")?;
		write!(out, "\tinitial -> q{};\n", self.initial)?;
		for s in self.reachable_states() {
			let shape = if self.states[s as usize].accept {
				"doublecircle"
			} else {
				"circle"
			};
			write!(out, "\tq{} [shape = {}];\n", s, shape)?;
			for t in self.sorted_transitions(s, false) {
				write!(
					out,
					"\tq{} -> q{} [label = \"{}\"];\n",
					s,
					t.to,
					DisplayCharRange(t.min, t.max)
				)?
			}
		}
		write!(out, "}}\n")
	}
}

impl PartialEq for Automaton {
	fn eq(&self, other: &Automaton) -> bool {
		self.singleton == other.singleton
			&& self.initial == other.initial
			&& self.deterministic == other.deterministic
			&& self.states == other.states
	}
}
