use std::collections::HashMap;
use super::{
	Automaton,
	StateId
};

#[derive(Clone, Default)]
struct Node {
	accept: bool,
	labels: Vec<u16>,
	children: Vec<u32>
}

/// Interning key for a sub-trie: finality, outgoing labels, and child
/// identities (arena indices). Children are interned post-order, so
/// comparing indices is comparing sub-languages.
#[derive(PartialEq, Eq, Hash)]
struct NodeKey {
	accept: bool,
	labels: Vec<u16>,
	children: Vec<u32>
}

/// Incremental builder of a minimal acyclic automaton from a
/// lexicographically sorted sequence of words.
pub struct DictionaryBuilder {
	nodes: Vec<Node>,
	register: HashMap<NodeKey, u32>,
	previous: Option<Vec<u16>>
}

impl DictionaryBuilder {
	pub fn new() -> DictionaryBuilder {
		DictionaryBuilder {
			nodes: vec![Node::default()],
			register: HashMap::new(),
			previous: None
		}
	}

	/// Adds a word. Words must arrive in lexicographic order of their
	/// UTF-16 code units; anything else is a programming error.
	pub fn add(&mut self, word: &str) {
		let units: Vec<u16> = word.encode_utf16().collect();
		if let Some(previous) = &self.previous {
			assert!(
				previous <= &units,
				"words must be added in lexicographic order"
			);
		}

		// walk down the last-child path as far as it matches: sorted
		// input guarantees new suffixes only ever attach there
		let mut state = 0u32;
		let mut pos = 0;
		while pos < units.len() {
			match self.last_child(state, units[pos]) {
				Some(next) => {
					state = next;
					pos += 1
				}
				None => break
			}
		}

		if !self.nodes[state as usize].children.is_empty() {
			self.replace_or_register(state)
		}
		self.add_suffix(state, &units[pos..]);
		self.previous = Some(units)
	}

	fn last_child(&self, state: u32, label: u16) -> Option<u32> {
		let node = &self.nodes[state as usize];
		match (node.labels.last(), node.children.last()) {
			(Some(&l), Some(&c)) if l == label => Some(c),
			_ => None
		}
	}

	/// Interns the diverged tail below `state`'s last child: replaces it
	/// with a registered equivalent when one exists, registers it
	/// otherwise.
	fn replace_or_register(&mut self, state: u32) {
		let child = *self.nodes[state as usize].children.last().unwrap();
		if !self.nodes[child as usize].children.is_empty() {
			self.replace_or_register(child)
		}
		let key = self.key(child);
		match self.register.get(&key).copied() {
			Some(registered) => {
				*self.nodes[state as usize].children.last_mut().unwrap() = registered
			}
			None => {
				self.register.insert(key, child);
			}
		}
	}

	fn key(&self, state: u32) -> NodeKey {
		let node = &self.nodes[state as usize];
		NodeKey {
			accept: node.accept,
			labels: node.labels.clone(),
			children: node.children.clone()
		}
	}

	fn add_suffix(&mut self, state: u32, suffix: &[u16]) {
		let mut state = state;
		for &c in suffix {
			let next = self.nodes.len() as u32;
			self.nodes.push(Node::default());
			let node = &mut self.nodes[state as usize];
			node.labels.push(c);
			node.children.push(next);
			state = next
		}
		self.nodes[state as usize].accept = true
	}

	/// Finishes construction and converts the trie nodes into the
	/// general automaton form. Consuming the builder makes adding after
	/// completion unrepresentable.
	pub fn build(mut self) -> Automaton {
		if !self.nodes[0].children.is_empty() {
			self.replace_or_register(0)
		}

		let mut a = Automaton::with_initial();
		let mut map: HashMap<u32, StateId> = HashMap::new();
		map.insert(0, a.initial());
		let mut stack = vec![0u32];
		while let Some(n) = stack.pop() {
			let s = map[&n];
			let node = self.nodes[n as usize].clone();
			a.set_accept(s, node.accept);
			for (i, &label) in node.labels.iter().enumerate() {
				let child = node.children[i];
				let cs = match map.get(&child) {
					Some(&cs) => cs,
					None => {
						let cs = a.add_state();
						map.insert(child, cs);
						stack.push(child);
						cs
					}
				};
				a.add_transition(s, label, label, cs)
			}
		}
		a.reduce();
		a
	}
}

impl Automaton {
	/// The minimal automaton accepting exactly the given words, which
	/// must be lexicographically sorted.
	pub fn string_union<'a, I: IntoIterator<Item = &'a str>>(words: I) -> Automaton {
		let mut builder = DictionaryBuilder::new();
		for word in words {
			builder.add(word)
		}
		builder.build()
	}
}
