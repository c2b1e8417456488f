use once_cell::unsync::OnceCell;
use crate::charset::{
	CharSet,
	MIN_CHAR,
	MAX_CHAR,
	range_start,
	range_end
};
use super::{
	Automaton,
	StateId
};

impl Automaton {
	/// The empty language.
	pub fn empty() -> Automaton {
		Automaton::with_initial()
	}

	/// The language containing only the empty string.
	pub fn empty_string() -> Automaton {
		Automaton::from_string("")
	}

	/// The language containing exactly `string`, in singleton form.
	pub fn from_string(string: &str) -> Automaton {
		Automaton {
			states: Vec::new(),
			initial: 0,
			deterministic: true,
			singleton: Some(string.to_string()),
			hash: OnceCell::new()
		}
	}

	/// The language of the single code unit `c`.
	pub fn from_char(c: u16) -> Automaton {
		Automaton::char_range(c, c)
	}

	/// The language of all single code units in `[min, max]`. An inverted
	/// interval denotes the empty language.
	pub fn char_range(min: u16, max: u16) -> Automaton {
		if min > max {
			return Automaton::empty();
		}
		let mut a = Automaton::with_initial();
		let end = a.add_state();
		a.set_accept(end, true);
		a.add_transition(a.initial, min, max, end);
		a
	}

	/// The language of all single code units in `set`.
	pub fn from_charset(set: &CharSet) -> Automaton {
		if set.is_empty() {
			return Automaton::empty();
		}
		let mut a = Automaton::with_initial();
		let end = a.add_state();
		a.set_accept(end, true);
		for range in set.ranges() {
			a.add_transition(a.initial, range_start(range), range_end(range), end)
		}
		a
	}

	/// The language of all single code units.
	pub fn any_char() -> Automaton {
		Automaton::char_range(MIN_CHAR, MAX_CHAR)
	}

	/// The language of all strings.
	pub fn any_string() -> Automaton {
		let mut a = Automaton::with_initial();
		a.set_accept(a.initial, true);
		a.add_transition(a.initial, MIN_CHAR, MAX_CHAR, a.initial);
		a
	}

	/// The language of decimal representations of the integers in
	/// `[min, max]`. With `digits > 0` every string has exactly `digits`
	/// characters, zero-padded as needed; with `digits == 0` any number
	/// of leading zeros is admitted.
	///
	/// Panics if `min > max` or if `max` does not fit in `digits` digits.
	pub fn interval(min: u32, max: u32, digits: usize) -> Automaton {
		assert!(min <= max, "inverted interval");
		let x = min.to_string();
		let y = max.to_string();
		assert!(
			digits == 0 || y.len() <= digits,
			"interval endpoint does not fit in {} digits",
			digits
		);
		let width = if digits > 0 { digits } else { y.len() };
		let x = format!("{:0>width$}", x, width = width).into_bytes();
		let y = format!("{:0>width$}", y, width = width).into_bytes();

		let mut a = Automaton {
			states: Vec::new(),
			initial: 0,
			deterministic: digits > 0,
			singleton: None,
			hash: OnceCell::new()
		};
		let mut initials = Vec::new();
		a.initial = between(&mut a, &x, &y, 0, &mut initials, digits == 0);
		if digits == 0 {
			let initial = a.initial;
			let pairs: Vec<(StateId, StateId)> = initials
				.into_iter()
				.filter(|&p| p != initial)
				.map(|p| (initial, p))
				.collect();
			a.add_epsilons(&pairs);
			a.add_transition(initial, b'0' as u16, b'0' as u16, initial);
		}
		a
	}
}

fn digit(c: u8) -> u16 {
	c as u16
}

/// State accepting any digit string of the remaining length.
fn any_of_right_length(a: &mut Automaton, x: &[u8], n: usize) -> StateId {
	let s = a.add_state();
	if x.len() == n {
		a.set_accept(s, true)
	} else {
		let next = any_of_right_length(a, x, n + 1);
		a.add_transition(s, b'0' as u16, b'9' as u16, next)
	}
	s
}

/// State accepting digit strings of the remaining length that are
/// lexicographically at least the remainder of `x`.
fn at_least(a: &mut Automaton, x: &[u8], n: usize, initials: &mut Vec<StateId>, zeros: bool) -> StateId {
	let s = a.add_state();
	if x.len() == n {
		a.set_accept(s, true)
	} else {
		if zeros {
			initials.push(s)
		}
		let c = x[n];
		let next = at_least(a, x, n + 1, initials, zeros && c == b'0');
		a.add_transition(s, digit(c), digit(c), next);
		if c < b'9' {
			let rest = any_of_right_length(a, x, n + 1);
			a.add_transition(s, digit(c) + 1, b'9' as u16, rest)
		}
	}
	s
}

/// State accepting digit strings of the remaining length that are
/// lexicographically at most the remainder of `x`.
fn at_most(a: &mut Automaton, x: &[u8], n: usize) -> StateId {
	let s = a.add_state();
	if x.len() == n {
		a.set_accept(s, true)
	} else {
		let c = x[n];
		let next = at_most(a, x, n + 1);
		a.add_transition(s, digit(c), digit(c), next);
		if c > b'0' {
			let rest = any_of_right_length(a, x, n + 1);
			a.add_transition(s, b'0' as u16, digit(c) - 1, rest)
		}
	}
	s
}

/// State accepting digit strings of the remaining length between the
/// remainders of `x` and `y`.
fn between(
	a: &mut Automaton,
	x: &[u8],
	y: &[u8],
	n: usize,
	initials: &mut Vec<StateId>,
	zeros: bool
) -> StateId {
	let s = a.add_state();
	if x.len() == n {
		a.set_accept(s, true)
	} else {
		if zeros {
			initials.push(s)
		}
		let cx = x[n];
		let cy = y[n];
		if cx == cy {
			let next = between(a, x, y, n + 1, initials, zeros && cx == b'0');
			a.add_transition(s, digit(cx), digit(cx), next)
		} else {
			let low = at_least(a, x, n + 1, initials, zeros && cx == b'0');
			a.add_transition(s, digit(cx), digit(cx), low);
			let high = at_most(a, y, n + 1);
			a.add_transition(s, digit(cy), digit(cy), high);
			if cx + 1 < cy {
				let middle = any_of_right_length(a, x, n + 1);
				a.add_transition(s, digit(cx) + 1, digit(cy) - 1, middle)
			}
		}
	}
	s
}
