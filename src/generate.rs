use std::fmt;
use rand::{
	rngs::ThreadRng,
	Rng
};
use source_span::Loc;
use crate::automaton::Automaton;
use crate::regexp::{
	self,
	RegExp,
	Syntax
};

pub enum Error {
	/// The pattern was empty.
	EmptyPattern,
	/// The pattern accepts no string, so there is nothing to generate.
	EmptyLanguage,
	/// The pattern did not parse.
	Syntax(Loc<regexp::Error>)
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			EmptyPattern => write!(f, "empty pattern"),
			EmptyLanguage => write!(f, "the pattern accepts no string"),
			Syntax(e) => e.fmt(f)
		}
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl From<Loc<regexp::Error>> for Error {
	fn from(e: Loc<regexp::Error>) -> Error {
		Error::Syntax(e)
	}
}

/// Random matching-string generator: a stochastic walk over the
/// automaton compiled from a pattern.
///
/// The pattern is compiled eagerly at construction; each call to
/// [`generate`](Xeger::generate) produces one new sample. The
/// distribution is uniform over the options of each visited state, not
/// over the language.
pub struct Xeger<R: Rng> {
	automaton: Automaton,
	rng: R
}

impl Xeger<ThreadRng> {
	/// Compiles `pattern`, sampling from the thread-local random source.
	pub fn new(pattern: &str) -> Result<Xeger<ThreadRng>, Error> {
		Xeger::with_rng(pattern, rand::thread_rng())
	}
}

impl<R: Rng> Xeger<R> {
	/// Compiles `pattern`, sampling from `rng`. Generators sharing one
	/// random source should share it by constructing from references or
	/// distinct seeds; the source is not re-seeded here.
	pub fn with_rng(pattern: &str, rng: R) -> Result<Xeger<R>, Error> {
		if pattern.is_empty() {
			return Err(Error::EmptyPattern);
		}

		// anchors are not interpreted; strip them at the boundary
		let mut pattern = pattern;
		if pattern.starts_with('^') {
			pattern = &pattern[1..];
		}
		if pattern.ends_with('$') {
			pattern = &pattern[..pattern.len() - 1];
		}

		let syntax = Syntax::all().without(Syntax::ANYSTRING);
		let regexp = RegExp::with_syntax(pattern, syntax)?;
		let mut automaton = regexp.to_automaton();
		automaton.minimize();
		automaton.expand_singleton();
		automaton.remove_dead_transitions();
		if automaton.is_empty_language() {
			return Err(Error::EmptyLanguage);
		}

		Ok(Xeger { automaton, rng })
	}

	/// The compiled automaton the walk runs over.
	pub fn automaton(&self) -> &Automaton {
		&self.automaton
	}

	/// Generates one string accepted by the pattern.
	pub fn generate(&mut self) -> String {
		let mut out = String::new();
		let mut state = self.automaton.initial();
		loop {
			let transitions = self.automaton.sorted_transitions(state, true);
			let accept = self.automaton.accept(state);
			if transitions.is_empty() {
				// live-state pruning guarantees acceptance here
				assert!(accept, "generation reached a non-accepting sink");
				return out;
			}

			// under acceptance, option 0 is "stop" and the valid indices
			// run up to transitions.len() inclusive
			let options = if accept {
				transitions.len()
			} else {
				transitions.len() - 1
			};
			let choice = self.rng.gen_range(0..=options);
			if accept && choice == 0 {
				return out;
			}
			let t = &transitions[if accept { choice - 1 } else { choice }];
			let c = self.sample(t.min, t.max);
			out.push(c);
			state = t.to;
		}
	}

	/// A uniform code unit from `[min, max]`, deflected off the
	/// surrogate block.
	fn sample(&mut self, min: u16, max: u16) -> char {
		let c = self.rng.gen_range(min..=max);
		let c = if c >= 0xD800 && c <= 0xDFFF {
			if max > 0xDFFF {
				self.rng.gen_range(0xE000..=max)
			} else if min < 0xD800 {
				self.rng.gen_range(min..=0xD7FF)
			} else {
				0xFFFD
			}
		} else {
			c
		};
		std::char::from_u32(c as u32).unwrap()
	}
}
