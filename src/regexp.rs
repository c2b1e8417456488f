use std::collections::HashMap;
use std::fmt;
use itertools::Itertools;
use crate::automaton::Automaton;
use crate::charset::{
	CharSet,
	DisplayCodeUnit,
	DisplayString,
	MIN_PRINTABLE,
	MAX_PRINTABLE
};

mod error;
pub mod parser;

pub use error::{
	Error,
	Result
};
use parser::Parser;

/// Syntax options of the extended regular-expression grammar, as a bit
/// set. `false` for a flag disables the construct, letting its operator
/// character parse as a literal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Syntax(u8);

impl Syntax {
	/// The `&` intersection operator.
	pub const INTERSECTION: Syntax = Syntax(0x01);

	/// The `~` complement operator.
	pub const COMPLEMENT: Syntax = Syntax(0x02);

	/// The `#` empty-language constant.
	pub const EMPTY: Syntax = Syntax(0x04);

	/// The `@` any-string constant.
	pub const ANYSTRING: Syntax = Syntax(0x08);

	/// Named automata, `<name>`.
	pub const AUTOMATON: Syntax = Syntax(0x10);

	/// Integer intervals, `<min-max>`.
	pub const INTERVAL: Syntax = Syntax(0x20);

	pub fn all() -> Syntax {
		Syntax(0x3f)
	}

	pub fn none() -> Syntax {
		Syntax(0)
	}

	pub fn with(self, other: Syntax) -> Syntax {
		Syntax(self.0 | other.0)
	}

	pub fn without(self, other: Syntax) -> Syntax {
		Syntax(self.0 & !other.0)
	}

	pub fn allows(self, other: Syntax) -> bool {
		self.0 & other.0 != 0
	}
}

impl Default for Syntax {
	fn default() -> Syntax {
		Syntax::all()
	}
}

/// Source of named automata for `<name>` references, consulted after the
/// registry map.
pub trait AutomatonProvider {
	fn get_automaton(&self, name: &str) -> Option<Automaton>;
}

/// Parse tree of a regular expression.
#[derive(Debug)]
pub enum Node {
	Union(Vec<Node>),
	Concat(Vec<Node>),
	Intersection(Box<Node>, Box<Node>),
	Optional(Box<Node>),
	Star(Box<Node>),
	RepeatMin(Box<Node>, u32),
	RepeatMinMax(Box<Node>, u32, u32),
	Complement(Box<Node>),
	Char(u16),
	Class(CharSet),
	AnyChar,
	Empty,
	Literal(String),
	AnyString,
	Automaton(String, Box<Automaton>),
	Interval(u32, u32, usize)
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Node::Union(list) => write!(f, "({})", list.iter().format("|")),
			Node::Concat(list) => list.iter().format("").fmt(f),
			Node::Intersection(a, b) => write!(f, "({}&{})", a, b),
			Node::Optional(e) => write!(f, "({})?", e),
			Node::Star(e) => write!(f, "({})*", e),
			Node::RepeatMin(e, 1) => write!(f, "({})+", e),
			Node::RepeatMin(e, n) => write!(f, "({}){{{},}}", e, n),
			Node::RepeatMinMax(e, n, m) => write!(f, "({}){{{},{}}}", e, n, m),
			Node::Complement(e) => write!(f, "~({})", e),
			Node::Char(c) => DisplayCodeUnit(*c).fmt(f),
			Node::Class(set) => write!(f, "[{}]", set),
			Node::AnyChar => write!(f, "."),
			Node::Empty => write!(f, "#"),
			Node::Literal(s) => write!(f, "\"{}\"", DisplayString(s)),
			Node::AnyString => write!(f, "@"),
			Node::Automaton(name, _) => write!(f, "<{}>", name),
			Node::Interval(min, max, _) => write!(f, "<{}-{}>", min, max)
		}
	}
}

/// A compiled regular expression: the parse tree, ready to be lowered
/// into an automaton.
#[derive(Debug)]
pub struct RegExp {
	pattern: String,
	node: Node
}

impl RegExp {
	/// Parses `pattern` with every syntax option enabled.
	pub fn new(pattern: &str) -> Result<RegExp> {
		RegExp::with_syntax(pattern, Syntax::all())
	}

	pub fn with_syntax(pattern: &str, syntax: Syntax) -> Result<RegExp> {
		RegExp::with_automata(pattern, syntax, None, None)
	}

	/// Parses `pattern`, resolving `<name>` references against the given
	/// registry first and the provider second. An unresolved name is a
	/// parse error carrying its position.
	pub fn with_automata(
		pattern: &str,
		syntax: Syntax,
		automata: Option<&HashMap<String, Automaton>>,
		provider: Option<&dyn AutomatonProvider>
	) -> Result<RegExp> {
		let node = if pattern.is_empty() {
			Node::Literal(String::new())
		} else {
			Parser::new(pattern, syntax, automata, provider).parse()?
		};
		Ok(RegExp {
			pattern: pattern.to_string(),
			node
		})
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn node(&self) -> &Node {
		&self.node
	}

	/// Lowers the parse tree into an automaton. Every composite
	/// intermediate is minimized so that construction stays small.
	pub fn to_automaton(&self) -> Automaton {
		let a = lower(&self.node);
		log::debug!(
			"compiled `{}` into {} states",
			self.pattern,
			a.number_of_states()
		);
		a
	}
}

impl fmt::Display for RegExp {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.pattern.fmt(f)
	}
}

fn minimized(mut a: Automaton) -> Automaton {
	a.minimize();
	a
}

fn lower(node: &Node) -> Automaton {
	match node {
		Node::Union(list) => minimized(Automaton::union(list.iter().map(lower).collect())),
		Node::Concat(list) => {
			minimized(Automaton::concatenate(list.iter().map(lower).collect()))
		}
		Node::Intersection(a, b) => minimized(lower(a).intersection(&lower(b))),
		Node::Optional(e) => minimized(lower(e).optional()),
		Node::Star(e) => minimized(lower(e).star()),
		Node::RepeatMin(e, n) => minimized(lower(e).repeat_min(*n)),
		Node::RepeatMinMax(e, n, m) => minimized(lower(e).repeat_range(*n, *m)),
		Node::Complement(e) => minimized(lower(e).complement()),
		Node::Char(c) => Automaton::from_char(*c),
		Node::Class(set) => Automaton::from_charset(set),
		Node::AnyChar => Automaton::char_range(MIN_PRINTABLE, MAX_PRINTABLE),
		Node::Empty => Automaton::empty(),
		Node::Literal(s) => Automaton::from_string(s),
		Node::AnyString => Automaton::any_string(),
		Node::Automaton(_, a) => (**a).clone(),
		Node::Interval(min, max, digits) => {
			minimized(Automaton::interval(*min, *max, *digits))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn compile(pattern: &str) -> Automaton {
		RegExp::new(pattern).unwrap().to_automaton()
	}

	#[test]
	fn simple_concatenation_and_star() {
		let a = compile("ab*c");
		assert!(a.run("ac"));
		assert!(a.run("abbbbc"));
		assert!(!a.run("ab"));
	}

	#[test]
	fn alternation() {
		let a = compile("High|Medium| Low");
		assert!(a.run("High"));
		assert!(a.run("Medium"));
		assert!(a.run(" Low"));
		assert!(!a.run("Low"));
		assert!(!a.run("high"));
	}

	#[test]
	fn bounded_repetitions() {
		let a = compile("a{3,5}");
		assert!(!a.run("aa"));
		assert!(a.run("aaa"));
		assert!(a.run("aaaaa"));
		assert!(!a.run("aaaaaa"));

		let exact = compile("x{2}");
		assert!(exact.run("xx"));
		assert!(!exact.run("x"));
		assert!(!exact.run("xxx"));

		let open = compile("y{2,}");
		assert!(!open.run("y"));
		assert!(open.run("yy"));
		assert!(open.run("yyyyyyyy"));
	}

	#[test]
	fn character_classes() {
		let a = compile("[a-cx]");
		assert!(a.run("a"));
		assert!(a.run("b"));
		assert!(a.run("x"));
		assert!(!a.run("d"));

		let negated = compile("[^a-c]");
		assert!(negated.run("d"));
		assert!(negated.run(" "));
		assert!(!negated.run("b"));
		// negation is against printable ASCII only
		assert!(!negated.run("\u{0100}"));
	}

	#[test]
	fn class_escapes() {
		let digits = compile(r"\d+");
		assert!(digits.run("0123"));
		assert!(!digits.run("a1"));

		let word = compile(r"\w+");
		assert!(word.run("foo_bar42"));
		assert!(!word.run("a b"));

		let space = compile(r"a\sb");
		assert!(space.run("a b"));
		assert!(space.run("a\tb"));
		assert!(!space.run("a\nb"));
	}

	#[test]
	fn dot_is_printable_ascii() {
		let a = compile(".");
		assert!(a.run("x"));
		assert!(a.run(" "));
		assert!(a.run("~"));
		assert!(!a.run("\n"));
		assert!(!a.run("\u{0100}"));
	}

	#[test]
	fn quoted_literals() {
		let a = compile("\"a|b*\"");
		assert!(a.run("a|b*"));
		assert!(!a.run("a"));
		assert!(!a.run("abb"));
	}

	#[test]
	fn empty_language_and_any_string() {
		let empty = compile("#");
		assert!(empty.is_empty_language());

		let any = compile("@");
		assert!(any.run(""));
		assert!(any.run("whatever"));
	}

	#[test]
	fn disabled_syntax_parses_operators_literally() {
		let a = RegExp::with_syntax("a&b", Syntax::all().without(Syntax::INTERSECTION))
			.unwrap()
			.to_automaton();
		assert!(a.run("a&b"));

		let b = RegExp::with_syntax("#", Syntax::none()).unwrap().to_automaton();
		assert!(b.run("#"));
	}

	#[test]
	fn intersection_operator() {
		let a = compile("[ab]*&.*a.*");
		assert!(a.run("aab"));
		assert!(a.run("ba"));
		assert!(!a.run("bb"));
		assert!(!a.run("ca"));
	}

	#[test]
	fn complement_operator() {
		let a = compile("~(ab)");
		assert!(!a.run("ab"));
		assert!(a.run(""));
		assert!(a.run("abc"));
		assert!(a.run("x"));
	}

	#[test]
	fn integer_intervals() {
		let a = compile("<5-17>");
		assert!(a.run("5"));
		assert!(a.run("07"));
		assert!(a.run("17"));
		assert!(!a.run("18"));

		let padded = compile("<05-17>");
		assert!(padded.run("05"));
		assert!(!padded.run("5"));
		assert!(!padded.run("005"));

		// inverted bounds are normalized
		let swapped = compile("<17-5>");
		assert!(swapped.run("9"));
	}

	#[test]
	fn named_automata() {
		struct Severities;

		impl AutomatonProvider for Severities {
			fn get_automaton(&self, name: &str) -> Option<Automaton> {
				if name == "severity" {
					Some(Automaton::string_union(vec!["high", "low"]))
				} else {
					None
				}
			}
		}

		let mut registry = HashMap::new();
		registry.insert("digit".to_string(), Automaton::char_range(b'0' as u16, b'9' as u16));

		let a = RegExp::with_automata(
			"<severity>-<digit>",
			Syntax::all(),
			Some(&registry),
			Some(&Severities)
		)
		.unwrap()
		.to_automaton();
		assert!(a.run("high-7"));
		assert!(a.run("low-0"));
		assert!(!a.run("medium-1"));

		let err = RegExp::with_automata(
			"<missing>",
			Syntax::all(),
			Some(&registry),
			Some(&Severities)
		);
		assert!(err.is_err());
	}

	#[test]
	fn non_capturing_group_markers_are_absorbed() {
		let a = compile("(?:ab)c");
		assert!(a.run("abc"));
		let b = compile("(?i:x)");
		assert!(b.run("x"));
	}

	#[test]
	fn empty_group_is_the_empty_string() {
		let a = compile("()");
		assert!(a.run(""));
		assert!(!a.run("()"));
	}

	#[test]
	fn empty_pattern_is_the_empty_string() {
		let a = compile("");
		assert!(a.run(""));
		assert!(!a.run("a"));
	}

	#[test]
	fn parse_errors_carry_positions() {
		assert!(RegExp::new("(ab").is_err());
		assert!(RegExp::new("a)").is_err());
		assert!(RegExp::new("[ab").is_err());
		assert!(RegExp::new("a{").is_err());
		assert!(RegExp::new("a{x}").is_err());
		assert!(RegExp::new("\"ab").is_err());
		assert!(RegExp::new("<1-2-3>").is_err());
		assert!(RegExp::new("<99999999999999999999-3>").is_err());
		assert!(RegExp::new("<name>").is_err());

		let err = RegExp::new("ab(cd").unwrap_err();
		// the error is positioned somewhere inside the pattern
		assert!(err.span().end().column <= "ab(cd".len());
	}

	#[test]
	fn display_round_trips_structure() {
		let r = RegExp::new("a[b-d]*|#").unwrap();
		let printed = format!("{}", r.node());
		assert!(printed.contains("b-d"));
		assert!(printed.contains("#"));
	}
}
