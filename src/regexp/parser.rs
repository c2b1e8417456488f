use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use source_span::{
	DefaultMetrics,
	Loc,
	Span
};
use crate::automaton::Automaton;
use crate::charset::{
	code_unit,
	CharSet
};
use super::{
	AutomatonProvider,
	Error,
	Node,
	Result,
	Syntax
};

enum ClassAtom {
	Char(u16),
	Set(CharSet)
}

/// Recursive-descent parser for the extended regular-expression grammar.
///
/// The cursor tracks a `Span` over the consumed input; errors carry the
/// position at which they occurred.
pub struct Parser<'a> {
	chars: Peekable<Chars<'a>>,
	metrics: DefaultMetrics,
	span: Span,
	syntax: Syntax,
	automata: Option<&'a HashMap<String, Automaton>>,
	provider: Option<&'a dyn AutomatonProvider>
}

impl<'a> Parser<'a> {
	pub fn new(
		pattern: &'a str,
		syntax: Syntax,
		automata: Option<&'a HashMap<String, Automaton>>,
		provider: Option<&'a dyn AutomatonProvider>
	) -> Parser<'a> {
		Parser {
			chars: pattern.chars().peekable(),
			metrics: DefaultMetrics::with_tab_stop(4),
			span: Span::default(),
			syntax,
			automata,
			provider
		}
	}

	/// Parses the whole pattern; trailing content is an error.
	pub fn parse(mut self) -> Result<Node> {
		let node = self.parse_union()?;
		match self.peek() {
			Some(c) => Err(self.error(Error::Unexpected(c))),
			None => Ok(node)
		}
	}

	fn peek(&mut self) -> Option<char> {
		self.chars.peek().copied()
	}

	fn consume(&mut self) -> Option<char> {
		let c = self.chars.next();
		if let Some(c) = c {
			self.span.push(c, &self.metrics)
		}
		c
	}

	fn expect_char(&mut self) -> Result<char> {
		match self.consume() {
			Some(c) => Ok(c),
			None => Err(self.error(Error::UnexpectedEos))
		}
	}

	fn eat(&mut self, c: char) -> bool {
		if self.peek() == Some(c) {
			self.consume();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, c: char) -> Result<()> {
		match self.consume() {
			Some(d) if d == c => Ok(()),
			Some(_) => Err(self.error(Error::Expected(c))),
			None => Err(self.error(Error::UnexpectedEos))
		}
	}

	fn error(&self, e: Error) -> Loc<Error> {
		Loc::new(e, self.span.end().into())
	}

	fn allows(&self, flag: Syntax) -> bool {
		self.syntax.allows(flag)
	}

	fn parse_union(&mut self) -> Result<Node> {
		let first = self.parse_inter()?;
		if self.eat('|') {
			let mut list = vec![first];
			match self.parse_union()? {
				Node::Union(mut tail) => list.append(&mut tail),
				other => list.push(other)
			}
			Ok(Node::Union(list))
		} else {
			Ok(first)
		}
	}

	fn parse_inter(&mut self) -> Result<Node> {
		let first = self.parse_concat()?;
		if self.allows(Syntax::INTERSECTION) && self.eat('&') {
			let rest = self.parse_inter()?;
			Ok(Node::Intersection(Box::new(first), Box::new(rest)))
		} else {
			Ok(first)
		}
	}

	fn parse_concat(&mut self) -> Result<Node> {
		let first = self.parse_repeat()?;
		let stop = match self.peek() {
			None => true,
			Some(')') | Some('|') => true,
			Some('&') if self.allows(Syntax::INTERSECTION) => true,
			_ => false
		};
		if stop {
			Ok(first)
		} else {
			let mut list = vec![first];
			match self.parse_concat()? {
				Node::Concat(mut tail) => list.append(&mut tail),
				other => list.push(other)
			}
			Ok(Node::Concat(list))
		}
	}

	fn parse_repeat(&mut self) -> Result<Node> {
		let mut e = self.parse_compl()?;
		loop {
			match self.peek() {
				Some('?') => {
					self.consume();
					e = Node::Optional(Box::new(e))
				}
				Some('*') => {
					self.consume();
					e = Node::Star(Box::new(e))
				}
				Some('+') => {
					self.consume();
					e = Node::RepeatMin(Box::new(e), 1)
				}
				Some('{') => {
					self.consume();
					let n = self.parse_number()?;
					let m = if self.eat(',') {
						match self.peek() {
							Some(c) if c.is_ascii_digit() => Some(self.parse_number()?),
							_ => None
						}
					} else {
						Some(n)
					};
					self.expect('}')?;
					e = match m {
						Some(m) => Node::RepeatMinMax(Box::new(e), n, m),
						None => Node::RepeatMin(Box::new(e), n)
					}
				}
				_ => break
			}
		}
		Ok(e)
	}

	fn parse_number(&mut self) -> Result<u32> {
		let mut digits = String::new();
		while let Some(c) = self.peek() {
			if c.is_ascii_digit() {
				self.consume();
				digits.push(c)
			} else {
				break;
			}
		}
		digits
			.parse()
			.map_err(|_| self.error(Error::InvalidInteger(digits.clone())))
	}

	fn parse_compl(&mut self) -> Result<Node> {
		if self.allows(Syntax::COMPLEMENT) && self.peek() == Some('~') {
			self.consume();
			let e = self.parse_compl()?;
			Ok(Node::Complement(Box::new(e)))
		} else {
			self.parse_char_class_exp()
		}
	}

	fn parse_char_class_exp(&mut self) -> Result<Node> {
		if self.eat('[') {
			let negate = self.eat('^');
			let mut set = CharSet::new();
			loop {
				match self.peek() {
					None => return Err(self.error(Error::UnexpectedEos)),
					Some(']') => {
						self.consume();
						break;
					}
					Some(_) => self.parse_char_class(&mut set)?
				}
			}
			let set = if negate { set.negate_printable() } else { set };
			Ok(Node::Class(set))
		} else {
			self.parse_simple()
		}
	}

	/// One char-atom or range of a character class, merged into `set`.
	fn parse_char_class(&mut self, set: &mut CharSet) -> Result<()> {
		match self.parse_class_atom()? {
			ClassAtom::Set(s) => set.add(&s),
			ClassAtom::Char(first) => {
				if self.eat('-') {
					if self.peek() == Some(']') {
						// trailing dash is a literal
						set.insert_char(first);
						set.insert_char(b'-' as u16)
					} else {
						match self.parse_class_atom()? {
							ClassAtom::Char(last) => {
								// an inverted range denotes nothing
								if first <= last {
									set.insert(first..=last)
								}
							}
							ClassAtom::Set(s) => {
								set.insert_char(first);
								set.insert_char(b'-' as u16);
								set.add(&s)
							}
						}
					}
				} else {
					set.insert_char(first)
				}
			}
		}
		Ok(())
	}

	fn parse_class_atom(&mut self) -> Result<ClassAtom> {
		let c = self.expect_char()?;
		if c == '\\' {
			let c = self.expect_char()?;
			match self.escape_class(c) {
				Some(set) => Ok(ClassAtom::Set(set)),
				None => self.class_char(c)
			}
		} else {
			self.class_char(c)
		}
	}

	fn class_char(&self, c: char) -> Result<ClassAtom> {
		match code_unit(c) {
			Some(c) => Ok(ClassAtom::Char(c)),
			None => Err(self.error(Error::Unexpected(c)))
		}
	}

	/// The predefined class denoted by an escape character, if any.
	fn escape_class(&self, c: char) -> Option<CharSet> {
		match c {
			'd' => Some(CharSet::digit()),
			'D' => Some(CharSet::digit().negate_printable()),
			's' => Some(CharSet::whitespace()),
			'S' => Some(CharSet::whitespace().negate_printable()),
			'w' => Some(CharSet::word()),
			'W' => Some(CharSet::word().negate_printable()),
			_ => None
		}
	}

	fn parse_simple(&mut self) -> Result<Node> {
		let c = self.expect_char()?;
		match c {
			'.' => Ok(Node::AnyChar),
			'#' if self.allows(Syntax::EMPTY) => Ok(Node::Empty),
			'@' if self.allows(Syntax::ANYSTRING) => Ok(Node::AnyString),
			'"' => {
				let mut string = String::new();
				loop {
					match self.consume() {
						Some('"') => break,
						Some(c) => string.push(c),
						None => return Err(self.error(Error::Expected('"')))
					}
				}
				Ok(Node::Literal(string))
			}
			'(' => {
				if self.eat(')') {
					return Ok(Node::Literal(String::new()));
				}
				if self.eat('?') {
					// absorb non-capturing flag markers up to the `:`
					while let Some(c) = self.peek() {
						if c == ')' {
							break;
						}
						self.consume();
						if c == ':' {
							break;
						}
					}
				}
				let e = self.parse_union()?;
				self.expect(')')?;
				Ok(e)
			}
			'<' if self.allows(Syntax::AUTOMATON) || self.allows(Syntax::INTERVAL) => {
				self.parse_named_or_interval()
			}
			'\\' => {
				let c = self.expect_char()?;
				match self.escape_class(c) {
					Some(set) => Ok(Node::Class(set)),
					None => Ok(self.literal(c))
				}
			}
			c => Ok(self.literal(c))
		}
	}

	fn literal(&self, c: char) -> Node {
		match code_unit(c) {
			Some(c) => Node::Char(c),
			// beyond the BMP: a surrogate-pair literal
			None => Node::Literal(c.to_string())
		}
	}

	fn parse_named_or_interval(&mut self) -> Result<Node> {
		let mut content = String::new();
		loop {
			match self.consume() {
				Some('>') => break,
				Some(c) => content.push(c),
				None => return Err(self.error(Error::Expected('>')))
			}
		}

		match content.matches('-').count() {
			0 => {
				if !self.allows(Syntax::AUTOMATON) {
					return Err(self.error(Error::InvalidInterval));
				}
				let automaton = self.resolve(&content)?;
				Ok(Node::Automaton(content, Box::new(automaton)))
			}
			1 => {
				if !self.allows(Syntax::INTERVAL) {
					return Err(self.error(Error::InvalidInterval));
				}
				let dash = content.find('-').unwrap();
				let smin = &content[..dash];
				let smax = &content[dash + 1..];
				let min: u32 = smin
					.parse()
					.map_err(|_| self.error(Error::InvalidInteger(smin.to_string())))?;
				let max: u32 = smax
					.parse()
					.map_err(|_| self.error(Error::InvalidInteger(smax.to_string())))?;
				let digits = if smin.len() == smax.len() { smin.len() } else { 0 };
				let (min, max) = if min > max { (max, min) } else { (min, max) };
				Ok(Node::Interval(min, max, digits))
			}
			_ => Err(self.error(Error::InvalidInterval))
		}
	}

	fn resolve(&self, name: &str) -> Result<Automaton> {
		if let Some(registry) = self.automata {
			if let Some(a) = registry.get(name) {
				return Ok(a.clone());
			}
		}
		if let Some(provider) = self.provider {
			if let Some(a) = provider.get_automaton(name) {
				return Ok(a);
			}
		}
		Err(self.error(Error::UndefinedAutomaton(name.to_string())))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(pattern: &str) -> Result<Node> {
		Parser::new(pattern, Syntax::all(), None, None).parse()
	}

	#[test]
	fn unions_and_concatenations_flatten() {
		match parse("a|b|c").unwrap() {
			Node::Union(list) => assert_eq!(list.len(), 3),
			_ => panic!("expected a union")
		}
		match parse("abc").unwrap() {
			Node::Concat(list) => assert_eq!(list.len(), 3),
			_ => panic!("expected a concatenation")
		}
	}

	#[test]
	fn repeat_binds_tighter_than_concatenation() {
		match parse("ab*").unwrap() {
			Node::Concat(list) => {
				assert_eq!(list.len(), 2);
				match &list[1] {
					Node::Star(inner) => match **inner {
						Node::Char(c) => assert_eq!(c, b'b' as u16),
						_ => panic!("expected a char under the star")
					},
					_ => panic!("expected a star")
				}
			}
			_ => panic!("expected a concatenation")
		}
	}

	#[test]
	fn leading_repeat_operators_are_literals() {
		let node = parse("*a").unwrap();
		match node {
			Node::Concat(list) => match list[0] {
				Node::Char(c) => assert_eq!(c, b'*' as u16),
				_ => panic!("expected a literal star")
			},
			_ => panic!("expected a concatenation")
		}
	}

	#[test]
	fn escaped_backslash_is_a_backslash() {
		match parse(r"\\").unwrap() {
			Node::Char(c) => assert_eq!(c, b'\\' as u16),
			_ => panic!("expected a char")
		}
	}

	#[test]
	fn unknown_escapes_are_literal() {
		match parse(r"\q").unwrap() {
			Node::Char(c) => assert_eq!(c, b'q' as u16),
			_ => panic!("expected a char")
		}
	}

	#[test]
	fn trailing_dash_in_class_is_literal() {
		match parse("[a-]").unwrap() {
			Node::Class(set) => {
				assert!(set.contains(b'a' as u16));
				assert!(set.contains(b'-' as u16));
				assert!(!set.contains(b'b' as u16));
			}
			_ => panic!("expected a class")
		}
	}

	#[test]
	fn error_positions_advance_with_the_cursor() {
		let err = parse("ab{x}").unwrap_err();
		assert_eq!(err.span().end().column, 3);
	}

	#[test]
	fn trailing_content_is_an_error() {
		assert!(parse("a)b").is_err());
	}
}
