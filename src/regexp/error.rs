use std::fmt;
use source_span::Loc;

pub enum Error {
	UnexpectedEos,
	Unexpected(char),
	Expected(char),
	InvalidInteger(String),
	InvalidInterval,
	UndefinedAutomaton(String)
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::Error::*;
		match self {
			UnexpectedEos => write!(f, "unexpected end of pattern"),
			Unexpected(c) => write!(f, "unexpected character `{}`", c),
			Expected(c) => write!(f, "expected `{}`", c),
			InvalidInteger(s) => write!(f, "invalid integer `{}`", s),
			InvalidInterval => write!(f, "invalid interval"),
			UndefinedAutomaton(name) => write!(f, "undefined automaton `{}`", name)
		}
	}
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

pub type Result<T> = std::result::Result<T, Loc<Error>>;
