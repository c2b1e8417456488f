use std::io::{
	self,
	Write
};
use std::process;
use clap::{
	App,
	AppSettings,
	Arg,
	SubCommand
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use source_span::{
	fmt::{Formatter, Style},
	Loc, Position
};
use rexgen::{
	generate,
	regexp,
	RegExp,
	Xeger
};

fn main() {
	let matches = App::new("rexgen")
		.version("0.1.0")
		.about("Compiles regular expressions into automata and generates matching strings")
		.setting(AppSettings::SubcommandRequiredElseHelp)
		.arg(
			Arg::with_name("verbose")
				.short("v")
				.multiple(true)
				.global(true)
				.help("Increase verbosity")
		)
		.subcommand(
			SubCommand::with_name("generate")
				.about("Generate random strings matching a pattern")
				.arg(Arg::with_name("PATTERN").required(true).help("The regular expression"))
				.arg(
					Arg::with_name("count")
						.short("n")
						.long("count")
						.takes_value(true)
						.default_value("1")
						.help("How many samples to generate")
				)
				.arg(
					Arg::with_name("seed")
						.long("seed")
						.takes_value(true)
						.help("Seed for the random source")
				)
		)
		.subcommand(
			SubCommand::with_name("test")
				.about("Test whether a string matches a pattern")
				.arg(Arg::with_name("PATTERN").required(true).help("The regular expression"))
				.arg(Arg::with_name("INPUT").required(true).help("The string to test"))
		)
		.subcommand(
			SubCommand::with_name("dot")
				.about("Print the compiled automaton in graphviz dot format")
				.arg(Arg::with_name("PATTERN").required(true).help("The regular expression"))
		)
		.get_matches();

	let verbosity = matches.occurrences_of("verbose") as usize;
	stderrlog::new().verbosity(verbosity).init().unwrap();

	match matches.subcommand() {
		("generate", Some(m)) => {
			let pattern = m.value_of("PATTERN").unwrap();
			let count: usize = match m.value_of("count").unwrap().parse() {
				Ok(count) => count,
				Err(_) => {
					eprintln!("invalid count");
					process::exit(1)
				}
			};
			let samples = match m.value_of("seed") {
				Some(seed) => {
					let seed: u64 = match seed.parse() {
						Ok(seed) => seed,
						Err(_) => {
							eprintln!("invalid seed");
							process::exit(1)
						}
					};
					generate_all(pattern, Xeger::with_rng(pattern, StdRng::seed_from_u64(seed)), count)
				}
				None => generate_all(pattern, Xeger::new(pattern), count)
			};
			let stdout = io::stdout();
			let mut out = stdout.lock();
			for sample in samples {
				writeln!(out, "{}", sample).unwrap()
			}
		}
		("test", Some(m)) => {
			let pattern = m.value_of("PATTERN").unwrap();
			let input = m.value_of("INPUT").unwrap();
			let automaton = compile(pattern);
			if automaton.run(input) {
				println!("match")
			} else {
				println!("no match");
				process::exit(1)
			}
		}
		("dot", Some(m)) => {
			let pattern = m.value_of("PATTERN").unwrap();
			let automaton = compile(pattern);
			let stdout = io::stdout();
			automaton.write_dot(&mut stdout.lock()).unwrap()
		}
		_ => unreachable!()
	}
}

fn compile(pattern: &str) -> rexgen::Automaton {
	match RegExp::new(pattern) {
		Ok(regexp) => {
			log::info!("compiling `{}`...", pattern);
			let mut automaton = regexp.to_automaton();
			automaton.minimize();
			automaton
		}
		Err(e) => report(pattern, &e)
	}
}

fn generate_all<R: rand::Rng>(
	pattern: &str,
	xeger: Result<Xeger<R>, generate::Error>,
	count: usize
) -> Vec<String> {
	match xeger {
		Ok(mut xeger) => (0..count).map(|_| xeger.generate()).collect(),
		Err(generate::Error::Syntax(e)) => report(pattern, &e),
		Err(e) => {
			eprintln!("{}", e);
			process::exit(1)
		}
	}
}

/// Renders a parse error under the offending pattern position.
fn report(pattern: &str, e: &Loc<regexp::Error>) -> ! {
	let metrics = source_span::DefaultMetrics::with_tab_stop(4);
	let chars = pattern.chars().map(|c| Ok::<char, io::Error>(c));
	let buffer = source_span::SourceBuffer::new(chars, Position::default(), metrics);
	for c in buffer.iter() {
		if c.is_err() {
			break;
		}
	}
	let mut fmt = Formatter::new();
	fmt.add(e.span(), Some(format!("{}", e)), Style::Error);
	match fmt.render(buffer.iter(), buffer.span(), &metrics) {
		Ok(formatted) => eprintln!("{}", formatted),
		Err(_) => eprintln!("{}", e)
	}
	process::exit(1)
}
