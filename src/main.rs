use clap::Parser;
use tokcomb::lexer::{Token, Tokenizer};
use tokcomb::parser::{BoxedParser, any_of, end_of_input, label, many, optional, run_on_string};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const INPUT: &str = "alpha, 42, b2\n, 7";

/// Parse a comma separated list of identifiers and numbers.
#[derive(Debug, Parser)]
#[command(name = "tokcomb", version)]
struct Args {
    /// Text to parse; a built-in sample is used when omitted
    input: Option<String>,
}

#[derive(Debug)]
enum Item {
    Ident(String),
    Number(String),
}

/// Enable with `RUST_LOG=tokcomb=debug` or `RUST_LOG=tokcomb=trace`.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn tokenizer() -> anyhow::Result<Tokenizer> {
    let tokenizer = Tokenizer::builder()
        .literal('\n', "newline")
        .literal(',', "comma")
        .pattern("[a-zA-Z]", "letter")?
        .pattern("[0-9]", "digit")?
        .class(char::is_whitespace, "space")
        .newline("newline")
        .build();
    Ok(tokenizer)
}

fn text(tokens: &[Token]) -> String {
    tokens.iter().map(Token::value).collect()
}

fn whitespace() -> BoxedParser<Option<Vec<Token>>> {
    optional(many(any_of(["space", "newline"])))
}

/// identifier := letter (letter | digit)*
fn identifier() -> BoxedParser<Item> {
    let rest = optional(many(any_of(["letter", "digit"])));
    (any_of(["letter"]) + rest)
        >> |(first, rest): (Token, Option<Vec<Token>>)| {
            let mut name = first.value().to_string();
            name.push_str(&text(&rest.unwrap_or_default()));
            Item::Ident(name)
        }
}

/// number := digit+
fn number() -> BoxedParser<Item> {
    many(any_of(["digit"])) >> |digits: Vec<Token>| Item::Number(text(&digits))
}

/// item := ws (identifier | number) ws
fn item() -> BoxedParser<Item> {
    label("item", whitespace() * (identifier() | number()) - whitespace())
}

/// list := item ("," item)* <end>
fn list() -> BoxedParser<Vec<Item>> {
    let tail = optional(many(any_of(["comma"]) * item()));
    (item() + tail - end_of_input())
        >> |(first, rest): (Item, Option<Vec<Item>>)| {
            let mut items = vec![first];
            items.extend(rest.unwrap_or_default());
            items
        }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let input = args.input.unwrap_or_else(|| INPUT.to_string());

    let items = run_on_string(&list(), &input, &tokenizer()?)?;
    for item in items {
        match item {
            Item::Ident(name) => println!("ident  {name}"),
            Item::Number(digits) => println!("number {digits}"),
        }
    }

    Ok(())
}
