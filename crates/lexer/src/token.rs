use logos::Logos;
use std::fmt;

/// Why a slice of source could not become a token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    Unrecognized,
    IntegerOutOfRange,
}

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")] // Ignore spaces, tabs and line breaks automatically
#[logos(skip(r"//[^\n]*", allow_greedy = true))] // Line comments
pub enum Token {
    // --- Keywords ---
    #[token("function")]
    Function,

    #[token("fn")]
    Fn, // Function types (fn(int) -> int)

    #[token("var")]
    Var,

    #[token("const")]
    Const,

    #[token("return")]
    Return,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("while")]
    While,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // --- Literals ---

    // Identifiers: variable names, functions, builtin type names (ex: "numbers", "int")
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Integers (ex: 42, 100)
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOutOfRange))]
    Int(i64),

    // Strings (ex: "hello"), stored unescaped
    #[regex(r#""([^"\\]|\\["\\nt])*""#, |lex| unescape(lex.slice()))]
    Str(String),

    // --- Operators ---
    #[token("|>")]
    PipeMap, // Element-wise map (numbers |> double)

    #[token("||")]
    Or,

    #[token("|")]
    Pipe,

    #[token("&&")]
    And,

    #[token("&")]
    Ampersand,

    #[token("^")]
    Caret,

    #[token("!")]
    Not,

    #[token(":=")]
    ColonEq, // Walrus operator (x := 10)

    #[token("=")]
    Eq,

    #[token("==")]
    DoubleEq,

    #[token("!=")]
    NotEq,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("**")]
    Pow,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token(">")]
    Gt,

    #[token("<")]
    Lt,

    #[token(">=")]
    GtEq,

    #[token("<=")]
    LtEq,

    #[token("->")]
    Arrow, // Function return (fn -> int) and closures (x -> x * 2)

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    // --- Delimiters ---
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket, // Sequence literal

    #[token("]")]
    RBracket,
}

fn unescape(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            _ => return None,
        }
    }

    Some(out)
}

impl Token {
    /// Source spelling of fixed tokens, used in parse error messages
    pub fn describe(&self) -> String {
        let fixed = match self {
            Token::Identifier(name) => return format!("identifier '{}'", name),
            Token::Int(n) => return format!("integer {}", n),
            Token::Str(_) => return "string".to_string(),
            Token::Function => "function",
            Token::Fn => "fn",
            Token::Var => "var",
            Token::Const => "const",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::True => "true",
            Token::False => "false",
            Token::PipeMap => "|>",
            Token::Or => "||",
            Token::Pipe => "|",
            Token::And => "&&",
            Token::Ampersand => "&",
            Token::Caret => "^",
            Token::Not => "!",
            Token::ColonEq => ":=",
            Token::Eq => "=",
            Token::DoubleEq => "==",
            Token::NotEq => "!=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Pow => "**",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Gt => ">",
            Token::Lt => "<",
            Token::GtEq => ">=",
            Token::LtEq => "<=",
            Token::Arrow => "->",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
        };
        format!("'{}'", fixed)
    }
}

// This helps to show the token prettily in the print
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
