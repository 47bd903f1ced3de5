// src/scoring/age.rs

/// Normalized age in years: a single value or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgeYears {
    Single(f64),
    Range(f64, f64),
}

impl AgeYears {
    /// Rejects values no dog can have (negative, NaN, infinite).
    pub fn from_years(years: f64) -> Option<Self> {
        (years.is_finite() && years >= 0.0).then_some(AgeYears::Single(years))
    }

    fn range(a: f64, b: f64) -> Self {
        AgeYears::Range(a.min(b), a.max(b))
    }

    /// Both ends of the age; a single value is its own range.
    pub fn endpoints(&self) -> (f64, f64) {
        match *self {
            AgeYears::Single(y) => (y, y),
            AgeYears::Range(lo, hi) => (lo, hi),
        }
    }
}

/// Scoring bands, narrowest first. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    /// Under 9 months: too young to judge, always neutral.
    TooYoung,
    Yearling,
    SweetSpot,
    Young,
    Prime,
    Mature,
    Older,
    Senior,
}

const AGE_BANDS: &[(f64, AgeBand)] = &[
    (0.75, AgeBand::TooYoung),
    (1.0, AgeBand::Yearling),
    (2.0, AgeBand::SweetSpot),
    (3.0, AgeBand::Young),
    (4.0, AgeBand::Prime),
    (5.0, AgeBand::Mature),
    (6.0, AgeBand::Older),
];

impl AgeBand {
    pub fn of(years: f64) -> Self {
        AGE_BANDS
            .iter()
            .find(|(upper, _)| years < *upper)
            .map(|(_, band)| *band)
            .unwrap_or(AgeBand::Senior)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unit {
    Years,
    Months,
    Weeks,
}

impl Unit {
    fn from_word(word: &str) -> Option<Self> {
        if word.starts_with("yr") || word.starts_with("year") {
            Some(Unit::Years)
        } else if word.starts_with("mo") {
            Some(Unit::Months)
        } else if word.starts_with("wk") || word.starts_with("week") {
            Some(Unit::Weeks)
        } else {
            None
        }
    }

    fn to_years(self, value: f64) -> f64 {
        match self {
            Unit::Years => value,
            Unit::Months => value / 12.0,
            Unit::Weeks => value / 52.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Dash,
    Word(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let lowered = text.to_lowercase().replace(['\u{2013}', '\u{2014}'], "-");
    let chars: Vec<char> = lowered.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            // Only a dot followed by a digit is a decimal point.
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let literal: String = chars[start..i].iter().collect();
            if let Ok(n) = literal.parse() {
                tokens.push(Token::Number(n));
            }
        } else if c.is_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_alphabetic() {
                i += 1;
            }
            tokens.push(Token::Word(chars[start..i].iter().collect()));
        } else {
            if c == '-' {
                tokens.push(Token::Dash);
            }
            i += 1;
        }
    }
    tokens
}

fn unit_at(tokens: &[Token], i: usize) -> Option<Unit> {
    match tokens.get(i) {
        Some(Token::Word(w)) => Unit::from_word(w),
        _ => None,
    }
}

/// "X-Y <unit>" or "X to Y <unit>".
fn numeric_range(tokens: &[Token]) -> Option<AgeYears> {
    tokens.windows(4).find_map(|w| match w {
        [Token::Number(a), sep, Token::Number(b), Token::Word(u)] => {
            let is_sep = matches!(sep, Token::Dash) || *sep == Token::Word("to".into());
            let unit = Unit::from_word(u)?;
            is_sep.then(|| AgeYears::range(unit.to_years(*a), unit.to_years(*b)))
        }
        _ => None,
    })
}

/// "X <unit>".
fn numeric_single(tokens: &[Token]) -> Option<AgeYears> {
    tokens.iter().enumerate().find_map(|(i, t)| match t {
        Token::Number(n) => unit_at(tokens, i + 1).map(|u| AgeYears::Single(u.to_years(*n))),
        _ => None,
    })
}

const AGE_CATEGORIES: &[(&str, AgeYears)] = &[
    ("puppy", AgeYears::Single(0.5)),
    ("pup", AgeYears::Single(0.5)),
    ("senior", AgeYears::Single(8.0)),
    ("young", AgeYears::Range(1.0, 3.0)),
    ("adult", AgeYears::Range(3.0, 7.0)),
];

/// Categorical phrases, used only when the text carries no numeric age.
fn categorical(tokens: &[Token]) -> Option<AgeYears> {
    AGE_CATEGORIES.iter().find_map(|(phrase, age)| {
        tokens
            .iter()
            .any(|t| matches!(t, Token::Word(w) if w == phrase))
            .then_some(*age)
    })
}

/// Parse rules in precedence order; the first rule that matches wins.
const AGE_RULES: &[fn(&[Token]) -> Option<AgeYears>] = &[numeric_range, numeric_single, categorical];

/// Parses free-text ages such as "1.5 yrs", "8 mos", "2–3 years" or "Senior".
///
/// Returns `None` when nothing is recognized; callers treat that as neutral.
pub fn parse_age(text: &str) -> Option<AgeYears> {
    let tokens = tokenize(text);
    AGE_RULES.iter().find_map(|rule| rule(&tokens))
}
