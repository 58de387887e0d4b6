//! Reading problems written in the .lp file format
//!
//! Parsing goes through independent stages, each exposed here:
//! [remove_comments], [split_sections], [parse_named_expression] (built on
//! [mathify_expression] and [parse_term]), [parse_constraints], [parse_bounds] and
//! [parse_variable_list]. [read_lp_str] chains them and assembles a [Problem].
//! Any malformed input aborts the whole parse.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::constraint::{Constraint, ConstraintSense};
use crate::error::ReadError;
use crate::expression::Expression;
use crate::objective::{Objective, ObjectiveSense};
use crate::problem::Problem;
use crate::util::{check_variable_name, UniqueNameGenerator};
use crate::variable::{VarType, Variable};

/// Name of a problem read from a document without a leading comment
pub const DEFAULT_PROBLEM_NAME: &str = "lp_model_problem";

/// Stem of the names generated for unnamed constraints
pub const UNNAMED_CONSTRAINT_STEM: &str = "c";

/// Relational operators, longest first so that `<=` is not read as `<`
const OPERATORS: [&str; 7] = ["<=", "=<", ">=", "=>", "<", ">", "="];

/// Variable name to coefficient
pub type Coefficients = BTreeMap<String, f64>;

/// Sections of an .lp document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    /// `Minimize`, `Maximize`
    Objective,
    /// `Subject To`
    Constraints,
    /// `Bounds`
    Bounds,
    /// `Generals`
    Generals,
    /// `Binaries`
    Binaries,
    /// `End`
    End,
}

impl Section {
    /// Every section, in the order they are searched for
    pub const ALL: [Section; 6] = [
        Section::Objective,
        Section::Constraints,
        Section::Bounds,
        Section::Generals,
        Section::Binaries,
        Section::End,
    ];

    /// Keywords opening the section, matched case-insensitively on word boundaries
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Section::Objective => &["minimize", "maximize", "minimum", "maximum", "min", "max"],
            Section::Constraints => &["subject to", "such that", "st", "s.t.", "st."],
            Section::Bounds => &["bounds", "bound"],
            Section::Generals => &["general", "generals", "gen"],
            Section::Binaries => &["binary", "binaries", "bin"],
            Section::End => &["end"],
        }
    }
}

/// The text of each section of a document, keywords excluded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sections<'a> {
    /// Whether the objective keyword asks for maximization
    pub is_maximize: bool,
    /// Objective row
    pub objective: &'a str,
    /// Constraint rows
    pub constraints: Option<&'a str>,
    /// Bound declarations
    pub bounds: Option<&'a str>,
    /// Integer variable names
    pub generals: Option<&'a str>,
    /// Binary variable names
    pub binaries: Option<&'a str>,
}

/// An optionally named expression, like the objective row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExpression {
    /// Text before the first `:`
    pub name: Option<String>,
    /// Coefficient of each variable
    pub coefficients: Coefficients,
    /// Sum of the constant terms
    pub constant: f64,
}

/// One constraint row before variables are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedConstraint {
    /// Text before the first `:`
    pub name: Option<String>,
    /// Variables of the left-hand side
    pub lhs: Coefficients,
    /// Constant of the left-hand side
    pub lhs_const: f64,
    /// Relation, strict operators included as non-strict
    pub sense: ConstraintSense,
    /// Variables of the right-hand side
    pub rhs: Coefficients,
    /// Constant of the right-hand side
    pub rhs_const: f64,
}

/// Bounds declared for one variable. Infinite values mean no bound on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParsedBound {
    /// Declared lower bound
    pub lower: Option<f64>,
    /// Declared upper bound
    pub upper: Option<f64>,
}

impl ParsedBound {
    fn apply(&mut self, sense: ConstraintSense, value: f64) {
        match sense {
            ConstraintSense::Leq => self.upper = Some(value),
            ConstraintSense::Geq => self.lower = Some(value),
            ConstraintSense::Eq => {
                self.lower = Some(value);
                self.upper = Some(value);
            }
        }
    }
}

/// Read a problem from any reader, such as an open file
pub fn read_lp<R: Read>(mut reader: R) -> Result<Problem, ReadError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    read_lp_str(&content)
}

/// Read a problem from the .lp file at `path`
pub fn read_lp_file<P: AsRef<Path>>(path: P) -> Result<Problem, ReadError> {
    read_lp(File::open(path)?)
}

/// Parse an .lp document.
///
/// Variables are created the first time their name appears, as continuous and
/// non-negative, and are then shared by every later reference. Declarations in
/// `Bounds`, `Generals` and `Binaries` apply to that single variable.
pub fn read_lp_str(content: &str) -> Result<Problem, ReadError> {
    let content = content.replace("\r\n", "\n");
    let content = content.trim();

    let problem_name = find_problem_name(content);
    let stripped = remove_comments(content);
    let sections = split_sections(&stripped)?;

    let objective = parse_named_expression(sections.objective)?;
    let constraints = match sections.constraints {
        Some(text) => parse_constraints(text)?,
        None => vec![],
    };
    let bounds = match sections.bounds {
        Some(text) => parse_bounds(text)?,
        None => BTreeMap::new(),
    };
    let generals = match sections.generals {
        Some(text) => parse_variable_list(text)?,
        None => vec![],
    };
    let binaries = match sections.binaries {
        Some(text) => parse_variable_list(text)?,
        None => vec![],
    };

    let mut table = VariableTable::default();
    let sense = if sections.is_maximize {
        ObjectiveSense::Maximize
    } else {
        ObjectiveSense::Minimize
    };
    let objective = Objective::new(
        objective.name.unwrap_or_default(),
        table.expression(&objective.coefficients, objective.constant),
        sense,
    );

    let mut names = UniqueNameGenerator::default();
    for name in constraints.iter().filter_map(|c| c.name.as_deref()) {
        names.reserve(name);
    }
    let constraints: Vec<_> = constraints
        .into_iter()
        .map(|parsed| {
            let name = match parsed.name {
                Some(name) => name,
                None => names.add_numbered(UNNAMED_CONSTRAINT_STEM),
            };
            let lhs = table.expression(&parsed.lhs, parsed.lhs_const);
            let rhs = table.expression(&parsed.rhs, parsed.rhs_const);
            Constraint::new(name, lhs, parsed.sense, rhs)
        })
        .collect();

    for (name, bound) in &bounds {
        let variable = table.find(name);
        let lower = match bound.lower {
            None => Some(0.),
            Some(value) if value == f64::NEG_INFINITY => None,
            Some(value) => Some(value),
        };
        let upper = match bound.upper {
            None => variable.up_bound(),
            Some(value) if value == f64::INFINITY => None,
            Some(value) => Some(value),
        };
        variable
            .set_bounds(lower, upper)
            .map_err(|source| ReadError::InvalidVariableBound {
                name: name.clone(),
                source,
            })?;
    }
    for name in &generals {
        table.find(name).set_var_type(VarType::Integer);
    }
    for name in &binaries {
        table.find(name).set_var_type(VarType::Binary);
    }

    let mut problem = Problem::new(problem_name);
    problem.set_objective(objective)?;
    let constraint_count = constraints.len();
    for constraint in constraints {
        problem.add_constraint(constraint)?;
    }
    for variable in table.variables.values() {
        problem.add_variable(variable)?;
    }

    tracing::debug!(
        component = "lp_reader",
        operation = "read",
        status = "ok",
        problem = problem.name(),
        variables = table.variables.len(),
        constraints = constraint_count,
        bounds = bounds.len(),
        generals = generals.len(),
        binaries = binaries.len(),
        "Read lp document"
    );
    Ok(problem)
}

/// Variables met while reading, created on first reference
#[derive(Default)]
struct VariableTable {
    variables: BTreeMap<String, Variable>,
}

impl VariableTable {
    fn find(&mut self, name: &str) -> Variable {
        self.variables
            .entry(name.to_string())
            .or_insert_with(|| Variable::continuous(name))
            .clone()
    }

    fn expression(&mut self, coefficients: &Coefficients, constant: f64) -> Expression {
        let mut expression = Expression::from_constant(constant);
        for (name, &coeff) in coefficients {
            let variable = self.find(name);
            expression.add_term(&variable, coeff);
        }
        expression
    }
}

/// Remove `\ ... \` comments, and everything after a backslash left unpaired.
///
/// ```
/// use lp_model::lp_reader::remove_comments;
///
/// assert_eq!(remove_comments(r"before \* a comment *\ after"), "before  after");
/// assert_eq!(remove_comments(r"before \* a comment"), "before ");
/// ```
pub fn remove_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(open) = rest.find('\\') {
        result.push_str(&rest[..open]);
        match rest[open + 1..].find('\\') {
            Some(close) => rest = &rest[open + close + 2..],
            None => return result,
        }
    }
    result.push_str(rest);
    result
}

/// The text of the first comment, stripped of the `*` decorations, or [DEFAULT_PROBLEM_NAME]
///
/// ```
/// use lp_model::lp_reader::find_problem_name;
///
/// assert_eq!(find_problem_name("\\* test_problem *\\\nMinimize"), "test_problem");
/// assert_eq!(find_problem_name("Minimize"), "lp_model_problem");
/// ```
pub fn find_problem_name(content: &str) -> String {
    let comment = content
        .split_once('\\')
        .and_then(|(_, rest)| rest.split_once('\\'))
        .map(|(comment, _)| {
            comment
                .trim()
                .trim_start_matches('*')
                .trim_end_matches('*')
                .trim()
        });
    match comment {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_PROBLEM_NAME.to_string(),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_boundary(content: &str, position: usize) -> bool {
    let before = content[..position].chars().next_back().map_or(false, is_word_char);
    let after = content[position..].chars().next().map_or(false, is_word_char);
    before != after
}

/// Find the first occurrence of any of the keywords, ignoring case, on word boundaries.
///
/// At a given position keywords are tried in order. Returns the matched text and its span.
///
/// ```
/// use lp_model::lp_reader::search_keywords;
///
/// let content = "FreeWheel Linear Programming Interface for Python";
/// assert_eq!(search_keywords(content, &["python", "java"]), Some(("Python", 43, 49)));
/// assert_eq!(search_keywords(content, &["line"]), None);
/// ```
pub fn search_keywords<'a>(content: &'a str, keywords: &[&str]) -> Option<(&'a str, usize, usize)> {
    let bytes = content.as_bytes();
    for (start, _) in content.char_indices() {
        if !is_word_boundary(content, start) {
            continue;
        }
        for keyword in keywords {
            let end = start + keyword.len();
            let matches = bytes
                .get(start..end)
                .map_or(false, |candidate| candidate.eq_ignore_ascii_case(keyword.as_bytes()));
            if matches && is_word_boundary(content, end) {
                return Some((&content[start..end], start, end));
            }
        }
    }
    None
}

/// Split a comment-free document into its sections.
///
/// Sections may come in any order after the objective. Only the objective and the
/// final `End` are mandatory.
pub fn split_sections(content: &str) -> Result<Sections<'_>, ReadError> {
    let mut found = vec![];
    let mut is_maximize = None;
    for section in Section::ALL.iter().copied() {
        if let Some((keyword, start, end)) = search_keywords(content, section.keywords()) {
            if section == Section::Objective {
                is_maximize = Some(keyword.to_ascii_lowercase().starts_with("max"));
            }
            found.push((section, start, end));
        }
    }
    let is_maximize = is_maximize.ok_or(ReadError::MissingObjective)?;

    found.sort_by_key(|&(_, start, _)| start);
    if found.last().map(|&(section, _, _)| section) != Some(Section::End) {
        return Err(ReadError::MissingEnd);
    }

    let mut sections = Sections {
        is_maximize,
        ..Sections::default()
    };
    for pair in found.windows(2) {
        let (section, _, keyword_end) = pair[0];
        let (_, next_start, _) = pair[1];
        let text = content.get(keyword_end..next_start).unwrap_or_default().trim();
        match section {
            Section::Objective => sections.objective = text,
            Section::Constraints => sections.constraints = Some(text),
            Section::Bounds => sections.bounds = Some(text),
            Section::Generals => sections.generals = Some(text),
            Section::Binaries => sections.binaries = Some(text),
            Section::End => {}
        }
    }
    Ok(sections)
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_digits(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    i
}

/// Length of the signed numeric literal starting `term`, if any.
///
/// Accepts `[+-] digits [. digits]`, `[+-] . digits` and an optional `e[+-]digits`
/// exponent, with whitespace allowed around the sign.
fn numeric_prefix_len(term: &str) -> Option<usize> {
    let bytes = term.as_bytes();
    let mut i = skip_whitespace(bytes, 0);
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i = skip_whitespace(bytes, i + 1);
    }
    let integer_end = skip_digits(bytes, i);
    let has_integer = integer_end > i;
    let mut end = if bytes.get(integer_end) == Some(&b'.') {
        let fraction_end = skip_digits(bytes, integer_end + 1);
        if fraction_end > integer_end + 1 {
            fraction_end
        } else if has_integer {
            integer_end + 1
        } else {
            return None;
        }
    } else if has_integer {
        integer_end
    } else {
        return None;
    };
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut j = end + 1;
        if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exponent_end = skip_digits(bytes, j);
        if exponent_end > j {
            end = exponent_end;
        }
    }
    Some(end)
}

/// Split a term such as `3 x`, `- 1.5e3 y` or `10` into a variable name and a coefficient.
///
/// The coefficient is 1 when the term has no numeric prefix. A term without a
/// variable is a constant and yields no name.
///
/// ```
/// use lp_model::lp_reader::parse_term;
///
/// assert_eq!(parse_term(" - 5 x ").unwrap(), (Some("x".to_string()), -5.));
/// assert_eq!(parse_term("1.5e03 x").unwrap(), (Some("x".to_string()), 1500.));
/// assert_eq!(parse_term("1e-3").unwrap(), (None, 0.001));
/// assert!(parse_term("-5 5x").is_err());
/// ```
pub fn parse_term(term: &str) -> Result<(Option<String>, f64), ReadError> {
    let term = term.trim();
    let (coeff, rest) = match numeric_prefix_len(term) {
        Some(end) => {
            let literal: String = term[..end].chars().filter(|c| !c.is_whitespace()).collect();
            let coeff = literal
                .parse::<f64>()
                .map_err(|_| ReadError::InvalidNumber(term[..end].to_string()))?;
            (coeff, &term[end..])
        }
        None => (1., term),
    };
    let name = rest.trim();
    if name.is_empty() {
        return Ok((None, coeff));
    }
    check_variable_name(name).map_err(|rule| ReadError::InvalidName {
        name: name.to_string(),
        rule,
    })?;
    Ok((Some(name.to_string()), coeff))
}

/// Whether the sign at `position` belongs to the exponent of a number starting the term
fn is_exponent_sign(expression: &str, term_start: usize, position: usize) -> bool {
    let mantissa = match expression[term_start..position].trim_start().strip_suffix(|c| c == 'e' || c == 'E') {
        Some(mantissa) => mantissa,
        None => return false,
    };
    let next_is_digit = expression[position + 1..]
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit());
    next_is_digit
        && mantissa.chars().any(|c| c.is_ascii_digit())
        && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.')
        && mantissa.matches('.').count() <= 1
}

/// Parse an expression like `3x + 4y - 5` into coefficients and a constant.
///
/// Repeated variables have their coefficients summed.
///
/// ```
/// use lp_model::lp_reader::mathify_expression;
///
/// let (coefficients, constant) = mathify_expression("5 x -2 x + 3 y - 4 y + 10 - 50").unwrap();
/// assert_eq!(coefficients["x"], 3.);
/// assert_eq!(coefficients["y"], -1.);
/// assert_eq!(constant, -40.);
/// ```
pub fn mathify_expression(expression: &str) -> Result<(Coefficients, f64), ReadError> {
    let expression = expression.trim();
    let mut coefficients = Coefficients::new();
    let mut constant = 0.;
    let mut sign = 1.;
    let mut term_start = 0;

    let mut add_term = |term: &str, sign: f64| -> Result<(), ReadError> {
        if term.trim().is_empty() {
            return Ok(());
        }
        match parse_term(term)? {
            (None, value) => constant += sign * value,
            (Some(name), coeff) => *coefficients.entry(name).or_insert(0.) += sign * coeff,
        }
        Ok(())
    };

    for (position, c) in expression.char_indices() {
        if (c == '+' || c == '-') && !is_exponent_sign(expression, term_start, position) {
            add_term(&expression[term_start..position], sign)?;
            sign = if c == '+' { 1. } else { -1. };
            term_start = position + 1;
        }
    }
    add_term(&expression[term_start..], sign)?;
    Ok((coefficients, constant))
}

/// Parse `name: expression`. Without a `:` the expression is unnamed.
pub fn parse_named_expression(named_expression: &str) -> Result<ParsedExpression, ReadError> {
    let named_expression = named_expression.replace('\n', " ");
    let named_expression = named_expression.trim();
    let (name, body) = match named_expression.split_once(':') {
        Some((name, body)) => (Some(name.trim()), body),
        None => (None, named_expression),
    };
    let (coefficients, constant) = mathify_expression(body)?;
    Ok(ParsedExpression {
        name: name.filter(|n| !n.is_empty()).map(str::to_string),
        coefficients,
        constant,
    })
}

/// Byte spans of the relational operators of `text`, in document order
fn find_operators(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = vec![];
    let mut i = 0;
    while i < bytes.len() {
        match OPERATORS.iter().find(|op| bytes[i..].starts_with(op.as_bytes())) {
            Some(op) => {
                spans.push((i, i + op.len()));
                i += op.len();
            }
            None => i += 1,
        }
    }
    spans
}

/// Parse the constraints section.
///
/// Operators delimit constraints: each one ends at the first line break following
/// the right-hand side of its operator, so a constraint may span several lines.
pub fn parse_constraints(section: &str) -> Result<Vec<ParsedConstraint>, ReadError> {
    let mut constraints = vec![];
    let mut start = 0;
    for (op_start, op_end) in find_operators(section) {
        let rhs_start = skip_whitespace(section.as_bytes(), op_end);
        let newline = section[rhs_start..].find('\n').map(|i| rhs_start + i);
        let end = newline.unwrap_or(section.len());
        let raw = section.get(start..end).unwrap_or_default();
        let invalid = |_| ReadError::InvalidConstraint(raw.to_string());

        let lhs = section
            .get(start..op_start)
            .ok_or_else(|| ReadError::InvalidConstraint(raw.to_string()))
            .and_then(parse_named_expression)
            .map_err(invalid)?;
        let (rhs, rhs_const) = mathify_expression(&section[op_end..end]).map_err(invalid)?;
        let sense = ConstraintSense::from_operator(&section[op_start..op_end])
            .ok_or_else(|| ReadError::InvalidConstraint(raw.to_string()))?;

        constraints.push(ParsedConstraint {
            name: lhs.name,
            lhs: lhs.coefficients,
            lhs_const: lhs.constant,
            sense,
            rhs,
            rhs_const,
        });
        start = newline.map_or(section.len(), |n| n + 1);
    }
    let trailing = section.get(start..).unwrap_or_default().trim();
    if !trailing.is_empty() {
        return Err(ReadError::InvalidConstraint(trailing.to_string()));
    }
    Ok(constraints)
}

/// Parse the bounds section.
///
/// Recognized declarations: `x free`, `x = v`, `x <= v`, `x >= v`, `v <= x`,
/// `v >= x` and `v <= x <= w`, separated by any whitespace. `free` and
/// `inf`/`-inf` bounds are stored as infinities.
///
/// Tokens such as `inf` or `nan` are valid variable names as well as numbers.
/// They are read as numbers only in a value position, so `inf <= 5` bounds a
/// variable named `inf` while `-inf <= inf <= 5` declares it free below.
pub fn parse_bounds(section: &str) -> Result<BTreeMap<String, ParsedBound>, ReadError> {
    let tokens: Vec<&str> = section.split_whitespace().collect();
    let sense = |i: usize| tokens.get(i).and_then(|t| ConstraintSense::from_operator(t));
    let value = |i: usize| tokens.get(i).and_then(|t| t.parse::<f64>().ok());
    let is_name = |i: usize| tokens.get(i).is_some_and(|t| check_variable_name(t).is_ok());
    let invalid = |i: usize| ReadError::InvalidBound(tokens[i..tokens.len().min(i + 3)].join(" "));
    let number = |i: usize, start: usize| match value(i) {
        Some(parsed) if parsed.is_nan() => Err(ReadError::InvalidNumber(tokens[i].to_string())),
        Some(parsed) => Ok(parsed),
        None => Err(invalid(start)),
    };
    let name = |i: usize, start: usize| match tokens.get(i) {
        Some(token) => check_variable_name(token)
            .map(|_| *token)
            .map_err(|rule| ReadError::InvalidName {
                name: token.to_string(),
                rule,
            }),
        None => Err(invalid(start)),
    };

    let mut bounds: BTreeMap<String, ParsedBound> = BTreeMap::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens.get(i + 1).is_some_and(|t| t.eq_ignore_ascii_case("free")) {
            let bound = bounds.entry(name(i, i)?.to_string()).or_default();
            bound.lower = Some(f64::NEG_INFINITY);
            bound.upper = Some(f64::INFINITY);
            i += 2;
            continue;
        }
        let first_sense = sense(i + 1).ok_or_else(|| invalid(i))?;
        let value_first = value(i).is_some()
            && (!is_name(i) || (is_name(i + 2) && (value(i + 2).is_none() || sense(i + 3).is_some())));
        if value_first {
            let first_value = number(i, i)?;
            let bound = bounds.entry(name(i + 2, i)?.to_string()).or_default();
            bound.apply(first_sense.reversed(), first_value);
            let start = i;
            i += 3;
            if let Some(second_sense) = sense(i) {
                bound.apply(second_sense, number(i + 1, start)?);
                i += 2;
            }
        } else {
            let variable = name(i, i)?;
            let bound_value = number(i + 2, i)?;
            bounds.entry(variable.to_string()).or_default().apply(first_sense, bound_value);
            i += 3;
        }
    }
    Ok(bounds)
}

/// Parse a whitespace separated list of variable names, as in `Generals` and `Binaries`
pub fn parse_variable_list(section: &str) -> Result<Vec<String>, ReadError> {
    section
        .split_whitespace()
        .map(|name| {
            check_variable_name(name).map_err(|rule| ReadError::InvalidName {
                name: name.to_string(),
                rule,
            })?;
            Ok(name.to_string())
        })
        .collect()
}
