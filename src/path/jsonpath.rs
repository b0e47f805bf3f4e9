//! A compact JSONPath evaluator
//!
//! Supports the subset that response root selectors use in practice:
//! dotted and bracketed names, wildcards, recursive descent, indices,
//! slices, unions and `?(...)` filters over `@`-relative paths.
//! Matches come back in document order.

use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{ParseError, Result};

/// Single selector inside a segment
#[derive(Debug, Clone)]
enum Step {
    Name(String),
    Wildcard,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(Box<Expr>),
}

/// One `.x`, `..x` or `[a, b]` component
#[derive(Debug, Clone)]
struct Segment {
    descendant: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Exists(Operand),
    Compare(Operand, CompareOp, Operand),
    Matches(Operand, Regex),
}

#[derive(Debug, Clone)]
enum Operand {
    /// Path relative to the filtered node (`@...`)
    Current(Vec<Segment>),
    /// Path from the document root (`$...`)
    Root(Vec<Segment>),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed JSONPath expression
#[derive(Debug, Clone)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse an expression; it must start with `$`
    pub fn parse(expression: &str) -> Result<Self> {
        let mut parser = Parser::new(expression);
        parser.skip_ws();
        parser.expect('$')?;
        let segments = parser.segments(false)?;
        parser.skip_ws();
        if !parser.at_end() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(JsonPath { segments })
    }

    /// Every node matched by this path, in document order
    pub fn select<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        evaluate(&self.segments, document, document)
    }
}

fn evaluate<'a>(segments: &[Segment], start: &'a Value, root: &'a Value) -> Vec<&'a Value> {
    segments.iter().fold(vec![start], |nodes, segment| {
        let mut next = Vec::new();
        for node in nodes {
            if segment.descendant {
                let mut targets = Vec::new();
                collect_descendants(node, &mut targets);
                for target in targets {
                    apply_steps(&segment.steps, target, root, &mut next);
                }
            } else {
                apply_steps(&segment.steps, node, root, &mut next);
            }
        }
        next
    })
}

/// Pre-order walk including `value` itself
fn collect_descendants<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(value);
    match value {
        Value::Array(arr) => arr.iter().for_each(|v| collect_descendants(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_descendants(v, out)),
        _ => {}
    }
}

fn children(value: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match value {
        Value::Array(arr) => Box::new(arr.iter()),
        Value::Object(map) => Box::new(map.values()),
        _ => Box::new(std::iter::empty()),
    }
}

fn apply_steps<'a>(steps: &[Step], node: &'a Value, root: &'a Value, out: &mut Vec<&'a Value>) {
    for step in steps {
        match step {
            Step::Name(name) => match node {
                Value::Object(map) => out.extend(map.get(name)),
                Value::Array(arr) => out.extend(name.parse::<usize>().ok().and_then(|i| arr.get(i))),
                _ => {}
            },
            Step::Wildcard => out.extend(children(node)),
            Step::Index(index) => {
                if let Value::Array(arr) = node {
                    let len = arr.len() as i64;
                    let i = if *index < 0 { len + index } else { *index };
                    if (0..len).contains(&i) {
                        out.push(&arr[i as usize]);
                    }
                }
            }
            Step::Slice { start, end, step } => {
                if let Value::Array(arr) = node {
                    out.extend(slice_indices(arr.len() as i64, *start, *end, *step).map(|i| &arr[i]));
                }
            }
            Step::Filter(expr) => {
                out.extend(children(node).filter(|child| expr.test(child, root)));
            }
        }
    }
}

fn slice_indices(
    len: i64,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> impl Iterator<Item = usize> {
    let step = step.unwrap_or(1);
    let normalize = move |i: i64| if i >= 0 { i } else { len + i };
    let mut indices = Vec::new();

    if step > 0 {
        let lower = normalize(start.unwrap_or(0)).clamp(0, len);
        let upper = normalize(end.unwrap_or(len)).clamp(0, len);
        let mut i = Some(lower);
        while let Some(index) = i.filter(|&index| index < upper) {
            indices.push(index as usize);
            i = index.checked_add(step);
        }
    } else if step < 0 {
        let upper = normalize(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lower = normalize(end.unwrap_or(-len - 1)).clamp(-1, len - 1);
        let mut i = Some(upper);
        while let Some(index) = i.filter(|&index| lower < index) {
            indices.push(index as usize);
            i = index.checked_add(step);
        }
    }

    indices.into_iter()
}

impl Expr {
    fn test(&self, node: &Value, root: &Value) -> bool {
        match self {
            Expr::Or(a, b) => a.test(node, root) || b.test(node, root),
            Expr::And(a, b) => a.test(node, root) && b.test(node, root),
            Expr::Not(inner) => !inner.test(node, root),
            Expr::Exists(operand) => match operand {
                Operand::Literal(value) => truthy(value),
                _ => operand.resolve(node, root).is_some_and(truthy),
            },
            Expr::Compare(left, op, right) => {
                compare(left.resolve(node, root), *op, right.resolve(node, root))
            }
            Expr::Matches(operand, pattern) => match operand.resolve(node, root) {
                Some(Value::String(s)) => pattern.is_match(s),
                _ => false,
            },
        }
    }
}

impl Operand {
    fn resolve<'a>(&'a self, node: &'a Value, root: &'a Value) -> Option<&'a Value> {
        match self {
            Operand::Current(segments) => evaluate(segments, node, root).into_iter().next(),
            Operand::Root(segments) => evaluate(segments, root, root).into_iter().next(),
            Operand::Literal(value) => Some(value),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn compare(left: Option<&Value>, op: CompareOp, right: Option<&Value>) -> bool {
    let ordering = match (left, right) {
        (None, None) => Some(Ordering::Equal),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
        }
        (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
        (Some(a), Some(b)) if a == b => Some(Ordering::Equal),
        _ => None,
    };

    match op {
        CompareOp::Eq => ordering == Some(Ordering::Equal),
        CompareOp::Ne => ordering != Some(Ordering::Equal),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Parser {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::invalid_path(self.pos, message)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let matches = s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c));
        if matches {
            self.pos += s.chars().count();
        }
        matches
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    /// Parse segments until input ends or (inside a filter) a non-path token
    fn segments(&mut self, in_filter: bool) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();
        loop {
            if in_filter {
                // whitespace ends a relative path inside filters
                if self.peek().is_some_and(char::is_whitespace) {
                    break;
                }
            } else {
                self.skip_ws();
            }

            match self.peek() {
                Some('.') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    let steps = if self.peek() == Some('[') {
                        self.bracket()?
                    } else {
                        vec![self.dotted()?]
                    };
                    segments.push(Segment { descendant: true, steps });
                }
                Some('.') => {
                    self.pos += 1;
                    let step = self.dotted()?;
                    segments.push(Segment { descendant: false, steps: vec![step] });
                }
                Some('[') => {
                    let steps = self.bracket()?;
                    segments.push(Segment { descendant: false, steps });
                }
                _ => break,
            }
        }
        Ok(segments)
    }

    fn dotted(&mut self) -> Result<Step> {
        if self.eat('*') {
            return Ok(Step::Wildcard);
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || ".[]()=!<>&|,'\"~".contains(c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a member name"));
        }
        Ok(Step::Name(self.chars[start..self.pos].iter().collect()))
    }

    fn bracket(&mut self) -> Result<Vec<Step>> {
        self.expect('[')?;
        let mut steps = Vec::new();
        loop {
            self.skip_ws();
            steps.push(self.bracket_item()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            self.expect(']')?;
            return Ok(steps);
        }
    }

    fn bracket_item(&mut self) -> Result<Step> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Step::Wildcard)
            }
            Some('\'') | Some('"') => Ok(Step::Name(self.quoted()?)),
            Some('?') => {
                self.pos += 1;
                self.skip_ws();
                let expr = if self.eat('(') {
                    let expr = self.or_expr()?;
                    self.skip_ws();
                    self.expect(')')?;
                    expr
                } else {
                    self.or_expr()?
                };
                Ok(Step::Filter(Box::new(expr)))
            }
            _ => {
                let start = self.integer()?;
                self.skip_ws();
                if !self.eat(':') {
                    return start
                        .map(Step::Index)
                        .ok_or_else(|| self.error("expected index, name, slice, wildcard or filter"));
                }
                self.skip_ws();
                let end = self.integer()?;
                self.skip_ws();
                let step = if self.eat(':') {
                    self.skip_ws();
                    self.integer()?
                } else {
                    None
                };
                if step == Some(0) {
                    return Err(self.error("slice step cannot be zero"));
                }
                Ok(Step::Slice { start, end, step })
            }
        }
    }

    fn integer(&mut self) -> Result<Option<i64>> {
        let start = self.pos;
        self.eat('-');
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Some)
            .map_err(|_| self.error("invalid integer"))
    }

    fn quoted(&mut self) -> Result<String> {
        let quote = self.peek().ok_or_else(|| self.error("expected string"))?;
        self.pos += 1;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    self.pos += 1;
                    out.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;
        loop {
            self.skip_ws();
            if !self.eat_str("||") {
                return Ok(left);
            }
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            self.skip_ws();
            if !self.eat_str("&&") {
                return Ok(left);
            }
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        if self.eat('(') {
            let expr = self.or_expr()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(expr);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.operand()?;
        self.skip_ws();

        if self.eat_str("=~") {
            self.skip_ws();
            let pattern = self.regex_literal()?;
            return Ok(Expr::Matches(left, pattern));
        }

        let op = if self.eat_str("===") || self.eat_str("==") {
            CompareOp::Eq
        } else if self.eat_str("!==") || self.eat_str("!=") {
            CompareOp::Ne
        } else if self.eat_str("<=") {
            CompareOp::Le
        } else if self.eat_str(">=") {
            CompareOp::Ge
        } else if self.eat('<') {
            CompareOp::Lt
        } else if self.eat('>') {
            CompareOp::Gt
        } else {
            return Ok(Expr::Exists(left));
        };

        self.skip_ws();
        let right = self.operand()?;
        Ok(Expr::Compare(left, op, right))
    }

    fn operand(&mut self) -> Result<Operand> {
        self.skip_ws();
        match self.peek() {
            Some('@') => {
                self.pos += 1;
                Ok(Operand::Current(self.segments(true)?))
            }
            Some('$') => {
                self.pos += 1;
                Ok(Operand::Root(self.segments(true)?))
            }
            Some('\'') | Some('"') => Ok(Operand::Literal(Value::String(self.quoted()?))),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number_literal(),
            _ => {
                if self.eat_str("true") {
                    Ok(Operand::Literal(Value::Bool(true)))
                } else if self.eat_str("false") {
                    Ok(Operand::Literal(Value::Bool(false)))
                } else if self.eat_str("null") {
                    Ok(Operand::Literal(Value::Null))
                } else {
                    Err(self.error("expected a path or literal"))
                }
            }
        }
    }

    fn number_literal(&mut self) -> Result<Operand> {
        let start = self.pos;
        self.eat('-');
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '+')
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        serde_json::from_str::<Value>(&text)
            .ok()
            .filter(Value::is_number)
            .map(Operand::Literal)
            .ok_or_else(|| self.error("invalid number literal"))
    }

    fn regex_literal(&mut self) -> Result<Regex> {
        self.expect('/')?;
        let mut pattern = String::new();
        loop {
            let c = self.peek().ok_or_else(|| self.error("unterminated regex"))?;
            self.pos += 1;
            match c {
                '\\' if self.peek() == Some('/') => {
                    pattern.push('/');
                    self.pos += 1;
                }
                '/' => break,
                c => pattern.push(c),
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_alphabetic()) {
            if "ims".contains(c) {
                flags.push(c);
            }
            self.pos += 1;
        }
        let pattern = if flags.is_empty() {
            pattern
        } else {
            format!("(?{}){}", flags, pattern)
        };
        Regex::new(&pattern).map_err(|e| self.error(&format!("invalid regex: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select(path: &str, doc: &Value) -> Vec<Value> {
        JsonPath::parse(path)
            .unwrap()
            .select(doc)
            .into_iter()
            .cloned()
            .collect()
    }

    fn store() -> Value {
        json!({
            "store": {
                "book": [
                    {"title": "Sayings", "price": 8.95, "tags": ["ref"]},
                    {"title": "Sword", "price": 12.99},
                    {"title": "Moby Dick", "price": 8.99, "isbn": "0-553"},
                    {"title": "Rings", "price": 22.99, "isbn": "0-395"}
                ],
                "bicycle": {"color": "red", "price": 19.95}
            }
        })
    }

    #[test]
    fn test_root_and_children() {
        let doc = json!({"data": [{"a": 1}, {"a": 2}]});
        assert_eq!(select("$", &doc), vec![doc.clone()]);
        assert_eq!(select("$.data[*]", &doc), vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(select("$['data'][1].a", &doc), vec![json!(2)]);
        assert_eq!(select("$.data[*].a", &doc), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_indices_and_slices() {
        let doc = json!([0, 1, 2, 3, 4, 5]);
        assert_eq!(select("$[-1]", &doc), vec![json!(5)]);
        assert_eq!(select("$[1:3]", &doc), vec![json!(1), json!(2)]);
        assert_eq!(select("$[::2]", &doc), vec![json!(0), json!(2), json!(4)]);
        assert_eq!(select("$[-2:]", &doc), vec![json!(4), json!(5)]);
        assert_eq!(select("$[::-2]", &doc), vec![json!(5), json!(3), json!(1)]);
        assert_eq!(select("$[0,2]", &doc), vec![json!(0), json!(2)]);
        assert!(select("$[9]", &doc).is_empty());
    }

    #[test]
    fn test_huge_slice_steps_stop_at_bounds() {
        let doc = json!([0, 1, 2]);
        assert_eq!(select("$[1::9223372036854775807]", &doc), vec![json!(1)]);
        assert_eq!(select("$[1::-9223372036854775808]", &doc), vec![json!(1)]);
        assert_eq!(select("$[::-9223372036854775807]", &doc), vec![json!(2)]);
    }

    #[test]
    fn test_recursive_descent() {
        let titles = select("$..title", &store());
        assert_eq!(titles.len(), 4);
        assert_eq!(titles[0], json!("Sayings"));

        let prices = select("$.store..price", &store());
        assert_eq!(prices.len(), 5);
    }

    #[test]
    fn test_filters() {
        let doc = store();
        let cheap = select("$.store.book[?(@.price < 10)].title", &doc);
        assert_eq!(cheap, vec![json!("Sayings"), json!("Moby Dick")]);

        let with_isbn = select("$..book[?(@.isbn)].title", &doc);
        assert_eq!(with_isbn, vec![json!("Moby Dick"), json!("Rings")]);

        let combined = select("$.store.book[?(@.price > 10 && @.title != 'Rings')].title", &doc);
        assert_eq!(combined, vec![json!("Sword")]);

        let matched = select("$.store.book[?(@.title =~ /^s/i)].price", &doc);
        assert_eq!(matched, vec![json!(8.95), json!(12.99)]);

        let negated = select("$.store.book[?(!@.isbn)].title", &doc);
        assert_eq!(negated, vec![json!("Sayings"), json!("Sword")]);

        let strict = select("$.store.book[?(@.title === \"Sword\")].price", &doc);
        assert_eq!(strict, vec![json!(12.99)]);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(JsonPath::parse("$.").is_err());
        assert!(JsonPath::parse("$[").is_err());
        assert!(JsonPath::parse("$[1:2:0]").is_err());
        assert!(JsonPath::parse("data").is_err());
        assert!(JsonPath::parse("$.a b").is_err());
    }
}
