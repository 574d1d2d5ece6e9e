use regex::Regex;

/// How a matching rule turns its regex match into a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The whole match.
    Whole,
    /// A numbered capture group.
    Group(usize),
    /// A fixed value, emitted whenever the pattern matches.
    Literal(&'static str),
}

/// Post-processing applied to a raw capture. Returning `None` rejects it.
pub type Refine = fn(&str) -> Option<String>;

/// One candidate surface form for a field.
#[derive(Clone)]
pub struct Rule {
    pub label: String,
    regex: Regex,
    capture: Capture,
    refine: Option<Refine>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("pattern", &self.regex.as_str())
            .field("capture", &self.capture)
            .field("refined", &self.refine.is_some())
            .finish()
    }
}

impl Rule {
    /// Build a rule from a pattern known at compile time.
    ///
    /// Panics on an invalid pattern, which is a programming error.
    pub fn new(label: impl Into<String>, pattern: &str, capture: Capture) -> Self {
        let regex = Regex::new(pattern).expect("invalid rule pattern");
        Self { label: label.into(), regex, capture, refine: None }
    }

    pub fn with_refine(mut self, refine: Refine) -> Self {
        self.refine = Some(refine);
        self
    }

    /// Value this rule yields for `text`, if any.
    ///
    /// Matches are tried left to right; a match whose value is blank (or
    /// rejected by the refine step) is skipped in favour of the next one.
    pub fn apply(&self, text: &str) -> Option<String> {
        match self.capture {
            Capture::Whole => self
                .regex
                .find_iter(text)
                .find_map(|m| self.accept(m.as_str())),
            Capture::Group(n) => self
                .regex
                .captures_iter(text)
                .find_map(|c| c.get(n).and_then(|m| self.accept(m.as_str()))),
            Capture::Literal(v) => self.regex.is_match(text).then(|| v.to_string()),
        }
    }

    fn accept(&self, raw: &str) -> Option<String> {
        let value = match self.refine {
            Some(refine) => refine(raw.trim())?,
            None => raw.to_string(),
        };
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Ordered candidate rules for a single field. The first rule that yields a
/// value wins and the rest are skipped, so list order is the tie-break.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Closed-set substring match: each literal matches itself and yields
    /// itself, in the given order.
    pub fn literals(values: &[&'static str]) -> Self {
        let rules = values
            .iter()
            .map(|&v| Rule::new(v, &regex::escape(v), Capture::Literal(v)))
            .collect();
        Self { rules }
    }

    /// Dates anchored on a label keyword. Combinations are ordered keyword
    /// first, then date shape, so an earlier keyword in any shape beats a
    /// later keyword.
    ///
    /// `keywords` and `shapes` are `(label, pattern)` pairs; the date is
    /// captured as group 1.
    pub fn keyword_dates(keywords: &[(&str, &str)], shapes: &[(&str, &str)]) -> Self {
        let mut rules = Vec::with_capacity(keywords.len() * shapes.len());
        for (kw_label, kw) in keywords {
            for (shape_label, shape) in shapes {
                rules.push(Rule::new(
                    format!("{kw_label} {shape_label}"),
                    &format!(r"{kw}[: ]*({shape})"),
                    Capture::Group(1),
                ));
            }
        }
        Self { rules }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn first_match(&self, text: &str) -> Option<String> {
        self.first_hit(text).map(|(_, v)| v)
    }

    /// Like [`first_match`](Self::first_match), also returning the rule that fired.
    pub fn first_hit(&self, text: &str) -> Option<(&Rule, String)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(text).map(|v| (rule, v)))
    }
}
