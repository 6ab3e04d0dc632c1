//! Field resolution over an unstable DOM.
//!
//! A logical field is described by a [`LocatorSpec`]: an ordered list of
//! [`Strategy`] values. Resolution walks the list in order and stops at the
//! first strategy that yields a non-empty value; later strategies are never
//! evaluated. A strategy that overruns its lookup budget counts as a miss.
//! The budget is measured after the strategy returns, not enforced while it
//! runs: lookups work on in-memory snapshots, so an overrun is discarded
//! rather than interrupted.
//!
//! Containers (section anchors, repeated items) are found the same way
//! through [`ElementLocator`] and [`Locate`].

use std::collections::HashSet;
use std::time::{Duration, Instant};

use log::debug;
use scraper::{ElementRef, Selector};

/// Parses a selector literal. Panics on malformed input, so only use it for
/// selectors compiled into the binary.
pub fn css(source: &str) -> Selector {
    Selector::parse(source).unwrap_or_else(|e| panic!("invalid selector `{}`: {:?}", source, e))
}

/// Whitespace-collapsed text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for word in element.text().flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read {
    Text,
    Attr(&'static str),
}

/// One way of pulling a value out of a scope.
pub trait Strategy {
    fn describe(&self) -> String;

    /// Every non-empty value this strategy finds, in document order.
    fn attempt(&self, scope: ElementRef<'_>) -> Vec<String>;
}

/// CSS selection, reading text or an attribute, optionally filtered.
pub struct Css {
    source: String,
    selector: Selector,
    read: Read,
    accept: Option<fn(&str) -> bool>,
}

impl Css {
    pub fn text(source: &str) -> Self {
        Css {
            source: source.to_string(),
            selector: css(source),
            read: Read::Text,
            accept: None,
        }
    }

    pub fn attr(source: &str, attr: &'static str) -> Self {
        Css {
            read: Read::Attr(attr),
            ..Css::text(source)
        }
    }

    pub fn accept(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = Some(accept);
        self
    }
}

impl Strategy for Css {
    fn describe(&self) -> String {
        match self.read {
            Read::Text => self.source.clone(),
            Read::Attr(attr) => format!("{} @{}", self.source, attr),
        }
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Vec<String> {
        scope
            .select(&self.selector)
            .filter_map(|el| match self.read {
                Read::Text => Some(element_text(el)),
                Read::Attr(attr) => el.value().attr(attr).map(|v| v.trim().to_string()),
            })
            .filter(|v| !v.is_empty())
            .filter(|v| self.accept.map_or(true, |accept| accept(v)))
            .collect()
    }
}

/// Elements whose text mentions `needle` (case-insensitive).
pub struct Contains {
    source: String,
    selector: Selector,
    needle: String,
}

impl Contains {
    pub fn new(source: &str, needle: &str) -> Self {
        Contains {
            source: source.to_string(),
            selector: css(source),
            needle: needle.to_lowercase(),
        }
    }
}

impl Strategy for Contains {
    fn describe(&self) -> String {
        format!("{} ~ \"{}\"", self.source, self.needle)
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Vec<String> {
        scope
            .select(&self.selector)
            .map(element_text)
            .filter(|text| text.to_lowercase().contains(&self.needle))
            .collect()
    }
}

type ValueFn = Box<dyn Fn(ElementRef<'_>) -> Vec<String>>;

/// Arbitrary extraction logic behind a label.
pub struct Custom {
    label: String,
    f: ValueFn,
}

impl Custom {
    pub fn new<F>(label: &str, f: F) -> Self
    where
        F: Fn(ElementRef<'_>) -> Vec<String> + 'static,
    {
        Custom {
            label: label.to_string(),
            f: Box::new(f),
        }
    }
}

impl Strategy for Custom {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn attempt(&self, scope: ElementRef<'_>) -> Vec<String> {
        (self.f)(scope)
    }
}

/// Outcome of resolving one field. Never an error: `NotFound` means "use the
/// default".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found { value: String, strategy: usize },
    NotFound,
}

impl Resolution {
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::NotFound => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Resolution::Found { value, .. } => Some(value),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

/// Ordered candidate strategies for one logical field.
pub struct LocatorSpec {
    field: &'static str,
    strategies: Vec<Box<dyn Strategy>>,
}

impl LocatorSpec {
    pub fn new(field: &'static str) -> Self {
        LocatorSpec {
            field,
            strategies: Vec::new(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn with(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn text(self, source: &str) -> Self {
        self.with(Css::text(source))
    }

    pub fn text_if(self, source: &str, accept: fn(&str) -> bool) -> Self {
        self.with(Css::text(source).accept(accept))
    }

    pub fn attr(self, source: &str, attr: &'static str) -> Self {
        self.with(Css::attr(source, attr))
    }

    pub fn attr_if(self, source: &str, attr: &'static str, accept: fn(&str) -> bool) -> Self {
        self.with(Css::attr(source, attr).accept(accept))
    }

    pub fn containing(self, source: &str, needle: &str) -> Self {
        self.with(Contains::new(source, needle))
    }

    /// Runs strategies in order until one yields values. Returns the values
    /// and the index of the winning strategy. A strategy whose attempt took
    /// longer than `budget` is dropped after the fact.
    fn first_hit(&self, scope: ElementRef<'_>, budget: Duration) -> Option<(Vec<String>, usize)> {
        for (idx, strategy) in self.strategies.iter().enumerate() {
            let started = Instant::now();
            let values = strategy.attempt(scope);
            if started.elapsed() > budget {
                debug!(
                    "{}: strategy #{} ({}) exceeded {:?}, skipping",
                    self.field,
                    idx,
                    strategy.describe(),
                    budget
                );
                continue;
            }
            if !values.is_empty() {
                return Some((values, idx));
            }
        }
        None
    }
}

/// Resolves a single value for `spec` inside `scope`.
pub fn resolve(scope: ElementRef<'_>, spec: &LocatorSpec, budget: Duration) -> Resolution {
    match spec.first_hit(scope, budget) {
        Some((mut values, strategy)) => Resolution::Found {
            value: values.swap_remove(0),
            strategy,
        },
        None => Resolution::NotFound,
    }
}

/// Every value found by the first productive strategy, in document order.
pub fn resolve_all(scope: ElementRef<'_>, spec: &LocatorSpec, budget: Duration) -> Vec<String> {
    spec.first_hit(scope, budget)
        .map(|(values, _)| values)
        .unwrap_or_default()
}

/// One way of finding container elements below a scope.
pub trait Locate {
    fn describe(&self) -> String;

    /// Matching elements in document order, never including `scope` itself.
    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>>;
}

fn below<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    let scope_id = scope.id();
    scope.select(selector).filter(|el| el.id() != scope_id).collect()
}

pub struct CssLocate {
    source: String,
    selector: Selector,
}

impl CssLocate {
    pub fn new(source: &str) -> Self {
        CssLocate {
            source: source.to_string(),
            selector: css(source),
        }
    }
}

impl Locate for CssLocate {
    fn describe(&self) -> String {
        self.source.clone()
    }

    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        below(scope, &self.selector)
    }
}

/// Matches that are not nested inside another match (below the scope).
pub struct TopLevel {
    source: String,
    selector: Selector,
}

impl TopLevel {
    pub fn new(source: &str) -> Self {
        TopLevel {
            source: source.to_string(),
            selector: css(source),
        }
    }
}

impl Locate for TopLevel {
    fn describe(&self) -> String {
        format!("top-level {}", self.source)
    }

    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let scope_id = scope.id();
        below(scope, &self.selector)
            .into_iter()
            .filter(|el| {
                !el.ancestors()
                    .take_while(|node| node.id() != scope_id)
                    .filter_map(ElementRef::wrap)
                    .any(|ancestor| self.selector.matches(&ancestor))
            })
            .collect()
    }
}

/// Matches of `base` that contain at least one match of `required`.
pub struct Having {
    base_source: String,
    base: Selector,
    required_source: String,
    required: Selector,
}

impl Having {
    pub fn new(base: &str, required: &str) -> Self {
        Having {
            base_source: base.to_string(),
            base: css(base),
            required_source: required.to_string(),
            required: css(required),
        }
    }
}

impl Locate for Having {
    fn describe(&self) -> String {
        format!("{} having {}", self.base_source, self.required_source)
    }

    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        below(scope, &self.base)
            .into_iter()
            .filter(|el| !below(*el, &self.required).is_empty())
            .collect()
    }
}

/// The `<section>` that encloses the element carrying `id`.
pub struct SectionById {
    id: String,
    selector: Selector,
    section: Selector,
}

impl SectionById {
    pub fn new(id: &str) -> Self {
        SectionById {
            id: id.to_string(),
            selector: css(&format!("[id=\"{}\"]", id)),
            section: css("section"),
        }
    }
}

impl Locate for SectionById {
    fn describe(&self) -> String {
        format!("section around #{}", self.id)
    }

    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let scope_id = scope.id();
        let mut seen = HashSet::new();
        below(scope, &self.selector)
            .into_iter()
            .filter_map(|marker| {
                marker
                    .ancestors()
                    .take_while(|node| node.id() != scope_id)
                    .filter_map(ElementRef::wrap)
                    .find(|ancestor| self.section.matches(ancestor))
            })
            .filter(|section| seen.insert(section.id()))
            .collect()
    }
}

/// `<section>` elements whose heading starts with the given words.
pub struct SectionByHeading {
    heading: String,
    section: Selector,
    title: Selector,
}

impl SectionByHeading {
    pub fn new(heading: &str) -> Self {
        SectionByHeading {
            heading: heading.to_lowercase(),
            section: css("section"),
            title: css("h2"),
        }
    }
}

impl Locate for SectionByHeading {
    fn describe(&self) -> String {
        format!("section headed \"{}\"", self.heading)
    }

    fn locate<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        below(scope, &self.section)
            .into_iter()
            .filter(|section| {
                section
                    .select(&self.title)
                    .next()
                    .map(|h| element_text(h).to_lowercase().starts_with(&self.heading))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Ordered candidate strategies for locating containers.
pub struct ElementLocator {
    name: &'static str,
    strategies: Vec<Box<dyn Locate>>,
}

impl ElementLocator {
    pub fn new(name: &'static str) -> Self {
        ElementLocator {
            name,
            strategies: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn with(mut self, strategy: impl Locate + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn css(self, source: &str) -> Self {
        self.with(CssLocate::new(source))
    }

    pub fn top_level(self, source: &str) -> Self {
        self.with(TopLevel::new(source))
    }

    pub fn having(self, base: &str, required: &str) -> Self {
        self.with(Having::new(base, required))
    }

    pub fn section_by_id(self, id: &str) -> Self {
        self.with(SectionById::new(id))
    }

    pub fn section_by_heading(self, heading: &str) -> Self {
        self.with(SectionByHeading::new(heading))
    }

    /// All matches of the first strategy that finds anything.
    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for strategy in &self.strategies {
            let found = strategy.locate(scope);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// First match and the index of the strategy that produced it.
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<(ElementRef<'a>, usize)> {
        self.strategies.iter().enumerate().find_map(|(idx, strategy)| {
            strategy
                .locate(scope)
                .into_iter()
                .next()
                .map(|el| (el, idx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::thread;

    const BUDGET: Duration = Duration::from_millis(250);

    fn counting(label: &'static str, calls: Rc<RefCell<Vec<&'static str>>>, value: Option<&'static str>) -> Custom {
        Custom::new(label, move |_| {
            calls.borrow_mut().push(label);
            value.map(|v| vec![v.to_string()]).unwrap_or_default()
        })
    }

    #[test]
    fn first_productive_strategy_wins_and_later_ones_never_run() {
        let doc = Html::parse_document("<p>x</p>");
        let calls = Rc::new(RefCell::new(Vec::new()));
        let spec = LocatorSpec::new("name")
            .with(counting("a", calls.clone(), None))
            .with(counting("b", calls.clone(), Some("Jane")))
            .with(counting("c", calls.clone(), Some("Other")))
            .with(counting("d", calls.clone(), Some("Another")));

        let result = resolve(doc.root_element(), &spec, BUDGET);
        assert_eq!(result, Resolution::Found { value: "Jane".into(), strategy: 1 });
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn empty_text_is_not_a_match() {
        let doc = Html::parse_document(
            r#"<h1 class="title">   </h1><div class="top"><h1>Jane Doe</h1></div>"#,
        );
        let spec = LocatorSpec::new("name").text("h1.title").text(".top h1");
        assert_eq!(
            resolve(doc.root_element(), &spec, BUDGET),
            Resolution::Found { value: "Jane Doe".into(), strategy: 1 }
        );
    }

    #[test]
    fn nothing_matching_is_not_found() {
        let doc = Html::parse_document("<p>x</p>");
        let spec = LocatorSpec::new("name").text("h1").attr("img", "src");
        assert_eq!(resolve(doc.root_element(), &spec, BUDGET), Resolution::NotFound);
        assert!(resolve_all(doc.root_element(), &spec, BUDGET).is_empty());
    }

    #[test]
    fn slow_strategy_counts_as_a_miss() {
        let doc = Html::parse_document("<p>x</p>");
        let spec = LocatorSpec::new("headline")
            .with(Custom::new("slow", |_| {
                thread::sleep(Duration::from_millis(40));
                vec!["late".to_string()]
            }))
            .with(Custom::new("fast", |_| vec!["on time".to_string()]));

        let result = resolve(doc.root_element(), &spec, Duration::from_millis(5));
        assert_eq!(result.value(), Some("on time"));
    }

    #[test]
    fn filters_attributes_and_containing_text() {
        let doc = Html::parse_document(
            r#"<img src="logo.png"><img class="p" src="https://cdn/profile-displayphoto-shrink_100_100/x">
               <ul><li>Berlin</li><li>500+ connections</li></ul>"#,
        );
        let pic = LocatorSpec::new("pic").attr_if("img", "src", |v| v.contains("profile"));
        assert_eq!(
            resolve(doc.root_element(), &pic, BUDGET).value(),
            Some("https://cdn/profile-displayphoto-shrink_100_100/x")
        );
        let conn = LocatorSpec::new("connections").containing("li", "Connection");
        assert_eq!(resolve(doc.root_element(), &conn, BUDGET).value(), Some("500+ connections"));
    }

    #[test]
    fn resolve_all_keeps_document_order() {
        let doc = Html::parse_document("<ul><li>a</li><li> </li><li>b</li></ul>");
        let spec = LocatorSpec::new("items").text("li");
        assert_eq!(resolve_all(doc.root_element(), &spec, BUDGET), vec!["a", "b"]);
    }

    #[test]
    fn top_level_skips_nested_matches() {
        let doc = Html::parse_document(
            r#"<section><ul>
                 <li id="one"><ul><li id="nested"></li></ul></li>
                 <li id="two"></li>
               </ul></section>"#,
        );
        let section = doc.select(&css("section")).next().unwrap();
        let items = ElementLocator::new("items").top_level("li").all(section);
        let ids: Vec<_> = items.iter().filter_map(|e| e.value().id()).collect();
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[test]
    fn sections_by_marker_and_heading() {
        let doc = Html::parse_document(
            r#"<main>
                 <section class="a"><div id="about"></div><p>About me</p></section>
                 <section class="b"><h2><span>Education</span></h2></section>
               </main>"#,
        );
        let root = doc.root_element();

        let (about, idx) = ElementLocator::new("about")
            .css("section#about")
            .section_by_id("about")
            .first(root)
            .unwrap();
        assert_eq!(idx, 1);
        assert_eq!(about.value().attr("class"), Some("a"));

        let edu = ElementLocator::new("education").section_by_heading("Education").all(root);
        assert_eq!(edu.len(), 1);
        assert_eq!(edu[0].value().attr("class"), Some("b"));
    }

    #[test]
    fn having_requires_descendant_and_excludes_scope() {
        let doc = Html::parse_document(
            r#"<ul class="outer"><li class="role"><b>Lead</b></li><li class="desc">text</li></ul>"#,
        );
        let outer = doc.select(&css("ul.outer")).next().unwrap();
        let roles = ElementLocator::new("roles").having("li", "b").all(outer);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].value().attr("class"), Some("role"));
    }
}
