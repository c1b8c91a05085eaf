//! Scripted in-memory driver for tests.
//!
//! Pages are flat lists of elements keyed by the exact selector string the
//! extractor queries. Elements can show up late, go stale, change text
//! between reads, and reveal other elements when clicked.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{Driver, DriverError};

#[derive(Debug, Clone)]
pub struct FakeElement {
    selector: String,
    texts: Vec<String>,
    class: Option<String>,
    displayed: bool,
    enabled: bool,
    present: bool,
    hidden_polls: u32,
    found_polls: Option<u32>,
    stale_reads: u32,
    reveals: Vec<String>,
    reads: usize,
}

impl FakeElement {
    pub fn new(selector: &str, text: &str) -> Self {
        Self {
            selector: selector.to_string(),
            texts: vec![text.to_string()],
            class: None,
            displayed: true,
            enabled: true,
            present: true,
            hidden_polls: 0,
            found_polls: None,
            stale_reads: 0,
            reveals: Vec::new(),
            reads: 0,
        }
    }

    /// Successive text reads return these in order, then repeat the last
    pub fn texts<const N: usize>(mut self, texts: [&str; N]) -> Self {
        self.texts = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// In the DOM but not rendered
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Not in the DOM until another element's click reveals it
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// Missed by the first `polls` lookups
    pub fn appears_after(mut self, polls: u32) -> Self {
        self.hidden_polls = polls;
        self
    }

    /// Found by the first `polls` lookups only, then removed from the DOM
    pub fn vanishes_after(mut self, polls: u32) -> Self {
        self.found_polls = Some(polls);
        self
    }

    /// First `reads` text reads fail as stale
    pub fn stale_for(mut self, reads: u32) -> Self {
        self.stale_reads = reads;
        self
    }

    /// Clicking makes elements with this selector present
    pub fn reveals(mut self, selector: &str) -> Self {
        self.reveals.push(selector.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeHandle(usize);

#[derive(Default)]
struct FakeDom {
    pages: HashMap<String, Vec<FakeElement>>,
    failing: HashSet<String>,
    current: Vec<FakeElement>,
    visits: Vec<String>,
    clicks: Vec<String>,
}

#[derive(Default)]
pub struct FakeDriver {
    dom: Mutex<FakeDom>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, elements: Vec<FakeElement>) -> Self {
        self.dom
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), elements);
        self
    }

    /// Navigating to `url` fails with a browser error
    pub fn failing(self, url: &str) -> Self {
        self.dom.lock().unwrap().failing.insert(url.to_string());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.dom.lock().unwrap().visits.clone()
    }

    /// Selectors of clicked elements, in click order
    pub fn clicks(&self) -> Vec<String> {
        self.dom.lock().unwrap().clicks.clone()
    }

    fn with_element<T>(
        &self,
        handle: &FakeHandle,
        f: impl FnOnce(&mut FakeElement) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut dom = self.dom.lock().unwrap();
        let element = dom
            .current
            .get_mut(handle.0)
            .ok_or(DriverError::StaleElement)?;
        f(element)
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = FakeHandle;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut dom = self.dom.lock().unwrap();
        dom.visits.push(url.to_string());
        if dom.failing.contains(url) {
            dom.current.clear();
            return Err(DriverError::Browser(format!("net::ERR_CONNECTION_REFUSED at {}", url)));
        }
        dom.current = dom.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeHandle>, DriverError> {
        let mut dom = self.dom.lock().unwrap();
        let mut found = Vec::new();
        for (i, element) in dom.current.iter_mut().enumerate() {
            if element.selector != selector || !element.present {
                continue;
            }
            if element.hidden_polls > 0 {
                element.hidden_polls -= 1;
                continue;
            }
            match element.found_polls.as_mut() {
                Some(0) => continue,
                Some(left) => *left -= 1,
                None => {}
            }
            found.push(FakeHandle(i));
        }
        Ok(found)
    }

    async fn text(&self, element: &FakeHandle) -> Result<String, DriverError> {
        self.with_element(element, |el| {
            if el.stale_reads > 0 {
                el.stale_reads -= 1;
                return Err(DriverError::StaleElement);
            }
            let idx = el.reads.min(el.texts.len().saturating_sub(1));
            el.reads += 1;
            Ok(el.texts.get(idx).cloned().unwrap_or_default())
        })
    }

    async fn attribute(
        &self,
        element: &FakeHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.with_element(element, |el| match name {
            "class" => Ok(el.class.clone()),
            _ => Ok(None),
        })
    }

    async fn is_displayed(&self, element: &FakeHandle) -> Result<bool, DriverError> {
        self.with_element(element, |el| Ok(el.displayed))
    }

    async fn is_enabled(&self, element: &FakeHandle) -> Result<bool, DriverError> {
        self.with_element(element, |el| Ok(el.enabled))
    }

    async fn click(&self, element: &FakeHandle) -> Result<(), DriverError> {
        let mut dom = self.dom.lock().unwrap();
        let clicked = dom
            .current
            .get(element.0)
            .cloned()
            .ok_or(DriverError::StaleElement)?;
        dom.clicks.push(clicked.selector.clone());
        for target in dom
            .current
            .iter_mut()
            .filter(|el| clicked.reveals.contains(&el.selector))
        {
            target.present = true;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.dom.get_mut().unwrap().current.clear();
        Ok(())
    }
}
