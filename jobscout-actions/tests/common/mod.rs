#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use jobscout_drivers::{BrowserSession, DomNode, ElementRef, ElementSummary};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A page that scrolls in fixed steps up to `max_offset` and renders the
/// selector's matches once enough scrolls have happened.
#[derive(Default)]
pub struct FakeSession {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    offset: f64,
    max_offset: f64,
    scrolls: u32,
    queries: u32,
    /// Matches appear after this many scrolls; `None` means never.
    appear_after: Option<u32>,
    matches: Vec<ElementSummary>,
    nodes: Vec<DomNode>,
    detached: Vec<String>,
    fail_upload: Option<String>,
    fail_scroll: bool,
    uploads: Vec<(String, PathBuf)>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    url: String,
    /// `document.readyState` answers in order; the last one repeats.
    ready_states: VecDeque<String>,
    ready_calls: u32,
    fail_ready: bool,
}

impl FakeSession {
    pub fn new() -> Self {
        let s = Self::default();
        s.state.lock().unwrap().max_offset = f64::MAX;
        s
    }

    /// Page can scroll down at most `max_offset` pixels.
    pub fn with_max_offset(self, max_offset: f64) -> Self {
        self.state.lock().unwrap().max_offset = max_offset;
        self
    }

    pub fn with_matches_after(self, scrolls: u32, count: usize) -> Self {
        {
            let mut st = self.state.lock().unwrap();
            st.appear_after = Some(scrolls);
            st.matches = (0..count)
                .map(|i| ElementSummary {
                    tag: "li".into(),
                    text: format!("Job {i}"),
                })
                .collect();
        }
        self
    }

    pub fn with_nodes(self, nodes: Vec<DomNode>) -> Self {
        self.state.lock().unwrap().nodes = nodes;
        self
    }

    pub fn with_detached(self, xpath: &str) -> Self {
        self.state.lock().unwrap().detached.push(xpath.into());
        self
    }

    pub fn with_failing_upload(self, cause: &str) -> Self {
        self.state.lock().unwrap().fail_upload = Some(cause.into());
        self
    }

    pub fn with_failing_scroll(self) -> Self {
        self.state.lock().unwrap().fail_scroll = true;
        self
    }

    pub fn with_ready_states(self, states: &[&str]) -> Self {
        self.state.lock().unwrap().ready_states = states.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_failing_ready_state(self) -> Self {
        self.state.lock().unwrap().fail_ready = true;
        self
    }

    pub fn ready_calls(&self) -> u32 {
        self.state.lock().unwrap().ready_calls
    }

    pub fn scrolls(&self) -> u32 {
        self.state.lock().unwrap().scrolls
    }

    pub fn queries(&self) -> u32 {
        self.state.lock().unwrap().queries
    }

    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn url(&self) -> String {
        self.state.lock().unwrap().url.clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url())
    }

    async fn evaluate(&self, _script: &str, _args: Vec<Value>) -> Result<Value> {
        Ok(Value::Null)
    }

    async fn find_elements(&self, _selector: &str) -> Result<Vec<ElementSummary>> {
        let mut st = self.state.lock().unwrap();
        st.queries += 1;
        match st.appear_after {
            Some(n) if st.scrolls >= n => Ok(st.matches.clone()),
            _ => Ok(vec![]),
        }
    }

    async fn interactive_elements(&self) -> Result<Vec<DomNode>> {
        Ok(self.state.lock().unwrap().nodes.clone())
    }

    async fn dom_element_by_index(&self, index: usize) -> Result<Option<DomNode>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .find(|n| n.index == Some(index))
            .cloned())
    }

    async fn locate_element(&self, node: &DomNode) -> Result<Option<ElementRef>> {
        let st = self.state.lock().unwrap();
        if st.detached.contains(&node.xpath) {
            return Ok(None);
        }
        Ok(Some(ElementRef {
            xpath: node.xpath.clone(),
        }))
    }

    async fn set_input_files(&self, element: &ElementRef, path: &Path) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        if let Some(cause) = &st.fail_upload {
            return Err(anyhow!("{cause}"));
        }
        st.uploads.push((element.xpath.clone(), path.to_path_buf()));
        Ok(())
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.state.lock().unwrap().clicks.push(element.xpath.clone());
        Ok(())
    }

    async fn type_text(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .typed
            .push((element.xpath.clone(), text.to_string()));
        Ok(())
    }

    async fn scroll_offset(&self) -> Result<f64> {
        Ok(self.state.lock().unwrap().offset)
    }

    async fn scroll_by(&self, amount: i64) -> Result<()> {
        let mut st = self.state.lock().unwrap();
        if st.fail_scroll {
            return Err(anyhow!("javascript error: window is gone"));
        }
        st.scrolls += 1;
        st.offset = (st.offset + amount as f64).clamp(0.0, st.max_offset);
        Ok(())
    }

    async fn ready_state(&self) -> Result<String> {
        let mut st = self.state.lock().unwrap();
        st.ready_calls += 1;
        if st.fail_ready {
            return Err(anyhow!("no such window"));
        }
        let state = match st.ready_states.len() {
            0 => "complete".to_string(),
            1 => st.ready_states[0].clone(),
            _ => st.ready_states.pop_front().unwrap_or_default(),
        };
        Ok(state)
    }
}

pub fn node(index: Option<usize>, tag: &str, attrs: &[(&str, &str)], xpath: &str) -> DomNode {
    DomNode {
        index,
        tag: tag.into(),
        attributes: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        xpath: xpath.into(),
        text: String::new(),
        children: vec![],
    }
}

/// A label at index 2 wrapping a file input, and a plain button at index 5.
pub fn upload_form() -> Vec<DomNode> {
    let mut label = node(Some(2), "label", &[], "/html/body/form/label");
    label.children.push(node(
        None,
        "input",
        &[("type", "file")],
        "/html/body/form/label/input",
    ));
    vec![label, node(Some(5), "button", &[], "/html/body/form/button")]
}

/// Write a PDF whose pages carry the given text; `None` is a page with no text.
pub fn write_pdf(path: &Path, pages: &[Option<&str>]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Point the `Contents` of `page_number` at an object that does not exist.
pub fn break_page_contents(path: &Path, page_number: u32) {
    let mut doc = Document::load(path).unwrap();
    let page_id = doc.get_pages()[&page_number];
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .unwrap()
        .set("Contents", Object::Reference((9999, 0)));
    doc.save(path).unwrap();
}
