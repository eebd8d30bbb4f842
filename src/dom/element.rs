//! Live element tree
//!
//! Elements are shared handles: cloning an [`Element`] clones the handle, not
//! the node. The tree can be mutated from any thread while the recorder holds
//! references into it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Tags that never have a closing tag when serialized
const VOID_TAGS: &[&str] = &["area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Decoded pixels of an `img`, `video` frame or `canvas`
#[derive(Clone, PartialEq, Eq)]
pub struct RasterData {
    pub width: u32,
    pub height: u32,
    /// RGBA8, row major
    pub rgba: Vec<u8>,
}

impl fmt::Debug for RasterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

struct ElementNode {
    tag: String,
    attributes: RwLock<Vec<(String, String)>>,
    value: RwLock<Option<String>>,
    text: RwLock<Option<String>>,
    style: RwLock<HashMap<String, String>>,
    rect: RwLock<Rect>,
    scroll: RwLock<(i32, i32)>,
    raster: RwLock<Option<RasterData>>,
    parent: RwLock<Weak<ElementNode>>,
    children: RwLock<Vec<Element>>,
}

#[derive(Clone)]
pub struct Element(Arc<ElementNode>);

impl Element {
    pub fn new(tag: &str) -> Self {
        Self(Arc::new(ElementNode {
            tag: tag.to_ascii_lowercase(),
            attributes: RwLock::new(Vec::new()),
            value: RwLock::new(None),
            text: RwLock::new(None),
            style: RwLock::new(HashMap::new()),
            rect: RwLock::new(Rect::default()),
            scroll: RwLock::new((0, 0)),
            raster: RwLock::new(None),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    pub fn with_id(self, id: &str) -> Self {
        self.set_attribute("id", id);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.set_attribute("class", class);
        self
    }

    pub fn with_attribute(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_rect(self, rect: Rect) -> Self {
        self.set_rect(rect);
        self
    }

    pub fn with_style(self, property: &str, value: &str) -> Self {
        self.set_style(property, value);
        self
    }

    /// Lowercase tag name
    pub fn tag_name(&self) -> &str {
        &self.0.tag
    }

    /// Empty when the element has no id
    pub fn id(&self) -> String {
        self.get_attribute("id").unwrap_or_default()
    }

    /// Raw `class` attribute, empty when absent
    pub fn class_name(&self) -> String {
        self.get_attribute("class").unwrap_or_default()
    }

    /// Class tokens in declared order, whitespace-only tokens dropped
    pub fn class_list(&self) -> Vec<String> {
        self.class_name().split_whitespace().map(str::to_string).collect()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.0
            .attributes
            .read()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let mut attributes = self.0.attributes.write();
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&self, name: &str) {
        self.0.attributes.write().retain(|(key, _)| key != name);
    }

    /// Current value of a form control
    pub fn value(&self) -> Option<String> {
        self.0.value.read().clone()
    }

    pub fn set_value(&self, value: &str) {
        *self.0.value.write() = Some(value.to_string());
    }

    pub fn text(&self) -> Option<String> {
        self.0.text.read().clone()
    }

    pub fn set_text(&self, text: &str) {
        *self.0.text.write() = Some(text.to_string());
    }

    pub fn set_style(&self, property: &str, value: &str) {
        self.0.style.write().insert(property.to_string(), value.to_string());
    }

    /// Resolved style value, falling back to the user agent default
    pub fn computed_style(&self, property: &str) -> String {
        if let Some(value) = self.0.style.read().get(property) {
            return value.clone();
        }
        let rect = self.bounding_rect();
        match property {
            "background-color" => "rgba(0, 0, 0, 0)".to_string(),
            "color" => "rgb(0, 0, 0)".to_string(),
            "font-size" => "16px".to_string(),
            "border" => "0px none rgb(0, 0, 0)".to_string(),
            "padding" => "0px".to_string(),
            "width" => format!("{}px", rect.width),
            "height" => format!("{}px", rect.height),
            _ => String::new(),
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        *self.0.rect.read()
    }

    pub fn set_rect(&self, rect: Rect) {
        *self.0.rect.write() = rect;
    }

    /// `(scrollLeft, scrollTop)`
    pub fn scroll_offset(&self) -> (i32, i32) {
        *self.0.scroll.read()
    }

    pub fn set_scroll_offset(&self, left: i32, top: i32) {
        *self.0.scroll.write() = (left, top);
    }

    pub fn raster(&self) -> Option<RasterData> {
        self.0.raster.read().clone()
    }

    pub fn set_raster(&self, raster: RasterData) {
        *self.0.raster.write() = Some(raster);
    }

    pub fn parent_element(&self) -> Option<Element> {
        self.0.parent.read().upgrade().map(Element)
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.children.read().clone()
    }

    /// 1-based position among the parent's element children
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent_element()?;
        let siblings = parent.0.children.read();
        siblings.iter().position(|s| s == self).map(|i| i + 1)
    }

    /// Append `child`, detaching it from any previous parent first.
    /// Returns false, leaving the tree unchanged, when `child` is this
    /// element or one of its ancestors.
    pub fn append_child(&self, child: &Element) -> bool {
        if self.has_inclusive_ancestor(child) {
            tracing::warn!("Refusing to append {:?} into its own subtree", child);
            return false;
        }
        if let Some(old_parent) = child.parent_element() {
            old_parent.remove_child(child);
        }
        *child.0.parent.write() = Arc::downgrade(&self.0);
        self.0.children.write().push(child.clone());
        true
    }

    fn has_inclusive_ancestor(&self, candidate: &Element) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if &node == candidate {
                return true;
            }
            current = node.parent_element();
        }
        false
    }

    pub fn remove_child(&self, child: &Element) -> bool {
        let mut children = self.0.children.write();
        let before = children.len();
        children.retain(|c| c != child);
        let removed = children.len() != before;
        drop(children);
        if removed {
            *child.0.parent.write() = Weak::new();
        }
        removed
    }

    /// Depth-first search of this subtree, including `self`
    pub fn find(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<Element> {
        if predicate(self) {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.find(predicate))
    }

    pub fn outer_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html);
        html
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.0.tag);
        for (name, value) in self.0.attributes.read().iter() {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value, true));
            out.push('"');
        }
        out.push('>');

        if VOID_TAGS.contains(&self.0.tag.as_str()) {
            return;
        }

        if let Some(text) = self.0.text.read().as_deref() {
            out.push_str(&escape(text, false));
        }
        for child in self.children() {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.0.tag);
        out.push('>');
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' if !attribute => escaped.push_str("&lt;"),
            '>' if !attribute => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.0.tag)?;
        let id = self.id();
        if !id.is_empty() {
            write!(f, "#{}", id)?;
        }
        for class in self.class_list() {
            write!(f, ".{}", class)?;
        }
        write!(f, ">")
    }
}

/// A page's element tree: `html > (head, body)`
#[derive(Clone)]
pub struct Document {
    document_element: Element,
    head: Element,
    body: Element,
}

impl Document {
    pub fn new() -> Self {
        let document_element = Element::new("html");
        let head = Element::new("head");
        let body = Element::new("body");
        document_element.append_child(&head);
        document_element.append_child(&body);
        Self {
            document_element,
            head,
            body,
        }
    }

    pub fn document_element(&self) -> &Element {
        &self.document_element
    }

    pub fn head(&self) -> &Element {
        &self.head
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.document_element.find(&|el| el.id() == id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
