//! In-memory presentation model.
//!
//! Stands in for a real presentation host: a [`Deck`] is an ordered list
//! of [`Page`]s, each holding positioned [`Layer`]s. Fresh pages come
//! with the host's default placeholder shapes, which insertion clears
//! before laying out its own text regions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub size: f32,
    /// `#rrggbb`
    pub color: String,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            size: 18.0,
            color: "#000000".to_string(),
            align: TextAlign::Left,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TextLayer {
    pub id: Uuid,
    pub content: String,
    pub bounds: Rect,
    pub style: TextStyle,
}

impl TextLayer {
    pub fn new(content: impl Into<String>, bounds: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            bounds,
            style: TextStyle::default(),
        }
    }
}

/// Host-provided empty shape on a fresh page.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PlaceholderLayer {
    pub id: Uuid,
    pub bounds: Rect,
}

impl PlaceholderLayer {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            bounds: Rect::new(x, y, width, height),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Layer {
    Placeholder(PlaceholderLayer),
    Text(TextLayer),
}

impl Layer {
    pub fn id(&self) -> Uuid {
        match self {
            Layer::Placeholder(p) => p.id,
            Layer::Text(t) => t.id,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    pub layers: Vec<Layer>,
}

impl Page {
    /// Blank page with the default title and body placeholders.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            layers: vec![
                Layer::Placeholder(PlaceholderLayer::new(50.0, 40.0, 620.0, 60.0)),
                Layer::Placeholder(PlaceholderLayer::new(50.0, 120.0, 620.0, 300.0)),
            ],
        }
    }

    pub fn text_layers(&self) -> impl Iterator<Item = &TextLayer> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Text(t) => Some(t),
            Layer::Placeholder(_) => None,
        })
    }

    pub fn text_layer_mut(&mut self, id: Uuid) -> Option<&mut TextLayer> {
        self.layers.iter_mut().find_map(|layer| match layer {
            Layer::Text(t) if t.id == id => Some(t),
            _ => None,
        })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Deck {
    pub id: Uuid,
    pub pages: Vec<Page>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            pages: Vec::new(),
        }
    }

    /// Append a blank page and return its id.
    pub fn add_page(&mut self) -> Uuid {
        let page = Page::new(format!("Slide {}", self.pages.len() + 1));
        let id = page.id;
        self.pages.push(page);
        id
    }

    pub fn page(&self, id: Uuid) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: Uuid) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_has_placeholders() {
        let mut deck = Deck::new();
        let id = deck.add_page();
        let page = deck.page(id).unwrap();
        assert_eq!(page.name, "Slide 1");
        assert_eq!(page.layers.len(), 2);
        assert_eq!(page.text_layers().count(), 0);
    }

    #[test]
    fn test_text_layer_lookup() {
        let mut deck = Deck::new();
        let id = deck.add_page();
        let layer = TextLayer::new("Hallo", Rect::new(50.0, 40.0, 620.0, 60.0));
        let layer_id = layer.id;
        deck.page_mut(id).unwrap().layers.push(Layer::Text(layer));

        let text = deck.page_mut(id).unwrap().text_layer_mut(layer_id).unwrap();
        text.style.bold = true;
        assert!(deck.page(id).unwrap().text_layers().all(|t| t.style.bold));
    }

    #[test]
    fn test_json_export() {
        let mut deck = Deck::new();
        deck.add_page();
        let json = deck.to_json().unwrap();
        let back: Deck = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deck);
    }
}
