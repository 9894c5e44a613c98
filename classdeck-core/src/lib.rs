//! Core data model for classdeck: slide records, the review list,
//! content categories, class settings, payload transforms and the
//! in-memory deck used as a presentation stand-in.

pub mod category;
pub mod deck;
pub mod settings;
pub mod slide;
pub mod transform;

pub use category::{ContentCategory, UnknownCategory};
pub use deck::{Deck, Layer, Page, PlaceholderLayer, Rect, TextAlign, TextLayer, TextStyle};
pub use settings::Settings;
pub use slide::{ReviewCursor, SlideKind, SlideList, SlideRecord};
pub use transform::{transform_edited, transform_payload, PayloadShape};
