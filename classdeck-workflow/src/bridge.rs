//! Slide → Presentation Bridge
//!
//! Hands approved slide records to a presentation collaborator. Every
//! record is first planned into an explicit list of [`InsertStep`]s, then
//! the steps are applied strictly in order, each awaited before the next
//! is issued, because the collaborator's object model only exposes a new
//! slide once its creation has committed.
//!
//! # Architecture
//!
//! ```text
//!  SlideRecord ──plan_slide──▸ [CreateBlank, Refetch, ClearDefaults, AddText…]
//!                                        │
//!                                 insert_slides (sequential, awaited)
//!                                        ▼
//!                           PresentationCollaborator (Deck, host API)
//! ```
//!
//! A failure stops the run. Slides already inserted stay inserted.

use async_trait::async_trait;
use classdeck_core::{Deck, Layer, Rect, SlideRecord, TextAlign, TextLayer, TextStyle};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------
// Error types
// ---------------------------------------------------------------

/// A collaborator call was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Errors from an insertion run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("{source}")]
    Step {
        /// 0-based index of the slide being inserted
        slide: usize,
        step: &'static str,
        source: CollaboratorError,
    },

    #[error("No slides to insert.")]
    Empty,
}

// ---------------------------------------------------------------
// Collaborator interface
// ---------------------------------------------------------------

#[async_trait]
pub trait PresentationCollaborator: Send {
    type Handle: Clone + Send + Sync;
    type Region: Send + Sync;

    /// Append a blank slide.
    async fn create_blank_container(&mut self) -> Result<Self::Handle, CollaboratorError>;

    /// Re-read a freshly created slide. Hosts that hand out live handles
    /// can keep the default.
    async fn fetch_container(
        &mut self,
        handle: Self::Handle,
    ) -> Result<Self::Handle, CollaboratorError> {
        Ok(handle)
    }

    /// Delete the host's default placeholder shapes.
    async fn clear_default_contents(
        &mut self,
        handle: &Self::Handle,
    ) -> Result<(), CollaboratorError>;

    async fn add_text_region(
        &mut self,
        handle: &Self::Handle,
        text: &str,
        bounds: Rect,
    ) -> Result<Self::Region, CollaboratorError>;

    async fn style_text(
        &mut self,
        region: &Self::Region,
        style: &TextStyle,
    ) -> Result<(), CollaboratorError>;
}

// ---------------------------------------------------------------
// Layout plan
// ---------------------------------------------------------------

const LEFT: f32 = 50.0;
const WIDTH: f32 = 620.0;
const TITLE_COLOR: &str = "#d13438";
const MUTED_COLOR: &str = "#605e5c";
const BODY_COLOR: &str = "#323130";

#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub text: String,
    pub bounds: Rect,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertStep {
    CreateBlank,
    Refetch,
    ClearDefaults,
    AddText(TextRegion),
}

impl InsertStep {
    pub fn name(&self) -> &'static str {
        match self {
            InsertStep::CreateBlank => "create slide",
            InsertStep::Refetch => "fetch slide",
            InsertStep::ClearDefaults => "clear placeholders",
            InsertStep::AddText(_) => "add text",
        }
    }
}

/// Ordered steps that put `record` on a fresh slide.
///
/// The title region is always present; subtitle, content and example
/// only when non-empty, and content/example never on a Title slide.
pub fn plan_slide(record: &SlideRecord) -> Vec<InsertStep> {
    let is_title = record.is_title();
    let align = if is_title { TextAlign::Center } else { TextAlign::Left };
    let mut steps = vec![InsertStep::CreateBlank, InsertStep::Refetch, InsertStep::ClearDefaults];

    steps.push(InsertStep::AddText(TextRegion {
        text: record.title.clone(),
        bounds: Rect::new(
            LEFT,
            if is_title { 180.0 } else { 40.0 },
            WIDTH,
            if is_title { 80.0 } else { 60.0 },
        ),
        style: TextStyle {
            bold: true,
            italic: false,
            size: if is_title { 44.0 } else { 32.0 },
            color: TITLE_COLOR.to_string(),
            align,
        },
    }));

    if !record.subtitle.is_empty() {
        steps.push(InsertStep::AddText(TextRegion {
            text: record.subtitle.clone(),
            bounds: Rect::new(LEFT, if is_title { 270.0 } else { 100.0 }, WIDTH, 40.0),
            style: TextStyle {
                bold: false,
                italic: false,
                size: if is_title { 24.0 } else { 20.0 },
                color: MUTED_COLOR.to_string(),
                align,
            },
        }));
    }

    if is_title {
        return steps;
    }

    if !record.body.is_empty() {
        steps.push(InsertStep::AddText(TextRegion {
            text: record.body.clone(),
            bounds: Rect::new(LEFT, 160.0, WIDTH, 100.0),
            style: TextStyle {
                bold: false,
                italic: false,
                size: 18.0,
                color: BODY_COLOR.to_string(),
                align,
            },
        }));
    }

    if !record.example.is_empty() {
        steps.push(InsertStep::AddText(TextRegion {
            text: record.example.clone(),
            bounds: Rect::new(LEFT, 280.0, WIDTH, 60.0),
            style: TextStyle {
                bold: false,
                italic: true,
                size: 16.0,
                color: MUTED_COLOR.to_string(),
                align,
            },
        }));
    }

    steps
}

// ---------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------

/// Insert `slides` in order. `progress(i, n)` is called before slide `i`
/// (1-based) of `n`. Returns the number of slides inserted.
pub async fn insert_slides<C>(
    collaborator: &mut C,
    slides: &[SlideRecord],
    mut progress: impl FnMut(usize, usize) + Send,
) -> Result<usize, InsertError>
where
    C: PresentationCollaborator + ?Sized,
{
    if slides.is_empty() {
        return Err(InsertError::Empty);
    }
    let total = slides.len();
    for (index, record) in slides.iter().enumerate() {
        progress(index + 1, total);
        log::info!("Inserting slide {} of {total}", index + 1);

        let mut handle: Option<C::Handle> = None;
        for step in plan_slide(record) {
            let fail = |source: CollaboratorError| InsertError::Step {
                slide: index,
                step: step.name(),
                source,
            };
            match &step {
                InsertStep::CreateBlank => {
                    handle = Some(collaborator.create_blank_container().await.map_err(fail)?);
                }
                InsertStep::Refetch => {
                    let created = handle.take().ok_or_else(|| missing_handle(index, &step))?;
                    handle = Some(collaborator.fetch_container(created).await.map_err(fail)?);
                }
                InsertStep::ClearDefaults => {
                    let current = handle.as_ref().ok_or_else(|| missing_handle(index, &step))?;
                    collaborator.clear_default_contents(current).await.map_err(fail)?;
                }
                InsertStep::AddText(region) => {
                    let current = handle.as_ref().ok_or_else(|| missing_handle(index, &step))?;
                    let added = collaborator
                        .add_text_region(current, &region.text, region.bounds)
                        .await
                        .map_err(fail)?;
                    collaborator.style_text(&added, &region.style).await.map_err(fail)?;
                }
            }
        }
    }
    Ok(total)
}

fn missing_handle(slide: usize, step: &InsertStep) -> InsertError {
    InsertError::Step {
        slide,
        step: step.name(),
        source: CollaboratorError("slide handle unavailable".to_string()),
    }
}

// ---------------------------------------------------------------
// In-memory collaborator
// ---------------------------------------------------------------

/// Presentation collaborator backed by an in-memory [`Deck`].
#[derive(Debug, Default)]
pub struct DeckCollaborator {
    deck: Deck,
}

impl DeckCollaborator {
    pub fn new(deck: Deck) -> Self {
        Self { deck }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn into_deck(self) -> Deck {
        self.deck
    }
}

#[async_trait]
impl PresentationCollaborator for DeckCollaborator {
    type Handle = Uuid;
    type Region = (Uuid, Uuid);

    async fn create_blank_container(&mut self) -> Result<Uuid, CollaboratorError> {
        Ok(self.deck.add_page())
    }

    async fn clear_default_contents(&mut self, handle: &Uuid) -> Result<(), CollaboratorError> {
        let page = self
            .deck
            .page_mut(*handle)
            .ok_or_else(|| CollaboratorError(format!("slide {handle} not found")))?;
        page.layers.clear();
        Ok(())
    }

    async fn add_text_region(
        &mut self,
        handle: &Uuid,
        text: &str,
        bounds: Rect,
    ) -> Result<(Uuid, Uuid), CollaboratorError> {
        let page = self
            .deck
            .page_mut(*handle)
            .ok_or_else(|| CollaboratorError(format!("slide {handle} not found")))?;
        let layer = TextLayer::new(text, bounds);
        let id = layer.id;
        page.layers.push(Layer::Text(layer));
        Ok((*handle, id))
    }

    async fn style_text(
        &mut self,
        region: &(Uuid, Uuid),
        style: &TextStyle,
    ) -> Result<(), CollaboratorError> {
        let (page_id, layer_id) = *region;
        let layer = self
            .deck
            .page_mut(page_id)
            .and_then(|page| page.text_layer_mut(layer_id))
            .ok_or_else(|| CollaboratorError(format!("text region {layer_id} not found")))?;
        layer.style = style.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdeck_core::SlideKind;

    fn vocab() -> SlideRecord {
        SlideRecord::new(SlideKind::Vocabulary, "der Apfel")
            .with_subtitle("the apple")
            .with_body("A fruit.")
            .with_example("Ich esse einen Apfel.")
    }

    /// Fails the n-th `add_text_region` call.
    struct FlakyCollaborator {
        inner: DeckCollaborator,
        regions_left: usize,
    }

    #[async_trait]
    impl PresentationCollaborator for FlakyCollaborator {
        type Handle = Uuid;
        type Region = (Uuid, Uuid);

        async fn create_blank_container(&mut self) -> Result<Uuid, CollaboratorError> {
            self.inner.create_blank_container().await
        }

        async fn clear_default_contents(&mut self, handle: &Uuid) -> Result<(), CollaboratorError> {
            self.inner.clear_default_contents(handle).await
        }

        async fn add_text_region(
            &mut self,
            handle: &Uuid,
            text: &str,
            bounds: Rect,
        ) -> Result<(Uuid, Uuid), CollaboratorError> {
            if self.regions_left == 0 {
                return Err(CollaboratorError("shape limit reached".to_string()));
            }
            self.regions_left -= 1;
            self.inner.add_text_region(handle, text, bounds).await
        }

        async fn style_text(
            &mut self,
            region: &(Uuid, Uuid),
            style: &TextStyle,
        ) -> Result<(), CollaboratorError> {
            self.inner.style_text(region, style).await
        }
    }

    #[test]
    fn test_plan_title_slide() {
        let record = SlideRecord::new(SlideKind::Title, "Food")
            .with_subtitle("A1")
            .with_body("ignored on title slides");
        let steps = plan_slide(&record);
        assert_eq!(steps.len(), 5);
        let InsertStep::AddText(title) = &steps[3] else {
            panic!("expected title region");
        };
        assert_eq!(title.bounds, Rect::new(50.0, 180.0, 620.0, 80.0));
        assert_eq!(title.style.size, 44.0);
        assert_eq!(title.style.align, TextAlign::Center);
        assert!(title.style.bold);
    }

    #[test]
    fn test_plan_content_slide() {
        let steps = plan_slide(&vocab());
        let regions: Vec<&TextRegion> = steps
            .iter()
            .filter_map(|s| match s {
                InsertStep::AddText(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].bounds.y, 40.0);
        assert_eq!(regions[1].bounds.y, 100.0);
        assert_eq!(regions[2].bounds.y, 160.0);
        assert!(regions[3].style.italic);
        assert_eq!(regions[3].style.color, "#605e5c");
    }

    #[test]
    fn test_plan_skips_empty_fields() {
        let steps = plan_slide(&SlideRecord::new(SlideKind::Quiz, "Question 1"));
        assert_eq!(steps.len(), 4);
    }

    #[tokio::test]
    async fn test_insert_into_deck() {
        let mut collab = DeckCollaborator::default();
        let slides = vec![SlideRecord::new(SlideKind::Title, "Food"), vocab()];
        let mut seen = Vec::new();

        let inserted = insert_slides(&mut collab, &slides, |i, n| seen.push((i, n)))
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
        let deck = collab.into_deck();
        assert_eq!(deck.pages.len(), 2);
        // placeholders cleared, only text regions left
        assert_eq!(deck.pages[0].layers.len(), 1);
        assert_eq!(deck.pages[1].text_layers().count(), 4);
        let title = deck.pages[1].text_layers().next().unwrap();
        assert_eq!(title.content, "der Apfel");
        assert_eq!(title.style.color, "#d13438");
    }

    #[tokio::test]
    async fn test_insert_empty_is_refused() {
        let mut collab = DeckCollaborator::default();
        let result = insert_slides(&mut collab, &[], |_, _| {}).await;
        assert_eq!(result, Err(InsertError::Empty));
        assert!(collab.deck().pages.is_empty());
    }

    #[tokio::test]
    async fn test_partial_insert_is_not_rolled_back() {
        let mut collab = FlakyCollaborator {
            inner: DeckCollaborator::default(),
            regions_left: 5,
        };
        let slides = vec![vocab(), vocab()];
        let err = insert_slides(&mut collab, &slides, |_, _| {}).await.unwrap_err();

        assert!(matches!(err, InsertError::Step { slide: 1, step: "add text", .. }));
        assert_eq!(err.to_string(), "shape limit reached");
        assert_eq!(collab.inner.deck().pages.len(), 2);
        assert_eq!(collab.inner.deck().pages[0].text_layers().count(), 4);
    }
}
