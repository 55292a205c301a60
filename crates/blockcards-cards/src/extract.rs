//! The extraction pass: discovery, per-block note construction, merge and card assembly.

use blockcards_core::prelude::*;
use blockcards_graph::{BlockQuery, GraphProxy};
use blockcards_render::ContentRenderer;
use futures::future::{join_all, try_join_all};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::instrument;

use crate::cloze::{CLOZE_QUERY, ClozeNote};
use crate::dedup::CandidateSet;
use crate::multiline::MultilineCardNote;
use crate::note::Note;
use crate::swift_arrow::{SWIFT_ARROW_QUERY, SwiftArrowNote};
use crate::tags::TagResolver;

/// Notes built by one extractor, with the count of blocks it had to drop
#[derive(Debug)]
pub struct Harvest<T> {
    pub notes: Vec<T>,
    pub dropped: usize,
}

impl<T> Default for Harvest<T> {
    fn default() -> Self {
        Self {
            notes: Vec::new(),
            dropped: 0,
        }
    }
}

/// Notes that survived the merge phase
pub struct CollectedNotes {
    pub notes: Vec<Box<dyn Note>>,
    /// Multi-line candidates removed by the merge
    pub filtered: usize,
    /// Blocks dropped because a query or render failed
    pub dropped: usize,
}

/// Outcome of a full extraction pass
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub cards: Vec<CardPayload>,
    pub filtered: usize,
    pub dropped: usize,
}

/// Run every construction future, keeping successes and dropping failed blocks.
async fn harvest<T, F>(kind: &str, tasks: impl IntoIterator<Item = F>) -> Harvest<T>
where
    F: Future<Output = Result<Option<T>>>,
{
    let mut out = Harvest::default();
    for result in join_all(tasks).await {
        match result {
            Ok(Some(note)) => out.notes.push(note),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Dropping {} candidate: {}", kind, e);
                out.dropped += 1;
            }
        }
    }
    out
}

/// Turns a graph into card payloads.
#[derive(Clone)]
pub struct Extractor {
    graph: Arc<dyn GraphProxy>,
    renderer: Arc<dyn ContentRenderer>,
    config: Arc<ExtractionConfig>,
}

impl Extractor {
    pub fn new(
        graph: Arc<dyn GraphProxy>,
        renderer: Arc<dyn ContentRenderer>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            graph,
            renderer,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Create the card, card-group and tag vocabulary pages if missing.
    #[instrument(skip(self), name = "ensure_vocabulary")]
    pub async fn ensure_vocabulary(&self) -> Result<Vec<Page>> {
        let mut names = vec![
            self.config.card_tag.clone(),
            self.config.card_group_tag.clone(),
        ];
        names.extend(CardTag::vocabulary());

        let pages = try_join_all(
            names
                .iter()
                .map(|name| self.graph.create_page_if_not_exists(name)),
        )
        .await?;
        log::debug!("Vocabulary ready: {} pages", pages.len());
        Ok(pages)
    }

    /// Blocks tagged as cards directly, through an alias, or by a card group.
    ///
    /// The three queries run concurrently; any failure fails discovery.
    #[instrument(skip(self), name = "discover_multiline")]
    pub async fn discover_multiline(&self) -> Result<Vec<Block>> {
        let by_tag = BlockQuery::ReferencesPage(self.config.card_tag.clone());
        let by_alias = BlockQuery::ReferencesPageAlias(self.config.card_tag.clone());
        let by_group = BlockQuery::ChildrenOfTagged(self.config.card_group_tag.clone());

        let (tagged, aliased, grouped) = futures::try_join!(
            self.graph.query(&by_tag),
            self.graph.query(&by_alias),
            self.graph.query(&by_group)
        )?;

        let mut seen = HashSet::new();
        let blocks: Vec<Block> = tagged
            .into_iter()
            .chain(aliased)
            .chain(grouped)
            .filter(|b| seen.insert(b.uuid.clone()))
            .collect();

        log::debug!("Discovered {} multi-line candidates", blocks.len());
        Ok(blocks)
    }

    async fn lookup_page(&self, page: Option<PageId>) -> Result<Option<Page>> {
        match page {
            Some(id) => self.graph.get_page_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Fetch a candidate with its children, its page and its tags.
    ///
    /// `None` when the block disappeared between discovery and construction.
    pub async fn build_multiline(&self, block: &Block) -> Result<Option<MultilineCardNote>> {
        let Some(full) = self
            .graph
            .get_block(&BlockRef::Uuid(block.uuid.clone()), true)
            .await?
        else {
            log::debug!("Block {} vanished before construction", block.uuid);
            return Ok(None);
        };

        let page = self.lookup_page(full.page).await?;
        let tags = TagResolver::new(self.graph.as_ref())
            .classify(&full.refs)
            .await;

        Ok(Some(MultilineCardNote::new(
            full,
            page,
            tags,
            Arc::clone(&self.config),
        )))
    }

    pub async fn extract_multiline(&self) -> Result<Harvest<MultilineCardNote>> {
        let blocks = self.discover_multiline().await?;
        Ok(harvest("multi-line", blocks.iter().map(|b| self.build_multiline(b))).await)
    }

    pub async fn extract_cloze(&self) -> Result<Harvest<ClozeNote>> {
        if !self.config.cloze_enabled {
            return Ok(Harvest::default());
        }
        let blocks = self
            .graph
            .query(&BlockQuery::ContentMatches(CLOZE_QUERY.to_string()))
            .await?;

        Ok(harvest(
            "cloze",
            blocks.into_iter().map(|block| async move {
                let page = self.lookup_page(block.page).await?;
                Ok::<_, Error>(ClozeNote::from_block(
                    block,
                    page,
                    Arc::clone(&self.config),
                ))
            }),
        )
        .await)
    }

    pub async fn extract_swift_arrow(&self) -> Result<Harvest<SwiftArrowNote>> {
        if !self.config.swift_arrow_enabled {
            return Ok(Harvest::default());
        }
        let blocks = self
            .graph
            .query(&BlockQuery::ContentMatches(SWIFT_ARROW_QUERY.to_string()))
            .await?;

        Ok(harvest(
            "swift-arrow",
            blocks.into_iter().map(|block| async move {
                let page = self.lookup_page(block.page).await?;
                Ok::<_, Error>(SwiftArrowNote::from_block(block, page, &self.config))
            }),
        )
        .await)
    }

    /// Run every extractor concurrently and merge their candidates.
    #[instrument(skip(self), name = "collect_notes")]
    pub async fn collect_notes(&self) -> Result<CollectedNotes> {
        let (multiline, cloze, swift) = futures::try_join!(
            self.extract_multiline(),
            self.extract_cloze(),
            self.extract_swift_arrow()
        )?;
        let dropped = multiline.dropped + cloze.dropped + swift.dropped;

        let mut candidates = CandidateSet::new();
        candidates.add_multiline(multiline.notes);
        candidates.add_notes(cloze.notes);
        candidates.add_notes(swift.notes);
        log::debug!("Merging {} candidates", candidates.len());

        let merged = candidates.merge();
        Ok(CollectedNotes {
            notes: merged.notes,
            filtered: merged.filtered,
            dropped,
        })
    }

    /// Full pass: collect notes, then build every card concurrently.
    ///
    /// A card whose rendering fails is dropped and counted; discovery failures
    /// are returned as errors.
    #[instrument(skip(self), fields(graph = %self.config.graph_name), name = "extract_cards")]
    pub async fn extract_cards(&self) -> Result<ExtractionReport> {
        let collected = self.collect_notes().await?;
        let renderer = self.renderer.as_ref();

        let results = join_all(collected.notes.iter().map(|note| async move {
            note.build_card(renderer)
                .await
                .map_err(|e| (note.uuid().to_string(), e))
        }))
        .await;

        let mut report = ExtractionReport {
            filtered: collected.filtered,
            dropped: collected.dropped,
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(card) => report.cards.push(card),
                Err((uuid, e)) => {
                    log::warn!("Dropping card for block {}: {}", uuid, e);
                    report.dropped += 1;
                }
            }
        }

        log::info!(
            "Extracted {} cards ({} merged away, {} dropped)",
            report.cards.len(),
            report.filtered,
            report.dropped
        );
        Ok(report)
    }
}
