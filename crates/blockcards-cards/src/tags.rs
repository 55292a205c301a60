//! Tag resolution: reference-tag ids to the classification vocabulary.

use blockcards_core::prelude::*;
use blockcards_graph::GraphProxy;
use futures::future::join_all;
use std::collections::BTreeSet;

/// Maps a block's reference-tag ids onto recognized tag names.
pub struct TagResolver<'a> {
    graph: &'a dyn GraphProxy,
}

impl<'a> TagResolver<'a> {
    pub fn new(graph: &'a dyn GraphProxy) -> Self {
        Self { graph }
    }

    /// Return the candidate names whose page id is in `tag_ids`, in candidate order.
    ///
    /// A missing page or a failed lookup excludes that candidate only.
    pub async fn resolve(&self, tag_ids: &BTreeSet<PageId>, candidates: &[String]) -> Vec<String> {
        if tag_ids.is_empty() {
            return Vec::new();
        }

        let lookups = candidates.iter().map(|name| async move {
            let page = self.graph.get_page(name).await;
            (name, page)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(name, page)| match page {
                Ok(Some(page)) if tag_ids.contains(&page.id) => Some(name.clone()),
                Ok(_) => None,
                Err(e) => {
                    log::debug!("Tag '{}' could not be resolved: {}", name, e);
                    None
                }
            })
            .collect()
    }

    /// Resolve against the card vocabulary and classify once.
    pub async fn classify(&self, tag_ids: &BTreeSet<PageId>) -> Vec<CardTag> {
        let names = self.resolve(tag_ids, &CardTag::vocabulary()).await;
        classify(&names)
    }
}

/// Convert resolved tag names into typed tags, keeping order and dropping unknown names.
pub fn classify(names: &[String]) -> Vec<CardTag> {
    names.iter().filter_map(|name| CardTag::parse(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blockcards_graph::{BlockQuery, GraphSnapshot, InMemoryGraph};

    fn graph() -> InMemoryGraph {
        let snapshot = GraphSnapshot::new("tags")
            .with_page(Page::new(1, "reversed"))
            .with_page(Page::new(2, "forward"))
            .with_page(Page::new(3, "depth-2"))
            .with_page(Page::new(4, "unrelated"));
        InMemoryGraph::from_snapshot(snapshot).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_follows_candidate_order() {
        let graph = graph();
        let resolver = TagResolver::new(&graph);
        let ids: BTreeSet<PageId> = [3, 1, 2, 4].into_iter().collect();

        let names = resolver.resolve(&ids, &CardTag::vocabulary()).await;
        assert_eq!(names, vec!["forward", "reversed", "depth-2"]);
    }

    #[tokio::test]
    async fn test_missing_pages_are_not_present() {
        let graph = graph();
        let resolver = TagResolver::new(&graph);
        let ids: BTreeSet<PageId> = [1].into_iter().collect();

        let names = resolver
            .resolve(&ids, &["bidirectional".to_string(), "reversed".to_string()])
            .await;
        assert_eq!(names, vec!["reversed"]);
    }

    #[tokio::test]
    async fn test_classify() {
        let graph = graph();
        let resolver = TagResolver::new(&graph);
        let ids: BTreeSet<PageId> = [1, 3].into_iter().collect();
        assert_eq!(
            resolver.classify(&ids).await,
            vec![CardTag::Reversed, CardTag::Depth(2)]
        );
    }

    /// Proxy whose page lookups fail for one name
    struct FlakyPages {
        inner: InMemoryGraph,
        failing: &'static str,
    }

    #[async_trait]
    impl GraphProxy for FlakyPages {
        async fn get_page(&self, name: &str) -> Result<Option<Page>> {
            if name == self.failing {
                return Err(Error::query_failed(format!("page {}", name), "timeout"));
            }
            self.inner.get_page(name).await
        }

        async fn get_page_by_id(&self, id: PageId) -> Result<Option<Page>> {
            self.inner.get_page_by_id(id).await
        }

        async fn get_block(
            &self,
            block: &BlockRef,
            include_children: bool,
        ) -> Result<Option<Block>> {
            self.inner.get_block(block, include_children).await
        }

        async fn query(&self, query: &BlockQuery) -> Result<Vec<Block>> {
            self.inner.query(query).await
        }

        async fn create_page_if_not_exists(&self, name: &str) -> Result<Page> {
            self.inner.create_page_if_not_exists(name).await
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_excludes_only_that_candidate() {
        let flaky = FlakyPages {
            inner: graph(),
            failing: "forward",
        };
        let resolver = TagResolver::new(&flaky);
        let ids: BTreeSet<PageId> = [1, 2].into_iter().collect();

        let names = resolver.resolve(&ids, &CardTag::vocabulary()).await;
        assert_eq!(names, vec!["reversed"]);
    }
}
