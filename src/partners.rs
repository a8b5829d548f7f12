//! Partner logos and their manual display order.
//!
//! [`PartnerBoard`] owns the in-memory partner list for one admin session.
//! The list is always sorted ascending by `sort_order` (stable, so equal keys
//! keep their insertion order). Every mutation goes to the store first and
//! only touches local state once the store has accepted it.
//!
//! ## Ordering keys
//!
//! New partners get `max(sort_order) + 1` (or `1` for the first). The maximum
//! is taken over the local list, so two sessions adding at the same moment can
//! hand out the same key; nothing in the store prevents that.
//!
//! Moving a partner swaps its key with its neighbor's. The updates are
//! sent concurrently and are not transactional: if some land and others
//! fail, the store keeps the ones that landed and the board reports [`PartnerError::PartialSwap`]. Reload to see the stored order.
//!
//! Swapping equal keys (the race above) would change nothing, so a move first
//! raises every key that does not exceed its predecessor's to predecessor + 1.
//! After a successful move the keys are strictly increasing; with no ties this
//! touches exactly the two swapped partners.

use crate::catalog::Catalog;
use crate::naming::{self, UploadKind};
use crate::remote::{self, ObjectStorage, Query, Record, RemoteCollection, RemoteError};
use crate::schema;
use crate::types::{Direction, Partner};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartnerError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Schema(#[from] schema::SchemaError),
    #[error("partner name must not be empty")]
    EmptyName,
    #[error("no partner '{0}'")]
    NotFound(String),
    #[error("sort_order keys are exhausted; renumber partners before adding or moving")]
    SortOrderOverflow,
    #[error("reorder of '{moved}' and '{neighbor}' was only partly stored: {source}")]
    PartialSwap {
        moved: String,
        neighbor: String,
        #[source]
        source: RemoteError,
    },
}

/// What a [`PartnerBoard::move_partner`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moved {
    Swapped,
    /// Already at the edge in that direction.
    Unchanged,
}

/// Session-local partner list backed by the store.
pub struct PartnerBoard<S> {
    store: Arc<S>,
    bucket: String,
    partners: Vec<Partner>,
}

impl<S> PartnerBoard<S>
where
    S: RemoteCollection + ObjectStorage,
{
    /// An empty board. Call [`load`](Self::load) to populate it.
    pub fn new(store: Arc<S>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            partners: Vec::new(),
        }
    }

    /// Fetch partners ordered by `sort_order`.
    ///
    /// On query failure the board shows the catalog's partners instead and
    /// returns `false`.
    pub async fn load(&mut self, catalog: &Catalog) -> bool {
        let query = Query::new().order_by("sort_order", true);
        match self.store.query(remote::PARTNERS, &query).await {
            Ok(rows) => {
                self.partners = rows
                    .into_iter()
                    .filter_map(|row| match schema::partner_from_record(row) {
                        Ok(p) => Some(p),
                        Err(e) => {
                            tracing::warn!(error = %e, "skipping undecodable partner row");
                            None
                        }
                    })
                    .collect();
                self.sort();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "partner query failed, serving catalog partners");
                self.partners = catalog.partners.clone();
                self.sort();
                false
            }
        }
    }

    /// Partners in display order.
    pub fn list(&self) -> &[Partner] {
        &self.partners
    }

    /// Upload a logo, then store a new partner after the current last one.
    ///
    /// Nothing changes locally unless both the upload and the insert succeed.
    pub async fn add(
        &mut self,
        name: &str,
        logo_filename: &str,
        logo: &[u8],
    ) -> Result<Partner, PartnerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PartnerError::EmptyName);
        }

        let sort_order = self.next_sort_order()?;

        let key = naming::object_key(UploadKind::PartnerLogo, logo_filename, logo);
        if let Err(e) = self.store.upload_object(&self.bucket, &key, logo).await {
            tracing::warn!(error = %e, partner = name, "logo upload failed");
            return Err(e.into());
        }
        let logo_url = self.store.public_url(&self.bucket, &key);

        let mut record = Record::new();
        record.insert("name".into(), Value::from(name));
        record.insert("logo_url".into(), Value::from(logo_url));
        record.insert("sort_order".into(), Value::from(sort_order));

        let stored = match self.store.insert(remote::PARTNERS, record).await {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, partner = name, "partner insert failed");
                return Err(e.into());
            }
        };
        let partner = schema::partner_from_record(stored)?;
        tracing::info!(id = %partner.id, sort_order = partner.sort_order, "added partner");
        self.partners.push(partner.clone());
        self.sort();
        Ok(partner)
    }

    /// Delete a partner from the store, then from the board.
    pub async fn remove(&mut self, id: &str) -> Result<(), PartnerError> {
        if let Err(e) = self.store.delete(remote::PARTNERS, id).await {
            tracing::warn!(error = %e, id, "partner delete failed");
            return Err(e.into());
        }
        self.partners.retain(|p| p.id != id);
        tracing::info!(id, "removed partner");
        Ok(())
    }

    /// Move a partner one place up or down by swapping keys with its neighbor.
    pub async fn move_partner(
        &mut self,
        id: &str,
        direction: Direction,
    ) -> Result<Moved, PartnerError> {
        let index = self
            .partners
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PartnerError::NotFound(id.to_string()))?;
        let neighbor = match direction {
            Direction::Up if index == 0 => return Ok(Moved::Unchanged),
            Direction::Down if index + 1 == self.partners.len() => return Ok(Moved::Unchanged),
            Direction::Up => index - 1,
            Direction::Down => index + 1,
        };

        // Position `p` of the new order keeps the key that was at `p`, so the
        // two partners trade keys. Ties anywhere are bumped apart on the way.
        let keys: Vec<i64> = self.partners.iter().map(|p| p.sort_order).collect();
        let assigned = strictly_increasing(&keys).ok_or(PartnerError::SortOrderOverflow)?;
        let plan: Vec<(usize, i64)> = assigned
            .iter()
            .enumerate()
            .map(|(position, &key)| {
                let holder = match position {
                    p if p == index => neighbor,
                    p if p == neighbor => index,
                    p => p,
                };
                (holder, key)
            })
            .filter(|&(holder, key)| self.partners[holder].sort_order != key)
            .collect();

        let results = futures::future::join_all(plan.iter().map(|&(holder, key)| {
            self.store
                .update(remote::PARTNERS, &self.partners[holder].id, sort_patch(key))
        }))
        .await;
        let stored = results.iter().filter(|r| r.is_ok()).count();
        if let Some(e) = results.into_iter().find_map(Result::err) {
            if stored == 0 {
                tracing::warn!(error = %e, id, "partner reorder failed");
                return Err(e.into());
            }
            tracing::warn!(error = %e, id, stored, "partner reorder only partly stored");
            return Err(PartnerError::PartialSwap {
                moved: self.partners[index].id.clone(),
                neighbor: self.partners[neighbor].id.clone(),
                source: e,
            });
        }

        for (holder, key) in plan {
            self.partners[holder].sort_order = key;
        }
        self.partners.swap(index, neighbor);
        self.sort();
        tracing::info!(id, ?direction, "reordered partner");
        Ok(Moved::Swapped)
    }

    fn next_sort_order(&self) -> Result<i64, PartnerError> {
        let max = self.partners.iter().map(|p| p.sort_order).max().unwrap_or(0);
        max.checked_add(1).ok_or(PartnerError::SortOrderOverflow)
    }

    fn sort(&mut self) {
        self.partners.sort_by_key(|p| p.sort_order);
    }
}

/// Keys for the partners in display order, raised just enough to be strictly
/// increasing. `None` if that would pass `i64::MAX`.
fn strictly_increasing(keys: &[i64]) -> Option<Vec<i64>> {
    let mut out: Vec<i64> = Vec::with_capacity(keys.len());
    for &key in keys {
        let next = match out.last() {
            Some(&prev) if key <= prev => prev.checked_add(1)?,
            _ => key,
        };
        out.push(next);
    }
    Some(out)
}

fn sort_patch(sort_order: i64) -> Record {
    let mut patch = Record::new();
    patch.insert("sort_order".into(), Value::from(sort_order));
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fault, LocalStore};
    use crate::test_helpers::*;

    async fn board_with(names: &[(&str, i64)]) -> (Arc<LocalStore>, PartnerBoard<LocalStore>) {
        let store = Arc::new(LocalStore::in_memory("https://cdn.test"));
        for (id, order) in names {
            insert_partner(&store, id, *order).await;
        }
        let mut board = PartnerBoard::new(store.clone(), "project-images");
        assert!(board.load(&Catalog::default()).await);
        (store, board)
    }

    async fn stored_order(store: &LocalStore) -> Vec<(String, i64)> {
        store
            .query(remote::PARTNERS, &Query::new().order_by("sort_order", true))
            .await
            .unwrap()
            .into_iter()
            .map(|r| {
                let p = schema::partner_from_record(r).unwrap();
                (p.id, p.sort_order)
            })
            .collect()
    }

    #[tokio::test]
    async fn load_sorts_by_sort_order() {
        let (_, board) = board_with(&[("c", 30), ("a", 10), ("b", 20)]).await;
        assert_eq!(partner_ids(board.list()), ["a", "b", "c"]);
        assert_sort_order_ascending(board.list());
    }

    #[tokio::test]
    async fn load_falls_back_to_catalog_partners() {
        let store = Arc::new(LocalStore::in_memory("https://cdn.test"));
        store.fail(Fault::Query("partners".into()));
        let mut board = PartnerBoard::new(store, "project-images");
        let catalog = Catalog::bundled().unwrap();
        assert!(!board.load(&catalog).await);
        assert_eq!(board.list().len(), catalog.partners.len());
        assert_sort_order_ascending(board.list());
    }

    #[tokio::test]
    async fn add_uploads_logo_and_appends_with_next_key() {
        let (store, mut board) = board_with(&[("a", 4), ("b", 9)]).await;
        let partner = board.add("Acme", "acme.svg", b"<svg/>").await.unwrap();

        assert_eq!(partner.sort_order, 10);
        assert_eq!(partner_ids(board.list()).last(), Some(&partner.id.as_str()));
        let key = partner.logo_url.rsplit('/').next().unwrap();
        assert!(key.starts_with("partner-") && key.ends_with(".svg"));
        assert_eq!(
            store.object("project-images", key).await.as_deref(),
            Some(&b"<svg/>"[..])
        );
    }

    #[tokio::test]
    async fn first_partner_gets_key_one() {
        let (_, mut board) = board_with(&[]).await;
        let partner = board.add("Acme", "acme.png", b"png").await.unwrap();
        assert_eq!(partner.sort_order, 1);
    }

    #[tokio::test]
    async fn add_rejects_blank_name() {
        let (_, mut board) = board_with(&[]).await;
        let err = board.add("   ", "x.png", b"x").await.unwrap_err();
        assert!(matches!(err, PartnerError::EmptyName));
    }

    #[tokio::test]
    async fn failed_upload_leaves_board_untouched() {
        let (store, mut board) = board_with(&[("a", 1)]).await;
        store.fail(Fault::Upload);
        let err = board.add("Acme", "acme.png", b"png").await.unwrap_err();
        assert!(matches!(err, PartnerError::Remote(RemoteError::Upload { .. })));
        assert_eq!(partner_ids(board.list()), ["a"]);
        assert_eq!(stored_order(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn failed_insert_leaves_board_untouched() {
        let (store, mut board) = board_with(&[("a", 1)]).await;
        store.fail(Fault::Insert("partners".into()));
        assert!(board.add("Acme", "acme.png", b"png").await.is_err());
        assert_eq!(partner_ids(board.list()), ["a"]);
    }

    #[tokio::test]
    async fn remove_deletes_remotely_then_locally() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        board.remove("a").await.unwrap();
        assert_eq!(partner_ids(board.list()), ["b"]);
        assert_eq!(stored_order(&store).await, [("b".to_string(), 2)]);
    }

    #[tokio::test]
    async fn failed_remove_keeps_local_order() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        store.fail(Fault::Delete("partners".into()));
        assert!(board.remove("a").await.is_err());
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
    }

    #[tokio::test]
    async fn move_up_on_first_is_noop() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        let moved = board.move_partner("a", Direction::Up).await.unwrap();
        assert_eq!(moved, Moved::Unchanged);
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
        assert_eq!(
            stored_order(&store).await,
            [("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn move_down_on_last_is_noop() {
        let (_, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        let moved = board.move_partner("b", Direction::Down).await.unwrap();
        assert_eq!(moved, Moved::Unchanged);
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
    }

    #[tokio::test]
    async fn move_swaps_exactly_two_keys() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 5), ("c", 9)]).await;
        let moved = board.move_partner("c", Direction::Up).await.unwrap();
        assert_eq!(moved, Moved::Swapped);
        assert_eq!(partner_ids(board.list()), ["a", "c", "b"]);
        assert_eq!(
            stored_order(&store).await,
            [
                ("a".to_string(), 1),
                ("c".to_string(), 5),
                ("b".to_string(), 9)
            ]
        );
    }

    #[tokio::test]
    async fn move_down_then_reload_matches() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2), ("c", 3)]).await;
        board.move_partner("a", Direction::Down).await.unwrap();
        assert_eq!(partner_ids(board.list()), ["b", "a", "c"]);

        let mut reloaded = PartnerBoard::new(store, "project-images");
        reloaded.load(&Catalog::default()).await;
        assert_eq!(partner_ids(reloaded.list()), ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn move_with_tied_keys_produces_distinct_keys() {
        let (_, mut board) = board_with(&[("a", 3), ("b", 3)]).await;
        board.move_partner("b", Direction::Up).await.unwrap();
        assert_eq!(partner_ids(board.list()), ["b", "a"]);
        assert_eq!(board.list()[0].sort_order, 3);
        assert_eq!(board.list()[1].sort_order, 4);
    }

    #[tokio::test]
    async fn move_unknown_partner_is_not_found() {
        let (_, mut board) = board_with(&[("a", 1)]).await;
        let err = board.move_partner("ghost", Direction::Up).await.unwrap_err();
        assert!(matches!(err, PartnerError::NotFound(_)));
    }

    #[tokio::test]
    async fn partial_swap_is_reported_and_not_rolled_back() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        store.fail(Fault::UpdateOf("a".into()));

        let err = board.move_partner("b", Direction::Up).await.unwrap_err();
        assert!(matches!(err, PartnerError::PartialSwap { .. }));
        // Local state untouched; the store kept b's half of the swap.
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
        let stored = stored_order(&store).await;
        assert!(stored.contains(&("b".to_string(), 1)));
        assert!(stored.contains(&("a".to_string(), 1)));
    }

    #[tokio::test]
    async fn failed_swap_leaves_everything_as_is() {
        let (store, mut board) = board_with(&[("a", 1), ("b", 2)]).await;
        store.fail(Fault::Update("partners".into()));
        let err = board.move_partner("a", Direction::Down).await.unwrap_err();
        assert!(matches!(err, PartnerError::Remote(_)));
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
        assert_eq!(
            stored_order(&store).await,
            [("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn move_through_tied_run_renumbers_later_keys() {
        let (store, mut board) = board_with(&[("a", 3), ("b", 3), ("c", 4)]).await;
        board.move_partner("b", Direction::Up).await.unwrap();

        assert_eq!(partner_ids(board.list()), ["b", "a", "c"]);
        let keys: Vec<i64> = board.list().iter().map(|p| p.sort_order).collect();
        assert_eq!(keys, [3, 4, 5]);
        assert_eq!(
            stored_order(&store).await,
            [
                ("b".to_string(), 3),
                ("a".to_string(), 4),
                ("c".to_string(), 5)
            ]
        );
    }

    #[tokio::test]
    async fn move_with_tie_above_pair_leaves_no_duplicates() {
        let (store, mut board) = board_with(&[("x", 3), ("a", 3), ("b", 3)]).await;
        board.move_partner("b", Direction::Up).await.unwrap();

        assert_eq!(partner_ids(board.list()), ["x", "b", "a"]);
        let stored = stored_order(&store).await;
        let mut keys: Vec<i64> = stored.iter().map(|(_, k)| *k).collect();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn move_at_key_limit_is_refused() {
        let (store, mut board) = board_with(&[("a", i64::MAX), ("b", i64::MAX)]).await;
        let err = board.move_partner("b", Direction::Up).await.unwrap_err();
        assert!(matches!(err, PartnerError::SortOrderOverflow));
        assert_eq!(partner_ids(board.list()), ["a", "b"]);
        assert_eq!(
            stored_order(&store).await,
            [("a".to_string(), i64::MAX), ("b".to_string(), i64::MAX)]
        );
    }

    #[tokio::test]
    async fn add_at_key_limit_is_refused_before_upload() {
        let (store, mut board) = board_with(&[("a", i64::MAX)]).await;
        let err = board.add("Acme", "acme.png", b"png").await.unwrap_err();
        assert!(matches!(err, PartnerError::SortOrderOverflow));
        assert_eq!(partner_ids(board.list()), ["a"]);
        let key = naming::object_key(UploadKind::PartnerLogo, "acme.png", b"png");
        assert!(store.object("project-images", &key).await.is_none());
    }

    #[test]
    fn strictly_increasing_keeps_distinct_keys() {
        assert_eq!(strictly_increasing(&[1, 5, 9]), Some(vec![1, 5, 9]));
        assert_eq!(strictly_increasing(&[]), Some(vec![]));
    }

    #[test]
    fn strictly_increasing_bumps_ties_and_their_followers() {
        assert_eq!(strictly_increasing(&[3, 3, 4]), Some(vec![3, 4, 5]));
        assert_eq!(strictly_increasing(&[2, 2, 2, 9]), Some(vec![2, 3, 4, 9]));
        assert_eq!(strictly_increasing(&[i64::MAX, i64::MAX]), None);
    }
}
