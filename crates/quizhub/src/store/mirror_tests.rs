// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

#[tokio::test]
async fn initialize_adds_once_then_reports_existed() {
    let mirror = FallbackMirror::new();
    assert_eq!(mirror.initialize("q1", "alice").await.unwrap(), InitOutcome::Added);
    assert_eq!(mirror.initialize("q1", "alice").await.unwrap(), InitOutcome::Existed);
    assert_eq!(mirror.score("q1", "alice").await.unwrap(), Some(0));
}

#[tokio::test]
async fn increment_creates_with_score_equal_to_delta_if_absent() {
    let mirror = FallbackMirror::new();
    let score = mirror.increment("q1", "alice", 7).await.unwrap();
    assert_eq!(score, 7);
}

#[tokio::test]
async fn top_n_sorts_descending_with_increasing_ranks() {
    let mirror = FallbackMirror::new();
    mirror.increment("q1", "alice", 3).await.unwrap();
    mirror.increment("q1", "bob", 5).await.unwrap();
    mirror.increment("q1", "carol", 1).await.unwrap();

    let rows = mirror.top_n("q1", 10).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].user_id, "bob");
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[1].user_id, "alice");
    assert_eq!(rows[1].rank, 2);
    assert_eq!(rows[2].user_id, "carol");
    assert_eq!(rows[2].rank, 3);
}

#[tokio::test]
async fn top_n_is_bounded_by_requested_n_and_size() {
    let mirror = FallbackMirror::new();
    for i in 0..5 {
        mirror.increment("q1", &format!("user{i}"), i).await.unwrap();
    }
    assert_eq!(mirror.top_n("q1", 3).await.unwrap().len(), 3);
    assert_eq!(mirror.top_n("q1", 100).await.unwrap().len(), 5);
}

#[tokio::test]
async fn empty_quiz_returns_empty_top_n() {
    let mirror = FallbackMirror::new();
    assert!(mirror.top_n("ghost", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn rank_and_score_are_none_for_unknown_user() {
    let mirror = FallbackMirror::new();
    mirror.increment("q1", "alice", 1).await.unwrap();
    assert_eq!(mirror.rank("q1", "bob").await.unwrap(), None);
    assert_eq!(mirror.score("q1", "bob").await.unwrap(), None);
}

#[tokio::test]
async fn remove_then_delete_clear_state() {
    let mirror = FallbackMirror::new();
    mirror.increment("q1", "alice", 1).await.unwrap();
    mirror.increment("q1", "bob", 2).await.unwrap();

    mirror.remove("q1", "alice").await.unwrap();
    assert_eq!(mirror.size("q1").await.unwrap(), 1);

    mirror.delete("q1").await.unwrap();
    assert_eq!(mirror.size("q1").await.unwrap(), 0);
}

proptest! {
    /// Invariant 1: for any sequence of initialize/increment on a fixed
    /// (quiz, user), the final score equals the sum of non-negative deltas.
    #[test]
    fn final_score_equals_sum_of_deltas(deltas in prop::collection::vec(0i64..1000, 0..50)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mirror = FallbackMirror::new();
            mirror.initialize("q1", "alice").await.unwrap();
            let mut expected = 0i64;
            for delta in &deltas {
                expected += delta;
                mirror.increment("q1", "alice", *delta).await.unwrap();
            }
            let score = mirror.score("q1", "alice").await.unwrap().unwrap_or(0);
            prop_assert_eq!(score, expected);
            Ok(())
        })?;
    }

    /// Invariant 4: initialize never decreases an existing score.
    #[test]
    fn initialize_never_lowers_existing_score(delta in 0i64..1000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mirror = FallbackMirror::new();
            mirror.increment("q1", "alice", delta).await.unwrap();
            let before = mirror.score("q1", "alice").await.unwrap();
            mirror.initialize("q1", "alice").await.unwrap();
            let after = mirror.score("q1", "alice").await.unwrap();
            prop_assert_eq!(before, after);
            Ok(())
        })?;
    }

    /// Invariant 3: top_n is sorted descending, ranks strictly increasing
    /// from 1, length <= min(n, size).
    #[test]
    fn top_n_respects_ordering_and_bound(
        scores in prop::collection::vec((1usize..20, 0i64..1000), 1..20),
        n in 1usize..25,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mirror = FallbackMirror::new();
            let mut users = std::collections::HashSet::new();
            for (id, score) in &scores {
                let user = format!("user{id}");
                users.insert(user.clone());
                mirror.increment("q1", &user, *score).await.unwrap();
            }
            let size = mirror.size("q1").await.unwrap();
            let rows = mirror.top_n("q1", n).await.unwrap();

            prop_assert!(rows.len() <= n.min(size));
            for pair in rows.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                prop_assert_eq!(pair[1].rank, pair[0].rank + 1);
            }
            if let Some(first) = rows.first() {
                prop_assert_eq!(first.rank, 1);
            }
            Ok(())
        })?;
    }
}
